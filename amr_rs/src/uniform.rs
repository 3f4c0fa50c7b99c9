//! `UniformPatch` - a minimal concrete grid dataset.
//!
//! The hierarchy works with any [`PatchGeometry`] implementor; this type is
//! the reference one, carrying exactly the geometry the registry audits
//! plus the opaque blanking array downstream consumers read.

use amr_core::{AmrBox, PatchGeometry};

use crate::error::{AmrError, Result};

/// A uniform structured patch described by origin, spacing, and node counts.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformPatch {
    origin: [f64; 3],
    spacing: [f64; 3],
    dimensions: [i32; 3],
    ghost: bool,
    visibility: Option<Vec<u8>>,
}

impl UniformPatch {
    /// Create a patch from its geometry.
    ///
    /// # Errors
    /// Spacing must be positive and node counts at least 1 on every axis
    /// (a degenerate planar axis has one node).
    pub fn new(origin: [f64; 3], spacing: [f64; 3], dimensions: [i32; 3]) -> Result<Self> {
        if spacing.iter().any(|&s| s <= 0.0) {
            return Err(AmrError::InvalidPatch {
                message: "spacing must be positive on every axis",
            });
        }
        if dimensions.iter().any(|&n| n < 1) {
            return Err(AmrError::InvalidPatch {
                message: "node counts must be at least 1 on every axis",
            });
        }
        Ok(Self {
            origin,
            spacing,
            dimensions,
            ghost: false,
            visibility: None,
        })
    }

    /// Create a patch that exactly matches a registry box.
    ///
    /// The patch origin is the box's low node corner under the hierarchy
    /// origin and level spacing; node counts come from the box extent.
    ///
    /// # Errors
    /// `InvalidPatch` for an invalid box or non-positive spacing.
    pub fn from_box(amr_box: &AmrBox, hierarchy_origin: [f64; 3], spacing: [f64; 3]) -> Result<Self> {
        if amr_box.is_invalid() {
            return Err(AmrError::InvalidPatch {
                message: "cannot build a patch from an invalid box",
            });
        }
        Self::new(
            amr_box.min_corner(hierarchy_origin, spacing),
            spacing,
            amr_box.num_nodes(),
        )
    }

    /// Mark whether the patch extent includes ghost cells.
    pub fn with_ghost_cells(mut self, ghost: bool) -> Self {
        self.ghost = ghost;
        self
    }

    /// Attach per-cell visibility flags for blanking.
    pub fn with_cell_visibility(mut self, visibility: Vec<u8>) -> Self {
        self.visibility = Some(visibility);
        self
    }
}

impl PatchGeometry for UniformPatch {
    #[inline]
    fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    #[inline]
    fn origin(&self) -> [f64; 3] {
        self.origin
    }

    #[inline]
    fn dimensions(&self) -> [i32; 3] {
        self.dimensions
    }

    #[inline]
    fn has_ghost_cells(&self) -> bool {
        self.ghost
    }

    fn cell_visibility(&self) -> Option<&[u8]> {
        self.visibility.as_deref()
    }
}
