//! `OverlappingAmr<G>` - the addressable hierarchy.
//!
//! Composes the metadata registry with the sparse block store and exposes
//! the combined surface consumers address: box/spacing/origin accessors,
//! relationship queries, dataset loading, traversal entry points, and the
//! validity audit (see [`crate::audit`]).

use amr_core::{AmrBox, GridDescription};

use crate::error::Result;
use crate::metadata::AmrMetaData;
use crate::store::{BlockStore, StoredBlock};

/// An overlapping AMR hierarchy over patches of type `G`.
///
/// `G` is any grid dataset type; geometry-dependent operations (the audit)
/// additionally require `G: PatchGeometry`. The hierarchy owns its loaded
/// patches exclusively; consumers receive borrowed references.
///
/// # Lifecycle
///
/// Declare the shape once, then populate:
///
/// ```ignore
/// use amr_rs::{OverlappingAmr, UniformPatch};
/// use amr_core::AmrBox;
///
/// let mut amr: OverlappingAmr<UniformPatch> = OverlappingAmr::new(&[1, 1])?;
/// amr.set_origin([0.0; 3]);
/// amr.set_spacing(0, [1.0; 3])?;
/// amr.set_spacing(1, [0.5; 3])?;
/// amr.set_box(0, 0, AmrBox::new([0; 3], [4, 4, 4]))?;
/// amr.set_box(1, 0, AmrBox::new([0; 3], [8, 8, 8]))?;
/// // Grid data may arrive later, or never, for any subset of blocks.
/// ```
#[derive(Debug, Clone)]
pub struct OverlappingAmr<G> {
    meta: AmrMetaData,
    data: BlockStore<G>,
}

impl<G> OverlappingAmr<G> {
    /// Declare a hierarchy with the given per-level block counts.
    ///
    /// # Errors
    /// `EmptyLevels` when no level is declared.
    pub fn new(blocks_per_level: &[usize]) -> Result<Self> {
        Ok(Self {
            meta: AmrMetaData::new(blocks_per_level)?,
            data: BlockStore::new(),
        })
    }

    /// Set the grid description (defaults to [`GridDescription::Full3d`]).
    pub fn with_description(mut self, description: GridDescription) -> Self {
        self.meta.set_description(description);
        self
    }

    /// Read-only access to the metadata registry.
    #[inline]
    pub fn metadata(&self) -> &AmrMetaData {
        &self.meta
    }

    #[inline]
    pub(crate) fn store(&self) -> &BlockStore<G> {
        &self.data
    }

    /// The hierarchy's grid description.
    #[inline]
    pub fn description(&self) -> GridDescription {
        self.meta.description()
    }

    /// Number of declared levels.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.meta.num_levels()
    }

    /// Number of blocks declared at `level`, or `None` when out of range.
    #[inline]
    pub fn blocks_at_level(&self, level: usize) -> Option<usize> {
        self.meta.blocks_at_level(level)
    }

    /// Total number of declared blocks.
    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.meta.total_blocks()
    }

    /// Number of blocks with grid data loaded.
    #[inline]
    pub fn num_loaded_blocks(&self) -> usize {
        self.data.len()
    }

    // -------------------------------------------------------------------------
    // Registry delegation
    // -------------------------------------------------------------------------

    /// Record the box for block `(level, id)`.
    pub fn set_box(&mut self, level: usize, id: usize, amr_box: AmrBox) -> Result<()> {
        self.meta.set_box(level, id, amr_box)
    }

    /// The box recorded for block `(level, id)`.
    ///
    /// A never-set box is returned as-is but reported through the log,
    /// since consuming code displaying such a box is almost always a
    /// population bug.
    pub fn amr_box(&self, level: usize, id: usize) -> Result<AmrBox> {
        let b = self.meta.box_at(level, id)?;
        if b.is_invalid() {
            log::error!("invalid AMR box at ({}, {})", level, id);
        }
        Ok(b)
    }

    /// Set the cell spacing for `level`.
    pub fn set_spacing(&mut self, level: usize, spacing: [f64; 3]) -> Result<()> {
        self.meta.set_spacing(level, spacing)
    }

    /// The cell spacing at `level`.
    pub fn spacing(&self, level: usize) -> Result<[f64; 3]> {
        self.meta.spacing(level)
    }

    /// Set the global origin.
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.meta.set_origin(origin);
    }

    /// The global origin, or `None` when never set.
    #[inline]
    pub fn origin(&self) -> Option<&[f64; 3]> {
        self.meta.origin()
    }

    /// Real-space bounds of block `(level, id)`.
    pub fn bounds(&self, level: usize, id: usize) -> Result<[f64; 6]> {
        self.meta.bounds(level, id)
    }

    /// Real-space position of block `(level, id)`'s first node.
    pub fn origin_of(&self, level: usize, id: usize) -> Result<[f64; 3]> {
        self.meta.origin_of(level, id)
    }

    /// Bounds of the union of level-0 boxes.
    pub fn total_bounds(&self) -> Option<[f64; 6]> {
        self.meta.total_bounds()
    }

    /// Set the refinement ratio of `level` relative to its parent.
    pub fn set_refinement_ratio(&mut self, level: usize, ratio: u32) -> Result<()> {
        self.meta.set_refinement_ratio(level, ratio)
    }

    /// The refinement ratio of `level`, deriving it from spacing when never
    /// set.
    pub fn refinement_ratio(&mut self, level: usize) -> Result<u32> {
        self.meta.refinement_ratio(level)
    }

    /// Whether ratios have been set or derived.
    #[inline]
    pub fn has_refinement_ratio(&self) -> bool {
        self.meta.has_refinement_ratio()
    }

    /// Build the parent/child table from box overlap.
    pub fn generate_parent_child_information(&mut self) -> Result<()> {
        self.meta.generate_parent_child_information()
    }

    /// Whether the parent/child table has been built.
    #[inline]
    pub fn has_children_information(&self) -> bool {
        self.meta.has_children_information()
    }

    /// Parent block ids of `(level, id)`; empty when none (or not built).
    pub fn parents(&self, level: usize, id: usize) -> &[u32] {
        self.meta.parents(level, id)
    }

    /// Child block ids of `(level, id)`; empty when none (or not built).
    pub fn children(&self, level: usize, id: usize) -> &[u32] {
        self.meta.children(level, id)
    }

    /// Flat index of block `(level, id)`.
    pub fn flat_index(&self, level: usize, id: usize) -> Result<usize> {
        self.meta.flat_index(level, id)
    }

    /// Decode a flat index back to `(level, id)`.
    #[inline]
    pub fn level_and_id(&self, flat: usize) -> Option<(usize, usize)> {
        self.meta.level_and_id(flat)
    }

    /// Associate block `(level, id)` with an originating-source id.
    pub fn set_source_index(&mut self, level: usize, id: usize, source: i64) -> Result<()> {
        let flat = self.meta.flat_index(level, id)?;
        self.meta.set_source_index(flat, source);
        Ok(())
    }

    /// The originating-source id of block `(level, id)`, or `None`.
    pub fn source_index(&self, level: usize, id: usize) -> Option<i64> {
        let flat = self.meta.flat_index(level, id).ok()?;
        self.meta.source_index(flat)
    }

    // -------------------------------------------------------------------------
    // Block data
    // -------------------------------------------------------------------------

    /// Load grid data for block `(level, id)`, dropping any previous patch
    /// stored there.
    ///
    /// # Errors
    /// Out-of-range addresses are rejected and the store is left unchanged.
    pub fn set_data_set(&mut self, level: usize, id: usize, patch: G) -> Result<()> {
        let flat = self.meta.flat_index(level, id)?;
        self.data.set(flat, patch);
        Ok(())
    }

    /// The grid data loaded for block `(level, id)`.
    ///
    /// `None` is the normal outcome for a sparse hierarchy - the block is
    /// declared but its data never arrived.
    pub fn data_set(&self, level: usize, id: usize) -> Option<&G> {
        let flat = self.meta.flat_index(level, id).ok()?;
        self.data.get(flat)
    }

    /// Remove and return the grid data of block `(level, id)`.
    pub fn take_data_set(&mut self, level: usize, id: usize) -> Option<G> {
        let flat = self.meta.flat_index(level, id).ok()?;
        self.data.take(flat)
    }

    /// All loaded blocks in insertion order.
    #[inline]
    pub fn loaded_blocks(&self) -> &[StoredBlock<G>] {
        self.data.loaded()
    }

    /// Parallel iterator over loaded blocks as `(level, id, patch)`.
    ///
    /// Traversal is read-only; iterating a finalized hierarchy from
    /// multiple threads is safe.
    #[cfg(feature = "rayon")]
    pub fn par_loaded_blocks(
        &self,
    ) -> impl rayon::prelude::ParallelIterator<Item = (usize, usize, &G)>
    where
        G: Sync,
    {
        use rayon::prelude::*;
        self.data.loaded().par_iter().filter_map(move |b| {
            let (level, id) = self.meta.level_and_id(b.flat_index)?;
            Some((level, id, &b.patch))
        })
    }
}
