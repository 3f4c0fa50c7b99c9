//! # amr_rs
//!
//! Data model and traversal runtime for overlapping Adaptive Mesh
//! Refinement hierarchies.
//!
//! An overlapping AMR hierarchy is a stack of refinement levels, each a set
//! of uniform blocks described in index space. This crate owns the
//! structural side of that model:
//!
//! - **Registry** ([`AmrMetaData`]): per-level box tables, spacing, global
//!   origin, refinement ratios, parent/child relationships
//! - **Sparse block store** ([`BlockStore`]): flat-index → owned grid data,
//!   where "not loaded" is a normal state, not an error
//! - **Hierarchy** ([`OverlappingAmr`]): composes both and exposes the
//!   addressable surface, including validity auditing
//! - **Traversal** ([`HierarchyIterator`]): dense (every declared block) or
//!   sparse (loaded blocks only) iteration
//! - **Point location** (`find_block`): finest-level-wins containment search
//!
//! ## Quick Start
//!
//! ```ignore
//! use amr_rs::{OverlappingAmr, UniformPatch};
//! use amr_core::AmrBox;
//!
//! let mut amr: OverlappingAmr<UniformPatch> = OverlappingAmr::new(&[1, 1])?;
//! amr.set_origin([0.0; 3]);
//! amr.set_spacing(0, [1.0; 3])?;
//! amr.set_spacing(1, [0.5; 3])?;
//! amr.set_box(0, 0, AmrBox::new([0; 3], [4, 4, 4]))?;
//! amr.set_box(1, 0, AmrBox::new([0; 3], [8, 8, 8]))?;
//!
//! // Finer levels win where they overlap.
//! assert_eq!(amr.find_block([2.0, 2.0, 2.0]), Some((1, 0)));
//!
//! // Dense traversal visits declared blocks whether or not data loaded.
//! for block in amr.iter() {
//!     println!("({}, {}) loaded: {}", block.level, block.id, block.data.is_some());
//! }
//! ```
//!
//! ## Concurrency
//!
//! The hierarchy is single-threaded and synchronous. Mutation requires
//! exclusive access (`&mut self`); read-only traversal of a finalized
//! hierarchy is safe from any number of threads, since iterators hold only
//! a shared borrow and their own cursor. With the `rayon` feature,
//! [`OverlappingAmr::par_loaded_blocks`] iterates loaded blocks in
//! parallel.
//!
//! ## Ownership
//!
//! The registry owns its tables; the store owns grid data exclusively
//! (replacing a slot drops the previous patch); consumers always receive
//! borrowed references.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod audit;
mod dataset;
mod error;
mod iterator;
mod locator;
mod metadata;
mod store;
mod uniform;

pub use audit::{AuditReport, Discrepancy};
pub use dataset::OverlappingAmr;
pub use error::{AmrError, Result};
pub use iterator::{BlockRef, HierarchyIterator};
pub use metadata::AmrMetaData;
pub use store::{BlockStore, StoredBlock};
pub use uniform::UniformPatch;

// Re-export amr_core types for convenience
pub use amr_core::{derive_ratio, AmrBox, BlockIndexer, GridDescription, PatchGeometry, RatioError};

/// Prelude module for convenient imports.
///
/// ```ignore
/// use amr_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::audit::{AuditReport, Discrepancy};
    pub use crate::dataset::OverlappingAmr;
    pub use crate::error::{AmrError, Result};
    pub use crate::iterator::{BlockRef, HierarchyIterator};
    pub use crate::metadata::AmrMetaData;
    pub use crate::uniform::UniformPatch;

    pub use amr_core::{AmrBox, GridDescription, PatchGeometry};
}
