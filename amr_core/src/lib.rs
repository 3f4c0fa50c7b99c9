//! # amr_core
//!
//! Pure primitives for overlapping Adaptive Mesh Refinement hierarchies.
//!
//! This crate provides the foundational, allocation-light pieces of the AMR
//! data model: index-space boxes, the flat-index prefix-sum codec,
//! refinement-ratio derivation, and the geometry trait that downstream grid
//! types implement. Stateful composition (registries, block stores,
//! iterators) lives in `amr_rs`.
//!
//! ## Features
//!
//! - **no_std compatible**: works without the standard library; enable
//!   `alloc` for the flat-index codec in embedded environments
//! - **Pure data model**: no grid storage, no traversal state, just math
//!   and extents
//!
//! ## Feature Flags
//!
//! - `std` (default): enables standard library support
//! - `alloc`: enables heap allocation (Vec, etc.) without full std
//!
//! ## Modules
//!
//! - [`types`]: `GridDescription` (planar vs full-3D hierarchies)
//! - [`box3`]: `AmrBox`, the per-block index-space extent
//! - [`index`]: `BlockIndexer`, `(level, id)` ↔ flat-index codec
//! - [`refinement`]: integer ratio derivation from adjacent-level spacings
//! - [`traits`]: `PatchGeometry`, the consumed block-dataset abstraction
//!
//! ## Usage
//!
//! ```ignore
//! use amr_core::prelude::*;
//!
//! let ix = BlockIndexer::from_blocks_per_level(&[1, 3]).unwrap();
//! assert_eq!(ix.flat_index(1, 2), Some(3));
//!
//! let b = AmrBox::new([0, 0, 0], [7, 7, 7]);
//! assert!(!b.is_invalid());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Conditional std/alloc support
#[cfg(feature = "std")]
extern crate std;

#[cfg(all(feature = "alloc", not(feature = "std")))]
extern crate alloc;

// Internal alloc prelude for conditional compilation
#[cfg(feature = "std")]
mod alloc_prelude {
    pub use std::vec::Vec;
}

#[cfg(all(feature = "alloc", not(feature = "std")))]
mod alloc_prelude {
    pub use alloc::vec::Vec;
}

pub mod box3;
#[cfg(any(feature = "std", feature = "alloc"))]
pub mod index;
pub mod refinement;
pub mod traits;
pub mod types;

/// Prelude module for convenient imports.
///
/// Provides the most commonly used types and functions.
pub mod prelude {
    pub use crate::box3::AmrBox;
    #[cfg(any(feature = "std", feature = "alloc"))]
    pub use crate::index::BlockIndexer;
    pub use crate::refinement::{derive_ratio, RatioError};
    pub use crate::traits::PatchGeometry;
    pub use crate::types::GridDescription;
}

// Re-export everything at crate root for convenience
pub use box3::AmrBox;
#[cfg(any(feature = "std", feature = "alloc"))]
pub use index::BlockIndexer;
pub use refinement::{derive_ratio, RatioError};
pub use traits::PatchGeometry;
pub use types::GridDescription;
