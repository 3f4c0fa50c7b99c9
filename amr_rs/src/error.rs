//! Error types for amr_rs operations.
//!
//! Provides specific error variants for registry construction, addressing,
//! and refinement-ratio failures. Geometry *inconsistency* found by the
//! validity audit is not an error; see [`crate::audit`] for the collected
//! discrepancy report.

use core::fmt;

use amr_core::RatioError;

/// Errors that can occur during amr_rs operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AmrError {
    /// Attempted to build a hierarchy with no levels.
    EmptyLevels,

    /// A level index is beyond the declared level count.
    LevelOutOfRange {
        /// The requested level.
        level: usize,
        /// Number of declared levels.
        levels: usize,
    },

    /// A block id is beyond the declared count for its level.
    BlockOutOfRange {
        /// The requested level.
        level: usize,
        /// The requested block id.
        id: usize,
        /// Number of blocks declared at that level.
        blocks: usize,
    },

    /// A refinement ratio below 1 was supplied.
    InvalidRatio {
        /// The target level.
        level: usize,
        /// The rejected ratio.
        ratio: u32,
    },

    /// Geometric ratio derivation failed for a level.
    RatioDerivation {
        /// The level whose ratio could not be derived.
        level: usize,
        /// The underlying derivation failure.
        source: RatioError,
    },

    /// Bounds were requested for a block whose box was never set.
    InvalidBox {
        /// The requested level.
        level: usize,
        /// The requested block id.
        id: usize,
    },

    /// A patch failed construction-time validation.
    InvalidPatch {
        /// Description of the validation failure.
        message: &'static str,
    },
}

impl fmt::Display for AmrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmrError::EmptyLevels => {
                write!(f, "a hierarchy must declare at least one level")
            }
            AmrError::LevelOutOfRange { level, levels } => {
                write!(f, "level {} is out of range ({} levels declared)", level, levels)
            }
            AmrError::BlockOutOfRange { level, id, blocks } => {
                write!(
                    f,
                    "block ({}, {}) is out of range ({} blocks declared at level {})",
                    level, id, blocks, level
                )
            }
            AmrError::InvalidRatio { level, ratio } => {
                write!(f, "refinement ratio {} for level {} is below 1", ratio, level)
            }
            AmrError::RatioDerivation { level, source } => {
                write!(f, "cannot derive refinement ratio for level {}: {}", level, source)
            }
            AmrError::InvalidBox { level, id } => {
                write!(f, "block ({}, {}) has no valid AMR box", level, id)
            }
            AmrError::InvalidPatch { message } => {
                write!(f, "invalid patch: {}", message)
            }
        }
    }
}

impl std::error::Error for AmrError {}

/// Result type alias for amr_rs operations.
pub type Result<T> = core::result::Result<T, AmrError>;
