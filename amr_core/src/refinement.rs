//! Refinement-ratio derivation from adjacent-level spacings.
//!
//! When a hierarchy never had its ratios set explicitly, they are recovered
//! from geometry: the integer factor between a parent level's spacing and
//! its child's. Every non-degenerate axis must agree on that factor.

use core::fmt;

use crate::types::GridDescription;

/// Failure modes of geometric ratio derivation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatioError {
    /// A level's spacing was never set (reads as zero) or is negative.
    MissingSpacing {
        /// The axis with non-positive spacing.
        axis: usize,
    },
    /// The rounded ratio is below 1 on some axis.
    NonPositive {
        /// The offending axis.
        axis: usize,
        /// The rounded coarse/fine factor on that axis.
        ratio: i64,
    },
    /// Two audited axes disagree on the integer factor.
    Inconsistent {
        /// The axis that disagrees with the first audited axis.
        axis: usize,
        /// Ratio derived from the first audited axis.
        expected: u32,
        /// Ratio derived from `axis`.
        got: u32,
    },
}

impl fmt::Display for RatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatioError::MissingSpacing { axis } => {
                write!(f, "spacing is unset or non-positive on axis {}", axis)
            }
            RatioError::NonPositive { axis, ratio } => {
                write!(f, "derived ratio {} on axis {} is below 1", ratio, axis)
            }
            RatioError::Inconsistent { axis, expected, got } => {
                write!(
                    f,
                    "axis {} derives ratio {} but axis 0 of the audited set derives {}",
                    axis, got, expected
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RatioError {}

/// Derive the integer refinement ratio between a coarse level and the
/// next-finer one from their spacings.
///
/// The ratio on each axis is `round(coarse / fine)`. Degenerate axes (per
/// `description`) are ignored; all remaining axes must agree and the result
/// must be at least 1.
pub fn derive_ratio(
    coarse: [f64; 3],
    fine: [f64; 3],
    description: GridDescription,
) -> Result<u32, RatioError> {
    let empty = description.empty_dimension();
    let mut derived: Option<u32> = None;

    for axis in 0..3 {
        if empty == Some(axis) {
            continue;
        }
        if coarse[axis] <= 0.0 || fine[axis] <= 0.0 {
            return Err(RatioError::MissingSpacing { axis });
        }
        let ratio = libm::round(coarse[axis] / fine[axis]) as i64;
        if ratio < 1 {
            return Err(RatioError::NonPositive { axis, ratio });
        }
        let ratio = ratio as u32;
        match derived {
            None => derived = Some(ratio),
            Some(expected) if expected != ratio => {
                return Err(RatioError::Inconsistent {
                    axis,
                    expected,
                    got: ratio,
                });
            }
            Some(_) => {}
        }
    }

    // At least two axes are always audited, so `derived` is set here.
    Ok(derived.unwrap_or(1))
}
