//! Validity auditing of loaded grids against the registry.
//!
//! The registry and the grids it indexes are populated through separate
//! calls, usually by separate subsystems, so they can drift. The audit
//! cross-checks every loaded grid's reported geometry against the
//! registry's box-derived expectations and collects *all* discrepancies -
//! one call surfaces every inconsistency instead of stopping at the first.

use core::fmt;

use amr_core::PatchGeometry;

use crate::dataset::OverlappingAmr;

/// One inconsistency between a loaded grid and the registry.
///
/// Expected values are what the registry's box, spacing, and origin tables
/// imply; actual values are what the grid reports.
#[derive(Debug, Clone, PartialEq)]
pub enum Discrepancy {
    /// A grid is loaded for a block whose box was never set.
    MissingBox {
        /// Level of the offending block.
        level: usize,
        /// Block id within the level.
        id: usize,
    },
    /// The grid's spacing disagrees with the registry on an audited axis.
    SpacingMismatch {
        /// Level of the offending block.
        level: usize,
        /// Block id within the level.
        id: usize,
        /// Registry spacing for the block's level.
        expected: [f64; 3],
        /// Spacing the grid reports.
        actual: [f64; 3],
    },
    /// The grid's origin disagrees with the box-derived position.
    OriginMismatch {
        /// Level of the offending block.
        level: usize,
        /// Block id within the level.
        id: usize,
        /// Box-derived origin of the block.
        expected: [f64; 3],
        /// Origin the grid reports.
        actual: [f64; 3],
    },
    /// The grid's node counts disagree with the box extent.
    DimensionMismatch {
        /// Level of the offending block.
        level: usize,
        /// Block id within the level.
        id: usize,
        /// Node counts the box declares.
        expected: [i32; 3],
        /// Node counts the grid reports.
        actual: [i32; 3],
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::MissingBox { level, id } => {
                write!(f, "grid loaded at ({}, {}) but its box was never set", level, id)
            }
            Discrepancy::SpacingMismatch {
                level,
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "grid spacing {:?} does not match registry {:?} at ({}, {})",
                    actual, expected, level, id
                )
            }
            Discrepancy::OriginMismatch {
                level,
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "grid origin {:?} does not match registry {:?} at ({}, {})",
                    actual, expected, level, id
                )
            }
            Discrepancy::DimensionMismatch {
                level,
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "grid dimensions {:?} do not match registry {:?} at ({}, {})",
                    actual, expected, level, id
                )
            }
        }
    }
}

/// Everything one audit pass found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditReport {
    discrepancies: Vec<Discrepancy>,
}

impl AuditReport {
    /// True when the audit found nothing wrong.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.discrepancies.is_empty()
    }

    /// Every discrepancy found, in traversal order.
    #[inline]
    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }
}

impl<G: PatchGeometry> OverlappingAmr<G> {
    /// Cross-check every loaded grid against the registry.
    ///
    /// Axis coverage follows the grid description: planar hierarchies check
    /// the degenerate axis, full 3D hierarchies check all three. Grids with
    /// ghost cells are exempt from origin and dimension checks (ghost
    /// padding legitimately shifts both) but never from spacing checks.
    ///
    /// The audit itself is non-fatal and checks every block even after
    /// failures. Comparisons are exact: the audit detects copy drift, not
    /// numerical noise.
    pub fn audit(&self) -> AuditReport {
        let description = self.description();
        let mut discrepancies = Vec::new();

        for blk in self.iter_loaded() {
            let Some(grid) = blk.data else { continue };
            let (level, id) = (blk.level, blk.id);

            let amr_box = match self.metadata().box_at(level, id) {
                Ok(b) if !b.is_invalid() => b,
                _ => {
                    discrepancies.push(Discrepancy::MissingBox { level, id });
                    continue;
                }
            };

            // Level and id come from traversal, so these lookups cannot be
            // out of range.
            let expected_spacing = self.metadata().spacing(level).unwrap_or([0.0; 3]);
            let expected_origin =
                amr_box.min_corner(self.metadata().origin_or_zero(), expected_spacing);
            let expected_dims = amr_box.num_nodes();

            let has_ghost = grid.has_ghost_cells();
            let actual_spacing = grid.spacing();
            let actual_origin = grid.origin();
            let actual_dims = grid.dimensions();

            let audited = |d: usize| description.audits_axis(d);

            if (0..3).any(|d| audited(d) && actual_spacing[d] != expected_spacing[d]) {
                discrepancies.push(Discrepancy::SpacingMismatch {
                    level,
                    id,
                    expected: expected_spacing,
                    actual: actual_spacing,
                });
            }
            if !has_ghost && (0..3).any(|d| audited(d) && actual_origin[d] != expected_origin[d]) {
                discrepancies.push(Discrepancy::OriginMismatch {
                    level,
                    id,
                    expected: expected_origin,
                    actual: actual_origin,
                });
            }
            if !has_ghost && (0..3).any(|d| audited(d) && actual_dims[d] != expected_dims[d]) {
                discrepancies.push(Discrepancy::DimensionMismatch {
                    level,
                    id,
                    expected: expected_dims,
                    actual: actual_dims,
                });
            }
        }

        AuditReport { discrepancies }
    }

    /// Run [`OverlappingAmr::audit`], log every discrepancy, and report the
    /// boolean summary.
    pub fn check_validity(&self) -> bool {
        let report = self.audit();
        for d in report.discrepancies() {
            log::error!("{}", d);
        }
        report.is_valid()
    }
}

#[cfg(test)]
mod tests {
    use amr_core::{AmrBox, GridDescription};

    use super::*;
    use crate::uniform::UniformPatch;

    /// The canonical two-level hierarchy: level 0 spans the domain at
    /// spacing 1.0, level 1 refines all of it at spacing 0.5. Both grids
    /// match the registry exactly.
    fn consistent_hierarchy() -> OverlappingAmr<UniformPatch> {
        let mut amr = OverlappingAmr::new(&[1, 1]).unwrap();
        amr.set_origin([0.0; 3]);
        amr.set_spacing(0, [1.0; 3]).unwrap();
        amr.set_spacing(1, [0.5; 3]).unwrap();

        let coarse = AmrBox::new([0; 3], [4, 4, 4]);
        let fine = AmrBox::new([0; 3], [8, 8, 8]);
        amr.set_box(0, 0, coarse).unwrap();
        amr.set_box(1, 0, fine).unwrap();

        amr.set_data_set(0, 0, UniformPatch::from_box(&coarse, [0.0; 3], [1.0; 3]).unwrap())
            .unwrap();
        amr.set_data_set(1, 0, UniformPatch::from_box(&fine, [0.0; 3], [0.5; 3]).unwrap())
            .unwrap();
        amr
    }

    #[test]
    fn test_consistent_hierarchy_is_valid() {
        let amr = consistent_hierarchy();
        assert!(amr.check_validity());
        assert!(amr.audit().is_valid());
    }

    #[test]
    fn test_spacing_mismatch_reported_once() {
        let mut amr = consistent_hierarchy();
        // Deliberately wrong spacing on the fine grid.
        let bad = UniformPatch::new([0.0; 3], [1.0; 3], [9, 9, 9]).unwrap();
        amr.set_data_set(1, 0, bad).unwrap();

        let report = amr.audit();
        assert!(!amr.check_validity());
        assert_eq!(
            report.discrepancies(),
            &[Discrepancy::SpacingMismatch {
                level: 1,
                id: 0,
                expected: [0.5; 3],
                actual: [1.0; 3],
            }]
        );
    }

    #[test]
    fn test_origin_and_dimension_mismatches_collected() {
        let mut amr = consistent_hierarchy();
        let shifted = UniformPatch::new([0.25, 0.0, 0.0], [0.5; 3], [9, 9, 8]).unwrap();
        amr.set_data_set(1, 0, shifted).unwrap();

        let report = amr.audit();
        assert_eq!(report.discrepancies().len(), 2);
        assert!(matches!(
            report.discrepancies()[0],
            Discrepancy::OriginMismatch { level: 1, id: 0, .. }
        ));
        assert!(matches!(
            report.discrepancies()[1],
            Discrepancy::DimensionMismatch { level: 1, id: 0, .. }
        ));
    }

    #[test]
    fn test_ghost_cells_exempt_origin_and_dims_only() {
        let mut amr = consistent_hierarchy();
        // Ghost padding shifts origin and dimensions; that is legitimate.
        let padded = UniformPatch::new([-0.5, -0.5, -0.5], [0.5; 3], [11, 11, 11])
            .unwrap()
            .with_ghost_cells(true);
        amr.set_data_set(1, 0, padded).unwrap();
        assert!(amr.check_validity());

        // Spacing is never exempt, ghost cells or not.
        let padded_bad_spacing = UniformPatch::new([-0.5, -0.5, -0.5], [0.25; 3], [11, 11, 11])
            .unwrap()
            .with_ghost_cells(true);
        amr.set_data_set(1, 0, padded_bad_spacing).unwrap();
        let report = amr.audit();
        assert_eq!(report.discrepancies().len(), 1);
        assert!(matches!(
            report.discrepancies()[0],
            Discrepancy::SpacingMismatch { level: 1, id: 0, .. }
        ));
    }

    #[test]
    fn test_planar_hierarchy_checks_degenerate_axis_only() {
        let mut amr: OverlappingAmr<UniformPatch> = OverlappingAmr::new(&[1])
            .unwrap()
            .with_description(GridDescription::XyPlane);
        amr.set_origin([0.0; 3]);
        amr.set_spacing(0, [1.0, 1.0, 1.0]).unwrap();
        let b = AmrBox::new([0, 0, 0], [4, 4, 0]);
        amr.set_box(0, 0, b).unwrap();

        // Wrong on x and y, right on the degenerate z axis: passes.
        let patch = UniformPatch::new([0.5, 0.5, 0.0], [2.0, 2.0, 1.0], [3, 3, 1]).unwrap();
        amr.set_data_set(0, 0, patch).unwrap();
        assert!(amr.check_validity());

        // Wrong on the degenerate axis: caught.
        let patch = UniformPatch::new([0.0, 0.0, 0.5], [1.0, 1.0, 1.0], [5, 5, 1]).unwrap();
        amr.set_data_set(0, 0, patch).unwrap();
        assert!(!amr.check_validity());
    }

    #[test]
    fn test_audit_continues_past_failures() {
        let mut amr = consistent_hierarchy();
        let bad_coarse = UniformPatch::new([0.0; 3], [2.0; 3], [5, 5, 5]).unwrap();
        let bad_fine = UniformPatch::new([0.0; 3], [1.0; 3], [9, 9, 9]).unwrap();
        amr.set_data_set(0, 0, bad_coarse).unwrap();
        amr.set_data_set(1, 0, bad_fine).unwrap();

        // Both blocks are reported, not just the first.
        let report = amr.audit();
        assert_eq!(report.discrepancies().len(), 2);
    }

    #[test]
    fn test_grid_without_box_reported() {
        let mut amr: OverlappingAmr<UniformPatch> = OverlappingAmr::new(&[1]).unwrap();
        amr.set_spacing(0, [1.0; 3]).unwrap();
        let patch = UniformPatch::new([0.0; 3], [1.0; 3], [5, 5, 5]).unwrap();
        amr.set_data_set(0, 0, patch).unwrap();

        let report = amr.audit();
        assert_eq!(
            report.discrepancies(),
            &[Discrepancy::MissingBox { level: 0, id: 0 }]
        );
    }

    #[test]
    fn test_unloaded_blocks_not_audited() {
        let mut amr = consistent_hierarchy();
        amr.take_data_set(1, 0);
        // Only the remaining loaded block is checked.
        assert!(amr.check_validity());
    }
}
