//! Point location in the hierarchy.
//!
//! Interpolation and velocity-field consumers need the block owning an
//! arbitrary real-space point. AMR semantics give finer levels precedence
//! wherever they overlap coarser ones, so the search scans levels coarse to
//! fine and keeps the last hit.

use crate::dataset::OverlappingAmr;
use crate::metadata::AmrMetaData;

impl AmrMetaData {
    /// First block at `level` whose real-space bounds contain `point`,
    /// scanning ids in ascending order.
    ///
    /// Blocks may share boundary faces; the lowest matching id wins there.
    pub fn find_in_level(&self, level: usize, point: [f64; 3]) -> Option<usize> {
        let blocks = self.blocks_at_level(level)?;
        let spacing = self.spacing(level).ok()?;
        let origin = self.origin_or_zero();
        (0..blocks).find(|&id| {
            matches!(self.box_at(level, id),
                Ok(b) if !b.is_invalid() && b.contains_point(origin, spacing, point))
        })
    }

    /// The finest block containing `point`, as `(level, id)`.
    ///
    /// Scans every level in ascending order; a hit at a finer level
    /// supersedes any coarser hit, so a point covered by both a coarse
    /// block and a refined child resolves to the child. Within a level the
    /// first id in scan order wins. `None` when the point lies outside
    /// every block at every level.
    pub fn find_block(&self, point: [f64; 3]) -> Option<(usize, usize)> {
        let mut found = None;
        for level in 0..self.num_levels() {
            if let Some(id) = self.find_in_level(level, point) {
                found = Some((level, id));
            }
        }
        found
    }
}

impl<G> OverlappingAmr<G> {
    /// The finest block containing `point`. See
    /// [`AmrMetaData::find_block`] for the scan-order contract.
    pub fn find_block(&self, point: [f64; 3]) -> Option<(usize, usize)> {
        self.metadata().find_block(point)
    }
}
