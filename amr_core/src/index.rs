//! Flat-index codec for the level/block index space.
//!
//! A hierarchy addresses blocks by `(level, id)` pairs, but sparse storage
//! and traversal key off a single flat index computed as a prefix sum over
//! the per-level block counts. `BlockIndexer` owns that prefix table and
//! converts in both directions.

use crate::alloc_prelude::Vec;

/// Prefix-sum encoder/decoder for `(level, id)` ↔ flat block indices.
///
/// The table stores cumulative offsets: `offsets[l]` is the flat index of
/// block 0 at level `l`, and `offsets[levels]` is the total block count.
/// Levels may declare zero blocks; indices stay dense regardless of whether
/// the corresponding grid data was ever loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndexer {
    /// Cumulative block counts; length is `num_levels + 1`, first entry 0.
    offsets: Vec<usize>,
}

impl BlockIndexer {
    /// Build the prefix table from per-level block counts.
    ///
    /// Returns `None` for an empty count sequence; a hierarchy must declare
    /// at least one level.
    pub fn from_blocks_per_level(blocks_per_level: &[usize]) -> Option<Self> {
        if blocks_per_level.is_empty() {
            return None;
        }
        let mut offsets = Vec::with_capacity(blocks_per_level.len() + 1);
        let mut total = 0usize;
        offsets.push(0);
        for &n in blocks_per_level {
            total += n;
            offsets.push(total);
        }
        Some(Self { offsets })
    }

    /// Number of declared levels.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total number of declared blocks across all levels.
    #[inline]
    pub fn total_blocks(&self) -> usize {
        *self.offsets.last().unwrap_or(&0)
    }

    /// Number of blocks declared at `level`, or `None` when out of range.
    #[inline]
    pub fn blocks_at_level(&self, level: usize) -> Option<usize> {
        if level >= self.num_levels() {
            return None;
        }
        Some(self.offsets[level + 1] - self.offsets[level])
    }

    /// Flat index of block 0 at `level`, or `None` when out of range.
    #[inline]
    pub fn level_offset(&self, level: usize) -> Option<usize> {
        if level >= self.num_levels() {
            return None;
        }
        Some(self.offsets[level])
    }

    /// Encode `(level, id)` to a flat index. `None` when either component is
    /// out of the declared range.
    #[inline]
    pub fn flat_index(&self, level: usize, id: usize) -> Option<usize> {
        if id >= self.blocks_at_level(level)? {
            return None;
        }
        Some(self.offsets[level] + id)
    }

    /// Decode a flat index back to `(level, id)`. `None` for indices at or
    /// beyond the total block count.
    pub fn level_and_id(&self, flat: usize) -> Option<(usize, usize)> {
        if flat >= self.total_blocks() {
            return None;
        }
        // First offset strictly greater than `flat` marks the level after
        // the one that owns it. Zero-block levels collapse to equal offsets
        // and are skipped naturally.
        let level = self.offsets.partition_point(|&o| o <= flat) - 1;
        Some((level, flat - self.offsets[level]))
    }

    /// Read-only view of the cumulative offset table.
    #[inline]
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}
