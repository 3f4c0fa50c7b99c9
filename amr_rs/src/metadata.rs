//! `AmrMetaData` - the level/block registry.
//!
//! Owns everything the hierarchy knows about its structure without touching
//! grid data: per-level box tables, spacing, the global origin, refinement
//! ratios, parent/child relationships, and the optional source-index map.
//! Built once during a setup phase, read-only afterwards except for the
//! documented mutation points and the lazily computed caches.

use std::collections::HashMap;

use amr_core::{derive_ratio, AmrBox, BlockIndexer, GridDescription};

use crate::error::{AmrError, Result};

const NO_RELATIONS: &[u32] = &[];

/// Registry of levels, boxes, and inter-level relationships.
///
/// Block indices are dense per level: every `(level, id)` within the
/// declared counts addresses a slot, whether or not grid data was ever
/// loaded for it. A slot whose box was never set holds the invalid box.
///
/// # Lazy caches
///
/// Two derived tables are computed on demand and flagged once built:
///
/// - refinement ratios ([`AmrMetaData::refinement_ratio`] generates them
///   from level spacings when unset)
/// - the parent/child table ([`AmrMetaData::generate_parent_child_information`]
///   must be called explicitly; relationship queries before that return
///   empty views)
#[derive(Debug, Clone)]
pub struct AmrMetaData {
    indexer: BlockIndexer,
    description: GridDescription,
    /// Box per declared slot, level-major; never-set slots stay invalid.
    boxes: Vec<Vec<AmrBox>>,
    /// Per-level spacing; zeros until set.
    spacing: Vec<[f64; 3]>,
    /// Single global origin shared by all levels.
    origin: Option<[f64; 3]>,
    /// Ratio of each level relative to its parent; `ratios[0]` is 1.
    ratios: Vec<u32>,
    has_refinement_ratio: bool,
    /// `parents[level][id]` lists parent ids at `level - 1`.
    parents: Vec<Vec<Vec<u32>>>,
    /// `children[level][id]` lists child ids at `level + 1`.
    children: Vec<Vec<Vec<u32>>>,
    has_children_information: bool,
    /// Flat block index -> originating source id, populated independently
    /// of the geometry tables.
    source_ids: HashMap<usize, i64>,
}

impl AmrMetaData {
    /// Allocate the registry for the given per-level block counts.
    ///
    /// # Errors
    /// `EmptyLevels` when `blocks_per_level` is empty. Individual levels may
    /// declare zero blocks.
    pub fn new(blocks_per_level: &[usize]) -> Result<Self> {
        let indexer =
            BlockIndexer::from_blocks_per_level(blocks_per_level).ok_or(AmrError::EmptyLevels)?;
        let levels = indexer.num_levels();

        Ok(Self {
            boxes: blocks_per_level
                .iter()
                .map(|&n| vec![AmrBox::invalid(); n])
                .collect(),
            spacing: vec![[0.0; 3]; levels],
            origin: None,
            ratios: Vec::new(),
            has_refinement_ratio: false,
            parents: Vec::new(),
            children: Vec::new(),
            has_children_information: false,
            source_ids: HashMap::new(),
            description: GridDescription::default(),
            indexer,
        })
    }

    /// Number of declared levels.
    #[inline]
    pub fn num_levels(&self) -> usize {
        self.indexer.num_levels()
    }

    /// Number of blocks declared at `level`, or `None` when out of range.
    #[inline]
    pub fn blocks_at_level(&self, level: usize) -> Option<usize> {
        self.indexer.blocks_at_level(level)
    }

    /// Total number of declared blocks across all levels.
    #[inline]
    pub fn total_blocks(&self) -> usize {
        self.indexer.total_blocks()
    }

    /// The flat-index codec for this hierarchy.
    #[inline]
    pub fn indexer(&self) -> &BlockIndexer {
        &self.indexer
    }

    /// The hierarchy's grid description.
    #[inline]
    pub fn description(&self) -> GridDescription {
        self.description
    }

    /// Set the hierarchy's grid description.
    pub fn set_description(&mut self, description: GridDescription) {
        self.description = description;
    }

    fn check_level(&self, level: usize) -> Result<()> {
        if level >= self.num_levels() {
            return Err(AmrError::LevelOutOfRange {
                level,
                levels: self.num_levels(),
            });
        }
        Ok(())
    }

    fn check_block(&self, level: usize, id: usize) -> Result<()> {
        self.check_level(level)?;
        let blocks = self.boxes[level].len();
        if id >= blocks {
            return Err(AmrError::BlockOutOfRange { level, id, blocks });
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Boxes
    // -------------------------------------------------------------------------

    /// Record the box for block `(level, id)`.
    ///
    /// # Errors
    /// Out-of-range addresses are rejected and leave the registry unchanged.
    pub fn set_box(&mut self, level: usize, id: usize, amr_box: AmrBox) -> Result<()> {
        self.check_block(level, id)?;
        self.boxes[level][id] = amr_box;
        Ok(())
    }

    /// The box recorded for block `(level, id)`.
    ///
    /// A never-set slot yields the invalid box; check
    /// [`AmrBox::is_invalid`] before deriving geometry from the result.
    ///
    /// # Errors
    /// Out-of-range addresses are rejected.
    pub fn box_at(&self, level: usize, id: usize) -> Result<AmrBox> {
        self.check_block(level, id)?;
        Ok(self.boxes[level][id])
    }

    // -------------------------------------------------------------------------
    // Spacing and origin
    // -------------------------------------------------------------------------

    /// Set the cell spacing for every block at `level`.
    pub fn set_spacing(&mut self, level: usize, spacing: [f64; 3]) -> Result<()> {
        self.check_level(level)?;
        self.spacing[level] = spacing;
        Ok(())
    }

    /// The cell spacing at `level`. Reads as zeros until set.
    pub fn spacing(&self, level: usize) -> Result<[f64; 3]> {
        self.check_level(level)?;
        Ok(self.spacing[level])
    }

    /// Set the global origin shared by all levels.
    pub fn set_origin(&mut self, origin: [f64; 3]) {
        self.origin = Some(origin);
    }

    /// The global origin, or `None` when never set.
    #[inline]
    pub fn origin(&self) -> Option<&[f64; 3]> {
        self.origin.as_ref()
    }

    /// The origin used for geometry derivation: the global origin, or zeros
    /// when it was never set.
    #[inline]
    pub(crate) fn origin_or_zero(&self) -> [f64; 3] {
        self.origin.unwrap_or([0.0; 3])
    }

    /// Real-space bounds `[xmin, xmax, ymin, ymax, zmin, zmax]` of block
    /// `(level, id)`.
    ///
    /// # Errors
    /// Out-of-range addresses are rejected; a never-set box is reported as
    /// `InvalidBox` rather than yielding nonsense bounds.
    pub fn bounds(&self, level: usize, id: usize) -> Result<[f64; 6]> {
        let b = self.box_at(level, id)?;
        if b.is_invalid() {
            return Err(AmrError::InvalidBox { level, id });
        }
        Ok(b.bounds(self.origin_or_zero(), self.spacing[level]))
    }

    /// Real-space position of block `(level, id)`'s first node.
    pub fn origin_of(&self, level: usize, id: usize) -> Result<[f64; 3]> {
        let bb = self.bounds(level, id)?;
        Ok([bb[0], bb[2], bb[4]])
    }

    /// Bounds of the union of level-0 boxes, or `None` when no level-0 box
    /// was ever set.
    pub fn total_bounds(&self) -> Option<[f64; 6]> {
        let origin = self.origin_or_zero();
        let spacing = self.spacing[0];
        let mut union: Option<[f64; 6]> = None;
        for b in &self.boxes[0] {
            if b.is_invalid() {
                continue;
            }
            let bb = b.bounds(origin, spacing);
            union = Some(match union {
                None => bb,
                Some(mut u) => {
                    for d in 0..3 {
                        u[2 * d] = u[2 * d].min(bb[2 * d]);
                        u[2 * d + 1] = u[2 * d + 1].max(bb[2 * d + 1]);
                    }
                    u
                }
            });
        }
        union
    }

    // -------------------------------------------------------------------------
    // Refinement ratios
    // -------------------------------------------------------------------------

    /// Set the refinement ratio of `level` relative to its parent level.
    ///
    /// # Errors
    /// Rejects ratios below 1 and out-of-range levels.
    pub fn set_refinement_ratio(&mut self, level: usize, ratio: u32) -> Result<()> {
        self.check_level(level)?;
        if ratio < 1 {
            return Err(AmrError::InvalidRatio { level, ratio });
        }
        if self.ratios.len() != self.num_levels() {
            self.ratios = vec![1; self.num_levels()];
        }
        self.ratios[level] = ratio;
        self.has_refinement_ratio = true;
        Ok(())
    }

    /// Whether ratios have been set or derived.
    #[inline]
    pub fn has_refinement_ratio(&self) -> bool {
        self.has_refinement_ratio
    }

    /// The refinement ratio of `level` relative to its parent level.
    ///
    /// Level 0 has no parent and reports 1. When no ratio was ever set,
    /// this triggers [`AmrMetaData::generate_refinement_ratio`] first.
    pub fn refinement_ratio(&mut self, level: usize) -> Result<u32> {
        self.check_level(level)?;
        if !self.has_refinement_ratio {
            self.generate_refinement_ratio()?;
        }
        Ok(self.ratios[level])
    }

    /// Derive every level's ratio from the spacing of adjacent levels.
    ///
    /// # Errors
    /// `RatioDerivation` when a level's spacing is unset or the audited
    /// axes disagree on the integer factor. The registry is left unchanged
    /// on failure.
    pub fn generate_refinement_ratio(&mut self) -> Result<()> {
        let levels = self.num_levels();
        let mut ratios = vec![1u32; levels];
        for level in 1..levels {
            ratios[level] = derive_ratio(
                self.spacing[level - 1],
                self.spacing[level],
                self.description,
            )
            .map_err(|source| AmrError::RatioDerivation { level, source })?;
        }
        self.ratios = ratios;
        self.has_refinement_ratio = true;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Parent/child relationships
    // -------------------------------------------------------------------------

    /// Whether the parent/child table has been built at least once.
    #[inline]
    pub fn has_children_information(&self) -> bool {
        self.has_children_information
    }

    /// Build the bidirectional parent/child table from box overlap.
    ///
    /// For every level `l > 0`, each valid box is mapped into the parent
    /// level's index space (coarsened by the refinement ratio) and linked to
    /// every level `l - 1` box it overlaps. Calling this again rebuilds the
    /// table from scratch.
    ///
    /// # Errors
    /// Ratio derivation failures propagate when ratios were never set.
    pub fn generate_parent_child_information(&mut self) -> Result<()> {
        if !self.has_refinement_ratio {
            self.generate_refinement_ratio()?;
        }

        let levels = self.num_levels();
        let mut parents: Vec<Vec<Vec<u32>>> = self
            .boxes
            .iter()
            .map(|level| vec![Vec::new(); level.len()])
            .collect();
        let mut children = parents.clone();

        for level in 1..levels {
            let ratio = self.ratios[level];
            for (id, b) in self.boxes[level].iter().enumerate() {
                if b.is_invalid() {
                    continue;
                }
                let in_parent_space = b.coarsened(ratio);
                for (parent_id, pb) in self.boxes[level - 1].iter().enumerate() {
                    if in_parent_space.intersects(pb) {
                        parents[level][id].push(parent_id as u32);
                        children[level - 1][parent_id].push(id as u32);
                    }
                }
            }
        }

        self.parents = parents;
        self.children = children;
        self.has_children_information = true;
        Ok(())
    }

    /// Parent block ids (at `level - 1`) of block `(level, id)`.
    ///
    /// An empty view means "no relationship" - including before the table
    /// has been generated. Callers that need the table populated must call
    /// [`AmrMetaData::generate_parent_child_information`] first.
    pub fn parents(&self, level: usize, id: usize) -> &[u32] {
        self.parents
            .get(level)
            .and_then(|l| l.get(id))
            .map_or(NO_RELATIONS, Vec::as_slice)
    }

    /// Child block ids (at `level + 1`) of block `(level, id)`.
    ///
    /// Same contract as [`AmrMetaData::parents`].
    pub fn children(&self, level: usize, id: usize) -> &[u32] {
        self.children
            .get(level)
            .and_then(|l| l.get(id))
            .map_or(NO_RELATIONS, Vec::as_slice)
    }

    /// Dump one block's relationships to the log.
    pub fn print_parent_child_info(&self, level: usize, id: usize) {
        log::debug!(
            "block ({}, {}): parents {:?}, children {:?}",
            level,
            id,
            self.parents(level, id),
            self.children(level, id)
        );
    }

    // -------------------------------------------------------------------------
    // Flat indexing and source ids
    // -------------------------------------------------------------------------

    /// Flat index of block `(level, id)`.
    pub fn flat_index(&self, level: usize, id: usize) -> Result<usize> {
        self.check_block(level, id)?;
        // Range was just checked, so encoding cannot fail.
        Ok(self.indexer.level_offset(level).unwrap_or(0) + id)
    }

    /// Decode a flat index back to `(level, id)`, or `None` when beyond the
    /// declared block count.
    #[inline]
    pub fn level_and_id(&self, flat: usize) -> Option<(usize, usize)> {
        self.indexer.level_and_id(flat)
    }

    /// Associate a flat block index with an originating-source id.
    pub fn set_source_index(&mut self, flat: usize, source: i64) {
        self.source_ids.insert(flat, source);
    }

    /// The originating-source id of a flat block index, or `None` when
    /// never assigned.
    pub fn source_index(&self, flat: usize) -> Option<i64> {
        self.source_ids.get(&flat).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two levels, one block each, level 1 refining the whole of level 0.
    fn two_level_meta() -> AmrMetaData {
        let mut meta = AmrMetaData::new(&[1, 1]).unwrap();
        meta.set_origin([0.0; 3]);
        meta.set_spacing(0, [1.0; 3]).unwrap();
        meta.set_spacing(1, [0.5; 3]).unwrap();
        meta.set_box(0, 0, AmrBox::new([0; 3], [4, 4, 4])).unwrap();
        meta.set_box(1, 0, AmrBox::new([0; 3], [8, 8, 8])).unwrap();
        meta
    }

    #[test]
    fn test_empty_levels_rejected() {
        assert!(matches!(AmrMetaData::new(&[]), Err(AmrError::EmptyLevels)));
    }

    #[test]
    fn test_box_roundtrip() {
        let mut meta = AmrMetaData::new(&[2, 3]).unwrap();
        let b = AmrBox::new([1, 2, 3], [4, 5, 6]);
        meta.set_box(1, 2, b).unwrap();
        assert_eq!(meta.box_at(1, 2), Ok(b));
    }

    #[test]
    fn test_never_set_box_is_invalid() {
        let meta = AmrMetaData::new(&[1]).unwrap();
        assert!(meta.box_at(0, 0).unwrap().is_invalid());
    }

    #[test]
    fn test_out_of_range_reported() {
        let mut meta = AmrMetaData::new(&[1, 2]).unwrap();
        assert_eq!(
            meta.box_at(2, 0),
            Err(AmrError::LevelOutOfRange { level: 2, levels: 2 })
        );
        assert_eq!(
            meta.set_box(1, 2, AmrBox::invalid()),
            Err(AmrError::BlockOutOfRange {
                level: 1,
                id: 2,
                blocks: 2
            })
        );
        assert_eq!(
            meta.set_spacing(5, [1.0; 3]),
            Err(AmrError::LevelOutOfRange { level: 5, levels: 2 })
        );
    }

    #[test]
    fn test_origin_absent_until_set() {
        let mut meta = AmrMetaData::new(&[1]).unwrap();
        assert!(meta.origin().is_none());
        meta.set_origin([1.0, 2.0, 3.0]);
        assert_eq!(meta.origin(), Some(&[1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_bounds_and_block_origin() {
        let meta = two_level_meta();
        assert_eq!(meta.bounds(0, 0), Ok([0.0, 4.0, 0.0, 4.0, 0.0, 4.0]));
        assert_eq!(meta.bounds(1, 0), Ok([0.0, 4.0, 0.0, 4.0, 0.0, 4.0]));
        assert_eq!(meta.origin_of(0, 0), Ok([0.0; 3]));
    }

    #[test]
    fn test_bounds_of_unset_box_reported() {
        let meta = AmrMetaData::new(&[1]).unwrap();
        assert_eq!(meta.bounds(0, 0), Err(AmrError::InvalidBox { level: 0, id: 0 }));
    }

    #[test]
    fn test_total_bounds_unions_level_zero() {
        let mut meta = AmrMetaData::new(&[2]).unwrap();
        meta.set_spacing(0, [1.0; 3]).unwrap();
        meta.set_box(0, 0, AmrBox::new([0; 3], [2, 2, 2])).unwrap();
        meta.set_box(0, 1, AmrBox::new([2, 0, 0], [5, 2, 2])).unwrap();
        assert_eq!(meta.total_bounds(), Some([0.0, 5.0, 0.0, 2.0, 0.0, 2.0]));

        let empty = AmrMetaData::new(&[1]).unwrap();
        assert_eq!(empty.total_bounds(), None);
    }

    #[test]
    fn test_explicit_ratio_roundtrip() {
        let mut meta = AmrMetaData::new(&[1, 1]).unwrap();
        assert!(!meta.has_refinement_ratio());
        meta.set_refinement_ratio(1, 4).unwrap();
        assert!(meta.has_refinement_ratio());
        assert_eq!(meta.refinement_ratio(1), Ok(4));
        assert_eq!(
            meta.set_refinement_ratio(1, 0),
            Err(AmrError::InvalidRatio { level: 1, ratio: 0 })
        );
    }

    #[test]
    fn test_lazy_ratio_derivation() {
        let mut meta = two_level_meta();
        assert!(!meta.has_refinement_ratio());
        assert_eq!(meta.refinement_ratio(1), Ok(2));
        assert_eq!(meta.refinement_ratio(0), Ok(1));
        assert!(meta.has_refinement_ratio());
    }

    #[test]
    fn test_ratio_derivation_without_spacing_fails() {
        let mut meta = AmrMetaData::new(&[1, 1]).unwrap();
        let err = meta.refinement_ratio(1).unwrap_err();
        assert!(matches!(err, AmrError::RatioDerivation { level: 1, .. }));
        // Failure leaves the lazy flag unset.
        assert!(!meta.has_refinement_ratio());
    }

    #[test]
    fn test_parent_child_bidirectional() {
        let mut meta = two_level_meta();
        assert!(!meta.has_children_information());
        meta.generate_parent_child_information().unwrap();
        assert!(meta.has_children_information());

        assert_eq!(meta.parents(1, 0), &[0]);
        assert_eq!(meta.children(0, 0), &[0]);
        assert!(meta.parents(0, 0).is_empty());
        assert!(meta.children(1, 0).is_empty());
    }

    #[test]
    fn test_relationships_empty_before_generation() {
        let meta = two_level_meta();
        assert!(meta.parents(1, 0).is_empty());
        assert!(meta.children(0, 0).is_empty());
        // Out-of-range queries are also just "no relationship".
        assert!(meta.parents(7, 7).is_empty());
    }

    #[test]
    fn test_parent_child_regeneration_is_idempotent() {
        let mut meta = two_level_meta();
        meta.generate_parent_child_information().unwrap();
        meta.generate_parent_child_information().unwrap();
        assert_eq!(meta.parents(1, 0), &[0]);
        assert_eq!(meta.children(0, 0), &[0]);
    }

    #[test]
    fn test_partial_overlap_links_multiple_parents() {
        let mut meta = AmrMetaData::new(&[2, 1]).unwrap();
        meta.set_spacing(0, [1.0; 3]).unwrap();
        meta.set_spacing(1, [0.5; 3]).unwrap();
        meta.set_box(0, 0, AmrBox::new([0; 3], [2, 4, 4])).unwrap();
        meta.set_box(0, 1, AmrBox::new([2, 0, 0], [4, 4, 4])).unwrap();
        // The fine box straddles both coarse boxes.
        meta.set_box(1, 0, AmrBox::new([2, 2, 2], [6, 6, 6])).unwrap();
        meta.generate_parent_child_information().unwrap();

        assert_eq!(meta.parents(1, 0), &[0, 1]);
        assert_eq!(meta.children(0, 0), &[0]);
        assert_eq!(meta.children(0, 1), &[0]);
    }

    #[test]
    fn test_flat_index_prefix_sum() {
        let meta = AmrMetaData::new(&[1, 3, 2]).unwrap();
        assert_eq!(meta.flat_index(0, 0), Ok(0));
        assert_eq!(meta.flat_index(1, 2), Ok(3));
        assert_eq!(meta.flat_index(2, 1), Ok(5));
        assert_eq!(meta.level_and_id(3), Some((1, 2)));
        assert!(meta.flat_index(1, 3).is_err());
    }

    #[test]
    fn test_source_index_map() {
        let mut meta = AmrMetaData::new(&[1, 1]).unwrap();
        assert_eq!(meta.source_index(0), None);
        meta.set_source_index(0, 42);
        assert_eq!(meta.source_index(0), Some(42));
        meta.set_source_index(0, 7);
        assert_eq!(meta.source_index(0), Some(7));
    }
}
