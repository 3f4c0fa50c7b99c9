//! Traversal over the level/block index space.
//!
//! Two strategies share one iterator type: the dense cursor walks every
//! declared block whether or not its data was loaded, and the sparse cursor
//! walks only loaded blocks in insertion order. The strategy is chosen once
//! per traversal, when [`HierarchyIterator::go_to_first_item`] runs, from
//! the skip-empty-nodes flag.

use crate::dataset::OverlappingAmr;

/// One visited block.
#[derive(Debug)]
pub struct BlockRef<'a, G> {
    /// Refinement level of the block.
    pub level: usize,
    /// Block id within its level.
    pub id: usize,
    /// Flat index within the declared hierarchy.
    pub flat_index: usize,
    /// The loaded patch, when one exists. Sparse traversal always carries
    /// data; dense traversal visits declared-but-unloaded blocks too.
    pub data: Option<&'a G>,
}

/// Strategy-specific cursor state. Selected at `go_to_first_item` and never
/// re-evaluated mid-traversal.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Flat counter over every declared block; `level` tracks the owning
    /// level incrementally.
    Dense { flat: usize, level: usize },
    /// Position in the store's insertion-ordered loaded list.
    Sparse { pos: usize },
}

/// Stateful traversal over a hierarchy.
///
/// The iterator holds only a borrow of the hierarchy and its own cursor, so
/// any number may traverse a finalized hierarchy concurrently.
///
/// # States
///
/// Uninitialized (before [`HierarchyIterator::go_to_first_item`]) →
/// positioned → done. The `current_*` accessors require a positioned
/// iterator; calling them when done (or never started) is a caller bug and
/// panics.
///
/// The [`Iterator`] implementation drives the same state machine: the first
/// `next()` call performs the initial transition.
#[derive(Debug)]
pub struct HierarchyIterator<'a, G> {
    amr: &'a OverlappingAmr<G>,
    skip_empty_nodes: bool,
    cursor: Option<Cursor>,
}

impl<'a, G> HierarchyIterator<'a, G> {
    pub(crate) fn new(amr: &'a OverlappingAmr<G>, skip_empty_nodes: bool) -> Self {
        Self {
            amr,
            skip_empty_nodes,
            cursor: None,
        }
    }

    /// Whether traversal will visit only loaded blocks.
    #[inline]
    pub fn skip_empty_nodes(&self) -> bool {
        self.skip_empty_nodes
    }

    /// Choose between sparse (`true`) and dense (`false`) traversal.
    ///
    /// Takes effect at the next [`HierarchyIterator::go_to_first_item`];
    /// an in-flight traversal keeps its strategy.
    pub fn set_skip_empty_nodes(&mut self, skip: bool) {
        self.skip_empty_nodes = skip;
    }

    /// Move the dense level marker past every level whose cumulative offset
    /// `flat` has crossed. Skips multiple levels at once when intermediate
    /// levels declare zero blocks.
    fn settle_level(&self, flat: usize, level: &mut usize) {
        let ix = self.amr.metadata().indexer();
        while *level < ix.num_levels() && flat >= ix.offsets()[*level + 1] {
            *level += 1;
        }
    }

    /// Start (or restart) traversal, selecting the strategy from the
    /// skip-empty-nodes flag.
    pub fn go_to_first_item(&mut self) {
        if self.skip_empty_nodes {
            self.cursor = Some(Cursor::Sparse { pos: 0 });
        } else {
            let mut level = 0;
            self.settle_level(0, &mut level);
            self.cursor = Some(Cursor::Dense { flat: 0, level });
        }
    }

    /// Advance to the next block.
    pub fn go_to_next_item(&mut self) {
        match self.cursor.take() {
            None => {
                debug_assert!(false, "go_to_next_item before go_to_first_item");
                self.go_to_first_item();
            }
            Some(Cursor::Dense { flat, mut level }) => {
                let flat = flat + 1;
                self.settle_level(flat, &mut level);
                self.cursor = Some(Cursor::Dense { flat, level });
            }
            Some(Cursor::Sparse { pos }) => {
                self.cursor = Some(Cursor::Sparse { pos: pos + 1 });
            }
        }
    }

    /// True when traversal is exhausted (or never started).
    pub fn is_done(&self) -> bool {
        match self.cursor {
            None => true,
            Some(Cursor::Dense { flat, .. }) => flat >= self.amr.total_blocks(),
            Some(Cursor::Sparse { pos }) => pos >= self.amr.store().loaded().len(),
        }
    }

    fn current_flat(&self) -> Option<usize> {
        match self.cursor? {
            Cursor::Dense { flat, .. } => (flat < self.amr.total_blocks()).then_some(flat),
            Cursor::Sparse { pos } => self.amr.store().loaded().get(pos).map(|b| b.flat_index),
        }
    }

    fn current_pair(&self) -> Option<(usize, usize)> {
        let flat = self.current_flat()?;
        match self.cursor? {
            // The dense cursor already tracks its level; subtract the level
            // offset instead of searching the prefix table again.
            Cursor::Dense { level, .. } => {
                let offset = self.amr.metadata().indexer().level_offset(level)?;
                Some((level, flat - offset))
            }
            Cursor::Sparse { .. } => self.amr.metadata().level_and_id(flat),
        }
    }

    /// Flat index of the current block.
    ///
    /// # Panics
    /// When the iterator is done or was never started.
    pub fn current_flat_index(&self) -> usize {
        debug_assert!(!self.is_done(), "current_flat_index on a finished traversal");
        self.current_flat().expect("traversal is done")
    }

    /// Refinement level of the current block.
    ///
    /// # Panics
    /// When the iterator is done or was never started.
    pub fn current_level(&self) -> usize {
        self.current_pair().expect("traversal is done").0
    }

    /// Block id (within its level) of the current block.
    ///
    /// # Panics
    /// When the iterator is done or was never started.
    pub fn current_index(&self) -> usize {
        self.current_pair().expect("traversal is done").1
    }

    /// Grid data of the current block, when loaded.
    pub fn current_data_set(&self) -> Option<&'a G> {
        self.amr.store().get(self.current_flat()?)
    }

    /// Real-space bounds of the current block, composed on each call from
    /// the registry (never cached across advances).
    ///
    /// `None` when the block's box was never set.
    pub fn current_bounds(&self) -> Option<[f64; 6]> {
        let (level, id) = self.current_pair()?;
        self.amr.metadata().bounds(level, id).ok()
    }
}

impl<'a, G> Iterator for HierarchyIterator<'a, G> {
    type Item = BlockRef<'a, G>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_none() {
            self.go_to_first_item();
        } else {
            self.go_to_next_item();
        }
        let flat_index = self.current_flat()?;
        let (level, id) = self.current_pair()?;
        Some(BlockRef {
            level,
            id,
            flat_index,
            data: self.amr.store().get(flat_index),
        })
    }
}

impl<G> OverlappingAmr<G> {
    /// Dense traversal: every declared block in level-ascending,
    /// id-ascending order, loaded or not.
    pub fn iter(&self) -> HierarchyIterator<'_, G> {
        HierarchyIterator::new(self, false)
    }

    /// Sparse traversal: only loaded blocks, in insertion order.
    pub fn iter_loaded(&self) -> HierarchyIterator<'_, G> {
        HierarchyIterator::new(self, true)
    }
}
