//! Integration tests for hierarchy traversal.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use amr_rs::OverlappingAmr;

/// Hierarchy with uneven level sizes, including an empty interior level,
/// with data loaded for a scattered subset of blocks.
fn scattered(counts: &[usize], loaded: &[(usize, usize)]) -> OverlappingAmr<u64> {
    let mut amr = OverlappingAmr::new(counts).unwrap();
    for &(level, id) in loaded {
        amr.set_data_set(level, id, (level * 100 + id) as u64).unwrap();
    }
    amr
}

#[test]
fn dense_visits_exactly_the_declared_blocks_in_order() {
    let counts = [1usize, 0, 3, 2];
    let amr = scattered(&counts, &[(2, 1), (3, 0)]);

    let visited: Vec<(usize, usize)> = amr.iter().map(|b| (b.level, b.id)).collect();
    assert_eq!(visited.len(), counts.iter().sum::<usize>());

    // Level-ascending, id-ascending, regardless of loaded data.
    let expected: Vec<(usize, usize)> = counts
        .iter()
        .enumerate()
        .flat_map(|(level, &n)| (0..n).map(move |id| (level, id)))
        .collect();
    assert_eq!(visited, expected);
}

#[test]
fn sparse_visits_exactly_the_loaded_set_once() {
    let loaded = [(2usize, 1usize), (0, 0), (2, 0), (3, 1)];
    let amr = scattered(&[1, 0, 3, 2], &loaded);

    let visited: Vec<(usize, usize)> = amr.iter_loaded().map(|b| (b.level, b.id)).collect();

    // Each stored block appears exactly once, decoding to the pair it was
    // stored under, in insertion order.
    assert_eq!(visited, loaded.to_vec());
    let unique: HashSet<_> = visited.iter().collect();
    assert_eq!(unique.len(), visited.len());
}

#[test]
fn sparse_carries_the_stored_data() {
    let amr = scattered(&[2, 2], &[(1, 1), (0, 1)]);
    for block in amr.iter_loaded() {
        let value = *block.data.expect("sparse traversal always has data");
        assert_eq!(value, (block.level * 100 + block.id) as u64);
    }
}

#[test]
fn dense_and_sparse_agree_on_flat_indices() {
    let amr = scattered(&[2, 3], &[(1, 2), (0, 0)]);

    let dense: Vec<usize> = amr.iter().map(|b| b.flat_index).collect();
    assert_eq!(dense, vec![0, 1, 2, 3, 4]);

    let sparse: Vec<usize> = amr.iter_loaded().map(|b| b.flat_index).collect();
    assert_eq!(sparse, vec![4, 0]);
}

#[test]
fn traversal_of_empty_hierarchy() {
    let amr: OverlappingAmr<u64> = OverlappingAmr::new(&[0, 0]).unwrap();
    assert_eq!(amr.iter().count(), 0);
    assert_eq!(amr.iter_loaded().count(), 0);
}

#[test]
fn concurrent_readonly_traversal() {
    let counts = [4usize, 8, 16];
    let loaded: Vec<(usize, usize)> = (0..8).map(|i| (1usize, i)).collect();
    let amr = Arc::new(scattered(&counts, &loaded));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let amr = Arc::clone(&amr);
            thread::spawn(move || {
                let dense = amr.iter().count();
                let sparse = amr.iter_loaded().count();
                (dense, sparse)
            })
        })
        .collect();

    for handle in handles {
        let (dense, sparse) = handle.join().unwrap();
        assert_eq!(dense, counts.iter().sum::<usize>());
        assert_eq!(sparse, loaded.len());
    }
}

#[cfg(feature = "rayon")]
#[test]
fn par_loaded_blocks_matches_sequential() {
    use rayon::prelude::*;

    let loaded = [(0usize, 1usize), (1, 0), (1, 3)];
    let amr = scattered(&[2, 4], &loaded);

    let sequential: HashSet<(usize, usize, u64)> = amr
        .iter_loaded()
        .map(|b| (b.level, b.id, *b.data.unwrap()))
        .collect();
    let parallel: HashSet<(usize, usize, u64)> = amr
        .par_loaded_blocks()
        .map(|(level, id, v)| (level, id, *v))
        .collect();

    assert_eq!(sequential, parallel);
}
