//! Work distribution arithmetic.

use std::num::NonZeroUsize;

/// How the directories of one run are split between worker processes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub directories: usize,
    pub files_per_dir: usize,
    pub processes: usize,
    pub chunk_size: usize,
    pub chunks: usize,
}

impl Plan {
    pub fn new(directories: usize, total_files: usize, processes: NonZeroUsize) -> Self {
        let chunk_size = chunk_size(directories, processes);
        Self {
            directories,
            files_per_dir: files_per_dir(total_files, directories),
            processes: processes.get(),
            chunk_size,
            chunks: directories.div_ceil(chunk_size),
        }
    }

    /// Number of files the plan actually creates, which may differ from the
    /// requested total.
    pub fn expected_files(&self) -> usize {
        self.files_per_dir.saturating_mul(self.directories)
    }
}

/// `max(1, total_files / directories)`; every directory gets at least one
/// file even when that overshoots the target.
pub fn files_per_dir(total_files: usize, directories: usize) -> usize {
    (total_files / directories.max(1)).max(1)
}

/// `max(1, directories / processes)`.
pub fn chunk_size(directories: usize, processes: NonZeroUsize) -> usize {
    (directories / processes.get()).max(1)
}

/// Splits `items` into consecutive chunks of `size` (the last may be
/// shorter). Every item lands in exactly one chunk.
pub fn partition<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn nz(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_files_per_dir() {
        assert_eq!(files_per_dir(100, 7), 14);
        assert_eq!(files_per_dir(5, 1000), 1);
        assert_eq!(files_per_dir(30, 3), 10);
        assert_eq!(files_per_dir(0, 4), 1);
    }

    #[test]
    fn test_chunk_size() {
        assert_eq!(chunk_size(10, nz(4)), 2);
        assert_eq!(chunk_size(3, nz(8)), 1);
        assert_eq!(chunk_size(0, nz(8)), 1);
        assert_eq!(chunk_size(16, nz(4)), 4);
    }

    #[test]
    fn test_uneven_split_makes_extra_chunks() {
        let dirs: Vec<u32> = (0..10).collect();
        let chunks = partition(&dirs, chunk_size(dirs.len(), nz(4)));
        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| c.len() == 2));

        let plan = Plan::new(10, 100, nz(4));
        assert_eq!(plan.chunks, 5);
        assert_eq!(plan.files_per_dir, 10);
        assert_eq!(plan.expected_files(), 100);
    }

    #[test]
    fn test_last_chunk_shorter() {
        let dirs: Vec<u32> = (0..7).collect();
        let chunks = partition(&dirs, 3);
        assert_eq!(chunks, vec![vec![0, 1, 2], vec![3, 4, 5], vec![6]]);
    }

    #[test]
    fn test_plan_overshoots_for_many_dirs() {
        let plan = Plan::new(1000, 5, nz(8));
        assert_eq!(plan.files_per_dir, 1);
        assert_eq!(plan.expected_files(), 1000);
        assert_eq!(plan.chunk_size, 125);
        assert_eq!(plan.chunks, 8);
    }

    proptest! {
        #[test]
        fn partition_is_a_disjoint_cover(k in 0usize..500, p in 1usize..64) {
            let items: Vec<usize> = (0..k).collect();
            let size = chunk_size(k, nz(p));
            let chunks = partition(&items, size);

            let flat: Vec<usize> = chunks.iter().flatten().copied().collect();
            prop_assert_eq!(flat, items);
            prop_assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
            prop_assert_eq!(chunks.len(), Plan::new(k, 1, nz(p)).chunks);
        }
    }
}
