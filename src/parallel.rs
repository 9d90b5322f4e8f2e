//! Range partitioning and the per-call worker pool.
//!
//! Every parallel phase splits the input into contiguous ranges, one per
//! worker, runs them on a pool that lives only for the current call, and
//! joins before the next phase starts.

use std::ops::Range;

use crate::config::CodecConfig;
use crate::error::Result;

/// A fixed-size pool of worker threads, built for one compress or
/// decompress call and dropped when it returns.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
    block_align: usize,
}

impl WorkerPool {
    /// Build a pool with `config.workers()` threads.
    ///
    /// # Errors
    /// Returns `Error::AllocationFailure` if the threads cannot be spawned.
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let workers = config.workers();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("parhuff-worker-{}", i))
            .build()?;
        Ok(Self {
            pool,
            workers,
            block_align: config.block_align(),
        })
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Split `len` bytes into at most one range per worker.
    pub fn ranges(&self, len: usize) -> Vec<Range<usize>> {
        partition(len, self.workers, self.block_align)
    }

    /// Run `op` inside the pool; parallel iterators in `op` use its threads.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .field("block_align", &self.block_align)
            .finish()
    }
}

/// Split `0..len` into up to `parts` contiguous, non-empty ranges.
///
/// Interior boundaries are aligned down to a multiple of `align`; the first
/// range starts at 0 and the last ends at `len`. Ranges that collapse to
/// nothing after alignment are dropped, so small inputs may yield fewer
/// ranges than `parts`. Empty input yields no ranges.
pub fn partition(len: usize, parts: usize, align: usize) -> Vec<Range<usize>> {
    let parts = parts.max(1);
    let align = align.max(1);
    if len == 0 {
        return Vec::new();
    }

    let mut ranges = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 1..=parts {
        let end = if i == parts {
            len
        } else {
            let raw = (len as u128 * i as u128 / parts as u128) as usize;
            raw - raw % align
        };
        if end > start {
            ranges.push(start..end);
            start = end;
        }
    }
    ranges
}

/// Carve `buf` into one mutable slice per range.
///
/// `ranges` must be ascending and non-overlapping; gaps between them are
/// simply not handed out. Each worker gets exclusive access to its slice, so
/// no locking is needed while they write.
pub fn split_disjoint_mut<'a>(buf: &'a mut [u8], ranges: &[Range<usize>]) -> Vec<&'a mut [u8]> {
    let mut slices = Vec::with_capacity(ranges.len());
    let mut rest = buf;
    let mut consumed = 0;
    for r in ranges {
        debug_assert!(r.start >= consumed && r.end >= r.start);
        let (_, tail) = std::mem::take(&mut rest).split_at_mut(r.start - consumed);
        let (mine, tail) = tail.split_at_mut(r.end - r.start);
        slices.push(mine);
        rest = tail;
        consumed = r.end;
    }
    slices
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partition_empty() {
        assert!(partition(0, 4, 64).is_empty());
    }

    #[test]
    fn test_partition_small_input_collapses() {
        // Every interior boundary aligns down to 0.
        assert_eq!(partition(10, 4, 64), vec![0..10]);
    }

    #[test]
    fn test_partition_aligned_boundaries() {
        let ranges = partition(1000, 4, 64);
        assert_eq!(ranges, vec![0..192, 192..448, 448..704, 704..1000]);
    }

    #[test]
    fn test_split_disjoint_with_gaps() {
        let mut buf: Vec<u8> = (0..10).collect();
        let slices = split_disjoint_mut(&mut buf, &[0..2, 3..3, 5..9]);
        assert_eq!(slices.len(), 3);
        assert_eq!(&*slices[0], &[0, 1]);
        assert!(slices[1].is_empty());
        assert_eq!(&*slices[2], &[5, 6, 7, 8]);
    }

    #[test]
    fn test_pool_runs_with_requested_workers() {
        let pool = WorkerPool::new(&CodecConfig::new().with_workers(3)).unwrap();
        assert_eq!(pool.workers(), 3);
        assert_eq!(pool.install(rayon::current_num_threads), 3);
    }

    proptest! {
        #[test]
        fn prop_partition_covers_input(
            len in 0usize..10_000,
            parts in 1usize..17,
            align in 1usize..129,
        ) {
            let ranges = partition(len, parts, align);
            prop_assert!(ranges.len() <= parts);

            let mut expected_start = 0;
            for (i, r) in ranges.iter().enumerate() {
                prop_assert_eq!(r.start, expected_start);
                prop_assert!(r.end > r.start);
                if i + 1 < ranges.len() {
                    prop_assert_eq!(r.end % align, 0);
                }
                expected_start = r.end;
            }
            prop_assert_eq!(expected_start, len);
        }
    }
}
