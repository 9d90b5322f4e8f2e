//! Byte histogram.
//!
//! Counts occurrences of every byte value. The input is split into one
//! contiguous range per worker, each worker fills a private 256-bucket array,
//! and the arrays are summed once all workers have joined.

use rayon::prelude::*;

use crate::parallel::WorkerPool;

/// Per-byte occurrence counts.
#[derive(Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; 256],
}

impl Histogram {
    /// An all-zero histogram.
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Build a histogram from explicit `(byte, count)` pairs.
    /// Later pairs for the same byte overwrite earlier ones.
    pub fn from_pairs<I: IntoIterator<Item = (u8, u64)>>(pairs: I) -> Self {
        let mut h = Self::new();
        for (byte, count) in pairs {
            h.counts[byte as usize] = count;
        }
        h
    }

    /// Count `input` on the calling thread.
    pub fn of(input: &[u8]) -> Self {
        let mut h = Self::new();
        h.accumulate(input);
        h
    }

    /// Count `input` in parallel on `pool`.
    pub fn compute(input: &[u8], pool: &WorkerPool) -> Self {
        let ranges = pool.ranges(input.len());
        log::trace!("histogram over {} bytes in {} ranges", input.len(), ranges.len());

        let partials: Vec<Histogram> = pool.install(|| {
            ranges
                .into_par_iter()
                .map(|r| Histogram::of(&input[r]))
                .collect()
        });

        let mut total = Self::new();
        for partial in &partials {
            total.merge(partial);
        }
        total
    }

    fn accumulate(&mut self, input: &[u8]) {
        for &b in input {
            self.counts[b as usize] += 1;
        }
    }

    fn merge(&mut self, other: &Histogram) {
        for (dst, src) in self.counts.iter_mut().zip(other.counts.iter()) {
            *dst += src;
        }
    }

    /// Count for one byte value.
    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// All 256 counts, indexed by byte value.
    pub fn counts(&self) -> &[u64; 256] {
        &self.counts
    }

    /// Nonzero `(byte, count)` pairs in ascending byte order.
    pub fn nonzero(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(b, &c)| (b as u8, c))
    }

    /// Number of distinct byte values observed.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Sum of all counts, which equals the length of the counted input.
    /// Saturates rather than wrapping on hostile tables.
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Whether no byte has been observed.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Histogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.nonzero()).finish()
    }
}
