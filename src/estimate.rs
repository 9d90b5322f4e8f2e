//! Exact encoded-size computation.
//!
//! Sums code lengths over the input before anything is written, so the
//! output can be allocated once at its final size. The per-range sums are
//! kept: their exclusive prefix sum is the global bit offset at which each
//! encoder worker starts.

use std::ops::Range;

use rayon::prelude::*;

use crate::parallel::WorkerPool;
use crate::table::CodeTable;

/// Encoded bit counts of each worker range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitLayout {
    ranges: Vec<Range<usize>>,
    bits: Vec<u64>,
    total_bits: u64,
}

impl BitLayout {
    /// Measure every range of `pool`'s partition of `input` in parallel.
    pub fn measure(input: &[u8], table: &CodeTable, pool: &WorkerPool) -> Self {
        let ranges = pool.ranges(input.len());
        let bits: Vec<u64> = pool.install(|| {
            ranges
                .par_iter()
                .map(|r| range_bits(&input[r.clone()], table))
                .collect()
        });
        let total_bits = bits.iter().sum();
        Self {
            ranges,
            bits,
            total_bits,
        }
    }

    /// Input ranges, one per worker.
    pub fn ranges(&self) -> &[Range<usize>] {
        &self.ranges
    }

    /// Encoded bits per range.
    pub fn range_bits(&self) -> &[u64] {
        &self.bits
    }

    /// Global bit offset at which each range's codes begin.
    pub fn start_offsets(&self) -> Vec<u64> {
        self.bits
            .iter()
            .scan(0u64, |acc, &b| {
                let start = *acc;
                *acc += b;
                Some(start)
            })
            .collect()
    }

    /// Total encoded bits.
    pub fn total_bits(&self) -> u64 {
        self.total_bits
    }

    /// Payload bytes: `ceil(total_bits / 8)`.
    pub fn total_bytes(&self) -> u64 {
        self.total_bits.div_ceil(8)
    }
}

fn range_bits(input: &[u8], table: &CodeTable) -> u64 {
    input.iter().map(|&b| table.len_of(b) as u64).sum()
}

/// Total encoded bits of `input` under `table`.
pub fn estimate(input: &[u8], table: &CodeTable, pool: &WorkerPool) -> u64 {
    BitLayout::measure(input, table, pool).total_bits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::histogram::Histogram;
    use crate::tree::CodeTree;

    fn table_for(input: &[u8]) -> CodeTable {
        CodeTable::derive(&CodeTree::build(&Histogram::of(input))).unwrap()
    }

    #[test]
    fn test_worked_example() {
        let input = b"aaaabbbccd";
        let pool = WorkerPool::new(&CodecConfig::new().with_workers(2)).unwrap();
        let layout = BitLayout::measure(input, &table_for(input), &pool);
        assert_eq!(layout.total_bits(), 19);
        assert_eq!(layout.total_bytes(), 3);
    }

    #[test]
    fn test_offsets_are_prefix_sums() {
        let input: Vec<u8> = (0..4000u32).map(|i| (i * 7 % 13) as u8).collect();
        let table = table_for(&input);
        let pool = WorkerPool::new(
            &CodecConfig::new().with_workers(4).with_block_align(8),
        )
        .unwrap();
        let layout = BitLayout::measure(&input, &table, &pool);
        assert_eq!(layout.ranges().len(), 4);

        let offsets = layout.start_offsets();
        assert_eq!(offsets[0], 0);
        for (i, r) in layout.ranges().iter().enumerate() {
            let before: u64 = input[..r.start].iter().map(|&b| table.len_of(b) as u64).sum();
            assert_eq!(offsets[i], before);
        }
        assert_eq!(estimate(&input, &table, &pool), layout.total_bits());
    }

    #[test]
    fn test_empty_input() {
        let pool = WorkerPool::new(&CodecConfig::new().with_workers(3)).unwrap();
        let layout = BitLayout::measure(&[], &CodeTable::derive(&CodeTree::default()).unwrap(), &pool);
        assert_eq!(layout.total_bits(), 0);
        assert!(layout.ranges().is_empty());
        assert!(layout.start_offsets().is_empty());
    }
}
