//! Parallel bit packer.
//!
//! Each worker encodes one input range starting at the exact global bit
//! offset given by the [`BitLayout`] prefix sum. Bytes that lie wholly inside
//! a worker's bit span are written directly into that worker's disjoint slice
//! of the payload. The at most two bytes per span that a neighbour may share
//! are returned as [`BoundaryByte`]s and OR-ed in by a single thread once all
//! workers have joined. The result is bit-for-bit what a sequential encoder
//! would produce, with no padding between ranges.

use std::ops::Range;

use rayon::prelude::*;

use crate::bits::{BoundaryByte, SpanWriter};
use crate::container::Checkpoint;
use crate::error::{Error, Result};
use crate::estimate::BitLayout;
use crate::parallel::{split_disjoint_mut, WorkerPool};
use crate::table::CodeTable;

/// What one worker hands back for the merge step.
#[derive(Debug)]
struct SpanResult {
    head: Option<BoundaryByte>,
    tail: Option<BoundaryByte>,
    checkpoints: Vec<Checkpoint>,
}

/// Pack `input` into `payload` using `table`.
///
/// `layout` must have been measured over the same input and table;
/// every input byte must have a code. `payload` must hold at least
/// `layout.total_bytes()` bytes; bytes past that are left untouched.
///
/// When `checkpoint_interval` is nonzero, a [`Checkpoint`] is returned for
/// every positive multiple of it strictly inside the input.
///
/// # Errors
/// Returns `Error::BufferTooSmall` if `payload` is too short; nothing is
/// written in that case.
pub fn encode(
    input: &[u8],
    table: &CodeTable,
    layout: &BitLayout,
    checkpoint_interval: usize,
    payload: &mut [u8],
    pool: &WorkerPool,
) -> Result<Vec<Checkpoint>> {
    let needed = layout.total_bytes();
    if (payload.len() as u64) < needed {
        return Err(Error::BufferTooSmall {
            required: needed,
            available: payload.len() as u64,
        });
    }
    let payload = &mut payload[..needed as usize];

    let starts = layout.start_offsets();
    let spans: Vec<(Range<usize>, u64)> = layout
        .ranges()
        .iter()
        .cloned()
        .zip(starts.iter().copied())
        .collect();
    let interiors: Vec<Range<usize>> = spans
        .iter()
        .zip(layout.range_bits())
        .map(|((_, start), &bits)| SpanWriter::interior_bytes(*start, start + bits))
        .collect();

    let results: Vec<SpanResult> = {
        let slices = split_disjoint_mut(payload, &interiors);
        pool.install(|| {
            spans
                .into_par_iter()
                .zip(slices.into_par_iter())
                .map(|((range, start), slice)| {
                    log::trace!("encode range {:?} from bit {}", range, start);
                    encode_span(input, range, start, table, checkpoint_interval, slice)
                })
                .collect()
        })
    };

    merge_boundaries(payload, &results);

    Ok(results.into_iter().flat_map(|r| r.checkpoints).collect())
}

fn encode_span(
    input: &[u8],
    range: Range<usize>,
    start_bit: u64,
    table: &CodeTable,
    interval: usize,
    interior: &mut [u8],
) -> SpanResult {
    let mut writer = SpanWriter::new(interior, start_bit);
    let mut checkpoints = Vec::new();

    let mut pos = range.start;
    if interval > 0 && pos > 0 && pos % interval == 0 {
        checkpoints.push(Checkpoint {
            bit_offset: start_bit,
            output_offset: pos as u64,
        });
    }

    while pos < range.end {
        let stop = if interval > 0 {
            ((pos / interval + 1) * interval).min(range.end)
        } else {
            range.end
        };
        for &b in &input[pos..stop] {
            let code = table.code(b);
            debug_assert!(code.len > 0, "byte {} has no code", b);
            writer.write_bits(code.bits, code.len);
        }
        pos = stop;
        if pos < range.end {
            checkpoints.push(Checkpoint {
                bit_offset: writer.bit_position(),
                output_offset: pos as u64,
            });
        }
    }

    let (head, tail) = writer.finish();
    SpanResult {
        head,
        tail,
        checkpoints,
    }
}

/// Sequentially combine every worker's partial bytes.
fn merge_boundaries(payload: &mut [u8], results: &[SpanResult]) {
    let boundaries = || results.iter().flat_map(|r| r.head.iter().chain(r.tail.iter()));
    for b in boundaries() {
        payload[b.index] = 0;
    }
    for b in boundaries() {
        payload[b.index] |= b.bits;
    }
}
