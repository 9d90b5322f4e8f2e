//! Tree-walking decoder.
//!
//! Variable-length codes cannot be entered at an arbitrary bit, so the
//! payload is cut at the checkpoints the encoder recorded. Each segment
//! starts on a known symbol boundary and decodes a known number of bytes
//! into its own slice of the output. A stream without checkpoints is a
//! single segment and decodes on one worker.

use std::ops::Range;

use rayon::prelude::*;

use crate::bits::BitReader;
use crate::container::StreamContainer;
use crate::error::{CorruptKind, Error, Result};
use crate::parallel::{split_disjoint_mut, WorkerPool};
use crate::tree::{CodeTree, NodeKind};

/// One independently decodable piece of the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Segment {
    bits: Range<u64>,
    output: Range<usize>,
}

fn segments(container: &StreamContainer<'_>) -> Vec<Segment> {
    let end = (container.total_bits, container.header.original_length as usize);
    let bounds: Vec<(u64, usize)> = std::iter::once((0, 0))
        .chain(
            container
                .header
                .checkpoints
                .iter()
                .map(|cp| (cp.bit_offset, cp.output_offset as usize)),
        )
        .chain(std::iter::once(end))
        .collect();

    bounds
        .windows(2)
        .map(|w| Segment {
            bits: w[0].0..w[1].0,
            output: w[0].1..w[1].1,
        })
        .collect()
}

/// Decode `container` into `output`, which must be exactly
/// `header.original_length` bytes long.
///
/// # Errors
/// Returns `Error::BufferTooSmall` if `output` has the wrong length, and
/// `Error::CorruptStream` if the payload does not decode cleanly: a code
/// runs past the end of its segment, a segment ends off its checkpoint,
/// the synthetic sibling of a one-symbol stream is reached, or the padding
/// bits are not zero.
pub fn decode(container: &StreamContainer<'_>, output: &mut [u8], pool: &WorkerPool) -> Result<()> {
    let expected = container.header.original_length;
    if output.len() as u64 != expected {
        return Err(Error::BufferTooSmall {
            required: expected,
            available: output.len() as u64,
        });
    }
    check_padding(container.payload, container.total_bits)?;

    let segments = segments(container);
    let output_ranges: Vec<Range<usize>> = segments.iter().map(|s| s.output.clone()).collect();
    let slices = split_disjoint_mut(output, &output_ranges);
    log::debug!("decoding {} bytes in {} segments", expected, segments.len());

    let tree = &container.tree;
    let payload = container.payload;
    pool.install(|| {
        segments
            .into_par_iter()
            .zip(slices.into_par_iter())
            .try_for_each(|(seg, out)| decode_segment(tree, payload, seg.bits, out))
    })
}

fn check_padding(payload: &[u8], total_bits: u64) -> Result<()> {
    let used = (total_bits % 8) as u32;
    if used == 0 {
        return Ok(());
    }
    match payload.last() {
        Some(&last) if last & (0xFFu8 >> used) != 0 => Err(CorruptKind::NonZeroPadding.into()),
        _ => Ok(()),
    }
}

/// Walk `tree` once per output byte, reading only bits inside `bits`.
fn decode_segment(tree: &CodeTree, payload: &[u8], bits: Range<u64>, out: &mut [u8]) -> Result<()> {
    let Some(root) = tree.root() else {
        return if out.is_empty() && bits.is_empty() {
            Ok(())
        } else {
            Err(CorruptKind::InvalidCode.into())
        };
    };

    let mut reader = BitReader::with_range(payload, bits.start, bits.end);
    for slot in out.iter_mut() {
        let mut index = root;
        loop {
            let node = tree.node(index);
            match node.kind {
                NodeKind::Leaf { byte } => {
                    // Only the synthetic sibling of a one-symbol tree has weight 0.
                    if node.weight == 0 {
                        return Err(CorruptKind::InvalidCode.into());
                    }
                    *slot = byte;
                    break;
                }
                NodeKind::Internal { left, right } => {
                    let bit = reader.read_bit().ok_or(CorruptKind::OutOfBits)?;
                    index = if bit { right } else { left };
                }
            }
        }
    }

    if reader.remaining() != 0 {
        return Err(CorruptKind::SegmentMisaligned.into());
    }
    Ok(())
}
