//! Self-describing stream container.
//!
//! ```text
//! offset size  field
//! 0      3     magic b"HUF"
//! 3      1     version
//! 4      8     original length (u64 LE)
//! 12     2     distinct byte count K (u16 LE)
//! 14     9*K   K x (byte u8, frequency u64 LE), ascending byte value
//! ..     4     checkpoint count C (u32 LE)
//! ..     16*C  C x (bit offset u64 LE, output offset u64 LE), ascending
//! ..     *     payload, ceil(total_bits / 8) bytes, MSB-first
//! ```
//!
//! The header carries raw frequencies rather than code lengths. Rebuilding
//! the tree from them with the same deterministic construction yields the
//! encoder's exact codes, so the payload bit count is not stored either.

use std::io::{Read, Write};

use crate::error::{CorruptKind, Error, Result};
use crate::histogram::Histogram;
use crate::tree::CodeTree;

/// Stream magic.
pub const MAGIC: [u8; 3] = *b"HUF";

/// Current container version.
pub const VERSION: u8 = 1;

const FIXED_LEN: usize = 3 + 1 + 8 + 2 + 4;
const PAIR_LEN: usize = 1 + 8;
const CHECKPOINT_LEN: usize = 8 + 8;

/// A known symbol boundary inside the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    /// Bit offset into the payload where a code starts.
    pub bit_offset: u64,
    /// Index of the output byte that code decodes to.
    pub output_offset: u64,
}

/// Number of checkpoints recorded for `len` input bytes: one at every
/// positive multiple of `interval` strictly inside the input.
pub fn checkpoint_count(len: usize, interval: usize) -> usize {
    if interval == 0 || len == 0 {
        0
    } else {
        (len - 1) / interval
    }
}

/// Everything that precedes the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    /// Length of the uncompressed input.
    pub original_length: u64,
    /// Frequency of every byte value in the input.
    pub histogram: Histogram,
    /// Decode checkpoints, ascending.
    pub checkpoints: Vec<Checkpoint>,
}

impl Header {
    /// Serialized size of a header with `distinct` frequency entries and
    /// `checkpoints` checkpoints.
    pub fn encoded_len_for(distinct: usize, checkpoints: usize) -> usize {
        FIXED_LEN + PAIR_LEN * distinct + CHECKPOINT_LEN * checkpoints
    }

    /// Serialized size of this header.
    pub fn encoded_len(&self) -> usize {
        Self::encoded_len_for(self.histogram.distinct(), self.checkpoints.len())
    }

    /// Serialize into the front of `out`, returning the bytes written.
    ///
    /// # Errors
    /// Returns `Error::BufferTooSmall` if `out` is shorter than [`Header::encoded_len`].
    pub fn write_to(&self, out: &mut [u8]) -> Result<usize> {
        let len = self.encoded_len();
        if out.len() < len {
            return Err(Error::BufferTooSmall {
                required: len as u64,
                available: out.len() as u64,
            });
        }

        let mut w: &mut [u8] = &mut out[..len];
        w.write_all(&MAGIC)?;
        w.write_all(&[VERSION])?;
        w.write_all(&self.original_length.to_le_bytes())?;
        w.write_all(&(self.histogram.distinct() as u16).to_le_bytes())?;
        for (byte, freq) in self.histogram.nonzero() {
            w.write_all(&[byte])?;
            w.write_all(&freq.to_le_bytes())?;
        }
        w.write_all(&(self.checkpoints.len() as u32).to_le_bytes())?;
        for cp in &self.checkpoints {
            w.write_all(&cp.bit_offset.to_le_bytes())?;
            w.write_all(&cp.output_offset.to_le_bytes())?;
        }
        debug_assert!(w.is_empty());
        Ok(len)
    }

    /// Parse a header from the front of `bytes`, returning it and its length.
    ///
    /// Checks the magic, version, and frequency table. Checkpoints are only
    /// checked for ordering here; [`StreamContainer::parse`] checks them
    /// against the payload.
    pub fn parse(bytes: &[u8]) -> Result<(Self, usize)> {
        let mut r = bytes;

        let mut magic = [0u8; 3];
        read_exact(&mut r, &mut magic)?;
        if magic != MAGIC {
            return Err(CorruptKind::BadMagic.into());
        }
        let version = read_u8(&mut r)?;
        if version != VERSION {
            return Err(CorruptKind::UnsupportedVersion(version).into());
        }

        let original_length = read_u64(&mut r)?;
        let distinct = read_u16(&mut r)? as usize;
        if distinct > 256 {
            return Err(CorruptKind::MalformedFrequencies.into());
        }

        let mut pairs = Vec::with_capacity(distinct);
        let mut sum = 0u64;
        let mut prev: Option<u8> = None;
        for _ in 0..distinct {
            let byte = read_u8(&mut r)?;
            let freq = read_u64(&mut r)?;
            if freq == 0 || prev.is_some_and(|p| p >= byte) {
                return Err(CorruptKind::MalformedFrequencies.into());
            }
            sum = sum
                .checked_add(freq)
                .ok_or(CorruptKind::FrequencySumMismatch)?;
            prev = Some(byte);
            pairs.push((byte, freq));
        }
        if sum != original_length {
            return Err(CorruptKind::FrequencySumMismatch.into());
        }

        let count = read_u32(&mut r)? as usize;
        if count > r.len() / CHECKPOINT_LEN {
            return Err(CorruptKind::TruncatedHeader.into());
        }
        let mut checkpoints = Vec::with_capacity(count);
        for _ in 0..count {
            let bit_offset = read_u64(&mut r)?;
            let output_offset = read_u64(&mut r)?;
            let cp = Checkpoint {
                bit_offset,
                output_offset,
            };
            if let Some(last) = checkpoints.last() {
                if !is_after(last, &cp) {
                    return Err(CorruptKind::MalformedCheckpoints.into());
                }
            }
            checkpoints.push(cp);
        }

        let header = Header {
            original_length,
            histogram: Histogram::from_pairs(pairs),
            checkpoints,
        };
        let len = bytes.len() - r.len();
        Ok((header, len))
    }
}

fn is_after(prev: &Checkpoint, next: &Checkpoint) -> bool {
    next.bit_offset > prev.bit_offset && next.output_offset > prev.output_offset
}

fn read_exact(r: &mut &[u8], buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf)
        .map_err(|_| Error::CorruptStream(CorruptKind::TruncatedHeader))
}

fn read_u8(r: &mut &[u8]) -> Result<u8> {
    let mut b = [0u8; 1];
    read_exact(r, &mut b)?;
    Ok(b[0])
}

fn read_u16(r: &mut &[u8]) -> Result<u16> {
    let mut b = [0u8; 2];
    read_exact(r, &mut b)?;
    Ok(u16::from_le_bytes(b))
}

fn read_u32(r: &mut &[u8]) -> Result<u32> {
    let mut b = [0u8; 4];
    read_exact(r, &mut b)?;
    Ok(u32::from_le_bytes(b))
}

fn read_u64(r: &mut &[u8]) -> Result<u64> {
    let mut b = [0u8; 8];
    read_exact(r, &mut b)?;
    Ok(u64::from_le_bytes(b))
}

/// Payload bits implied by `tree`'s code lengths and `histogram`'s counts.
///
/// Returns `None` if the sum does not fit in a `u64`.
pub fn payload_bits(tree: &CodeTree, histogram: &Histogram) -> Option<u64> {
    let depths = tree.leaf_depths();
    let total: u128 = histogram
        .nonzero()
        .map(|(b, f)| f as u128 * depths[b as usize] as u128)
        .sum();
    u64::try_from(total).ok()
}

/// A parsed and validated stream, borrowing its payload.
#[derive(Debug)]
pub struct StreamContainer<'a> {
    /// The decoded header.
    pub header: Header,
    /// The tree rebuilt from the header's frequencies.
    pub tree: CodeTree,
    /// Meaningful bits in `payload`.
    pub total_bits: u64,
    /// Packed codes.
    pub payload: &'a [u8],
}

impl<'a> StreamContainer<'a> {
    /// Parse `bytes` and check that header and payload agree.
    ///
    /// # Errors
    /// Returns `Error::CorruptStream` for any inconsistency: bad magic or
    /// version, a malformed table, checkpoints outside the stream, or a
    /// payload whose length differs from the one the header implies.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let (header, header_len) = Header::parse(bytes)?;
        let payload = &bytes[header_len..];

        let tree = CodeTree::build(&header.histogram);
        let total_bits = payload_bits(&tree, &header.histogram)
            .ok_or(CorruptKind::MalformedFrequencies)?;
        let expected = total_bits.div_ceil(8);
        if payload.len() as u64 != expected {
            return Err(CorruptKind::PayloadLength {
                expected,
                actual: payload.len() as u64,
            }
            .into());
        }

        for cp in &header.checkpoints {
            let inside_output = cp.output_offset > 0 && cp.output_offset < header.original_length;
            let inside_bits = cp.bit_offset > 0 && cp.bit_offset < total_bits;
            if !inside_output || !inside_bits {
                return Err(CorruptKind::MalformedCheckpoints.into());
            }
        }

        log::debug!(
            "container: {} bytes original, {} distinct, {} checkpoints, {} payload bits",
            header.original_length,
            header.histogram.distinct(),
            header.checkpoints.len(),
            total_bits
        );

        Ok(Self {
            header,
            tree,
            total_bits,
            payload,
        })
    }
}
