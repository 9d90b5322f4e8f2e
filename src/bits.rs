//! Bit-level I/O for the packed payload.
//!
//! Bits are packed most-significant first within each byte. A writer covers
//! one worker's span of the global bitstream: full bytes go straight into the
//! worker's own slice, while the first and last bytes, which a neighbouring
//! worker may also touch, are staged for a sequential merge.

/// A byte that a worker only partially filled, to be OR-ed into the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundaryByte {
    /// Index into the payload.
    pub index: usize,
    /// Bits this worker contributed; the rest are zero.
    pub bits: u8,
}

/// MSB-first writer over one worker's span of the payload.
#[derive(Debug)]
pub struct SpanWriter<'a> {
    interior: &'a mut [u8],
    written: usize,
    acc: u64,
    nbits: u32,
    head_index: usize,
    head_pending: bool,
    head: Option<BoundaryByte>,
    bit_pos: u64,
}

impl<'a> SpanWriter<'a> {
    /// Byte range of the payload that a span `[start_bit, end_bit)` owns
    /// outright, i.e. bytes whose eight bits all fall inside the span.
    pub fn interior_bytes(start_bit: u64, end_bit: u64) -> std::ops::Range<usize> {
        let first = start_bit.div_ceil(8) as usize;
        let last = ((end_bit / 8) as usize).max(first);
        first..last
    }

    /// Start writing at global bit `start_bit`; `interior` must be the slice
    /// for [`SpanWriter::interior_bytes`] of this span.
    pub fn new(interior: &'a mut [u8], start_bit: u64) -> Self {
        let phase = (start_bit % 8) as u32;
        Self {
            interior,
            written: 0,
            acc: 0,
            nbits: phase,
            head_index: (start_bit / 8) as usize,
            head_pending: phase != 0,
            head: None,
            bit_pos: start_bit,
        }
    }

    /// Global position of the next bit to be written.
    #[inline]
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Append the low `len` bits of `code`, most significant first.
    #[inline]
    pub fn write_bits(&mut self, code: u64, len: u32) {
        debug_assert!((1..=64).contains(&len));
        if len > 56 {
            self.write_bits(code >> 32, len - 32);
            self.write_bits(code & 0xFFFF_FFFF, 32);
            return;
        }

        self.acc = (self.acc << len) | (code & ((1u64 << len) - 1));
        self.nbits += len;
        self.bit_pos += len as u64;

        while self.nbits >= 8 {
            self.nbits -= 8;
            let byte = (self.acc >> self.nbits) as u8;
            self.emit(byte);
        }
        self.acc &= (1u64 << self.nbits) - 1;
    }

    #[inline]
    fn emit(&mut self, byte: u8) {
        if self.head_pending {
            self.head_pending = false;
            self.head = Some(BoundaryByte {
                index: self.head_index,
                bits: byte,
            });
        } else {
            self.interior[self.written] = byte;
            self.written += 1;
        }
    }

    /// Flush and return the boundary bytes this span shares with its
    /// neighbours: at most one at the front and one at the back.
    pub fn finish(self) -> (Option<BoundaryByte>, Option<BoundaryByte>) {
        debug_assert!(self.nbits < 8);
        let mut head = self.head;
        let mut tail = None;

        if self.nbits > 0 {
            let byte = (self.acc << (8 - self.nbits)) as u8;
            let partial = BoundaryByte {
                index: (self.bit_pos / 8) as usize,
                bits: byte,
            };
            if self.head_pending {
                // Span starts and ends inside the same byte.
                head = Some(partial);
            } else {
                tail = Some(partial);
            }
        }

        debug_assert_eq!(self.written, self.interior.len());
        (head, tail)
    }
}

/// MSB-first reader over `[start, end)` bits of a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: u64,
    end: u64,
}

impl<'a> BitReader<'a> {
    /// Read all bits of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_range(data, 0, data.len() as u64 * 8)
    }

    /// Read bits `start..end`; `end` is clamped to the slice.
    pub fn with_range(data: &'a [u8], start: u64, end: u64) -> Self {
        let end = end.min(data.len() as u64 * 8);
        Self {
            data,
            pos: start.min(end),
            end,
        }
    }

    /// Next bit, or `None` once the range is exhausted.
    #[inline]
    pub fn read_bit(&mut self) -> Option<bool> {
        if self.pos >= self.end {
            return None;
        }
        let byte = self.data[(self.pos >> 3) as usize];
        let bit = (byte >> (7 - (self.pos & 7))) & 1;
        self.pos += 1;
        Some(bit == 1)
    }

    /// Global position of the next bit.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Bits left before the end of the range.
    pub fn remaining(&self) -> u64 {
        self.end - self.pos
    }
}
