//! Compress and decompress entry points.
//!
//! Phases run strictly in order, each joined before the next begins:
//! histogram, tree, table, size, encode. All of them share one worker pool
//! that lives for the duration of the call.

use crate::buffer::ByteBuffer;
use crate::config::CodecConfig;
use crate::container::{checkpoint_count, Header, StreamContainer};
use crate::decoder;
use crate::encoder;
use crate::error::{Error, Result};
use crate::estimate::BitLayout;
use crate::histogram::Histogram;
use crate::parallel::WorkerPool;
use crate::table::CodeTable;
use crate::tree::CodeTree;

/// Everything known about an input before a single byte is written.
#[derive(Debug)]
struct Plan {
    histogram: Histogram,
    table: CodeTable,
    layout: BitLayout,
    header_len: usize,
}

impl Plan {
    fn build(input: &[u8], config: &CodecConfig, pool: &WorkerPool) -> Result<Self> {
        let histogram = Histogram::compute(input, pool);
        let tree = CodeTree::build(&histogram);
        let table = CodeTable::derive(&tree)?;
        let layout = BitLayout::measure(input, &table, pool);
        let header_len = Header::encoded_len_for(
            histogram.distinct(),
            checkpoint_count(input.len(), config.checkpoint_interval()),
        );

        log::debug!(
            "plan: {} bytes, {} distinct, {} payload bits, {} header bytes",
            input.len(),
            histogram.distinct(),
            layout.total_bits(),
            header_len
        );

        Ok(Self {
            histogram,
            table,
            layout,
            header_len,
        })
    }

    fn compressed_len(&self) -> u64 {
        self.header_len as u64 + self.layout.total_bytes()
    }
}

/// A Huffman compressor/decompressor bound to one configuration.
#[derive(Clone, Copy, Debug, Default)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    /// Create a codec with `config`.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Exact size `compress` will produce for `input`.
    pub fn compressed_len(&self, input: &[u8]) -> Result<u64> {
        let pool = WorkerPool::new(&self.config)?;
        Ok(Plan::build(input, &self.config, &pool)?.compressed_len())
    }

    /// Compress `input` into the front of `output`, which must already be
    /// large enough (see [`Codec::compressed_len`]).
    ///
    /// Returns the number of bytes written; anything after them in `output`
    /// is untouched and may be truncated by the caller.
    ///
    /// # Errors
    /// `Error::BufferTooSmall` if `output` cannot hold the result, in which
    /// case nothing is written.
    pub fn compress<I, O>(&self, input: &I, output: &mut O) -> Result<u64>
    where
        I: ByteBuffer + ?Sized,
        O: ByteBuffer + ?Sized,
    {
        let input = input.as_slice();
        let pool = WorkerPool::new(&self.config)?;
        let plan = Plan::build(input, &self.config, &pool)?;
        self.write_planned(input, &plan, output.as_mut_slice(), &pool)
    }

    /// Compress `input`, resizing `output` to the compressed size first.
    /// Growable buffers end up exactly that long.
    pub fn compress_exact<I, O>(&self, input: &I, output: &mut O) -> Result<u64>
    where
        I: ByteBuffer + ?Sized,
        O: ByteBuffer + ?Sized,
    {
        let input = input.as_slice();
        let pool = WorkerPool::new(&self.config)?;
        let plan = Plan::build(input, &self.config, &pool)?;
        output.resize(to_usize(plan.compressed_len())?)?;
        self.write_planned(input, &plan, output.as_mut_slice(), &pool)
    }

    /// Compress `input` into a freshly allocated vector.
    pub fn compress_to_vec(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compress_exact(input, &mut out)?;
        Ok(out)
    }

    fn write_planned(
        &self,
        input: &[u8],
        plan: &Plan,
        output: &mut [u8],
        pool: &WorkerPool,
    ) -> Result<u64> {
        let total = plan.compressed_len();
        if (output.len() as u64) < total {
            return Err(Error::BufferTooSmall {
                required: total,
                available: output.len() as u64,
            });
        }

        let (head, rest) = output.split_at_mut(plan.header_len);
        let checkpoints = encoder::encode(
            input,
            &plan.table,
            &plan.layout,
            self.config.checkpoint_interval(),
            rest,
            pool,
        )?;

        let header = Header {
            original_length: input.len() as u64,
            histogram: plan.histogram.clone(),
            checkpoints,
        };
        debug_assert_eq!(header.encoded_len(), plan.header_len);
        header.write_to(head)?;

        log::debug!("compressed {} bytes to {}", input.len(), total);
        Ok(total)
    }

    /// Decompress the stream in `input` into the front of `output`, resizing
    /// it to the original length first. Returns that length.
    ///
    /// A fixed-size `output` larger than needed is accepted; bytes past the
    /// returned length are left untouched.
    ///
    /// # Errors
    /// `Error::CorruptStream` if the stream is malformed; `BufferTooSmall`
    /// or `AllocationFailure` if `output` cannot be sized. On error the
    /// contents of `output` are unspecified.
    pub fn decompress<I, O>(&self, input: &I, output: &mut O) -> Result<u64>
    where
        I: ByteBuffer + ?Sized,
        O: ByteBuffer + ?Sized,
    {
        let container = StreamContainer::parse(input.as_slice())?;
        let len = container.header.original_length;
        let n = to_usize(len)?;
        output.resize(n)?;

        let out = output.as_mut_slice();
        let available = out.len() as u64;
        let out = out.get_mut(..n).ok_or(Error::BufferTooSmall {
            required: len,
            available,
        })?;

        let pool = WorkerPool::new(&self.config)?;
        decoder::decode(&container, out, &pool)?;
        Ok(len)
    }

    /// Decompress `input` into a freshly allocated vector.
    pub fn decompress_to_vec(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.decompress(input, &mut out)?;
        Ok(out)
    }
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n)
        .map_err(|_| Error::AllocationFailure(format!("{} bytes exceed the address space", n)))
}

/// Compress with the default configuration; see [`Codec::compress`].
pub fn compress<I, O>(input: &I, output: &mut O) -> Result<u64>
where
    I: ByteBuffer + ?Sized,
    O: ByteBuffer + ?Sized,
{
    Codec::default().compress(input, output)
}

/// Decompress with the default configuration; see [`Codec::decompress`].
pub fn decompress<I, O>(input: &I, output: &mut O) -> Result<u64>
where
    I: ByteBuffer + ?Sized,
    O: ByteBuffer + ?Sized,
{
    Codec::default().decompress(input, output)
}
