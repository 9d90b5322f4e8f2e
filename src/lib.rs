//! # Parallel Huffman Coding
//!
//! *Whole-buffer canonical Huffman compression with every phase spread across cores.*
//!
//! ## Intuition First
//!
//! Count how often each byte value occurs. Give the common bytes short bit
//! strings and the rare ones long bit strings, chosen so that no string is a
//! prefix of another. Write the strings back to back and the reader can
//! always tell where one ends and the next begins.
//!
//! The catch for parallelism is that a bit is smaller than anything two
//! threads can safely write at once. This crate measures every worker's
//! output size first, so each one knows the exact bit where it starts.
//! Workers then own disjoint bytes and only the few bytes where two workers
//! meet are stitched together afterwards.
//!
//! ## The Problem
//!
//! - **Encoding** is easy to split by input range, but each range's output
//!   position depends on the code lengths of everything before it.
//! - **Decoding** a variable-length code cannot start at an arbitrary bit.
//!   The encoder therefore records checkpoints (bit offset, output offset)
//!   at fixed input intervals, and the decoder runs one worker per segment.
//!
//! ## Historical Context
//!
//! ```text
//! 1948  Shannon     Entropy as the fundamental limit
//! 1952  Huffman     Minimum-redundancy prefix codes
//! 1964  Schwartz    Canonical codes: lengths alone define the code
//! 1989  Deflate     Huffman + LZ77 becomes the everyday default
//! 2010s GPUs/SIMD   Self-synchronising and checkpointed parallel decoding
//! ```
//!
//! ## Complexity Analysis
//!
//! - **Time**: $O(n / p)$ for histogram, sizing, encoding and checkpointed
//!   decoding with $p$ workers; $O(k \log k)$ tree construction for $k \le 256$
//!   distinct bytes.
//! - **Space**: a 256-entry table per worker plus the output buffer. The tree
//!   lives in one arena of at most 511 nodes.
//!
//! ## Failure Modes
//!
//! 1. **Pathological skew**: Fibonacci-like frequencies produce codes longer
//!    than the 64-bit code register; compression reports [`Error::CodeTooLong`].
//! 2. **Corrupt input**: truncated payloads, bad magic, inconsistent frequency
//!    tables and stray padding bits are all reported as
//!    [`Error::CorruptStream`] rather than producing wrong bytes.
//!
//! ## Implementation Notes
//!
//! - Ties in the priority queue are broken by insertion order, so the same
//!   input always produces the same tree and byte-identical output.
//! - The container stores only byte frequencies. The decoder rebuilds the
//!   tree with the same algorithm.
//! - Each call builds its own thread pool (see [`CodecConfig`]).
//!
//! ```
//! use parhuff::{Codec, CodecConfig};
//!
//! let codec = Codec::new(CodecConfig::new().with_workers(2));
//! let packed = codec.compress_to_vec(b"abracadabra").unwrap();
//! assert_eq!(codec.decompress_to_vec(&packed).unwrap(), b"abracadabra");
//! ```
//!
//! ## References
//!
//! - Huffman, D. A. (1952). "A Method for the Construction of Minimum-Redundancy Codes."
//! - Schwartz, E. S., Kallick, B. (1964). "Generating a Canonical Prefix Encoding."

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bits;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod container;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod estimate;
pub mod histogram;
pub mod parallel;
pub mod table;
pub mod tree;

pub use buffer::{ByteBuffer, SliceBuffer};
#[cfg(feature = "mmap")]
pub use buffer::MmapBuffer;
pub use codec::{compress, decompress, Codec};
pub use config::CodecConfig;
pub use container::{Checkpoint, Header, StreamContainer};
pub use error::{CorruptKind, Error, Result};
pub use estimate::{estimate, BitLayout};
pub use histogram::Histogram;
pub use parallel::WorkerPool;
pub use table::{Code, CodeTable, MAX_CODE_LEN};
pub use tree::CodeTree;
