//! Error types for the Huffman codec.

use thiserror::Error;

/// Why a compressed stream was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CorruptKind {
    /// The stream does not start with the container magic.
    #[error("bad magic")]
    BadMagic,
    /// The container version is not one this build understands.
    #[error("unsupported version {0}")]
    UnsupportedVersion(u8),
    /// The stream ended inside the header.
    #[error("truncated header")]
    TruncatedHeader,
    /// Frequency entries are out of order, duplicated, or zero.
    #[error("malformed frequency table")]
    MalformedFrequencies,
    /// Frequencies do not add up to the declared original length.
    #[error("frequencies do not sum to original length")]
    FrequencySumMismatch,
    /// Checkpoints are out of order or point outside the stream.
    #[error("malformed checkpoint table")]
    MalformedCheckpoints,
    /// Payload length disagrees with the length implied by the header.
    #[error("payload is {actual} bytes, expected {expected}")]
    PayloadLength {
        /// Bytes implied by the frequency table.
        expected: u64,
        /// Bytes actually present.
        actual: u64,
    },
    /// The tree walk needed more bits than the payload holds.
    #[error("ran out of bits mid-code")]
    OutOfBits,
    /// A code path led to a leaf that cannot occur in valid data.
    #[error("invalid code path")]
    InvalidCode,
    /// A segment finished decoding somewhere other than its declared end.
    #[error("segment does not end on checkpoint")]
    SegmentMisaligned,
    /// Padding bits after the last code are not zero.
    #[error("non-zero padding bits")]
    NonZeroPadding,
}

/// Error variants for compression and decompression.
#[derive(Debug, Error)]
pub enum Error {
    /// The compressed stream is malformed or truncated.
    #[error("corrupt stream: {0}")]
    CorruptStream(#[from] CorruptKind),

    /// The output buffer cannot hold the result; nothing was written.
    #[error("buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the operation needs.
        required: u64,
        /// Bytes the buffer offers.
        available: u64,
    },

    /// Memory or worker threads could not be obtained.
    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    /// A derived code does not fit the 64-bit code register.
    #[error("code length {length} exceeds the supported maximum")]
    CodeTooLong {
        /// Depth of the offending leaf.
        length: usize,
    },

    /// An I/O error occurred while moving bytes in or out.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the corruption reason, if this is a corrupt-stream error.
    pub fn corrupt_kind(&self) -> Option<CorruptKind> {
        match self {
            Error::CorruptStream(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(e: std::collections::TryReserveError) -> Self {
        Error::AllocationFailure(e.to_string())
    }
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Error::AllocationFailure(format!("worker pool: {}", e))
    }
}

/// A specialized Result type for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
