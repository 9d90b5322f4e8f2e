//! Codec configuration.
//!
//! Every phase takes its worker count from a [`CodecConfig`] handed in by the
//! caller. Nothing consults the machine's parallelism behind the caller's back,
//! which lets tests pin execution to a single worker.

/// Default block alignment for range splits, one cache line.
pub const DEFAULT_BLOCK_ALIGN: usize = 64;

/// Default distance between decode checkpoints, in input bytes.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 1 << 20;

/// Tuning knobs shared by every phase of a compress or decompress call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecConfig {
    workers: usize,
    block_align: usize,
    checkpoint_interval: usize,
}

impl CodecConfig {
    /// Configuration sized to the machine's available parallelism.
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers,
            block_align: DEFAULT_BLOCK_ALIGN,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }

    /// Use exactly `workers` threads per phase. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Align interior range boundaries down to multiples of `align` bytes.
    /// Zero is treated as one (no alignment).
    pub fn with_block_align(mut self, align: usize) -> Self {
        self.block_align = align.max(1);
        self
    }

    /// Record a decode checkpoint every `interval` input bytes.
    /// Zero disables checkpoints.
    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    /// Number of workers per phase, at least 1.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Range alignment in bytes, at least 1.
    pub fn block_align(&self) -> usize {
        self.block_align
    }

    /// Checkpoint spacing in input bytes; 0 means disabled.
    pub fn checkpoint_interval(&self) -> usize {
        self.checkpoint_interval
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}
