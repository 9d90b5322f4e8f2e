//! huffpack CLI - whole-file Huffman compression
//!
//! Compresses a file into a self-describing `.arch` stream and back. Both
//! ends are memory-mapped; the output file is sized by the codec itself.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use memmap2::Mmap;

use parhuff::{Codec, CodecConfig, MmapBuffer};

/// Parallel canonical Huffman compressor.
#[derive(Parser, Debug)]
#[command(name = "huffpack")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Worker threads per phase (defaults to available parallelism)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=1024))]
    workers: Option<u32>,

    /// Input bytes between decoder checkpoints (0 disables parallel decode)
    #[arg(long, global = true, value_name = "BYTES")]
    checkpoint_interval: Option<usize>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress INPUT into INPUT.arch
    Compress {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
    /// Restore the original bytes of a compressed stream
    Decompress {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },
}

const EXTENSION: &str = "arch";

fn compressed_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".");
    name.push(EXTENSION);
    PathBuf::from(name)
}

fn restored_path(input: &Path) -> PathBuf {
    if input.extension().is_some_and(|ext| ext == EXTENSION) {
        input.with_extension("")
    } else {
        let mut name = input.as_os_str().to_owned();
        name.push(".out");
        PathBuf::from(name)
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = CodecConfig::new();
    if let Some(workers) = args.workers {
        config = config.with_workers(workers as usize);
    }
    if let Some(interval) = args.checkpoint_interval {
        config = config.with_checkpoint_interval(interval);
    }
    let codec = Codec::new(config);

    match args.command {
        Command::Compress { input, output } => {
            let output = output.unwrap_or_else(|| compressed_path(&input));
            let source = MappedInput::open(&input)?;

            let start = Instant::now();
            let mut packed = MmapBuffer::create(&output, 0)?;
            let written = codec.compress_exact(source.as_slice(), &mut packed)?;
            packed.flush()?;
            let elapsed = start.elapsed();

            if args.verbose {
                report(&input, &output, source.len(), written, elapsed, config);
            }
        }
        Command::Decompress { input, output } => {
            let output = output.unwrap_or_else(|| restored_path(&input));
            let source = MappedInput::open(&input)?;

            let start = Instant::now();
            let mut restored = MmapBuffer::create(&output, 0)?;
            let written = codec.decompress(source.as_slice(), &mut restored)?;
            restored.flush()?;
            let elapsed = start.elapsed();

            if args.verbose {
                report(&input, &output, source.len(), written, elapsed, config);
            }
        }
    }
    Ok(())
}

/// Read-only view of an input file; empty files are not mapped.
struct MappedInput {
    map: Option<Mmap>,
}

impl MappedInput {
    fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self { map: None });
        }
        // SAFETY: the file is only read, and only for the duration of one call.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map: Some(map) })
    }

    fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    fn len(&self) -> u64 {
        self.as_slice().len() as u64
    }
}

fn report(
    input: &Path,
    output: &Path,
    in_len: u64,
    out_len: u64,
    elapsed: std::time::Duration,
    config: CodecConfig,
) {
    eprintln!("Input: {:?} ({} bytes)", input, in_len);
    eprintln!("Output: {:?} ({} bytes)", output, out_len);
    eprintln!("  Workers: {}", config.workers());
    eprintln!("  Checkpoint interval: {}", config.checkpoint_interval());
    eprintln!("  Time: {:.2?}", elapsed);
    if in_len > 0 {
        eprintln!("  Ratio: {:.3}", out_len as f64 / in_len as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        assert_eq!(compressed_path(Path::new("data.bin")), PathBuf::from("data.bin.arch"));
        assert_eq!(restored_path(Path::new("data.bin.arch")), PathBuf::from("data.bin"));
        assert_eq!(restored_path(Path::new("data.bin")), PathBuf::from("data.bin.out"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["huffpack", "compress", "a.txt", "--workers", "3", "-v"]).unwrap();
        assert_eq!(args.workers, Some(3));
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Compress { output: None, .. }));
    }

    #[test]
    fn test_compress_then_decompress_files() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("data.bin");
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 7 * i % 5) as u8).collect();
        std::fs::write(&plain, &data).unwrap();

        let codec = Codec::new(CodecConfig::new().with_workers(3).with_checkpoint_interval(1000));
        let packed_path = compressed_path(&plain);
        let source = MappedInput::open(&plain).unwrap();
        let mut packed = MmapBuffer::create(&packed_path, 0).unwrap();
        let written = codec.compress_exact(source.as_slice(), &mut packed).unwrap();
        packed.flush().unwrap();
        drop(packed);
        assert_eq!(std::fs::metadata(&packed_path).unwrap().len(), written);

        let source = MappedInput::open(&packed_path).unwrap();
        let restored_file = dir.path().join("restored.bin");
        let mut restored = MmapBuffer::create(&restored_file, 0).unwrap();
        assert_eq!(codec.decompress(source.as_slice(), &mut restored).unwrap(), 10_000);
        restored.flush().unwrap();
        drop(restored);
        assert_eq!(std::fs::read(&restored_file).unwrap(), data);
    }

    #[test]
    fn test_empty_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("empty");
        std::fs::write(&plain, b"").unwrap();

        let source = MappedInput::open(&plain).unwrap();
        assert_eq!(source.len(), 0);
        let mut packed = MmapBuffer::create(compressed_path(&plain), 0).unwrap();
        assert_eq!(Codec::default().compress_exact(source.as_slice(), &mut packed).unwrap(), 18);
    }
}
