//! wavflac CLI - bit-exact WAV <-> FLAC transcoding
//!
//! A command-line front end for the encode and decode pipelines

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use wavflac_lib::codec::{EncoderConfig, SearchEffort};
use wavflac_lib::format::flac::FlacDemuxer;
use wavflac_lib::format::wav::WavDemuxer;
use wavflac_lib::format::{
    detect_format_from_extension, detect_format_from_magic, ContainerFormat, StreamParameters,
};
use wavflac_lib::integrity;
use wavflac_lib::transcode::{decode_file, encode_file};
use wavflac_lib::{init, Config};

#[derive(Parser)]
#[command(name = "wavflac")]
#[command(about = "Bit-exact WAV <-> FLAC transcoder", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a WAV file to FLAC
    Encode {
        /// Input WAV file
        input: PathBuf,

        /// Output FLAC file
        output: PathBuf,

        /// Samples per block (16-65535)
        #[arg(short, long)]
        block_size: Option<usize>,

        /// Subframe search effort (fast, medium, best, exhaustive)
        #[arg(short, long)]
        effort: Option<SearchEffort>,

        /// Compression level preset (0-8)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=8))]
        level: Option<u8>,
    },

    /// Decode a FLAC file to WAV, verifying its MD5 digest
    Decode {
        /// Input FLAC file
        input: PathBuf,

        /// Output WAV file
        output: PathBuf,
    },

    /// Show the stream parameters of a WAV or FLAC file
    Info {
        /// Input file path
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init(Config {
        verbose: cli.verbose,
        debug: cli.debug,
    })?;

    info!("wavflac v{}", wavflac_lib::VERSION);
    let start = Instant::now();

    match cli.command {
        Commands::Encode {
            input,
            output,
            block_size,
            effort,
            level,
        } => {
            let config = encoder_config(block_size, effort, level)?;
            cmd_encode(&input, &output, &config)?;
        }
        Commands::Decode { input, output } => {
            cmd_decode(&input, &output)?;
        }
        Commands::Info { input } => {
            cmd_info(&input)?;
        }
    }

    info!("Finished in {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}

/// Level preset first, then explicit overrides
fn encoder_config(
    block_size: Option<usize>,
    effort: Option<SearchEffort>,
    level: Option<u8>,
) -> anyhow::Result<EncoderConfig> {
    let mut config = match level {
        Some(level) => EncoderConfig::from_compression_level(level)?,
        None => EncoderConfig::default(),
    };
    if let Some(block_size) = block_size {
        config.block_size = block_size;
    }
    if let Some(effort) = effort {
        config.effort = effort;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_encode(input: &Path, output: &Path, config: &EncoderConfig) -> anyhow::Result<()> {
    let start = Instant::now();
    let stream_info = encode_file(input, output, config)
        .with_context(|| format!("Failed to encode {}", input.display()))?;
    let elapsed = start.elapsed();

    let params = &stream_info.params;
    let input_len = std::fs::metadata(input)?.len();
    let output_len = std::fs::metadata(output)?.len();

    println!("Encoded {} -> {}", input.display(), output.display());
    print_params(params);
    println!("  Block Size: {}", config.block_size);
    println!("  Effort: {}", config.effort);
    println!(
        "  Frame Size: {}-{} bytes",
        stream_info.min_frame_size, stream_info.max_frame_size
    );
    if input_len > 0 {
        println!(
            "  Size: {} -> {} bytes ({:.1}%)",
            input_len,
            output_len,
            output_len as f64 * 100.0 / input_len as f64
        );
    }
    println!("  Time: {:.3}s", elapsed.as_secs_f64());
    Ok(())
}

fn cmd_decode(input: &Path, output: &Path) -> anyhow::Result<()> {
    let start = Instant::now();
    let report = decode_file(input, output)
        .with_context(|| format!("Failed to decode {}", input.display()))?;

    println!("Decoded {} -> {}", input.display(), output.display());
    print_params(&report.params);
    println!("  MD5: {}", report.digest);
    println!("  Time: {:.3}s", start.elapsed().as_secs_f64());
    Ok(())
}

fn cmd_info(input: &Path) -> anyhow::Result<()> {
    let mut file =
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;

    let format = match detect_format_from_extension(&input.to_string_lossy()) {
        Some(format) => format,
        None => {
            let mut header = [0u8; 12];
            let n = file.read(&mut header)?;
            file.seek(SeekFrom::Start(0))?;
            match detect_format_from_magic(&header[..n]) {
                Some(format) => format,
                None => bail!("Unrecognized file format: {}", input.display()),
            }
        }
    };

    println!("File: {}", input.display());
    println!("  Format: {}", format);
    match format {
        ContainerFormat::Wav => {
            let params = WavDemuxer::probe(BufReader::new(file))?;
            print_params(&params);
        }
        ContainerFormat::Flac => {
            let stream_info = FlacDemuxer::probe(BufReader::new(file))?;
            print_params(&stream_info.params);
            println!(
                "  Block Size: {}-{}",
                stream_info.min_block_size, stream_info.max_block_size
            );
            println!(
                "  Frame Size: {}-{} bytes",
                stream_info.min_frame_size, stream_info.max_frame_size
            );
            if stream_info.params.has_digest() {
                println!("  MD5: {}", integrity::hex(&stream_info.params.content_digest));
            } else {
                println!("  MD5: absent");
            }
        }
    }
    Ok(())
}

fn print_params(params: &StreamParameters) {
    println!("  Sample Rate: {} Hz", params.sample_rate);
    println!("  Channels: {}", params.num_channels);
    println!("  Bits Per Sample: {}", params.sample_depth);
    println!("  Samples: {}", params.num_samples);
    println!("  Duration: {:.2}s", params.duration_seconds());
}
