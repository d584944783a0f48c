//! wavflac - bit-exact WAV <-> FLAC transcoding
//!
//! wavflac converts uncompressed RIFF/WAVE PCM files into FLAC and back while
//! preserving every sample value, and checks the result against the MD5
//! digest stored in the FLAC STREAMINFO block.
//!
//! # Architecture
//!
//! - `format`: container handling (WAV demuxer/muxer, FLAC demuxer/muxer,
//!   little-endian chunk primitives, seekable output sinks)
//! - `codec`: the frame codec contract and the FLAC frame codecs (flacenc,
//!   Symphonia and a native encoder for what flacenc cannot take)
//! - `integrity`: content digest computation and verification
//! - `transcode`: file-level encode/decode pipelines

pub mod codec;
pub mod error;
pub mod format;
pub mod integrity;
pub mod transcode;

pub use error::{Error, Result};

/// wavflac version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Configuration for the wavflac library
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

/// Initialize the wavflac library with the given configuration
pub fn init(config: Config) -> Result<()> {
    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        // A subscriber may already be installed by the host (or another test)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(level)
            .with_target(false)
            .try_init();
    }

    Ok(())
}
