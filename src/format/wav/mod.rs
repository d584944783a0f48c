//! WAV audio format support
//!
//! Canonical 44-byte-header RIFF/WAVE files holding linear PCM: a `RIFF`
//! descriptor, a 16-byte `fmt ` chunk and a `data` chunk, in that order.
//! Samples are interleaved little-endian; 8-bit samples are unsigned with an
//! offset of 128, wider depths are two's complement.

pub mod demuxer;
pub mod header;
pub mod muxer;

pub use demuxer::WavDemuxer;
pub use header::{FormatTag, WavFormat, WavHeader};
pub use muxer::WavMuxer;

use crate::format::chunk::Tag;

/// WAV format magic numbers
pub const RIFF_MAGIC: &Tag = b"RIFF";
pub const WAVE_MAGIC: &Tag = b"WAVE";
pub const FMT_CHUNK: &Tag = b"fmt ";
pub const DATA_CHUNK: &Tag = b"data";

/// Size of the PCM `fmt ` chunk payload
pub const PCM_FMT_SIZE: u32 = 16;

/// RIFF size field minus the data chunk length
pub const RIFF_OVERHEAD: u64 = 36;
