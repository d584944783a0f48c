//! Container format handling (demuxing and muxing)
//!
//! This module reads and writes the two containers wavflac converts between:
//! RIFF/WAVE for uncompressed PCM and native FLAC streams.

pub mod chunk;
pub mod flac;
pub mod output;
pub mod stream;
pub mod wav;

pub use output::{AppendSink, PatchSink, SeekableSink, StreamSink};
pub use stream::{SampleMatrix, StreamParameters};

use std::fmt;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// RIFF/WAVE linear PCM
    Wav,
    /// Native FLAC stream
    Flac,
}

impl ContainerFormat {
    /// Short format name
    pub fn name(self) -> &'static str {
        match self {
            ContainerFormat::Wav => "wav",
            ContainerFormat::Flac => "flac",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Detect format from file extension
pub fn detect_format_from_extension(path: &str) -> Option<ContainerFormat> {
    let (_, ext) = path.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "wav" | "wave" => Some(ContainerFormat::Wav),
        "flac" => Some(ContainerFormat::Flac),
        _ => None,
    }
}

/// Detect format from the first bytes of a file
pub fn detect_format_from_magic(header: &[u8]) -> Option<ContainerFormat> {
    if header.starts_with(flac::FLAC_MAGIC) {
        Some(ContainerFormat::Flac)
    } else if header.len() >= 12
        && header.starts_with(wav::RIFF_MAGIC)
        && &header[8..12] == wav::WAVE_MAGIC
    {
        Some(ContainerFormat::Wav)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format_from_extension() {
        assert_eq!(detect_format_from_extension("take1.wav"), Some(ContainerFormat::Wav));
        assert_eq!(
            detect_format_from_extension("dir.v2/Take1.FLAC"),
            Some(ContainerFormat::Flac)
        );
        assert_eq!(detect_format_from_extension("notes.txt"), None);
        assert_eq!(detect_format_from_extension("noext"), None);
    }

    #[test]
    fn test_detect_format_from_magic() {
        assert_eq!(
            detect_format_from_magic(b"fLaC\x80\x00\x00\x22"),
            Some(ContainerFormat::Flac)
        );
        assert_eq!(
            detect_format_from_magic(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Some(ContainerFormat::Wav)
        );
        assert_eq!(detect_format_from_magic(b"RIFF\x24\x00\x00\x00AVI "), None);
        assert_eq!(detect_format_from_magic(b"fL"), None);
    }
}
