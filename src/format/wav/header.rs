//! WAV file header structures and parsing

use super::{DATA_CHUNK, FMT_CHUNK, PCM_FMT_SIZE, RIFF_MAGIC, WAVE_MAGIC};
use crate::error::{Error, Result};
use crate::format::chunk::{expect_tag, read_u16_le, read_u32_le};
use crate::format::StreamParameters;
use std::io::Read;

/// WAV format tag identifying the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// PCM (uncompressed)
    Pcm,
    /// IEEE Float
    IeeeFloat,
    /// A-Law
    ALaw,
    /// Mu-Law
    MuLaw,
    /// Extensible format
    Extensible,
    /// Unknown format
    Unknown(u16),
}

impl From<u16> for FormatTag {
    fn from(val: u16) -> Self {
        match val {
            0x0001 => FormatTag::Pcm,
            0x0003 => FormatTag::IeeeFloat,
            0x0006 => FormatTag::ALaw,
            0x0007 => FormatTag::MuLaw,
            0xFFFE => FormatTag::Extensible,
            other => FormatTag::Unknown(other),
        }
    }
}

impl From<FormatTag> for u16 {
    fn from(tag: FormatTag) -> Self {
        match tag {
            FormatTag::Pcm => 0x0001,
            FormatTag::IeeeFloat => 0x0003,
            FormatTag::ALaw => 0x0006,
            FormatTag::MuLaw => 0x0007,
            FormatTag::Extensible => 0xFFFE,
            FormatTag::Unknown(val) => val,
        }
    }
}

/// WAV format chunk data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavFormat {
    /// Format tag (codec ID)
    pub format_tag: FormatTag,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Average bytes per second
    pub byte_rate: u32,
    /// Block alignment
    pub block_align: u16,
    /// Bits per sample
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Build the PCM format block describing `params`
    pub fn from_params(params: &StreamParameters) -> Self {
        let mut format = WavFormat {
            format_tag: FormatTag::Pcm,
            channels: params.num_channels,
            sample_rate: params.sample_rate,
            byte_rate: 0,
            block_align: 0,
            bits_per_sample: params.sample_depth,
        };
        format.block_align = format.calculate_block_align();
        format.byte_rate = format.calculate_byte_rate();
        format
    }

    /// Read the 16-byte PCM format payload, checking each field as it is read
    ///
    /// Channel count and sample rate are range-checked before the next field
    /// is consumed; block align and byte rate are checked for consistency once
    /// the sample depth is known.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let format_tag = FormatTag::from(read_u16_le(reader)?);
        if format_tag != FormatTag::Pcm {
            return Err(Error::structural(format!(
                "Unsupported WAV file codec: {:?} (only linear PCM is supported)",
                format_tag
            )));
        }

        let channels = read_u16_le(reader)?;
        StreamParameters::check_channels(channels as u64)?;

        let sample_rate = read_u32_le(reader)?;
        StreamParameters::check_sample_rate(sample_rate)?;

        let byte_rate = read_u32_le(reader)?;
        let block_align = read_u16_le(reader)?;

        let bits_per_sample = read_u16_le(reader)?;
        StreamParameters::check_sample_depth(bits_per_sample)?;

        let format = WavFormat {
            format_tag,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
        };
        format.validate()?;

        Ok(format)
    }

    /// Convert to bytes for writing
    pub fn to_bytes(&self) -> [u8; PCM_FMT_SIZE as usize] {
        let mut bytes = [0u8; PCM_FMT_SIZE as usize];

        bytes[0..2].copy_from_slice(&u16::from(self.format_tag).to_le_bytes());
        bytes[2..4].copy_from_slice(&self.channels.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.byte_rate.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        bytes
    }

    /// Calculate expected byte rate
    pub fn calculate_byte_rate(&self) -> u32 {
        self.sample_rate * self.calculate_block_align() as u32
    }

    /// Calculate expected block alignment
    pub fn calculate_block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Validate stored block align and byte rate against the other fields
    pub fn validate(&self) -> Result<()> {
        let expected_block_align = self.calculate_block_align();
        if self.block_align != expected_block_align {
            return Err(Error::structural(format!(
                "Invalid block align value: expected {}, got {}",
                expected_block_align, self.block_align
            )));
        }

        let expected_byte_rate = self.calculate_byte_rate();
        if self.byte_rate != expected_byte_rate {
            return Err(Error::structural(format!(
                "Invalid byte rate value: expected {}, got {}",
                expected_byte_rate, self.byte_rate
            )));
        }

        Ok(())
    }
}

/// Complete WAV file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF chunk size as stored (not validated)
    pub riff_size: u32,
    /// WAV format information
    pub format: WavFormat,
    /// Data chunk size in bytes
    pub data_size: u32,
}

impl WavHeader {
    /// Read and validate everything up to the first sample byte
    ///
    /// The layout is fixed: RIFF descriptor, a 16-byte `fmt ` chunk, then the
    /// `data` chunk header. Any other ordering is a structural error.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        expect_tag(reader, RIFF_MAGIC, "RIFF file header")?;
        let riff_size = read_u32_le(reader)?;
        expect_tag(reader, WAVE_MAGIC, "WAV file header")?;

        expect_tag(reader, FMT_CHUNK, "WAV format chunk")?;
        let fmt_size = read_u32_le(reader)?;
        if fmt_size != PCM_FMT_SIZE {
            return Err(Error::structural(format!(
                "Unsupported WAV file type: fmt chunk is {} bytes, expected {}",
                fmt_size, PCM_FMT_SIZE
            )));
        }
        let format = WavFormat::read(reader)?;

        expect_tag(reader, DATA_CHUNK, "WAV data chunk")?;
        let data_size = read_u32_le(reader)?;
        if data_size == 0 || data_size % format.block_align as u32 != 0 {
            return Err(Error::structural(format!(
                "Invalid length of audio sample data: {} bytes with block align {}",
                data_size, format.block_align
            )));
        }

        Ok(WavHeader {
            riff_size,
            format,
            data_size,
        })
    }

    /// Get total number of samples (per channel)
    pub fn num_samples(&self) -> u64 {
        self.data_size as u64 / self.format.block_align as u64
    }

    /// Get duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.num_samples() as f64 / self.format.sample_rate as f64
    }

    /// Stream parameters described by this header (no digest)
    pub fn stream_parameters(&self) -> StreamParameters {
        StreamParameters::new(
            self.format.sample_rate,
            self.format.channels,
            self.format.bits_per_sample,
            self.num_samples(),
        )
    }
}
