//! FLAC frame headers
//!
//! A frame header is byte aligned and protected by CRC-8:
//!
//! ```text
//! sync (14) | reserved (1) | blocking strategy (1)
//! block size code (4) | sample rate code (4)
//! channel assignment (4) | sample size code (3) | reserved (1)
//! coded frame/sample number (UTF-8 style, 1-7 bytes)
//! [block size - 1 (8 or 16)] [sample rate (8 or 16)]
//! CRC-8 (8)
//! ```

use super::crc::crc8;
use crate::codec::bitstream::BitWriter;
use crate::error::{Error, Result};

/// 14-bit frame sync code
pub const FRAME_SYNC: u32 = 0x3FFE;

/// Inter-channel decorrelation of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAssignment {
    /// 1-8 channels coded independently
    Independent(u8),
    /// Left and side (left - right)
    LeftSide,
    /// Side (left - right) and right
    RightSide,
    /// Mid ((left + right) >> 1) and side
    MidSide,
}

impl ChannelAssignment {
    fn code(self) -> u32 {
        match self {
            ChannelAssignment::Independent(n) => n as u32 - 1,
            ChannelAssignment::LeftSide => 8,
            ChannelAssignment::RightSide => 9,
            ChannelAssignment::MidSide => 10,
        }
    }
}

/// Frame header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Variable block size stream: `number` is a sample number
    pub variable_block_size: bool,
    /// Samples per channel in this frame
    pub block_size: usize,
    /// Sample rate, `None` when deferred to STREAMINFO
    pub sample_rate: Option<u32>,
    pub channels: ChannelAssignment,
    /// Sample depth, `None` when deferred to STREAMINFO
    pub sample_depth: Option<u32>,
    /// Frame number (fixed) or first sample number (variable)
    pub number: u64,
}

const SAMPLE_RATES: [(u32, u32); 11] = [
    (1, 88_200),
    (2, 176_400),
    (3, 192_000),
    (4, 8_000),
    (5, 16_000),
    (6, 22_050),
    (7, 24_000),
    (8, 32_000),
    (9, 44_100),
    (10, 48_000),
    (11, 96_000),
];

impl FrameHeader {
    /// Write the header including its CRC-8
    ///
    /// `writer` must be byte aligned with nothing written yet.
    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        if !writer.is_aligned() || !writer.as_bytes().is_empty() {
            return Err(Error::invalid_input("Frame header must start a fresh writer"));
        }
        if self.block_size == 0 || self.block_size > 65536 {
            return Err(Error::invalid_input(format!(
                "Frame block size {} out of range",
                self.block_size
            )));
        }

        let (bs_code, bs_extra) = block_size_code(self.block_size);
        let (sr_code, sr_extra) = sample_rate_code(self.sample_rate);
        let ss_code = sample_size_code(self.sample_depth);

        writer.write_bits(FRAME_SYNC as u64, 14);
        writer.write_bit(false);
        writer.write_bit(self.variable_block_size);
        writer.write_bits(bs_code as u64, 4);
        writer.write_bits(sr_code as u64, 4);
        writer.write_bits(self.channels.code() as u64, 4);
        writer.write_bits(ss_code as u64, 3);
        writer.write_bit(false);
        write_coded_number(writer, self.number)?;
        if let Some((value, bits)) = bs_extra {
            writer.write_bits(value as u64, bits);
        }
        if let Some((value, bits)) = sr_extra {
            writer.write_bits(value as u64, bits);
        }

        let crc = crc8(writer.as_bytes());
        writer.write_bits(crc as u64, 8);
        Ok(())
    }
}

/// Block size code and the optional explicit field (value, bits)
fn block_size_code(block_size: usize) -> (u32, Option<(u32, u32)>) {
    match block_size {
        192 => (1, None),
        576 | 1152 | 2304 | 4608 => (2 + (block_size / 576).trailing_zeros(), None),
        256 | 512 | 1024 | 2048 | 4096 | 8192 | 16384 | 32768 => {
            (8 + (block_size / 256).trailing_zeros(), None)
        }
        n if n <= 256 => (6, Some((n as u32 - 1, 8))),
        n => (7, Some((n as u32 - 1, 16))),
    }
}

/// Sample rate code and the optional explicit field (value, bits)
fn sample_rate_code(sample_rate: Option<u32>) -> (u32, Option<(u32, u32)>) {
    let Some(rate) = sample_rate else {
        return (0, None);
    };

    if let Some(&(code, _)) = SAMPLE_RATES.iter().find(|&&(_, r)| r == rate) {
        return (code, None);
    }

    if rate % 1000 == 0 && rate / 1000 <= 255 {
        (12, Some((rate / 1000, 8)))
    } else if rate <= 65535 {
        (13, Some((rate, 16)))
    } else if rate % 10 == 0 && rate / 10 <= 65535 {
        (14, Some((rate / 10, 16)))
    } else {
        (0, None)
    }
}

/// Sample size code; depths without a code defer to STREAMINFO
fn sample_size_code(sample_depth: Option<u32>) -> u32 {
    match sample_depth {
        Some(8) => 1,
        Some(12) => 2,
        Some(16) => 4,
        Some(20) => 5,
        Some(24) => 6,
        _ => 0,
    }
}

/// Write a frame or sample number in the extended UTF-8 coding (up to 36 bits)
pub fn write_coded_number(writer: &mut BitWriter, value: u64) -> Result<()> {
    if value >= 1 << 36 {
        return Err(Error::invalid_input(format!(
            "Coded number {} exceeds 36 bits",
            value
        )));
    }

    if value < 0x80 {
        writer.write_bits(value, 8);
        return Ok(());
    }

    let len: u32 = match value {
        v if v < 0x800 => 2,
        v if v < 0x1_0000 => 3,
        v if v < 0x20_0000 => 4,
        v if v < 0x400_0000 => 5,
        v if v < 0x8000_0000 => 6,
        _ => 7,
    };

    let prefix = (0xFF00u16 >> len) as u8;
    let lead_bits = 6 * (len - 1);
    writer.write_bits((prefix | (value >> lead_bits) as u8) as u64, 8);
    for i in (0..len - 1).rev() {
        writer.write_bits(0x80 | ((value >> (6 * i)) & 0x3F), 8);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(
        block_size: usize,
        rate: Option<u32>,
        depth: Option<u32>,
        number: u64,
    ) -> FrameHeader {
        FrameHeader {
            variable_block_size: false,
            block_size,
            sample_rate: rate,
            channels: ChannelAssignment::MidSide,
            sample_depth: depth,
            number,
        }
    }

    fn coded(value: u64) -> Vec<u8> {
        let mut bw = BitWriter::new();
        write_coded_number(&mut bw, value).unwrap();
        bw.into_bytes()
    }

    #[test]
    fn test_common_header_bytes() {
        let mut bw = BitWriter::new();
        header(4096, Some(44100), Some(16), 0).write(&mut bw).unwrap();
        let bytes = bw.into_bytes();
        // sync, 4096 (code 12), 44.1 kHz (code 9), mid/side, 16 bit, frame 0
        assert_eq!(&bytes[..5], &[0xFF, 0xF8, 0xC9, 0xA8, 0x00]);
        assert_eq!(bytes[5], crc8(&bytes[..5]));
        assert_eq!(bytes.len(), 6);
    }

    #[test]
    fn test_block_size_codes() {
        assert_eq!(block_size_code(192), (1, None));
        assert_eq!(block_size_code(576), (2, None));
        assert_eq!(block_size_code(4608), (5, None));
        assert_eq!(block_size_code(256), (8, None));
        assert_eq!(block_size_code(32768), (15, None));
        assert_eq!(block_size_code(1), (6, Some((0, 8))));
        assert_eq!(block_size_code(16), (6, Some((15, 8))));
        assert_eq!(block_size_code(1000), (7, Some((999, 16))));
        assert_eq!(block_size_code(65535), (7, Some((65534, 16))));
    }

    #[test]
    fn test_sample_rate_codes() {
        assert_eq!(sample_rate_code(None), (0, None));
        assert_eq!(sample_rate_code(Some(44100)), (9, None));
        assert_eq!(sample_rate_code(Some(96000)), (11, None));
        assert_eq!(sample_rate_code(Some(12000)), (12, Some((12, 8))));
        assert_eq!(sample_rate_code(Some(11025)), (13, Some((11025, 16))));
        assert_eq!(sample_rate_code(Some(384_000)), (14, Some((38400, 16))));
        assert_eq!(sample_rate_code(Some(655_350)), (14, Some((65535, 16))));
        // Not expressible in the header
        assert_eq!(sample_rate_code(Some(700_001)), (0, None));
        assert_eq!(sample_rate_code(Some((1 << 20) - 1)), (0, None));
    }

    #[test]
    fn test_depth_32_defers_to_streaminfo() {
        assert_eq!(sample_size_code(Some(32)), 0);
        assert_eq!(sample_size_code(Some(8)), 1);
        assert_eq!(sample_size_code(Some(24)), 6);
    }

    #[test]
    fn test_coded_numbers() {
        assert_eq!(coded(0), vec![0x00]);
        assert_eq!(coded(0x7F), vec![0x7F]);
        assert_eq!(coded(0x80), vec![0xC2, 0x80]);
        assert_eq!(coded(0x7FF), vec![0xDF, 0xBF]);
        assert_eq!(coded(0x800), vec![0xE0, 0xA0, 0x80]);
        assert_eq!(coded(0xFFFF), vec![0xEF, 0xBF, 0xBF]);
        assert_eq!(coded((1 << 36) - 1), vec![0xFE, 0xBF, 0xBF, 0xBF, 0xBF, 0xBF, 0xBF]);

        let mut bw = BitWriter::new();
        assert!(write_coded_number(&mut bw, 1 << 36).is_err());
    }

    #[test]
    fn test_header_needs_fresh_writer() {
        let mut bw = BitWriter::new();
        bw.write_bits(1, 3);
        assert!(header(4096, None, None, 0).write(&mut bw).is_err());
        assert!(header(0, None, None, 0).write(&mut BitWriter::new()).is_err());
    }
}
