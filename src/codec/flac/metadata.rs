//! FLAC metadata blocks
//!
//! Every metadata block starts with a 4-byte header: a last-block flag, a
//! 7-bit block type and a 24-bit big-endian payload length. Only STREAMINFO
//! is interpreted; other blocks are recorded by type and skipped.

use crate::codec::bitstream::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::format::StreamParameters;

/// Metadata block type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    StreamInfo,
    Padding,
    Application,
    SeekTable,
    VorbisComment,
    CueSheet,
    Picture,
    /// Types 7-126
    Reserved(u8),
    /// Type 127
    Invalid,
}

impl From<u8> for BlockType {
    fn from(val: u8) -> Self {
        match val & 0x7F {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            2 => BlockType::Application,
            3 => BlockType::SeekTable,
            4 => BlockType::VorbisComment,
            5 => BlockType::CueSheet,
            6 => BlockType::Picture,
            127 => BlockType::Invalid,
            other => BlockType::Reserved(other),
        }
    }
}

impl From<BlockType> for u8 {
    fn from(block_type: BlockType) -> Self {
        match block_type {
            BlockType::StreamInfo => 0,
            BlockType::Padding => 1,
            BlockType::Application => 2,
            BlockType::SeekTable => 3,
            BlockType::VorbisComment => 4,
            BlockType::CueSheet => 5,
            BlockType::Picture => 6,
            BlockType::Reserved(val) => val,
            BlockType::Invalid => 127,
        }
    }
}

/// Metadata block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBlockHeader {
    /// Last metadata block before the frames
    pub is_last: bool,
    pub block_type: BlockType,
    /// Payload length in bytes
    pub length: u32,
}

impl MetadataBlockHeader {
    /// Header size in bytes
    pub const SIZE: usize = 4;

    /// Parse a header
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        MetadataBlockHeader {
            is_last: bytes[0] & 0x80 != 0,
            block_type: BlockType::from(bytes[0]),
            length: u32::from_be_bytes([0, bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Serialize the header
    pub fn to_bytes(&self) -> [u8; 4] {
        let len = self.length.to_be_bytes();
        [
            ((self.is_last as u8) << 7) | u8::from(self.block_type),
            len[1],
            len[2],
            len[3],
        ]
    }
}

/// A parsed metadata block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataBlock {
    /// Stream information
    StreamInfo(StreamInfo),
    /// Any other block, skipped
    Other {
        block_type: BlockType,
        length: u32,
    },
}

/// The STREAMINFO metadata block
///
/// Stream parameters plus the frame bounds an encoder can amend after the
/// frames have been written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    /// Smallest block size in samples (excluding the last block)
    pub min_block_size: u16,
    /// Largest block size in samples
    pub max_block_size: u16,
    /// Smallest frame in bytes, 0 if unknown
    pub min_frame_size: u32,
    /// Largest frame in bytes, 0 if unknown
    pub max_frame_size: u32,
    /// Sample rate, channels, depth, sample count and digest
    pub params: StreamParameters,
}

impl StreamInfo {
    /// Payload size in bytes
    pub const PAYLOAD_SIZE: usize = 34;
    /// Header plus payload
    pub const BLOCK_SIZE: usize = MetadataBlockHeader::SIZE + Self::PAYLOAD_SIZE;

    const FRAME_SIZE_LIMIT: u32 = (1 << 24) - 1;

    /// Create stream information for a fixed block size with unknown frame sizes
    pub fn new(params: StreamParameters, block_size: u16) -> Self {
        StreamInfo {
            min_block_size: block_size,
            max_block_size: block_size,
            min_frame_size: 0,
            max_frame_size: 0,
            params,
        }
    }

    /// Fold the byte length of one emitted frame into the frame bounds
    pub fn observe_frame(&mut self, frame_len: usize) {
        let len = (frame_len as u64).min(Self::FRAME_SIZE_LIMIT as u64) as u32;
        if self.min_frame_size == 0 || len < self.min_frame_size {
            self.min_frame_size = len;
        }
        self.max_frame_size = self.max_frame_size.max(len);
    }

    /// Serialize the 34-byte payload
    pub fn to_payload(&self) -> [u8; Self::PAYLOAD_SIZE] {
        let p = &self.params;
        let mut bw = BitWriter::with_capacity(Self::PAYLOAD_SIZE);
        bw.write_bits(self.min_block_size as u64, 16);
        bw.write_bits(self.max_block_size as u64, 16);
        bw.write_bits(self.min_frame_size as u64, 24);
        bw.write_bits(self.max_frame_size as u64, 24);
        bw.write_bits(p.sample_rate as u64, 20);
        bw.write_bits(p.num_channels.saturating_sub(1) as u64, 3);
        bw.write_bits(p.sample_depth.saturating_sub(1) as u64, 5);
        bw.write_bits(p.num_samples, 36);
        for &byte in &p.content_digest {
            bw.write_bits(byte as u64, 8);
        }

        let mut payload = [0u8; Self::PAYLOAD_SIZE];
        payload.copy_from_slice(&bw.into_bytes());
        payload
    }

    /// Serialize header and payload as a complete 38-byte metadata block
    pub fn to_block_bytes(&self, is_last: bool) -> [u8; Self::BLOCK_SIZE] {
        let header = MetadataBlockHeader {
            is_last,
            block_type: BlockType::StreamInfo,
            length: Self::PAYLOAD_SIZE as u32,
        };

        let mut block = [0u8; Self::BLOCK_SIZE];
        block[..MetadataBlockHeader::SIZE].copy_from_slice(&header.to_bytes());
        block[MetadataBlockHeader::SIZE..].copy_from_slice(&self.to_payload());
        block
    }

    /// Parse a STREAMINFO payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        if payload.len() != Self::PAYLOAD_SIZE {
            return Err(Error::structural(format!(
                "STREAMINFO payload is {} bytes, expected {}",
                payload.len(),
                Self::PAYLOAD_SIZE
            )));
        }

        let mut br = BitReader::new(payload);
        let min_block_size = br.read_bits(16)? as u16;
        let max_block_size = br.read_bits(16)? as u16;
        let min_frame_size = br.read_bits(24)?;
        let max_frame_size = br.read_bits(24)?;
        let sample_rate = br.read_bits(20)?;
        let num_channels = br.read_bits(3)? as u16 + 1;
        let sample_depth = br.read_bits(5)? as u16 + 1;
        let num_samples = br.read_bits_u64(36)?;

        let mut content_digest = [0u8; 16];
        content_digest.copy_from_slice(&payload[18..]);

        Ok(StreamInfo {
            min_block_size,
            max_block_size,
            min_frame_size,
            max_frame_size,
            params: StreamParameters {
                sample_rate,
                num_channels,
                sample_depth,
                num_samples,
                content_digest,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_info() -> StreamInfo {
        let mut params = StreamParameters::new(44100, 2, 16, 4);
        params.content_digest = [0xAB; 16];
        StreamInfo::new(params, 4096)
    }

    #[test]
    fn test_block_header_bytes() {
        let header = MetadataBlockHeader {
            is_last: true,
            block_type: BlockType::StreamInfo,
            length: 34,
        };
        assert_eq!(header.to_bytes(), [0x80, 0x00, 0x00, 0x22]);
        assert_eq!(MetadataBlockHeader::from_bytes([0x80, 0, 0, 0x22]), header);

        let padding = MetadataBlockHeader::from_bytes([0x01, 0x01, 0x00, 0x00]);
        assert!(!padding.is_last);
        assert_eq!(padding.block_type, BlockType::Padding);
        assert_eq!(padding.length, 65536);
    }

    #[test]
    fn test_block_types() {
        assert_eq!(BlockType::from(4), BlockType::VorbisComment);
        assert_eq!(BlockType::from(0x85), BlockType::CueSheet);
        assert_eq!(BlockType::from(9), BlockType::Reserved(9));
        assert_eq!(BlockType::from(127), BlockType::Invalid);
    }

    #[test]
    fn test_streaminfo_layout() {
        let block = sample_info().to_block_bytes(true);
        assert_eq!(block.len(), 38);
        assert_eq!(&block[0..4], &[0x80, 0x00, 0x00, 0x22]);
        // min/max block size
        assert_eq!(&block[4..8], &[0x10, 0x00, 0x10, 0x00]);
        // frame sizes unknown
        assert_eq!(&block[8..14], &[0; 6]);
        // 44100 Hz (0x0AC44) << 4 | (2 - 1) << 1 | (16 - 1) >> 4
        assert_eq!(&block[14..17], &[0x0A, 0xC4, 0x42]);
        // low 4 bits of depth-1, then 36-bit sample count
        assert_eq!(&block[17..22], &[0xF0, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(&block[22..38], &[0xAB; 16]);
    }

    #[test]
    fn test_streaminfo_parse_matches_serialize() {
        let mut info = sample_info();
        info.observe_frame(1200);
        info.observe_frame(900);
        info.observe_frame(1500);
        assert_eq!(info.min_frame_size, 900);
        assert_eq!(info.max_frame_size, 1500);

        let parsed = StreamInfo::parse(&info.to_payload()).unwrap();
        assert_eq!(parsed, info);
    }

    #[test]
    fn test_streaminfo_extreme_fields() {
        let mut params = StreamParameters::new((1 << 20) - 1, 8, 32, (1 << 36) - 1);
        params.content_digest = [0xFF; 16];
        let info = StreamInfo::new(params, u16::MAX);
        assert_eq!(StreamInfo::parse(&info.to_payload()).unwrap(), info);
    }

    #[test]
    fn test_streaminfo_wrong_length() {
        let err = StreamInfo::parse(&[0u8; 33]).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }
}
