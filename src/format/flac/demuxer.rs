//! FLAC stream demuxer

use crate::codec::flac::decoder::MIN_FRAME_LEN;
use crate::codec::flac::{
    BlockType, MetadataBlock, MetadataBlockHeader, StreamInfo, SymphoniaFrameDecoder, FLAC_MAGIC,
};
use crate::codec::FrameDecoder;
use crate::error::{Error, Result};
use crate::format::chunk::{read_tag, tag_display};
use crate::format::{SampleMatrix, StreamParameters};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// FLAC demuxer
///
/// Holds the whole stream in memory and decodes it with the Symphonia
/// frame decoder.
pub struct FlacDemuxer {
    data: Vec<u8>,
}

impl FlacDemuxer {
    /// Open a FLAC file
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }

    /// Check the marker and read the rest of the stream
    pub fn new<R: Read>(mut reader: R) -> Result<Self> {
        read_magic(&mut reader)?;
        let mut data = FLAC_MAGIC.to_vec();
        reader.read_to_end(&mut data)?;
        Ok(FlacDemuxer { data })
    }

    /// Decode a complete FLAC stream
    pub fn decode<R: Read>(reader: R) -> Result<(SampleMatrix, StreamParameters)> {
        Self::new(reader)?.read_all()
    }

    /// Read STREAMINFO without touching the frames
    pub fn probe<R: Read>(mut reader: R) -> Result<StreamInfo> {
        read_magic(&mut reader)?;

        let mut header = [0u8; MetadataBlockHeader::SIZE];
        reader.read_exact(&mut header)?;
        let header = MetadataBlockHeader::from_bytes(header);
        if header.block_type != BlockType::StreamInfo {
            return Err(Error::structural(format!(
                "First metadata block is {:?}, expected STREAMINFO",
                header.block_type
            )));
        }

        let mut payload = vec![0u8; header.length as usize];
        reader.read_exact(&mut payload)?;
        StreamInfo::parse(&payload)
    }

    /// Decode every frame
    pub fn read_all(self) -> Result<(SampleMatrix, StreamParameters)> {
        let mut decoder = SymphoniaFrameDecoder::new(self.data)?;
        decode_stream(&mut decoder)
    }
}

fn read_magic<R: Read>(reader: &mut R) -> Result<()> {
    let magic = read_tag(reader)?;
    if &magic != FLAC_MAGIC {
        return Err(Error::structural(format!(
            "Not a FLAC stream: expected 'fLaC', found '{}'",
            tag_display(&magic)
        )));
    }
    Ok(())
}

/// Pull metadata and frames from `decoder` into a new sample matrix
pub fn decode_stream<D: FrameDecoder>(
    decoder: &mut D,
) -> Result<(SampleMatrix, StreamParameters)> {
    let info = match decoder.read_metadata_block()? {
        Some(MetadataBlock::StreamInfo(info)) => info,
        Some(MetadataBlock::Other { block_type, .. }) => {
            return Err(Error::structural(format!(
                "First metadata block is {:?}, expected STREAMINFO",
                block_type
            )));
        }
        None => return Err(Error::structural("FLAC stream has no metadata blocks")),
    };
    while let Some(block) = decoder.read_metadata_block()? {
        debug!("Metadata block: {:?}", block);
    }

    let params = info.params;
    if params.sample_depth % 8 != 0 {
        return Err(Error::unsupported(format!(
            "{}-bit samples are not byte aligned",
            params.sample_depth
        )));
    }
    params.validate()?;

    // Bound the allocation by what the remaining bytes could possibly hold
    if let Some(bytes) = decoder.frame_bytes() {
        let capacity = bytes / MIN_FRAME_LEN * u64::from(info.max_block_size);
        if params.num_samples > capacity {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "STREAMINFO declares {} samples but only {} bytes of frames follow",
                    params.num_samples, bytes
                ),
            )));
        }
    }

    let num_samples = usize::try_from(params.num_samples)
        .map_err(|_| Error::range(format!("Too many samples: {}", params.num_samples)))?;
    let mut samples = SampleMatrix::zeroed(params.num_channels as usize, num_samples)?;

    let mut offset = 0;
    loop {
        let n = decoder.read_block(&mut samples, offset)?;
        if n == 0 {
            break;
        }
        offset += n;
    }

    if offset != num_samples {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("FLAC stream truncated: {} of {} samples decoded", offset, num_samples),
        )));
    }

    info!(
        "Decoded {} samples x {} channels, {} Hz, {} bits",
        num_samples, params.num_channels, params.sample_rate, params.sample_depth
    );
    Ok((samples, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EncoderConfig;
    use crate::format::flac::FlacMuxer;
    use crate::format::SeekableSink;
    use std::io::Cursor;

    fn encode(samples: &SampleMatrix, params: StreamParameters) -> Vec<u8> {
        let mut sink = SeekableSink::new(Cursor::new(Vec::new())).unwrap();
        FlacMuxer::new(EncoderConfig::default())
            .encode(&mut sink, samples, params)
            .unwrap();
        sink.into_inner().into_inner()
    }

    fn stereo() -> (SampleMatrix, StreamParameters) {
        let left: Vec<i32> =
            (0..9000).map(|i| ((i as f64 * 0.03).sin() * 12000.0) as i32).collect();
        let right: Vec<i32> = left.iter().map(|v| -v / 3).collect();
        let samples = SampleMatrix::new(vec![left, right]).unwrap();
        (samples, StreamParameters::new(44100, 2, 16, 9000))
    }

    #[test]
    fn test_decode_roundtrip() {
        let (samples, params) = stereo();
        let bytes = encode(&samples, params);
        let (decoded, decoded_params) = FlacDemuxer::decode(Cursor::new(&bytes)).unwrap();
        assert_eq!(decoded, samples);
        assert_eq!(decoded_params.num_samples, 9000);
        assert!(decoded_params.has_digest());
    }

    #[test]
    fn test_probe_reads_streaminfo() {
        let (samples, params) = stereo();
        let bytes = encode(&samples, params);
        let info = FlacDemuxer::probe(Cursor::new(&bytes[..42])).unwrap();
        assert_eq!(info.params.sample_rate, 44100);
        assert_eq!(info.params.num_channels, 2);
        assert_eq!(info.max_block_size, 4096);
    }

    #[test]
    fn test_bad_magic() {
        let err = FlacDemuxer::decode(Cursor::new(b"RIFF\x00\x00\x00\x00")).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
    }

    #[test]
    fn test_missing_frames_is_io() {
        let (samples, params) = stereo();
        let bytes = encode(&samples, params);
        // Drop the last frame entirely
        let info = FlacDemuxer::probe(Cursor::new(&bytes)).unwrap();
        let last_frame_start = bytes.len() - info.min_frame_size as usize;
        let err = FlacDemuxer::decode(Cursor::new(&bytes[..last_frame_start])).unwrap_err();
        assert!(err.is_io(), "{:?}", err);
    }

    #[test]
    fn test_oversized_sample_count_is_io() {
        let params = StreamParameters::new(44100, 8, 16, (1 << 36) - 1);
        let mut bytes = FLAC_MAGIC.to_vec();
        bytes.extend_from_slice(&StreamInfo::new(params, 4096).to_block_bytes(true));
        let err = FlacDemuxer::decode(Cursor::new(&bytes)).unwrap_err();
        assert!(err.is_io(), "{:?}", err);

        // A few stray bytes do not lift the bound either
        bytes.extend_from_slice(&[0u8; 64]);
        let err = FlacDemuxer::decode(Cursor::new(&bytes)).unwrap_err();
        assert!(err.is_io(), "{:?}", err);
    }

    #[test]
    fn test_non_byte_depth_unsupported() {
        let mut info = StreamInfo::new(StreamParameters::new(44100, 1, 16, 0), 4096);
        info.params.sample_depth = 20;
        let mut bytes = FLAC_MAGIC.to_vec();
        bytes.extend_from_slice(&info.to_block_bytes(true));
        let err = FlacDemuxer::decode(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_first_block_must_be_streaminfo() {
        let padding = MetadataBlockHeader {
            is_last: true,
            block_type: BlockType::Padding,
            length: 0,
        };
        let mut bytes = FLAC_MAGIC.to_vec();
        bytes.extend_from_slice(&padding.to_bytes());
        assert!(matches!(
            FlacDemuxer::decode(Cursor::new(&bytes)),
            Err(Error::Structural(_))
        ));
        assert!(matches!(
            FlacDemuxer::probe(Cursor::new(&bytes)),
            Err(Error::Structural(_))
        ));
    }
}
