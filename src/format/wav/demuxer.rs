//! WAV file demuxer implementation

use super::header::WavHeader;
use crate::error::{Error, Result};
use crate::format::{SampleMatrix, StreamParameters};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// WAV demuxer
///
/// The header is parsed and validated on construction; the sample data is
/// read by [`WavDemuxer::read_samples`]. Bytes following the data chunk are
/// never read.
pub struct WavDemuxer<R: Read> {
    reader: R,
    header: WavHeader,
}

impl WavDemuxer<BufReader<File>> {
    /// Open a WAV file and parse its header
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> WavDemuxer<R> {
    /// Parse the header from `reader`, leaving it positioned at the first sample
    pub fn new(mut reader: R) -> Result<Self> {
        let header = WavHeader::read(&mut reader)?;
        debug!(
            "WAV header: {} Hz, {} channels, {} bits, {} samples",
            header.format.sample_rate,
            header.format.channels,
            header.format.bits_per_sample,
            header.num_samples()
        );
        Ok(WavDemuxer { reader, header })
    }

    /// Parse a complete WAV stream
    pub fn parse(reader: R) -> Result<(SampleMatrix, StreamParameters)> {
        let demuxer = Self::new(reader)?;
        let params = demuxer.stream_parameters();
        let samples = demuxer.read_samples()?;
        Ok((samples, params))
    }

    /// Parse only the header
    pub fn probe(reader: R) -> Result<StreamParameters> {
        Ok(Self::new(reader)?.stream_parameters())
    }

    /// Get the parsed header
    pub fn header(&self) -> &WavHeader {
        &self.header
    }

    /// Stream parameters described by the header (no digest)
    pub fn stream_parameters(&self) -> StreamParameters {
        self.header.stream_parameters()
    }

    /// Read and de-interleave the data chunk
    pub fn read_samples(self) -> Result<SampleMatrix> {
        let data_size = self.header.data_size as u64;
        let mut data = Vec::new();
        self.reader.take(data_size).read_to_end(&mut data)?;
        if (data.len() as u64) < data_size {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "WAV data chunk truncated: {} of {} bytes present",
                    data.len(),
                    data_size
                ),
            )));
        }

        let format = &self.header.format;
        let num_channels = format.channels as usize;
        let bytes_per_sample = (format.bits_per_sample / 8) as usize;
        let num_samples = self.header.num_samples() as usize;

        let mut channels: Vec<Vec<i32>> = (0..num_channels)
            .map(|_| Vec::with_capacity(num_samples))
            .collect();
        for frame in data.chunks_exact(format.block_align as usize) {
            for (ch, bytes) in frame.chunks_exact(bytes_per_sample).enumerate() {
                channels[ch].push(decode_sample(bytes));
            }
        }

        SampleMatrix::new(channels)
    }
}

/// Decode one little-endian sample of `bytes.len()` bytes
fn decode_sample(bytes: &[u8]) -> i32 {
    let raw = bytes
        .iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | b as u32);

    if bytes.len() == 1 {
        return raw as i32 - 128;
    }

    let shift = 32 - 8 * bytes.len() as u32;
    ((raw << shift) as i32) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::wav::{WavFormat, DATA_CHUNK, FMT_CHUNK, RIFF_MAGIC, WAVE_MAGIC};
    use std::io::Cursor;

    fn build_wav(params: &StreamParameters, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(RIFF_MAGIC);
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(WAVE_MAGIC);
        out.extend_from_slice(FMT_CHUNK);
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&WavFormat::from_params(params).to_bytes());
        out.extend_from_slice(DATA_CHUNK);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_decode_sample_widths() {
        assert_eq!(decode_sample(&[0x00]), -128);
        assert_eq!(decode_sample(&[0x80]), 0);
        assert_eq!(decode_sample(&[0xFF]), 127);
        assert_eq!(decode_sample(&[0xFF, 0xFF]), -1);
        assert_eq!(decode_sample(&[0x00, 0x80]), -32768);
        assert_eq!(decode_sample(&[0xFF, 0xFF, 0x7F]), 8_388_607);
        assert_eq!(decode_sample(&[0x00, 0x00, 0x80]), -8_388_608);
        assert_eq!(decode_sample(&[0x00, 0x00, 0x00, 0x80]), i32::MIN);
    }

    #[test]
    fn test_parse_stereo() {
        let params = StreamParameters::new(44100, 2, 16, 3);
        let data = [
            0x00, 0x00, 0xFF, 0xFF, // 0, -1
            0x01, 0x00, 0x00, 0x80, // 1, -32768
            0xFF, 0x7F, 0x02, 0x00, // 32767, 2
        ];

        let (samples, parsed) = WavDemuxer::parse(Cursor::new(build_wav(&params, &data))).unwrap();
        assert_eq!(parsed, params);
        assert_eq!(samples.channel(0), Some(&[0, 1, 32767][..]));
        assert_eq!(samples.channel(1), Some(&[-1, -32768, 2][..]));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let params = StreamParameters::new(8000, 1, 8, 2);
        let mut bytes = build_wav(&params, &[0x80, 0x81]);
        bytes.extend_from_slice(b"LIST\x04\x00\x00\x00junk");

        let (samples, _) = WavDemuxer::parse(Cursor::new(bytes)).unwrap();
        assert_eq!(samples.channel(0), Some(&[0, 1][..]));
    }

    #[test]
    fn test_truncated_data_is_io() {
        let params = StreamParameters::new(8000, 1, 16, 2);
        let mut bytes = build_wav(&params, &[0, 0, 0, 0]);
        bytes.truncate(bytes.len() - 1);

        let err = WavDemuxer::parse(Cursor::new(bytes)).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_probe_reads_header_only() {
        let params = StreamParameters::new(96000, 6, 24, 1);
        let mut bytes = build_wav(&params, &[0; 18]);
        bytes.truncate(44);

        assert_eq!(WavDemuxer::probe(Cursor::new(bytes)).unwrap(), params);
    }
}
