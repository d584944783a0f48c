//! WAV file muxer implementation

use super::header::WavFormat;
use super::{DATA_CHUNK, FMT_CHUNK, PCM_FMT_SIZE, RIFF_MAGIC, RIFF_OVERHEAD, WAVE_MAGIC};
use crate::error::{Error, Result};
use crate::format::chunk::{write_tag, write_u32_le};
use crate::format::{SampleMatrix, StreamParameters};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

const WRITE_CHUNK: usize = 64 * 1024;

/// WAV file muxer
///
/// Writes the canonical 44-byte header followed by interleaved samples. Each
/// sample is truncated to its low `bytes_per_sample` bytes (8-bit samples get
/// the +128 offset first); values are not range-checked.
pub struct WavMuxer<W: Write> {
    writer: W,
}

impl WavMuxer<BufWriter<File>> {
    /// Create a WAV file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> WavMuxer<W> {
    /// Create a muxer over `writer`
    pub fn new(writer: W) -> Self {
        WavMuxer { writer }
    }

    /// Write a complete WAV stream
    ///
    /// Nothing is written when the parameters or the matrix shape are invalid,
    /// or when the data chunk would not fit the 32-bit RIFF size fields.
    pub fn write(&mut self, samples: &SampleMatrix, params: &StreamParameters) -> Result<()> {
        params.validate()?;
        params.check_matrix(samples)?;

        let data_len = params.data_len();
        if data_len + RIFF_OVERHEAD > u32::MAX as u64 {
            return Err(Error::range(format!(
                "Audio data too large for WAV: {} bytes",
                data_len
            )));
        }

        debug!(
            "Writing WAV: {} Hz, {} channels, {} bits, {} data bytes",
            params.sample_rate, params.num_channels, params.sample_depth, data_len
        );

        self.write_header(params, data_len as u32)?;
        self.write_samples(samples, params.bytes_per_sample() as usize)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the muxer, returning the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, params: &StreamParameters, data_len: u32) -> Result<()> {
        let format = WavFormat::from_params(params);

        write_tag(&mut self.writer, RIFF_MAGIC)?;
        write_u32_le(&mut self.writer, data_len + RIFF_OVERHEAD as u32)?;
        write_tag(&mut self.writer, WAVE_MAGIC)?;

        write_tag(&mut self.writer, FMT_CHUNK)?;
        write_u32_le(&mut self.writer, PCM_FMT_SIZE)?;
        self.writer.write_all(&format.to_bytes())?;

        write_tag(&mut self.writer, DATA_CHUNK)?;
        write_u32_le(&mut self.writer, data_len)?;
        Ok(())
    }

    fn write_samples(&mut self, samples: &SampleMatrix, bytes_per_sample: usize) -> Result<()> {
        let channels = samples.channels();
        let mut buf = Vec::with_capacity(WRITE_CHUNK + 32);

        for i in 0..samples.num_samples() {
            for ch in channels {
                encode_sample(ch[i], bytes_per_sample, &mut buf);
            }
            if buf.len() >= WRITE_CHUNK {
                self.writer.write_all(&buf)?;
                buf.clear();
            }
        }

        self.writer.write_all(&buf)?;
        Ok(())
    }
}

/// Append the low `bytes_per_sample` bytes of `value`, little-endian
fn encode_sample(value: i32, bytes_per_sample: usize, out: &mut Vec<u8>) {
    if bytes_per_sample == 1 {
        out.push(value.wrapping_add(128) as u8);
    } else {
        out.extend_from_slice(&value.to_le_bytes()[..bytes_per_sample]);
    }
}
