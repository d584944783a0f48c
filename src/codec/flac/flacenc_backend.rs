//! FLAC frame encoder backed by flacenc (pure Rust)
//!
//! Each block is handed to flacenc on its own, so the final block keeps its
//! true length instead of being padded to the configured block size.
//! Streams and blocks flacenc cannot take fall back to the native encoder:
//! 32-bit samples, block sizes outside 64..=32767 and final blocks shorter
//! than 64 samples.

use super::encoder::{encode_block, NativeFrameEncoder};
use super::metadata::StreamInfo;
use crate::codec::encoder::{FrameEncoder, SearchEffort, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::format::SampleMatrix;
use flacenc::bitsink::ByteSink;
use flacenc::component::{BitRepr, StreamInfo as FlacencStreamInfo};
use flacenc::config::Encoder as FlacConfig;
use flacenc::error::{Verified, Verify};
use flacenc::source::{Fill, FrameBuf};
use tracing::{debug, trace};

/// Deepest samples flacenc accepts
const MAX_DEPTH: u16 = 24;

/// Highest rate flacenc's STREAMINFO accepts
///
/// Its frames never carry the rate, so faster streams use this as a
/// placeholder.
const MAX_RATE: u32 = 96_000;

/// Frame encoder delegating to flacenc
#[derive(Debug, Default)]
pub struct FlacencFrameEncoder {
    frames_encoded: u64,
}

impl FlacencFrameEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames produced by the last call to `encode`
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }

    /// Whether flacenc can encode full blocks of this stream
    pub fn accepts(info: &StreamInfo, block_size: usize) -> bool {
        info.params.sample_depth <= MAX_DEPTH
            && (flacenc::constant::MIN_BLOCK_SIZE..=flacenc::constant::MAX_BLOCK_SIZE)
                .contains(&block_size)
    }
}

/// flacenc settings for a search effort
fn flacenc_config(block_size: usize, effort: SearchEffort) -> Result<Verified<FlacConfig>> {
    let mut config = FlacConfig::default();
    config.block_size = block_size;
    config.multithread = false;

    let subframe = &mut config.subframe_coding;
    match effort {
        SearchEffort::Fast => {
            subframe.use_lpc = false;
            subframe.fixed.max_order = 2;
            config.stereo_coding.use_leftside = false;
            config.stereo_coding.use_rightside = false;
            config.stereo_coding.use_midside = false;
        }
        SearchEffort::Medium => subframe.qlpc.lpc_order = 8,
        SearchEffort::Best => subframe.qlpc.lpc_order = 12,
        SearchEffort::Exhaustive => {
            subframe.qlpc.lpc_order = flacenc::constant::qlpc::MAX_ORDER;
            subframe.qlpc.quant_precision = flacenc::constant::qlpc::MAX_PRECISION;
        }
    }

    config
        .into_verified()
        .map_err(|(_, e)| Error::codec(format!("Invalid flacenc configuration: {:?}", e)))
}

impl FrameEncoder for FlacencFrameEncoder {
    fn encode(
        &mut self,
        info: &StreamInfo,
        samples: &SampleMatrix,
        block_size: usize,
        effort: SearchEffort,
        emit: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<u64> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(Error::invalid_input(format!(
                "Invalid FLAC block size: {}",
                block_size
            )));
        }
        let params = &info.params;
        params.check_matrix(samples)?;

        if !Self::accepts(info, block_size) {
            debug!(
                "flacenc cannot take {}-bit samples in blocks of {}, using the native encoder",
                params.sample_depth, block_size
            );
            let mut native = NativeFrameEncoder::new();
            self.frames_encoded = native.encode(info, samples, block_size, effort, emit)?;
            return Ok(self.frames_encoded);
        }

        let config = flacenc_config(block_size, effort)?;
        let num_channels = samples.num_channels();
        let stream_info = FlacencStreamInfo::new(
            params.sample_rate.min(MAX_RATE) as usize,
            num_channels,
            params.sample_depth as usize,
        )
        .map_err(|e| Error::codec(format!("Invalid flacenc stream parameters: {:?}", e)))?;
        let mut framebuf = FrameBuf::with_size(num_channels, block_size)
            .map_err(|e| Error::codec(format!("Invalid flacenc block: {:?}", e)))?;

        let total = samples.num_samples();
        debug!(
            "Encoding {} samples x {} channels with flacenc, block size {}, effort {}",
            total, num_channels, block_size, effort
        );

        self.frames_encoded = 0;
        let mut interleaved = Vec::with_capacity(block_size * num_channels);
        let mut offset = 0;
        while offset < total {
            let len = block_size.min(total - offset);

            let frame = if len < flacenc::constant::MIN_BLOCK_SIZE {
                let limits = effort.limits();
                encode_block(info, samples, offset, len, self.frames_encoded, &limits)?
            } else {
                interleaved.clear();
                for i in offset..offset + len {
                    interleaved.extend(samples.channels().iter().map(|ch| ch[i]));
                }
                framebuf.resize(len);
                framebuf
                    .fill_interleaved(&interleaved)
                    .map_err(|e| Error::codec(format!("flacenc rejected samples: {:?}", e)))?;

                let frame = flacenc::encode_fixed_size_frame(
                    &config,
                    &framebuf,
                    self.frames_encoded as usize,
                    &stream_info,
                )
                .map_err(|e| Error::codec(format!("FLAC encoding failed: {:?}", e)))?;
                let mut sink = ByteSink::new();
                frame.write(&mut sink).map_err(|e| {
                    Error::codec(format!("FLAC frame serialization failed: {:?}", e))
                })?;
                sink.as_slice().to_vec()
            };

            trace!("Frame {}: {} samples, {} bytes", self.frames_encoded, len, frame.len());
            emit(&frame)?;
            offset += len;
            self.frames_encoded += 1;
        }

        Ok(self.frames_encoded)
    }
}
