//! FLAC stream muxer

use crate::codec::flac::{FlacencFrameEncoder, StreamInfo, FLAC_MAGIC, METADATA_OFFSET};
use crate::codec::{EncoderConfig, FrameEncoder};
use crate::error::{Error, Result};
use crate::format::{PatchSink, SampleMatrix, StreamParameters};
use crate::integrity::compute_digest;
use tracing::{debug, info};

/// FLAC muxer
///
/// Drives a [`FrameEncoder`] and owns everything around the frames: the
/// marker, the STREAMINFO block and its backpatch.
pub struct FlacMuxer<E: FrameEncoder> {
    encoder: E,
    config: EncoderConfig,
}

impl FlacMuxer<FlacencFrameEncoder> {
    /// Muxer using the flacenc frame encoder
    pub fn new(config: EncoderConfig) -> Self {
        Self::with_encoder(FlacencFrameEncoder::new(), config)
    }
}

impl<E: FrameEncoder> FlacMuxer<E> {
    /// Create a muxer around `encoder`
    pub fn with_encoder(encoder: E, config: EncoderConfig) -> Self {
        FlacMuxer { encoder, config }
    }

    /// Encoder configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `samples` as a complete FLAC stream into `target`
    ///
    /// Nothing is written unless the parameters, the matrix and the encoder
    /// configuration are all valid. The digest in `params` is replaced by
    /// the one computed from `samples`. Returns the STREAMINFO that was
    /// finally written.
    pub fn encode<S: PatchSink>(
        &mut self,
        target: &mut S,
        samples: &SampleMatrix,
        mut params: StreamParameters,
    ) -> Result<StreamInfo> {
        params.validate()?;
        params.check_matrix(samples)?;
        samples.check_depth(params.sample_depth)?;
        self.config.validate()?;
        if target.position() != 0 {
            return Err(Error::invalid_input(format!(
                "FLAC output must start an empty sink, {} bytes already written",
                target.position()
            )));
        }

        target.append(FLAC_MAGIC)?;

        params.content_digest = compute_digest(samples, params.sample_depth);
        let info = StreamInfo::new(params, self.config.block_size as u16);
        if target.position() != METADATA_OFFSET {
            return Err(Error::structural(format!(
                "STREAMINFO must start at byte {}, sink is at {}",
                METADATA_OFFSET,
                target.position()
            )));
        }
        target.append(&info.to_block_bytes(true))?;

        let mut amended = info;
        let frames = self.encoder.encode(
            &info,
            samples,
            self.config.block_size,
            self.config.effort,
            &mut |frame| {
                target.append(frame)?;
                amended.observe_frame(frame.len());
                Ok(())
            },
        )?;
        target.flush()?;

        debug!(
            "Frame sizes {}..{} bytes, backpatching STREAMINFO",
            amended.min_frame_size, amended.max_frame_size
        );
        target.overwrite_at(METADATA_OFFSET, &amended.to_block_bytes(true))?;
        target.flush()?;

        info!(
            "Encoded {} samples in {} frames ({} bytes)",
            params.num_samples,
            frames,
            target.position()
        );
        Ok(amended)
    }
}
