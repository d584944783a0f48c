//! Native FLAC frame encoder
//!
//! Produces fixed-blocksize frames. Every channel of every block is searched
//! for its smallest subframe within the limits of the requested
//! [`SearchEffort`]; stereo blocks additionally compare the four channel
//! assignments when decorrelation is enabled.
//!
//! This is the encoder for 32-bit samples, which flacenc does not take. It
//! also covers the block sizes outside flacenc's range and final blocks too
//! short for flacenc's predictors.

use super::crc::crc16;
use super::frame::{ChannelAssignment, FrameHeader};
use super::metadata::StreamInfo;
use super::subframe::SubframeEncoding;
use crate::codec::bitstream::BitWriter;
use crate::codec::encoder::{
    FrameEncoder, SearchEffort, SearchLimits, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE,
};
use crate::error::{Error, Result};
use crate::format::SampleMatrix;
use tracing::{debug, trace};

/// Native FLAC frame encoder
#[derive(Debug, Default)]
pub struct NativeFrameEncoder {
    frames_encoded: u64,
}

impl NativeFrameEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames produced by the last call to `encode`
    pub fn frames_encoded(&self) -> u64 {
        self.frames_encoded
    }
}

/// Encode `len` samples of every channel from `offset` as frame `frame_number`
pub(crate) fn encode_block(
    info: &StreamInfo,
    samples: &SampleMatrix,
    offset: usize,
    len: usize,
    frame_number: u64,
    limits: &SearchLimits,
) -> Result<Vec<u8>> {
    let block: Vec<Vec<i64>> = samples
        .channels()
        .iter()
        .map(|ch| ch[offset..offset + len].iter().map(|&s| s as i64).collect())
        .collect();
    let depth = info.params.sample_depth as u32;

    let stereo = block.len() == 2 && depth < 32 && limits.stereo_decorrelation;
    let (assignment, subframes) = if stereo {
        choose_stereo(&block[0], &block[1], depth, limits)
    } else {
        let subframes: Vec<SubframeEncoding> = block
            .iter()
            .map(|channel| SubframeEncoding::search(channel, depth, limits))
            .collect();
        (ChannelAssignment::Independent(block.len() as u8), subframes)
    };

    let header = FrameHeader {
        variable_block_size: false,
        block_size: len,
        sample_rate: Some(info.params.sample_rate),
        channels: assignment,
        sample_depth: Some(depth),
        number: frame_number,
    };

    let estimate: u64 = subframes.iter().map(|s| s.bits).sum::<u64>() / 8 + 32;
    let mut writer = BitWriter::with_capacity(estimate as usize);
    header.write(&mut writer)?;
    for subframe in &subframes {
        subframe.write(&mut writer);
    }
    writer.align_to_byte();
    let crc = crc16(writer.as_bytes());
    writer.write_bits(crc as u64, 16);

    let frame = writer.into_bytes();
    trace!(
        "Frame {}: {} samples, {:?}, {} bytes",
        frame_number,
        len,
        assignment,
        frame.len()
    );
    Ok(frame)
}

/// Compare independent, left/side, right/side and mid/side coding
fn choose_stereo(
    left: &[i64],
    right: &[i64],
    depth: u32,
    limits: &SearchLimits,
) -> (ChannelAssignment, Vec<SubframeEncoding>) {
    let side: Vec<i64> = left.iter().zip(right).map(|(l, r)| l - r).collect();
    let mid: Vec<i64> = left.iter().zip(right).map(|(l, r)| (l + r) >> 1).collect();

    let l = SubframeEncoding::search(left, depth, limits);
    let r = SubframeEncoding::search(right, depth, limits);
    let s = SubframeEncoding::search(&side, depth + 1, limits);
    let m = SubframeEncoding::search(&mid, depth, limits);

    let options = [
        (ChannelAssignment::Independent(2), l.bits.saturating_add(r.bits)),
        (ChannelAssignment::LeftSide, l.bits.saturating_add(s.bits)),
        (ChannelAssignment::RightSide, s.bits.saturating_add(r.bits)),
        (ChannelAssignment::MidSide, m.bits.saturating_add(s.bits)),
    ];
    let assignment = options
        .iter()
        .min_by_key(|(_, bits)| *bits)
        .map_or(ChannelAssignment::Independent(2), |&(a, _)| a);

    let subframes = match assignment {
        ChannelAssignment::LeftSide => vec![l, s],
        ChannelAssignment::RightSide => vec![s, r],
        ChannelAssignment::MidSide => vec![m, s],
        ChannelAssignment::Independent(_) => vec![l, r],
    };
    (assignment, subframes)
}

impl FrameEncoder for NativeFrameEncoder {
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
        info.params.check_matrix(samples)?;

        let limits = effort.limits();
        let total = samples.num_samples();
        debug!(
            "Encoding {} samples x {} channels, block size {}, effort {}",
            total,
            samples.num_channels(),
            block_size,
            effort
        );

        self.frames_encoded = 0;
        let mut offset = 0;
        while offset < total {
            let len = block_size.min(total - offset);
            let frame = encode_block(info, samples, offset, len, self.frames_encoded, &limits)?;
            emit(&frame)?;

            offset += len;
            self.frames_encoded += 1;
        }

        Ok(self.frames_encoded)
    }
}
