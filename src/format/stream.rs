//! Sample matrix and stream parameters shared by both containers

use crate::error::{Error, Result};

/// Per-channel signed PCM samples
///
/// Every channel holds the same number of samples. The matrix is built once
/// by whichever stage produced it and handed downstream by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleMatrix {
    channels: Vec<Vec<i32>>,
}

impl SampleMatrix {
    /// Create a matrix from per-channel sample vectors
    pub fn new(channels: Vec<Vec<i32>>) -> Result<Self> {
        StreamParameters::check_channels(channels.len() as u64)?;

        let num_samples = channels[0].len();
        if let Some((index, ch)) = channels
            .iter()
            .enumerate()
            .find(|(_, ch)| ch.len() != num_samples)
        {
            return Err(Error::invalid_input(format!(
                "Channel {} has {} samples, expected {}",
                index,
                ch.len(),
                num_samples
            )));
        }

        Ok(SampleMatrix { channels })
    }

    /// Create a silent matrix of the given shape
    ///
    /// Fails with a range error instead of aborting when the allocation
    /// cannot be satisfied.
    pub fn zeroed(num_channels: usize, num_samples: usize) -> Result<Self> {
        StreamParameters::check_channels(num_channels as u64)?;
        let mut channels = Vec::with_capacity(num_channels);
        for _ in 0..num_channels {
            let mut channel = Vec::new();
            channel.try_reserve_exact(num_samples).map_err(|e| {
                Error::range(format!(
                    "Cannot allocate {} samples x {} channels: {}",
                    num_samples, num_channels, e
                ))
            })?;
            channel.resize(num_samples, 0);
            channels.push(channel);
        }
        Ok(SampleMatrix { channels })
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn num_samples(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[i32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels in declared order
    pub fn channels(&self) -> &[Vec<i32>] {
        &self.channels
    }

    /// Consume the matrix, returning the channel vectors
    pub fn into_channels(self) -> Vec<Vec<i32>> {
        self.channels
    }

    /// Mutable access for decoders filling a freshly allocated matrix
    pub(crate) fn channels_mut(&mut self) -> &mut [Vec<i32>] {
        &mut self.channels
    }

    /// Check that every sample is representable as a signed `depth`-bit value
    pub fn check_depth(&self, depth: u16) -> Result<()> {
        StreamParameters::check_sample_depth(depth)?;
        let min = -(1i64 << (depth - 1));
        let max = (1i64 << (depth - 1)) - 1;

        for (ch, samples) in self.channels.iter().enumerate() {
            if let Some((i, &v)) = samples
                .iter()
                .enumerate()
                .find(|&(_, &v)| (v as i64) < min || (v as i64) > max)
            {
                return Err(Error::range(format!(
                    "Sample {} of channel {} ({}) does not fit in {} bits",
                    i, ch, v, depth
                )));
            }
        }

        Ok(())
    }
}

/// Stream-level audio parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParameters {
    /// Sample rate in Hz (1 <= rate < 2^20)
    pub sample_rate: u32,
    /// Number of channels (1-8)
    pub num_channels: u16,
    /// Bits per sample (8, 16, 24 or 32)
    pub sample_depth: u16,
    /// Samples per channel
    pub num_samples: u64,
    /// MD5 of the canonical sample bytes, all zero when absent
    pub content_digest: [u8; 16],
}

impl StreamParameters {
    /// Exclusive upper bound of the sample rate (20-bit STREAMINFO field)
    pub const SAMPLE_RATE_LIMIT: u32 = 1 << 20;
    /// Maximum number of channels
    pub const MAX_CHANNELS: u16 = 8;
    /// Maximum sample depth in bits
    pub const MAX_SAMPLE_DEPTH: u16 = 32;
    /// Exclusive upper bound of the sample count (36-bit STREAMINFO field)
    pub const SAMPLE_COUNT_LIMIT: u64 = 1 << 36;

    /// Create parameters with no content digest
    pub fn new(sample_rate: u32, num_channels: u16, sample_depth: u16, num_samples: u64) -> Self {
        StreamParameters {
            sample_rate,
            num_channels,
            sample_depth,
            num_samples,
            content_digest: [0; 16],
        }
    }

    /// Bytes used by one sample of one channel
    pub fn bytes_per_sample(&self) -> u16 {
        self.sample_depth / 8
    }

    /// Bytes used by one multi-channel sample frame in WAV
    pub fn block_align(&self) -> u32 {
        self.num_channels as u32 * self.bytes_per_sample() as u32
    }

    /// Average bytes per second in WAV
    pub fn byte_rate(&self) -> u64 {
        self.block_align() as u64 * self.sample_rate as u64
    }

    /// Length of the WAV data chunk
    pub fn data_len(&self) -> u64 {
        self.num_samples * self.block_align() as u64
    }

    /// Whether a non-zero digest is stored
    pub fn has_digest(&self) -> bool {
        self.content_digest != [0; 16]
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_samples as f64 / self.sample_rate as f64
    }

    /// Validate every bounded field
    pub fn validate(&self) -> Result<()> {
        Self::check_channels(self.num_channels as u64)?;
        Self::check_sample_rate(self.sample_rate)?;
        Self::check_sample_depth(self.sample_depth)?;

        if self.num_samples >= Self::SAMPLE_COUNT_LIMIT {
            return Err(Error::range(format!(
                "Too many samples: {} (limit 2^36)",
                self.num_samples
            )));
        }

        Ok(())
    }

    /// Check that `samples` has the shape these parameters describe
    pub fn check_matrix(&self, samples: &SampleMatrix) -> Result<()> {
        if samples.num_channels() != self.num_channels as usize {
            return Err(Error::invalid_input(format!(
                "Sample matrix has {} channels, parameters declare {}",
                samples.num_channels(),
                self.num_channels
            )));
        }

        if samples.num_samples() as u64 != self.num_samples {
            return Err(Error::invalid_input(format!(
                "Sample matrix has {} samples per channel, parameters declare {}",
                samples.num_samples(),
                self.num_samples
            )));
        }

        Ok(())
    }

    /// Check a channel count
    pub fn check_channels(num_channels: u64) -> Result<()> {
        if num_channels == 0 || num_channels > Self::MAX_CHANNELS as u64 {
            return Err(Error::range(format!(
                "Too many (or few) audio channels: {} (valid range 1-8)",
                num_channels
            )));
        }
        Ok(())
    }

    /// Check a sample rate
    pub fn check_sample_rate(sample_rate: u32) -> Result<()> {
        if sample_rate == 0 || sample_rate >= Self::SAMPLE_RATE_LIMIT {
            return Err(Error::range(format!(
                "Sample rate too large or invalid: {} Hz (valid range 1-{})",
                sample_rate,
                Self::SAMPLE_RATE_LIMIT - 1
            )));
        }
        Ok(())
    }

    /// Check a sample depth
    pub fn check_sample_depth(sample_depth: u16) -> Result<()> {
        if sample_depth == 0 || sample_depth > Self::MAX_SAMPLE_DEPTH {
            return Err(Error::range(format!(
                "Unsupported sample depth: {} bits (valid range 8-32)",
                sample_depth
            )));
        }
        if sample_depth % 8 != 0 {
            return Err(Error::range(format!(
                "Unsupported sample depth: {} bits is not a multiple of 8",
                sample_depth
            )));
        }
        Ok(())
    }
}
