//! Frame encoder contract and encoder configuration

use super::flac::StreamInfo;
use crate::error::{Error, Result};
use crate::format::SampleMatrix;
use std::fmt;
use std::str::FromStr;

/// Default block size for FLAC encoding (4096 samples is a good balance)
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Minimum block size supported by FLAC
pub const MIN_BLOCK_SIZE: usize = 16;

/// Maximum block size supported by FLAC
pub const MAX_BLOCK_SIZE: usize = 65535;

/// Encoder trait turning a sample matrix into a sequence of FLAC frames
///
/// Implementations emit each complete frame through `emit`, in stream order,
/// and return the number of frames produced. They never touch the container:
/// the magic and the metadata blocks belong to the muxer.
pub trait FrameEncoder {
    /// Encode every sample of `samples` using blocks of `block_size` samples
    fn encode(
        &mut self,
        info: &StreamInfo,
        samples: &SampleMatrix,
        block_size: usize,
        effort: SearchEffort,
        emit: &mut dyn FnMut(&[u8]) -> Result<()>,
    ) -> Result<u64>;
}

/// How hard the encoder searches for the smallest subframe encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchEffort {
    /// Low-order fixed predictors only, independent channels
    Fast,
    /// Fixed predictors, LPC up to order 8, stereo decorrelation
    Medium,
    /// LPC up to order 12, deeper partition search
    #[default]
    Best,
    /// Every LPC order up to 32 at several coefficient precisions
    Exhaustive,
}

/// Search bounds implied by a [`SearchEffort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Highest FIXED predictor order tried
    pub max_fixed_order: usize,
    /// Highest LPC order considered (0 disables LPC)
    pub max_lpc_order: usize,
    /// Highest Rice partition order tried
    pub max_partition_order: u32,
    /// Try left/side, right/side and mid/side for stereo input
    pub stereo_decorrelation: bool,
    /// Evaluate every LPC order and precision instead of the estimated best
    pub exhaustive: bool,
}

impl SearchEffort {
    /// All levels, fastest first
    pub const ALL: [SearchEffort; 4] = [
        SearchEffort::Fast,
        SearchEffort::Medium,
        SearchEffort::Best,
        SearchEffort::Exhaustive,
    ];

    /// Search bounds for this level
    pub fn limits(self) -> SearchLimits {
        match self {
            SearchEffort::Fast => SearchLimits {
                max_fixed_order: 2,
                max_lpc_order: 0,
                max_partition_order: 2,
                stereo_decorrelation: false,
                exhaustive: false,
            },
            SearchEffort::Medium => SearchLimits {
                max_fixed_order: 4,
                max_lpc_order: 8,
                max_partition_order: 4,
                stereo_decorrelation: true,
                exhaustive: false,
            },
            SearchEffort::Best => SearchLimits {
                max_fixed_order: 4,
                max_lpc_order: 12,
                max_partition_order: 6,
                stereo_decorrelation: true,
                exhaustive: false,
            },
            SearchEffort::Exhaustive => SearchLimits {
                max_fixed_order: 4,
                max_lpc_order: 32,
                max_partition_order: 8,
                stereo_decorrelation: true,
                exhaustive: true,
            },
        }
    }

    fn name(self) -> &'static str {
        match self {
            SearchEffort::Fast => "fast",
            SearchEffort::Medium => "medium",
            SearchEffort::Best => "best",
            SearchEffort::Exhaustive => "exhaustive",
        }
    }
}

impl fmt::Display for SearchEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchEffort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SearchEffort::ALL
            .into_iter()
            .find(|effort| effort.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::invalid_input(format!(
                    "Unknown search effort '{}'. Valid: fast, medium, best, exhaustive",
                    s
                ))
            })
    }
}

/// FLAC encoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Block size in samples (16-65535)
    pub block_size: usize,
    /// Subframe search effort
    pub effort: SearchEffort,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            block_size: DEFAULT_BLOCK_SIZE,
            effort: SearchEffort::Best,
        }
    }
}

impl EncoderConfig {
    /// Create a configuration with the given block size and effort
    pub fn new(block_size: usize, effort: SearchEffort) -> Self {
        EncoderConfig { block_size, effort }
    }

    /// Create a configuration for fastest encoding
    pub fn fast() -> Self {
        EncoderConfig {
            block_size: 1152, // Smaller blocks = faster
            effort: SearchEffort::Fast,
        }
    }

    /// Create a configuration for best compression
    pub fn best() -> Self {
        EncoderConfig {
            block_size: 4096,
            effort: SearchEffort::Exhaustive,
        }
    }

    /// Map a compression level (0 = fastest, 8 = best compression)
    pub fn from_compression_level(level: u8) -> Result<Self> {
        let (block_size, effort) = match level {
            0 | 1 => (1152, SearchEffort::Fast),
            2 | 3 => (2048, SearchEffort::Medium),
            4..=6 => (4096, SearchEffort::Best),
            7 | 8 => (4608, SearchEffort::Exhaustive),
            _ => {
                return Err(Error::invalid_input(format!(
                    "Invalid FLAC compression level: {}. Valid range: 0-8",
                    level
                )))
            }
        };
        Ok(EncoderConfig { block_size, effort })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&self.block_size) {
            return Err(Error::invalid_input(format!(
                "Invalid FLAC block size: {}. Valid range: {}-{}",
                self.block_size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncoderConfig::default();
        assert_eq!(config.block_size, 4096);
        assert_eq!(config.effort, SearchEffort::Best);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_block_size_bounds() {
        assert!(EncoderConfig::new(16, SearchEffort::Fast).validate().is_ok());
        assert!(EncoderConfig::new(65535, SearchEffort::Fast).validate().is_ok());
        assert!(EncoderConfig::new(15, SearchEffort::Fast).validate().is_err());
        assert!(EncoderConfig::new(65536, SearchEffort::Fast).validate().is_err());
    }

    #[test]
    fn test_compression_levels() {
        assert_eq!(EncoderConfig::from_compression_level(0).unwrap(), EncoderConfig::fast());
        assert_eq!(EncoderConfig::from_compression_level(5).unwrap(), EncoderConfig::default());
        assert_eq!(EncoderConfig::from_compression_level(8).unwrap().block_size, 4608);
        assert!(EncoderConfig::from_compression_level(9).is_err());

        for level in 0..=8 {
            assert!(EncoderConfig::from_compression_level(level)
                .unwrap()
                .validate()
                .is_ok());
        }
    }

    #[test]
    fn test_effort_parsing() {
        assert_eq!("fast".parse::<SearchEffort>().unwrap(), SearchEffort::Fast);
        assert_eq!("BEST".parse::<SearchEffort>().unwrap(), SearchEffort::Best);
        assert!("turbo".parse::<SearchEffort>().is_err());
        assert_eq!(SearchEffort::Exhaustive.to_string(), "exhaustive");
    }

    #[test]
    fn test_effort_limits_grow() {
        let fast = SearchEffort::Fast.limits();
        let best = SearchEffort::Best.limits();
        assert_eq!(fast.max_lpc_order, 0);
        assert!(!fast.stereo_decorrelation);
        assert!(best.max_lpc_order > SearchEffort::Medium.limits().max_lpc_order);
        assert!(SearchEffort::Exhaustive.limits().exhaustive);
    }
}
