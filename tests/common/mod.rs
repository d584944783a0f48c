//! Common test utilities for wavflac integration tests
//!
//! Helpers for generating sample matrices, assembling WAV byte streams by
//! hand and writing them to temporary files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use wavflac_lib::format::{SampleMatrix, StreamParameters};

// ============================================================================
// Sample Generation
// ============================================================================

/// Largest value representable at `depth` bits
pub fn max_value(depth: u16) -> i32 {
    ((1i64 << (depth - 1)) - 1) as i32
}

/// Smallest value representable at `depth` bits
pub fn min_value(depth: u16) -> i32 {
    (-(1i64 << (depth - 1))) as i32
}

/// A sine per channel, each at a slightly different frequency
pub fn create_sine_matrix(channels: usize, samples: usize, depth: u16) -> SampleMatrix {
    let amplitude = max_value(depth) as f64 * 0.8;
    let data = (0..channels)
        .map(|ch| {
            let step = 0.01 + ch as f64 * 0.003;
            (0..samples)
                .map(|i| ((i as f64 * step).sin() * amplitude).round() as i32)
                .collect()
        })
        .collect();
    SampleMatrix::new(data).expect("valid shape")
}

/// Full-range pseudo-random samples, reproducible from `seed`
pub fn create_noise_matrix(channels: usize, samples: usize, depth: u16, seed: u64) -> SampleMatrix {
    let mut state = seed;
    let data = (0..channels)
        .map(|_| {
            (0..samples)
                .map(|_| {
                    // Simple PRNG for reproducible test data
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
                    ((state >> 32) as i32) >> (32 - depth)
                })
                .collect()
        })
        .collect();
    SampleMatrix::new(data).expect("valid shape")
}

/// Samples alternating between the extremes of `depth`
pub fn create_extremes_matrix(channels: usize, samples: usize, depth: u16) -> SampleMatrix {
    let data = (0..channels)
        .map(|ch| {
            (0..samples)
                .map(|i| if (i + ch) % 2 == 0 { max_value(depth) } else { min_value(depth) })
                .collect()
        })
        .collect();
    SampleMatrix::new(data).expect("valid shape")
}

/// Parameters matching `samples`
pub fn params_for(samples: &SampleMatrix, sample_rate: u32, depth: u16) -> StreamParameters {
    StreamParameters::new(
        sample_rate,
        samples.num_channels() as u16,
        depth,
        samples.num_samples() as u64,
    )
}

// ============================================================================
// WAV Assembly
// ============================================================================

/// Assemble a canonical WAV file from raw fields and sample data bytes
pub fn build_wav(channels: u16, sample_rate: u32, depth: u16, data: &[u8]) -> Vec<u8> {
    let block_align = channels * (depth / 8);
    let byte_rate = sample_rate * block_align as u32;

    let mut wav = Vec::with_capacity(44 + data.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes());
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&depth.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data.len() as u32).to_le_bytes());
    wav.extend_from_slice(data);
    wav
}

/// Interleave `samples` as WAV sample bytes
pub fn interleave(samples: &SampleMatrix, depth: u16) -> Vec<u8> {
    let width = (depth / 8) as usize;
    let mut data = Vec::with_capacity(samples.num_samples() * samples.num_channels() * width);
    for i in 0..samples.num_samples() {
        for ch in samples.channels() {
            if width == 1 {
                data.push((ch[i] + 128) as u8);
            } else {
                data.extend_from_slice(&ch[i].to_le_bytes()[..width]);
            }
        }
    }
    data
}

/// Complete WAV file holding `samples`
pub fn wav_for(samples: &SampleMatrix, sample_rate: u32, depth: u16) -> Vec<u8> {
    build_wav(
        samples.num_channels() as u16,
        sample_rate,
        depth,
        &interleave(samples, depth),
    )
}

/// Offset of a header field in a canonical WAV file
pub mod offsets {
    pub const RIFF: usize = 0;
    pub const WAVE: usize = 8;
    pub const FMT_SIZE: usize = 16;
    pub const FORMAT_TAG: usize = 20;
    pub const CHANNELS: usize = 22;
    pub const SAMPLE_RATE: usize = 24;
    pub const BYTE_RATE: usize = 28;
    pub const BLOCK_ALIGN: usize = 32;
    pub const DEPTH: usize = 34;
    pub const DATA: usize = 36;
    pub const DATA_SIZE: usize = 40;
}

// ============================================================================
// Files
// ============================================================================

/// Write `bytes` to `name` inside `dir`
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write test file");
    path
}
