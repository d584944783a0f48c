//! Codec implementations (encoders and decoders)
//!
//! The [`FrameEncoder`] and [`FrameDecoder`] traits are the seam between
//! containers and the FLAC frame coders behind them.

pub mod bitstream;
pub mod decoder;
pub mod encoder;
pub mod flac;

pub use decoder::FrameDecoder;
pub use encoder::{
    EncoderConfig, FrameEncoder, SearchEffort, SearchLimits, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE,
};
pub use flac::{FlacencFrameEncoder, NativeFrameEncoder, StreamInfo, SymphoniaFrameDecoder};
