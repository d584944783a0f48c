//! FLAC codec implementation
//!
//! FLAC (Free Lossless Audio Codec) stores integer PCM losslessly as a
//! sequence of independently decodable frames preceded by metadata blocks.
//!
//! ## Features
//!
//! - **Sample rates**: 1-1048575 Hz
//! - **Bit depths**: 8, 16, 24 and 32 bits per sample
//! - **Channels**: 1-8, with left/side, right/side and mid/side stereo
//! - **Subframes**: CONSTANT, VERBATIM, FIXED (orders 0-4) and LPC (orders 1-32)
//!
//! Frames are encoded by flacenc, with the native encoder covering 32-bit
//! samples and block lengths flacenc does not take. Symphonia decodes them.
//!
//! ## Encoder Usage
//!
//! ```rust,ignore
//! use wavflac_lib::codec::{FrameEncoder, SearchEffort};
//! use wavflac_lib::codec::flac::{FlacencFrameEncoder, StreamInfo};
//!
//! let info = StreamInfo::new(params, 4096);
//! let mut encoder = FlacencFrameEncoder::new();
//! encoder.encode(&info, &samples, 4096, SearchEffort::Best, &mut |frame| {
//!     out.extend_from_slice(frame);
//!     Ok(())
//! })?;
//! ```

pub mod crc;
pub mod decoder;
pub mod encoder;
pub mod flacenc_backend;
pub mod frame;
pub mod lpc;
pub mod metadata;
pub mod residual;
pub mod subframe;

pub use decoder::SymphoniaFrameDecoder;
pub use encoder::NativeFrameEncoder;
pub use flacenc_backend::FlacencFrameEncoder;
pub use metadata::{BlockType, MetadataBlock, MetadataBlockHeader, StreamInfo};

/// Stream marker at the start of every FLAC file
pub const FLAC_MAGIC: &[u8; 4] = b"fLaC";

/// Offset of the first metadata block (STREAMINFO)
pub const METADATA_OFFSET: u64 = 4;
