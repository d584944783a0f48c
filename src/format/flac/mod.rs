//! FLAC container support
//!
//! `fLaC` marker, metadata blocks (STREAMINFO first, at byte 4) and frames.
//! The muxer writes STREAMINFO before the frames and backpatches it in place
//! once the frame sizes are known, so it needs a [`PatchSink`].
//!
//! [`PatchSink`]: crate::format::PatchSink

pub mod demuxer;
pub mod muxer;

pub use crate::codec::flac::FLAC_MAGIC;
pub use demuxer::{decode_stream, FlacDemuxer};
pub use muxer::FlacMuxer;
