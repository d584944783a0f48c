//! Frame decoder contract

use super::flac::MetadataBlock;
use crate::error::Result;
use crate::format::SampleMatrix;

/// Decoder trait pulling metadata blocks and then audio frames
pub trait FrameDecoder {
    /// Read the next metadata block
    ///
    /// Returns `None` once the block flagged as last has been consumed.
    fn read_metadata_block(&mut self) -> Result<Option<MetadataBlock>>;

    /// Bytes left for audio frames once the last metadata block is read
    fn frame_bytes(&self) -> Option<u64> {
        None
    }

    /// Decode one frame into `samples` starting at sample index `offset`
    ///
    /// Returns the number of samples per channel written, or 0 at the end of
    /// the stream.
    fn read_block(&mut self, samples: &mut SampleMatrix, offset: usize) -> Result<usize>;
}
