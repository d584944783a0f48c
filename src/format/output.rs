//! Output sinks for container writers
//!
//! Writers that only append use [`AppendSink`]. Writers that must revisit an
//! already-written, fixed-size region (the FLAC STREAMINFO backpatch) require
//! [`PatchSink`], which only seekable targets implement, so a socket or pipe
//! can never be handed to them.

use crate::error::{Error, Result};
use std::io::{Seek, SeekFrom, Write};

/// Sequential byte output
pub trait AppendSink {
    /// Append bytes at the end of the output
    fn append(&mut self, bytes: &[u8]) -> Result<()>;

    /// Number of bytes appended so far
    fn position(&self) -> u64;

    /// Flush buffered output to the underlying target
    fn flush(&mut self) -> Result<()>;
}

/// Byte output that can also rewrite a region it already wrote
pub trait PatchSink: AppendSink {
    /// Overwrite `bytes.len()` bytes starting at `offset`
    ///
    /// The region must lie entirely within what was already appended; the
    /// length of the output never changes and later appends continue at the
    /// end.
    fn overwrite_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;
}

/// Append-only sink over any writer
pub struct StreamSink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> StreamSink<W> {
    /// Wrap a writer
    pub fn new(inner: W) -> Self {
        StreamSink { inner, written: 0 }
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> AppendSink for StreamSink<W> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.written
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Append-and-patch sink over a seekable writer
///
/// Offsets are relative to the writer's position when the sink was created.
pub struct SeekableSink<W: Write + Seek> {
    inner: W,
    base: u64,
    end: u64,
}

impl<W: Write + Seek> SeekableSink<W> {
    /// Wrap a seekable writer, starting at its current position
    pub fn new(mut inner: W) -> Result<Self> {
        let base = inner.stream_position()?;
        Ok(SeekableSink {
            inner,
            base,
            end: 0,
        })
    }

    /// Consume the sink, returning the writer positioned at the end of output
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Seek> AppendSink for SeekableSink<W> {
    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.end += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.end
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write + Seek> PatchSink for SeekableSink<W> {
    fn overwrite_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        let region_end = offset
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| Error::invalid_input("Patch region overflows"))?;
        if region_end > self.end {
            return Err(Error::invalid_input(format!(
                "Patch region {}..{} extends past written output ({} bytes)",
                offset, region_end, self.end
            )));
        }

        self.inner.seek(SeekFrom::Start(self.base + offset))?;
        self.inner.write_all(bytes)?;
        self.inner.seek(SeekFrom::Start(self.base + self.end))?;
        Ok(())
    }
}
