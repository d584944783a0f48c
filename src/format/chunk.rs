//! Little-endian chunk primitives
//!
//! Fixed-width little-endian integers and 4-byte tags, the building blocks
//! of the RIFF container. Reads fail with `Error::Io` on premature end of
//! input; tag mismatches are structural errors.

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// A four-character chunk identifier
pub type Tag = [u8; 4];

/// Chunk header (4 byte ID + 4 byte size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub id: Tag,
    pub size: u32,
}

impl ChunkHeader {
    /// Create a chunk header
    pub fn new(id: Tag, size: u32) -> Self {
        ChunkHeader { id, size }
    }

    /// Read a chunk header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 8 {
            return None;
        }

        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[0..4]);

        let size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        Some(ChunkHeader { id, size })
    }

    /// Convert chunk header to bytes
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0..4].copy_from_slice(&self.id);
        bytes[4..8].copy_from_slice(&self.size.to_le_bytes());
        bytes
    }

    /// Read a chunk header from a stream
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let id = read_tag(reader)?;
        let size = read_u32_le(reader)?;
        Ok(ChunkHeader { id, size })
    }

    /// Write the chunk header to a stream
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }
}

/// Render a tag for error messages, escaping non-printable bytes
pub fn tag_display(tag: &[u8]) -> String {
    tag.iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}

/// Read a 4-byte tag
pub fn read_tag<R: Read>(reader: &mut R) -> Result<Tag> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

/// Read a 4-byte tag and require it to equal `expected`
pub fn expect_tag<R: Read>(reader: &mut R, expected: &Tag, what: &str) -> Result<()> {
    let tag = read_tag(reader)?;
    if &tag != expected {
        return Err(Error::structural(format!(
            "Invalid {}: expected \"{}\", found \"{}\"",
            what,
            tag_display(expected),
            tag_display(&tag)
        )));
    }
    Ok(())
}

/// Read `n` bytes (0 <= n <= 4) as an unsigned little-endian integer
pub fn read_uint_le<R: Read>(reader: &mut R, n: usize) -> Result<u32> {
    if n > 4 {
        return Err(Error::invalid_input(format!(
            "Cannot read a {}-byte integer into 32 bits",
            n
        )));
    }

    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes[..n])?;
    Ok(u32::from_le_bytes(bytes))
}

/// Read a little-endian u16
pub fn read_u16_le<R: Read>(reader: &mut R) -> Result<u16> {
    let mut bytes = [0u8; 2];
    reader.read_exact(&mut bytes)?;
    Ok(u16::from_le_bytes(bytes))
}

/// Read a little-endian u32
pub fn read_u32_le<R: Read>(reader: &mut R) -> Result<u32> {
    let mut bytes = [0u8; 4];
    reader.read_exact(&mut bytes)?;
    Ok(u32::from_le_bytes(bytes))
}

/// Write a 4-byte tag
pub fn write_tag<W: Write>(writer: &mut W, tag: &Tag) -> Result<()> {
    writer.write_all(tag)?;
    Ok(())
}

/// Write a little-endian u16
pub fn write_u16_le<W: Write>(writer: &mut W, value: u16) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u32
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> Result<()> {
    writer.write_all(&value.to_le_bytes())?;
    Ok(())
}
