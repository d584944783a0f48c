//! Bitstream reading and writing utilities for FLAC.
//!
//! This module provides BitReader for the fixed-width fields of metadata
//! blocks and BitWriter for assembling frames during encoding. The writer
//! also handles two's complement fields, unary codes and Rice codes.
//!
//! # Bit Ordering
//!
//! Both BitReader and BitWriter use MSB-first (big-endian) bit ordering, as
//! FLAC requires for everything after the metadata block headers.

use crate::error::{Error, Result};

/// Bitstream reader over a byte slice.
///
/// Reads bits in MSB-first order. Maintains an internal position tracking the
/// current bit offset within the data.
pub struct BitReader<'a> {
    /// The underlying byte data
    data: &'a [u8],
    /// Current bit position (0-based from start of data)
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader from a byte slice.
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        BitReader { data, bit_pos: 0 }
    }

    /// Read up to 32 bits as an unsigned value.
    ///
    /// # Errors
    /// Returns `Error::EndOfStream` if insufficient bits remain.
    /// Returns `Error::InvalidInput` if n > 32.
    #[inline]
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(Error::invalid_input(
                "Cannot read more than 32 bits at once",
            ));
        }
        Ok(self.read_bits_u64(n)? as u32)
    }

    /// Read up to 64 bits as an unsigned value.
    ///
    /// # Errors
    /// Returns `Error::EndOfStream` if insufficient bits remain.
    /// Returns `Error::InvalidInput` if n > 64.
    pub fn read_bits_u64(&mut self, n: u32) -> Result<u64> {
        if n > 64 {
            return Err(Error::invalid_input(
                "Cannot read more than 64 bits at once",
            ));
        }
        if n as usize > self.remaining() {
            return Err(Error::EndOfStream);
        }

        let mut result: u64 = 0;
        let mut left = n as usize;
        while left > 0 {
            let byte = self.data[self.bit_pos / 8];
            let avail = 8 - self.bit_pos % 8;
            let take = avail.min(left);
            let mask = ((1u16 << take) - 1) as u8;
            let bits = (byte >> (avail - take)) & mask;

            result = (result << take) | bits as u64;
            self.bit_pos += take;
            left -= take;
        }

        Ok(result)
    }

    /// Get the number of bits remaining to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        let total_bits = self.data.len() * 8;
        total_bits.saturating_sub(self.bit_pos)
    }
}

/// Bitstream writer into a growable buffer.
///
/// Writes bits in MSB-first order. Complete bytes go straight to the output
/// buffer; at most 7 pending bits are held in the accumulator.
pub struct BitWriter {
    /// Output byte buffer
    data: Vec<u8>,
    /// Pending bits, right-aligned
    acc: u64,
    /// Number of pending bits in `acc` (0-7 between calls)
    bit_count: u32,
}

impl BitWriter {
    /// Create a new BitWriter with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Create a new BitWriter with specified initial capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            data: Vec::with_capacity(capacity),
            acc: 0,
            bit_count: 0,
        }
    }

    /// Write a single bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u64, 1);
    }

    /// Write the low n bits of value (n <= 64).
    pub fn write_bits(&mut self, value: u64, n: u32) {
        debug_assert!(n <= 64);
        let mut left = n;
        while left > 0 {
            let take = left.min(56);
            let chunk = (value >> (left - take)) & ((1u64 << take) - 1);
            self.acc = (self.acc << take) | chunk;
            self.bit_count += take;
            left -= take;

            while self.bit_count >= 8 {
                self.bit_count -= 8;
                self.data.push((self.acc >> self.bit_count) as u8);
            }
            self.acc &= (1u64 << self.bit_count) - 1;
        }
    }

    /// Write an n-bit two's complement value.
    #[inline]
    pub fn write_signed(&mut self, value: i64, n: u32) {
        self.write_bits(value as u64, n);
    }

    /// Write a unary code: `zeros` 0 bits followed by a 1 bit.
    pub fn write_unary(&mut self, zeros: u64) {
        let mut left = zeros;
        while left > 0 {
            let run = left.min(32);
            self.write_bits(0, run as u32);
            left -= run;
        }
        self.write_bits(1, 1);
    }

    /// Write a zigzag-folded Rice code with the given parameter.
    pub fn write_rice(&mut self, value: i64, param: u32) {
        let folded = ((value << 1) ^ (value >> 63)) as u64;
        self.write_unary(folded >> param);
        self.write_bits(folded, param);
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align_to_byte(&mut self) {
        if self.bit_count > 0 {
            self.write_bits(0, 8 - self.bit_count);
        }
    }

    /// Check whether the writer is on a byte boundary.
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.bit_count == 0
    }

    /// Total number of bits written.
    #[inline]
    pub fn bit_len(&self) -> u64 {
        self.data.len() as u64 * 8 + self.bit_count as u64
    }

    /// Complete bytes written so far.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Pad to a byte boundary and return the buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.data
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
