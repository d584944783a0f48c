//! Content digest computation and verification
//!
//! The digest is the MD5 of the samples interleaved in sample order, each
//! written as `depth / 8` little-endian bytes of its two's complement value.
//! 8-bit samples are hashed signed, without the WAV offset of 128.

use crate::error::{Error, Result};
use crate::format::SampleMatrix;
use std::fmt;
use tracing::{debug, warn};

const DIGEST_CHUNK: usize = 64 * 1024;

/// Outcome of comparing a stored digest with the decoded samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestStatus {
    /// No digest was stored (all zero)
    Absent,
    /// Stored and computed digests agree
    Match,
    /// Stored and computed digests differ
    Mismatch,
}

impl fmt::Display for DigestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DigestStatus::Absent => "absent",
            DigestStatus::Match => "match",
            DigestStatus::Mismatch => "mismatch",
        };
        f.write_str(s)
    }
}

/// Compute the content digest of `samples` at `depth` bits
pub fn compute_digest(samples: &SampleMatrix, depth: u16) -> [u8; 16] {
    let width = (depth / 8) as usize;
    let mut context = md5::Context::new();
    let mut buffer = Vec::with_capacity(DIGEST_CHUNK + 32);

    for i in 0..samples.num_samples() {
        for channel in samples.channels() {
            buffer.extend_from_slice(&channel[i].to_le_bytes()[..width]);
        }
        if buffer.len() >= DIGEST_CHUNK {
            context.consume(&buffer);
            buffer.clear();
        }
    }
    context.consume(&buffer);

    context.compute().0
}

/// Compare a stored digest with a computed one
pub fn classify(stored: &[u8; 16], computed: &[u8; 16]) -> DigestStatus {
    if stored.iter().all(|&b| b == 0) {
        DigestStatus::Absent
    } else if stored == computed {
        DigestStatus::Match
    } else {
        DigestStatus::Mismatch
    }
}

/// Check `samples` against a stored digest
///
/// A mismatch is an [`Error::Integrity`]; an absent digest is only logged.
pub fn verify(stored: &[u8; 16], samples: &SampleMatrix, depth: u16) -> Result<DigestStatus> {
    let computed = compute_digest(samples, depth);
    match classify(stored, &computed) {
        DigestStatus::Absent => {
            warn!("Stream carries no MD5 digest; decoded samples cannot be verified");
            Ok(DigestStatus::Absent)
        }
        DigestStatus::Match => {
            debug!("MD5 digest verified: {}", hex(&computed));
            Ok(DigestStatus::Match)
        }
        DigestStatus::Mismatch => Err(Error::integrity(format!(
            "MD5 mismatch: stored {}, computed {}",
            hex(stored),
            hex(&computed)
        ))),
    }
}

/// Lowercase hex rendering of a digest
pub fn hex(digest: &[u8; 16]) -> String {
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_of_nothing() {
        let samples = SampleMatrix::new(vec![vec![]]).unwrap();
        assert_eq!(hex(&compute_digest(&samples, 16)), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_digest_byte_order() {
        // Interleaved little-endian bytes: 01 00 | ff ff | 02 00 | 00 80
        let samples = SampleMatrix::new(vec![vec![1, 2], vec![-1, -32768]]).unwrap();
        let expected = md5::compute([0x01, 0x00, 0xFF, 0xFF, 0x02, 0x00, 0x00, 0x80]).0;
        assert_eq!(compute_digest(&samples, 16), expected);
    }

    #[test]
    fn test_digest_8_bit_is_signed() {
        let samples = SampleMatrix::new(vec![vec![-128, 0, 127]]).unwrap();
        assert_eq!(compute_digest(&samples, 8), md5::compute([0x80, 0x00, 0x7F]).0);
    }

    #[test]
    fn test_classify() {
        let digest = [7u8; 16];
        assert_eq!(classify(&[0; 16], &digest), DigestStatus::Absent);
        assert_eq!(classify(&digest, &digest), DigestStatus::Match);
        assert_eq!(classify(&[8; 16], &digest), DigestStatus::Mismatch);
    }

    #[test]
    fn test_verify() {
        let mut samples = SampleMatrix::new(vec![vec![10, -20, 30]]).unwrap();
        let stored = compute_digest(&samples, 24);
        assert_eq!(verify(&stored, &samples, 24).unwrap(), DigestStatus::Match);
        assert_eq!(verify(&[0; 16], &samples, 24).unwrap(), DigestStatus::Absent);

        samples.channels_mut()[0][1] = -21;
        assert!(matches!(verify(&stored, &samples, 24), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_large_input_spans_chunks() {
        let ch: Vec<i32> = (0..40_000).map(|i| i * 7 - 140_000).collect();
        let samples = SampleMatrix::new(vec![ch.clone(), ch.clone()]).unwrap();

        let mut bytes = Vec::new();
        for v in &ch {
            bytes.extend_from_slice(&v.to_le_bytes()[..3]);
            bytes.extend_from_slice(&v.to_le_bytes()[..3]);
        }
        assert_eq!(compute_digest(&samples, 24), md5::compute(&bytes).0);
    }
}
