//! File-level encode and decode pipelines
//!
//! Each pipeline reads and validates its whole input before the output is
//! created, so a rejected input never leaves a file behind. File handles live
//! only as long as the call that opened them.

use crate::codec::flac::StreamInfo;
use crate::codec::EncoderConfig;
use crate::error::Result;
use crate::format::flac::{FlacDemuxer, FlacMuxer};
use crate::format::wav::{WavDemuxer, WavMuxer};
use crate::format::{SampleMatrix, SeekableSink, StreamParameters};
use crate::integrity::{self, DigestStatus};
use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;
use tracing::info;

/// Result of a decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeReport {
    /// Stream parameters read from STREAMINFO
    pub params: StreamParameters,
    /// Outcome of the digest check
    pub digest: DigestStatus,
}

/// Encode a WAV file into a FLAC file
pub fn encode_file(input: &Path, output: &Path, config: &EncoderConfig) -> Result<StreamInfo> {
    info!("Encoding {} -> {}", input.display(), output.display());
    let demuxer = WavDemuxer::open(input)?;
    let params = demuxer.stream_parameters();
    let samples = demuxer.read_samples()?;
    log_input(&params);

    let file = File::create(output)?;
    let mut sink = SeekableSink::new(BufWriter::new(file))?;
    let stream_info = FlacMuxer::new(*config).encode(&mut sink, &samples, params)?;
    sink.into_inner().flush()?;

    Ok(stream_info)
}

/// Decode a FLAC file into a WAV file, verifying the content digest
pub fn decode_file(input: &Path, output: &Path) -> Result<DecodeReport> {
    info!("Decoding {} -> {}", input.display(), output.display());
    let (samples, params) = FlacDemuxer::open(input)?.read_all()?;
    let digest = check(&samples, &params)?;

    WavMuxer::create(output)?.write(&samples, &params)?;

    Ok(DecodeReport { params, digest })
}

/// Encode an in-memory WAV stream into FLAC bytes
pub fn encode_bytes(wav: &[u8], config: &EncoderConfig) -> Result<(Vec<u8>, StreamInfo)> {
    let (samples, params) = WavDemuxer::parse(wav)?;
    let mut sink = SeekableSink::new(Cursor::new(Vec::new()))?;
    let stream_info = FlacMuxer::new(*config).encode(&mut sink, &samples, params)?;
    Ok((sink.into_inner().into_inner(), stream_info))
}

/// Decode in-memory FLAC bytes into a WAV stream, verifying the digest
pub fn decode_bytes(flac: &[u8]) -> Result<(Vec<u8>, DecodeReport)> {
    let (samples, params) = FlacDemuxer::decode(flac)?;
    let digest = check(&samples, &params)?;

    let mut muxer = WavMuxer::new(Vec::new());
    muxer.write(&samples, &params)?;
    Ok((muxer.into_inner(), DecodeReport { params, digest }))
}

fn check(samples: &SampleMatrix, params: &StreamParameters) -> Result<DigestStatus> {
    let status = integrity::verify(&params.content_digest, samples, params.sample_depth)?;
    info!("Digest check: {}", status);
    Ok(status)
}

fn log_input(params: &StreamParameters) {
    info!(
        "Input: {} Hz, {} channels, {} bits, {} samples ({:.2}s)",
        params.sample_rate,
        params.num_channels,
        params.sample_depth,
        params.num_samples,
        params.duration_seconds()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::SearchEffort;
    use crate::error::Error;

    fn wav_bytes(samples: &SampleMatrix, params: &StreamParameters) -> Vec<u8> {
        let mut muxer = WavMuxer::new(Vec::new());
        muxer.write(samples, params).unwrap();
        muxer.into_inner()
    }

    #[test]
    fn test_bytes_roundtrip_is_identical() {
        let samples =
            SampleMatrix::new(vec![vec![0, 1, -1, 32767], vec![-32768, 0, 100, -100]]).unwrap();
        let params = StreamParameters::new(44100, 2, 16, 4);
        let wav = wav_bytes(&samples, &params);

        let config = EncoderConfig::new(1152, SearchEffort::Medium);
        let (flac, info) = encode_bytes(&wav, &config).unwrap();
        assert_eq!(info.params.num_samples, 4);

        let (decoded, report) = decode_bytes(&flac).unwrap();
        assert_eq!(decoded, wav);
        assert_eq!(report.digest, DigestStatus::Match);
        assert_eq!(report.params.content_digest, info.params.content_digest);
    }

    #[test]
    fn test_corrupted_sample_fails_integrity() {
        let samples = SampleMatrix::new(vec![(0..500).map(|i| i * 3).collect()]).unwrap();
        let params = StreamParameters::new(8000, 1, 16, 500);
        let wav = wav_bytes(&samples, &params);
        let (mut flac, info) = encode_bytes(&wav, &EncoderConfig::fast()).unwrap();

        // Swap in a digest of different samples; frames stay valid
        let mut other = samples.channels().to_vec();
        other[0][10] += 1;
        let other = SampleMatrix::new(other).unwrap();
        let mut forged = info;
        forged.params.content_digest = integrity::compute_digest(&other, 16);
        flac[4..42].copy_from_slice(&forged.to_block_bytes(true));

        assert!(matches!(decode_bytes(&flac), Err(Error::Integrity(_))));
    }

    #[test]
    fn test_absent_digest_decodes() {
        let samples = SampleMatrix::new(vec![vec![5, 6, 7]]).unwrap();
        let params = StreamParameters::new(22050, 1, 24, 3);
        let wav = wav_bytes(&samples, &params);
        let (mut flac, info) = encode_bytes(&wav, &EncoderConfig::default()).unwrap();

        let mut cleared = info;
        cleared.params.content_digest = [0; 16];
        flac[4..42].copy_from_slice(&cleared.to_block_bytes(true));

        let (_, report) = decode_bytes(&flac).unwrap();
        assert_eq!(report.digest, DigestStatus::Absent);
    }

    #[test]
    fn test_rejected_input_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        let output = dir.path().join("out.flac");
        std::fs::write(&input, b"RIFX\x24\x00\x00\x00WAVE").unwrap();

        let err = encode_file(&input, &output, &EncoderConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Structural(_)));
        assert!(!output.exists());
    }
}
