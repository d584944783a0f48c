//! FLAC frame decoder backed by Symphonia
//!
//! Metadata blocks are walked directly over the in-memory stream so that
//! STREAMINFO and the block sequence can be checked before any audio is
//! touched. Audio frames are handed to Symphonia's FLAC reader and decoder,
//! one frame per [`FrameDecoder::read_block`] call.

use super::metadata::{BlockType, MetadataBlock, MetadataBlockHeader, StreamInfo};
use super::FLAC_MAGIC;
use crate::codec::decoder::FrameDecoder;
use crate::error::{Error, Result};
use crate::format::SampleMatrix;
use std::io::{self, Cursor};
use std::ops::Range;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::default::codecs::FlacDecoder;
use symphonia::default::formats::FlacReader;
use tracing::{debug, trace};

/// Highest STREAMINFO sample rate Symphonia accepts
///
/// Frames of faster streams always defer their rate to STREAMINFO, so the
/// reader is given a copy with the rate clamped to this value.
const MAX_PLAYBACK_RATE: u32 = 655_350;

/// Smallest possible frame: 6 header bytes, 2 bytes of subframes, CRC-16
pub const MIN_FRAME_LEN: u64 = 10;

struct Playback {
    reader: FlacReader,
    decoder: FlacDecoder,
    track_id: u32,
}

/// FLAC frame decoder over a complete in-memory stream
pub struct SymphoniaFrameDecoder {
    stream: Vec<u8>,
    pos: usize,
    metadata_done: bool,
    stream_info: Option<StreamInfo>,
    stream_info_at: Option<usize>,
    frame_bytes: Option<u64>,
    playback: Option<Playback>,
    frames_decoded: u64,
}

impl SymphoniaFrameDecoder {
    /// Create a decoder over a stream starting with the `fLaC` marker
    pub fn new(stream: Vec<u8>) -> Result<Self> {
        if !stream.starts_with(FLAC_MAGIC) {
            return Err(Error::structural("Not a FLAC stream: missing 'fLaC' marker"));
        }
        Ok(SymphoniaFrameDecoder {
            stream,
            pos: FLAC_MAGIC.len(),
            metadata_done: false,
            stream_info: None,
            stream_info_at: None,
            frame_bytes: None,
            playback: None,
            frames_decoded: 0,
        })
    }

    /// STREAMINFO, once it has been read
    pub fn stream_info(&self) -> Option<&StreamInfo> {
        self.stream_info.as_ref()
    }

    /// Frames decoded so far
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    fn take(&mut self, len: usize, what: &str) -> Result<Range<usize>> {
        let start = self.pos;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.stream.len())
            .ok_or_else(|| {
                Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("FLAC stream truncated in {}", what),
                ))
            })?;
        self.pos = end;
        Ok(start..end)
    }

    /// Hand the stream to Symphonia once the metadata has been walked
    fn open(&mut self, info: &StreamInfo) -> Result<Playback> {
        let mut bytes = std::mem::take(&mut self.stream);
        if info.params.sample_rate > MAX_PLAYBACK_RATE {
            if let Some(at) = self.stream_info_at {
                let mut clamped = *info;
                clamped.params.sample_rate = MAX_PLAYBACK_RATE;
                bytes[at..at + StreamInfo::PAYLOAD_SIZE].copy_from_slice(&clamped.to_payload());
            }
        }

        let source = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
        let reader =
            FlacReader::try_new(source, &FormatOptions::default()).map_err(symphonia_error)?;
        let track = reader
            .default_track()
            .ok_or_else(|| Error::structural("FLAC stream has no audio track"))?;
        let track_id = track.id;
        let decoder = FlacDecoder::try_new(&track.codec_params, &DecoderOptions::default())
            .map_err(symphonia_error)?;

        Ok(Playback {
            reader,
            decoder,
            track_id,
        })
    }
}

/// Map a Symphonia failure onto the crate's error kinds
fn symphonia_error(err: SymphoniaError) -> Error {
    match err {
        SymphoniaError::IoError(e) => Error::Io(e),
        SymphoniaError::DecodeError(msg) => Error::codec(msg),
        SymphoniaError::Unsupported(msg) => Error::unsupported(msg),
        SymphoniaError::LimitError(msg) => Error::range(msg),
        other => Error::codec(other.to_string()),
    }
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn read_metadata_block(&mut self) -> Result<Option<MetadataBlock>> {
        if self.metadata_done {
            return Ok(None);
        }

        let range = self.take(MetadataBlockHeader::SIZE, "metadata block header")?;
        let mut header_bytes = [0u8; MetadataBlockHeader::SIZE];
        header_bytes.copy_from_slice(&self.stream[range]);
        let header = MetadataBlockHeader::from_bytes(header_bytes);
        let payload = self.take(header.length as usize, "metadata block")?;

        let block = match header.block_type {
            BlockType::StreamInfo => {
                if self.stream_info.is_some() {
                    return Err(Error::structural("Duplicate STREAMINFO block"));
                }
                let payload_at = payload.start;
                let info = StreamInfo::parse(&self.stream[payload])?;
                debug!(
                    "STREAMINFO: {} Hz, {} channels, {} bits, {} samples",
                    info.params.sample_rate,
                    info.params.num_channels,
                    info.params.sample_depth,
                    info.params.num_samples
                );
                self.stream_info = Some(info);
                self.stream_info_at = Some(payload_at);
                MetadataBlock::StreamInfo(info)
            }
            BlockType::Invalid => {
                return Err(Error::structural("Invalid metadata block type 127"));
            }
            block_type => {
                debug!("Skipping {:?} metadata block ({} bytes)", block_type, header.length);
                MetadataBlock::Other {
                    block_type,
                    length: header.length,
                }
            }
        };

        if header.is_last {
            self.metadata_done = true;
            self.frame_bytes = Some((self.stream.len() - self.pos) as u64);
        }
        Ok(Some(block))
    }

    fn frame_bytes(&self) -> Option<u64> {
        self.frame_bytes
    }

    fn read_block(&mut self, samples: &mut SampleMatrix, offset: usize) -> Result<usize> {
        if !self.metadata_done {
            return Err(Error::structural(
                "Audio frames requested before the last metadata block",
            ));
        }
        let info = self
            .stream_info
            .ok_or_else(|| Error::structural("Missing STREAMINFO block"))?;

        if self.playback.is_none() {
            match self.open(&info) {
                Ok(playback) => self.playback = Some(playback),
                // No frame to synchronize to
                Err(e) if e.is_io() && offset == samples.num_samples() => return Ok(0),
                Err(e) => return Err(e),
            }
        }
        let Some(playback) = self.playback.as_mut() else {
            return Ok(0);
        };

        let packet = loop {
            match playback.reader.next_packet() {
                Ok(packet) if packet.track_id() == playback.track_id => break packet,
                Ok(_) => continue,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    return Ok(0);
                }
                Err(e) => return Err(symphonia_error(e)),
            }
        };

        // The reader drops frames failing their CRC and resumes at the next intact one
        if packet.ts() != offset as u64 {
            return Err(Error::codec(format!(
                "Frame {} is corrupt: next intact frame starts at sample {}, expected {}",
                self.frames_decoded,
                packet.ts(),
                offset
            )));
        }

        let decoded = playback.decoder.decode(&packet).map_err(symphonia_error)?;
        let AudioBufferRef::S32(buf) = decoded else {
            return Err(Error::codec("FLAC decoder produced non 32-bit samples"));
        };

        let len = buf.frames();
        let channels = buf.spec().channels.count();
        if channels != samples.num_channels() {
            return Err(Error::structural(format!(
                "Frame {} has {} channels, STREAMINFO declares {}",
                self.frames_decoded,
                channels,
                samples.num_channels()
            )));
        }
        if offset + len > samples.num_samples() {
            return Err(Error::structural(format!(
                "Frame {} overruns the declared {} samples",
                self.frames_decoded,
                samples.num_samples()
            )));
        }

        // Decoded samples are left-justified in 32 bits
        let shift = 32 - info.params.sample_depth as u32;
        for (ch, target) in samples.channels_mut().iter_mut().enumerate() {
            for (slot, &value) in target[offset..offset + len].iter_mut().zip(buf.chan(ch)) {
                *slot = value >> shift;
            }
        }

        trace!(
            "Frame {}: {} samples, {} bytes",
            self.frames_decoded,
            len,
            packet.buf().len()
        );
        self.frames_decoded += 1;
        Ok(len)
    }
}
