//! Audio payload decoding.
//!
//! Two decode paths exist: streaming chunks from the remote session are
//! base64-encoded raw 16-bit little-endian PCM at a fixed 48 kHz stereo
//! format, while reference-track files arrive as arbitrary containers and
//! go through symphonia's probe.

use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Sample rate of inbound streaming chunks.
pub const CHUNK_SAMPLE_RATE: u32 = 48_000;

/// Channel count of inbound streaming chunks.
pub const CHUNK_CHANNELS: u16 = 2;

/// A decoded PCM buffer, interleaved `f32`.
///
/// Once handed to an output for scheduling, ownership transfers and the
/// buffer is never mutated again.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Extract the first channel as a mono sample vector.
    pub fn first_channel(&self) -> Vec<f32> {
        self.samples
            .iter()
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }
}

/// Decode a streaming audio chunk payload.
///
/// The payload is base64 over interleaved i16le PCM, 48 kHz stereo.
pub fn decode_chunk(payload: &str) -> Result<PcmBuffer> {
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| Error::Decode(format!("invalid chunk encoding: {e}")))?;

    if bytes.is_empty() {
        return Err(Error::Decode("empty audio chunk".into()));
    }
    if bytes.len() % 2 != 0 {
        return Err(Error::Decode("truncated 16-bit sample".into()));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect();

    Ok(PcmBuffer {
        samples,
        channels: CHUNK_CHANNELS,
        sample_rate: CHUNK_SAMPLE_RATE,
    })
}

/// Decode an in-memory audio file (any container/codec symphonia probes).
pub fn decode_bytes(bytes: &[u8]) -> Result<PcmBuffer> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::Decode(format!("unrecognized audio format: {e}")))?;

    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| Error::Decode("no audio track".into()))?;

    let sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2) as u16;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("unsupported codec: {e}")))?;

    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| Error::Decode(e.to_string()))?;
        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(Error::Decode("no audio data".into()));
    }

    Ok(PcmBuffer {
        samples,
        channels,
        sample_rate,
    })
}
