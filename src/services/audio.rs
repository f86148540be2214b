use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rubato::{FftFixedIn, Resampler};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// All analysis runs at this rate; decoded audio is resampled to match.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

const MIN_DURATION_SECS: f32 = 0.5;
const MAX_DURATION_SECS: f32 = 300.0;
const SILENCE_PEAK: f32 = 0.001;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid base64 encoding: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("Unsupported or corrupt audio stream: {0}")]
    Codec(String),
    #[error("No decodable audio frames found")]
    Empty,
    #[error("Resampling failed: {0}")]
    Resample(String),
    #[error("Audio too short. Minimum 0.5 seconds required.")]
    TooShort,
    #[error("Audio too long. Maximum 5 minutes allowed.")]
    TooLong,
    #[error("Audio appears to be silent or corrupted.")]
    Silent,
}

impl AudioError {
    /// Validation failures surface their message as-is; everything else gets
    /// reported as a decode failure by the handler.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AudioError::TooShort | AudioError::TooLong | AudioError::Silent
        )
    }
}

pub fn supported_formats() -> Vec<&'static str> {
    vec!["mp3", "wav"]
}

/// Decode a base64 audio payload into mono samples at [`TARGET_SAMPLE_RATE`].
///
/// A data-URL prefix ("data:audio/mpeg;base64,...") is stripped, as is any
/// whitespace a client leaked into the payload.
pub fn decode_base64_audio(audio_base64: &str, format: &str) -> Result<Vec<f32>, AudioError> {
    let payload = match audio_base64.split_once(',') {
        Some((_, rest)) => rest,
        None => audio_base64,
    };
    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64.decode(cleaned.as_bytes())?;

    let (samples, sample_rate) = decode_audio_bytes(bytes, format)?;
    if samples.is_empty() {
        return Err(AudioError::Empty);
    }

    if sample_rate == TARGET_SAMPLE_RATE {
        Ok(samples)
    } else {
        resample(&samples, sample_rate, TARGET_SAMPLE_RATE)
    }
}

/// Validate the decoded signal against the service limits.
pub fn validate_audio(y: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    let duration = y.len() as f32 / sample_rate as f32;
    if duration < MIN_DURATION_SECS {
        return Err(AudioError::TooShort);
    }
    if duration > MAX_DURATION_SECS {
        return Err(AudioError::TooLong);
    }

    let peak = y.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
    if peak < SILENCE_PEAK {
        return Err(AudioError::Silent);
    }
    Ok(())
}

fn decode_audio_bytes(bytes: Vec<u8>, extension: &str) -> Result<(Vec<f32>, u32), AudioError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(extension);

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Codec(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(AudioError::Empty)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Codec(e.to_string()))?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(TARGET_SAMPLE_RATE);
    let mut mono: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Codec(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_buf.is_none() {
                    sample_rate = spec.rate;
                    sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
                }
                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    let channels = spec.channels.count().max(1);
                    if channels == 1 {
                        mono.extend_from_slice(buf.samples());
                    } else {
                        for frame in buf.samples().chunks_exact(channels) {
                            mono.push(frame.iter().sum::<f32>() / channels as f32);
                        }
                    }
                }
            }
            // A corrupt frame is skipped rather than failing the whole clip.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(AudioError::Codec(e.to_string())),
        }
    }

    Ok((mono, sample_rate))
}

fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    const CHUNK: usize = 1024;

    let mut resampler = FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, CHUNK, 2, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let estimated = samples.len() as u64 * to_rate as u64 / from_rate.max(1) as u64;
    let mut out: Vec<f32> = Vec::with_capacity(estimated as usize + CHUNK);

    let mut pos = 0;
    while pos + CHUNK <= samples.len() {
        let chunk = [&samples[pos..pos + CHUNK]];
        let blocks = resampler
            .process(&chunk, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&blocks[0]);
        pos += CHUNK;
    }
    if pos < samples.len() {
        let tail = [&samples[pos..]];
        let blocks = resampler
            .process_partial(Some(&tail), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&blocks[0]);
    }
    let flush = resampler
        .process_partial::<&[f32]>(None, None)
        .map_err(|e| AudioError::Resample(e.to_string()))?;
    out.extend_from_slice(&flush[0]);

    Ok(out)
}
