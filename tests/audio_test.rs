use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tokio_test::{assert_err, assert_ok};

use voiceguard::services::audio::{
    decode_base64_audio, supported_formats, validate_audio, TARGET_SAMPLE_RATE,
};

fn sine(freq: f32, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let n = (duration_secs * sample_rate as f32) as usize;
    (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            0.5 * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect()
}

/// Minimal mono 16-bit PCM WAV encoder for fixtures.
fn wav_bytes(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + samples.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn wav_base64(samples: &[f32], sample_rate: u32) -> String {
    BASE64.encode(wav_bytes(samples, sample_rate))
}

#[test]
fn test_decode_wav_at_target_rate() {
    let samples = sine(440.0, 1.0, TARGET_SAMPLE_RATE);
    let encoded = wav_base64(&samples, TARGET_SAMPLE_RATE);

    let decoded = assert_ok!(decode_base64_audio(&encoded, "wav"));
    assert_eq!(decoded.len(), samples.len());

    let peak = decoded.iter().fold(0.0f32, |a, &v| a.max(v.abs()));
    assert!((peak - 0.5).abs() < 0.01, "peak {peak}");
}

#[test]
fn test_decode_resamples_to_target_rate() {
    let samples = sine(440.0, 1.0, 44_100);
    let encoded = wav_base64(&samples, 44_100);

    let decoded = assert_ok!(decode_base64_audio(&encoded, "wav"));

    // One second of input should come back as roughly one second at 16 kHz.
    let expected = TARGET_SAMPLE_RATE as i64;
    assert!(
        (decoded.len() as i64 - expected).abs() < 800,
        "resampled to {} samples",
        decoded.len()
    );
    assert_ok!(validate_audio(&decoded, TARGET_SAMPLE_RATE));
}

#[test]
fn test_decode_strips_data_url_prefix() {
    let samples = sine(440.0, 1.0, TARGET_SAMPLE_RATE);
    let encoded = format!("data:audio/wav;base64,{}", wav_base64(&samples, TARGET_SAMPLE_RATE));

    let decoded = assert_ok!(decode_base64_audio(&encoded, "wav"));
    assert_eq!(decoded.len(), samples.len());
}

#[test]
fn test_decode_tolerates_embedded_whitespace() {
    let samples = sine(440.0, 1.0, TARGET_SAMPLE_RATE);
    let encoded = wav_base64(&samples, TARGET_SAMPLE_RATE);
    let wrapped = format!("{}\n{}\r\n  {}", &encoded[..40], &encoded[40..90], &encoded[90..]);

    let decoded = assert_ok!(decode_base64_audio(&wrapped, "wav"));
    assert_eq!(decoded.len(), samples.len());
}

#[test]
fn test_decode_rejects_invalid_base64() {
    let err = assert_err!(decode_base64_audio("not base64 at all!!!", "wav"));
    assert!(!err.is_validation());
    assert!(err.to_string().contains("Invalid base64"), "{err}");
}

#[test]
fn test_decode_rejects_non_audio_bytes() {
    let garbage: Vec<u8> = (0..400).map(|i| (i % 251) as u8).collect();
    let encoded = BASE64.encode(&garbage);

    let err = assert_err!(decode_base64_audio(&encoded, "mp3"));
    assert!(!err.is_validation());
}

#[test]
fn test_validate_rejects_short_audio() {
    let samples = sine(200.0, 0.3, TARGET_SAMPLE_RATE);
    let err = assert_err!(validate_audio(&samples, TARGET_SAMPLE_RATE));
    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "Audio too short. Minimum 0.5 seconds required."
    );
}

#[test]
fn test_validate_rejects_long_audio() {
    let samples = vec![0.1f32; (301 * TARGET_SAMPLE_RATE) as usize];
    let err = assert_err!(validate_audio(&samples, TARGET_SAMPLE_RATE));
    assert_eq!(err.to_string(), "Audio too long. Maximum 5 minutes allowed.");
}

#[test]
fn test_validate_rejects_silent_audio() {
    let samples = vec![0.0005f32; TARGET_SAMPLE_RATE as usize];
    let err = assert_err!(validate_audio(&samples, TARGET_SAMPLE_RATE));
    assert_eq!(
        err.to_string(),
        "Audio appears to be silent or corrupted."
    );
}

#[test]
fn test_validate_accepts_normal_audio() {
    let samples = sine(200.0, 1.0, TARGET_SAMPLE_RATE);
    assert_ok!(validate_audio(&samples, TARGET_SAMPLE_RATE));
}

#[test]
fn test_supported_formats() {
    let formats = supported_formats();
    assert!(formats.contains(&"mp3"));
    assert!(formats.contains(&"wav"));
}
