//! Integration Tests
//!
//! End-to-end tests for the record -> transform -> encode pipeline.

use approx::assert_abs_diff_eq;
use pretty_assertions::assert_eq;

use glassy_audio::engine::{
    audio_buffer_to_wav, concat_buffers, create_buffer, download_audio_buffer_as_wav,
    generate_test_tone, import_audio, normalize_buffer, peak_amplitude, remove_silence,
    slice_buffer, trim_silence, AudioBuffer, WavHeader,
};

const RATE: u32 = 44100;

fn filled(value: f32, channels: usize, duration_secs: f64) -> AudioBuffer {
    let mut buffer = create_buffer(RATE, channels, duration_secs).unwrap();
    for channel in buffer.channels_mut() {
        channel.fill(value);
    }
    buffer
}

fn pcm_samples(bytes: &[u8]) -> Vec<i16> {
    bytes[44..]
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// A "recording": silence, speech-like square wave, silence, in two channels
fn voice_note() -> AudioBuffer {
    let silence = create_buffer(RATE, 2, 0.25).unwrap();
    let mut speech = create_buffer(RATE, 2, 0.5).unwrap();
    for channel in speech.channels_mut() {
        for (i, sample) in channel.iter_mut().enumerate() {
            *sample = if (i / 40) % 2 == 0 { 0.2 } else { -0.2 };
        }
    }
    concat_buffers(&[&silence, &speech, &silence]).unwrap().unwrap()
}

// === Encoder size and header properties ===

#[test]
fn test_encoded_size_formula() {
    for (channels, duration) in [(1, 0.5), (2, 0.25), (3, 0.125)] {
        let buffer = filled(0.1, channels, duration);
        let blob = audio_buffer_to_wav(&buffer).unwrap();
        assert_eq!(blob.size(), 44 + buffer.len() * channels * 2);

        let bytes = blob.as_bytes();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");
    }
}

#[test]
fn test_one_second_mono_is_88244_bytes() {
    let buffer = filled(0.5, 1, 1.0);
    let blob = audio_buffer_to_wav(&buffer).unwrap();
    assert_eq!(blob.size(), 88244);
}

#[test]
fn test_zero_length_buffer_header() {
    let buffer = create_buffer(RATE, 2, 0.0).unwrap();
    let blob = audio_buffer_to_wav(&buffer).unwrap();

    assert_eq!(blob.size(), 44);
    let header = WavHeader::parse(blob.as_bytes()).unwrap();
    assert_eq!(header.data_size, 0);
    assert_eq!(header.channels, 2);
    assert_eq!(header.sample_rate, RATE);
}

#[test]
fn test_amplitude_encoding() {
    for (value, expected) in [(0.5, 16384), (-0.5, -16384), (1.0, 32767), (-1.0, -32768)] {
        let blob = audio_buffer_to_wav(&filled(value, 1, 0.01)).unwrap();
        assert!(pcm_samples(blob.as_bytes()).iter().all(|&s| s == expected));
    }
}

#[test]
fn test_stereo_alternates_channels() {
    let mut buffer = create_buffer(RATE, 2, 0.01).unwrap();
    buffer.channel_mut(0).fill(0.5);
    buffer.channel_mut(1).fill(0.7);

    let samples = pcm_samples(audio_buffer_to_wav(&buffer).unwrap().as_bytes());
    assert_eq!(samples.len(), buffer.len() * 2);
    for frame in samples.chunks_exact(2) {
        assert_eq!(frame[0], 16384);
        assert!((frame[1] - 22938).abs() <= 1);
    }
}

// === Buffer utility properties ===

#[test]
fn test_slice_length_and_content() {
    let buffer = generate_test_tone(220.0, 1.0, RATE, 2, 0.9).unwrap();
    let (t0, t1) = (0.1, 0.35);
    let sliced = slice_buffer(&buffer, t0, t1).unwrap();

    let start = (t0 * RATE as f64).floor() as usize;
    let end = (t1 * RATE as f64).floor() as usize;
    assert_eq!(sliced.len(), end - start);
    for ch in 0..2 {
        assert_eq!(sliced.channel(ch), &buffer.channel(ch)[start..end]);
    }
}

#[test]
fn test_concat_lengths_and_order() {
    let empty: Vec<AudioBuffer> = Vec::new();
    assert!(concat_buffers(&empty).unwrap().is_none());

    let a = filled(0.25, 1, 0.01);
    let b = filled(-0.75, 1, 0.02);
    let joined = concat_buffers(&[&a, &b]).unwrap().unwrap();

    assert_eq!(joined.len(), a.len() + b.len());
    assert_eq!(&joined.channel(0)[..a.len()], a.channel(0));
    assert_eq!(&joined.channel(0)[a.len()..], b.channel(0));
}

#[test]
fn test_normalize_then_encode_hits_target() {
    let mut buffer = generate_test_tone(440.0, 0.5, RATE, 1, 0.2).unwrap();
    let peak_before = peak_amplitude(&buffer);

    normalize_buffer(&mut buffer, 0.89);
    assert_abs_diff_eq!(peak_amplitude(&buffer), 0.89, epsilon = 1e-5);

    normalize_buffer(&mut buffer, 0.89);
    assert_abs_diff_eq!(peak_amplitude(&buffer), 0.89, epsilon = 1e-5);

    let max_pcm = pcm_samples(audio_buffer_to_wav(&buffer).unwrap().as_bytes())
        .iter()
        .map(|s| (*s as i32).abs())
        .max()
        .unwrap();
    assert!(peak_before < 0.21);
    assert!((max_pcm - (0.89 * 32767.0_f64).round() as i32).abs() <= 2);
}

#[test]
fn test_remove_silence_on_voice_note() {
    let note = voice_note();
    let segments = remove_silence(&note, 0.01, 0.1);

    assert_eq!(segments.len(), 1);
    let one_sample = 1.0 / RATE as f64;
    assert!((segments[0].start - 0.25).abs() <= one_sample);
    assert!((segments[0].end - 0.75).abs() <= one_sample);
}

#[test]
fn test_silent_buffer_has_no_segments() {
    let buffer = filled(0.001, 1, 0.5);
    assert!(remove_silence(&buffer, 0.01, 0.1).is_empty());
}

// === Full pipeline ===

#[test]
fn test_trim_normalize_download_import() {
    let dir = tempfile::tempdir().unwrap();

    let note = voice_note();
    let mut trimmed = trim_silence(&note, 0.01, 0.1).unwrap().unwrap();
    assert_eq!(trimmed.len(), create_buffer(RATE, 1, 0.5).unwrap().len());

    normalize_buffer(&mut trimmed, 0.5);
    let path = download_audio_buffer_as_wav(&trimmed, dir.path(), Some("note.wav")).unwrap();

    let imported = import_audio(&path).unwrap();
    assert_eq!(imported.number_of_channels(), 2);
    assert_eq!(imported.sample_rate(), RATE);
    assert_eq!(imported.len(), trimmed.len());
    for (orig, imp) in trimmed.channel(1).iter().zip(imported.channel(1)) {
        assert_abs_diff_eq!(*orig, *imp, epsilon = 1e-4);
    }
}
