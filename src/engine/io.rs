//! Audio file I/O
//!
//! Decodes WAV files into [`AudioBuffer`]s at their native sample rate and
//! channel count, and generates test tones. Encoding lives in
//! [`crate::engine::wav`].

use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::debug;

use crate::engine::buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// Import a WAV file as 32-bit float samples
///
/// Integer formats are scaled by their full-scale magnitude (e.g. 32768 for
/// 16-bit) so that decoded values lie in [-1.0, 1.0).
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a valid WAV file
/// * `UnsupportedFormat` - If the bit depth is not 8, 16, 24 or 32
pub fn import_audio(path: &Path) -> Result<AudioBuffer> {
    if !path.exists() {
        return Err(AudioError::FileNotFound {
            path: path.display().to_string(),
            source: None,
        });
    }

    let reader = WavReader::open(path).map_err(|e| AudioError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples = read_samples_as_f32(reader, spec.bits_per_sample, spec.sample_format)?;
    let buffer = AudioBuffer::from_interleaved(&samples, channels, spec.sample_rate)?;

    debug!(
        "Imported {}: {} channels, {} Hz, {} frames",
        path.display(),
        channels,
        spec.sample_rate,
        buffer.len()
    );

    Ok(buffer)
}

/// Generate a sine test tone
///
/// Every channel carries the same sine wave.
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration_secs` - Duration of the tone in seconds
/// * `sample_rate` - Sample rate in Hz
/// * `channels` - Number of channels
/// * `amplitude` - Peak amplitude
pub fn generate_test_tone(
    frequency: f32,
    duration_secs: f64,
    sample_rate: u32,
    channels: usize,
    amplitude: f32,
) -> Result<AudioBuffer> {
    let mut buffer = crate::engine::utils::create_buffer(sample_rate, channels, duration_secs)?;

    let angular_freq = 2.0 * std::f64::consts::PI * frequency as f64 / sample_rate as f64;

    for channel in buffer.channels_mut() {
        for (i, sample) in channel.iter_mut().enumerate() {
            *sample = amplitude * (angular_freq * i as f64).sin() as f32;
        }
    }

    Ok(buffer)
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    bits_per_sample: u16,
    sample_format: SampleFormat,
) -> Result<Vec<f32>> {
    let invalid = |bits: &str, e: hound::Error| AudioError::InvalidAudio {
        reason: format!("Failed to read {} samples: {}", bits, e),
        source: Some(Box::new(e)),
    };

    match sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid("float", e)),
        SampleFormat::Int => match bits_per_sample {
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| v as f32 / 128.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid("8-bit", e)),
            16 => reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / 32768.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid("16-bit", e)),
            // 24-bit stored as i32 in hound
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 8388608.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid("24-bit", e)),
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / 2147483648.0))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid("32-bit int", e)),
            _ => Err(AudioError::UnsupportedFormat {
                format: format!("{}-bit integer audio", bits_per_sample),
            }),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
