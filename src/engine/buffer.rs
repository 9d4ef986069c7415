//! Audio Buffer
//!
//! The in-memory audio representation shared by the buffer utilities and the
//! WAV encoder: non-interleaved 32-bit float channels at a fixed sample rate.

use crate::error::{AudioError, Result};

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert linear amplitude to decibels
///
/// # Arguments
/// * `linear` - Linear amplitude value
///
/// # Returns
/// Value in decibels. Returns -f32::INFINITY for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Peak absolute amplitude across all channels of a buffer
///
/// Returns 0.0 for empty buffers.
pub fn peak_amplitude(buffer: &AudioBuffer) -> f32 {
    buffer
        .samples
        .iter()
        .flat_map(|channel| channel.iter())
        .map(|&s| s.abs())
        .fold(0.0_f32, f32::max)
}

/// Calculate the peak level of an audio buffer in dB
pub fn calculate_peak_db(buffer: &AudioBuffer) -> f32 {
    linear_to_db(peak_amplitude(buffer))
}

// ============================================================================
// Audio Buffer
// ============================================================================

/// Audio buffer holding one `Vec<f32>` per channel
///
/// All channels have the same length, there is at least one channel and the
/// sample rate is non-zero. Samples are nominally in [-1.0, 1.0] but values
/// outside that range are kept as-is.
///
/// # Example
/// ```
/// use glassy_audio::engine::AudioBuffer;
///
/// let buffer = AudioBuffer::new(44100, 2, 44100).unwrap();
/// assert_eq!(buffer.number_of_channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zero-filled buffer
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate in Hz, must be non-zero
    /// * `channels` - Number of channels, must be at least 1
    /// * `length` - Number of samples per channel
    pub fn new(sample_rate: u32, channels: usize, length: usize) -> Result<Self> {
        Self::from_channels(vec![vec![0.0_f32; length]; channels], sample_rate)
    }

    /// Build a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// * `NoChannels` - if `channels` is empty
    /// * `InvalidParameter` - if `sample_rate` is zero
    /// * `LengthMismatch` - if the channels differ in length
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if channels.is_empty() {
            return Err(AudioError::NoChannels);
        }
        if sample_rate == 0 {
            return Err(AudioError::InvalidParameter {
                reason: "sample rate must be greater than zero".to_string(),
            });
        }

        let expected = channels[0].len();
        if let Some((channel, data)) = channels
            .iter()
            .enumerate()
            .find(|(_, data)| data.len() != expected)
        {
            return Err(AudioError::LengthMismatch {
                channel,
                expected,
                found: data.len(),
            });
        }

        Ok(Self {
            samples: channels,
            sample_rate,
        })
    }

    /// Create an audio buffer from interleaved sample data
    ///
    /// # Arguments
    /// * `interleaved` - Interleaved samples (L, R, L, R, ... for stereo)
    /// * `channels` - Number of interleaved channels
    /// * `sample_rate` - Sample rate in Hz
    pub fn from_interleaved(interleaved: &[f32], channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 {
            return Err(AudioError::NoChannels);
        }

        if interleaved.len() % channels != 0 {
            return Err(AudioError::InvalidAudio {
                reason: format!(
                    "Interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    channels
                ),
                source: None,
            });
        }

        let frames = interleaved.len() / channels;
        let mut samples: Vec<Vec<f32>> = (0..channels)
            .map(|_| Vec::with_capacity(frames))
            .collect();

        for frame in interleaved.chunks_exact(channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Get the number of channels
    #[inline]
    pub fn number_of_channels(&self) -> usize {
        self.samples.len()
    }

    /// Get the number of samples per channel
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    /// Check if the buffer holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample rate in Hz
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Get immutable access to a channel's samples
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Get mutable access to a channel's samples
    ///
    /// The slice cannot be resized, so the equal-length invariant holds.
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.samples[index]
    }

    /// Checked variant of [`AudioBuffer::channel`]
    pub fn try_channel(&self, index: usize) -> Result<&[f32]> {
        self.samples
            .get(index)
            .map(Vec::as_slice)
            .ok_or(AudioError::ChannelOutOfRange {
                index,
                channels: self.number_of_channels(),
            })
    }

    /// Iterate over all channels
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(Vec::as_slice)
    }

    /// Iterate mutably over all channels
    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.samples.iter_mut().map(Vec::as_mut_slice)
    }

}

// ============================================================================
// Tests
// ============================================================================
