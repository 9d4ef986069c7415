//! Audio Buffer Utilities
//!
//! Construction and transformation of [`AudioBuffer`]s: synthetic silence,
//! slicing, concatenation, peak normalization and silence detection.
//!
//! Everything here is pure except [`normalize_buffer`], which scales the
//! buffer it is given in place.

use std::borrow::Borrow;
use std::ops::Range;

use log::{debug, warn};
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::engine::buffer::{peak_amplitude, AudioBuffer};
use crate::error::{AudioError, Result};

/// Default peak level targeted by [`normalize_buffer`]
pub const DEFAULT_NORMALIZE_TARGET: f32 = 0.89;

/// Default amplitude below which a sample counts as silent
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Default minimum duration for a non-silent segment to be kept
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 0.1;

// ============================================================================
// Segment
// ============================================================================

/// A non-silent time interval in seconds, start-inclusive and end-exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Segment {
    /// Build a segment from a sample index range
    pub fn from_samples(range: Range<usize>, sample_rate: u32) -> Self {
        Self {
            start: range.start as f64 / sample_rate as f64,
            end: range.end as f64 / sample_rate as f64,
        }
    }

    /// Segment length in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

// ============================================================================
// External sources
// ============================================================================

/// A buffer-like value produced outside this crate, such as a decoder's output
///
/// Implement this to hand decoded audio to [`from_real_audio_buffer`]. Samples
/// may be any numeric type convertible to `f32`.
pub trait AudioSource {
    /// Sample type stored by the source
    type Sample: ToPrimitive + Copy;

    /// Number of channels
    fn number_of_channels(&self) -> usize;

    /// Samples per channel
    fn length(&self) -> usize;

    /// Sample rate in Hz
    fn sample_rate(&self) -> u32;

    /// Samples of one channel
    fn channel_data(&self, index: usize) -> &[Self::Sample];
}

impl AudioSource for AudioBuffer {
    type Sample = f32;

    fn number_of_channels(&self) -> usize {
        AudioBuffer::number_of_channels(self)
    }

    fn length(&self) -> usize {
        self.len()
    }

    fn sample_rate(&self) -> u32 {
        AudioBuffer::sample_rate(self)
    }

    fn channel_data(&self, index: usize) -> &[f32] {
        self.channel(index)
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Largest per-channel length a `Vec<f32>` can hold
const MAX_FRAMES: usize = isize::MAX as usize / std::mem::size_of::<f32>();

/// Create a silent buffer of the given duration
///
/// The length is `ceil(sample_rate * duration_secs)` samples per channel.
///
/// # Errors
/// * `InvalidParameter` - zero sample rate, a negative or non-finite duration,
///   or a length too large to allocate
/// * `NoChannels` - zero channels
pub fn create_buffer(sample_rate: u32, channels: usize, duration_secs: f64) -> Result<AudioBuffer> {
    if !duration_secs.is_finite() || duration_secs < 0.0 {
        return Err(AudioError::InvalidParameter {
            reason: format!("duration must be a non-negative number, got {}", duration_secs),
        });
    }

    let frames = (sample_rate as f64 * duration_secs).ceil();
    if frames > MAX_FRAMES as f64 {
        return Err(AudioError::InvalidParameter {
            reason: format!(
                "{}s at {} Hz is too long to allocate",
                duration_secs, sample_rate
            ),
        });
    }

    let length = frames as usize;
    AudioBuffer::new(sample_rate, channels, length)
}

/// Copy the samples between `start_time` and `end_time` (seconds) into a new buffer
///
/// Sample bounds are `floor(time * sample_rate)`; the end bound is exclusive.
///
/// # Errors
/// `InvalidSliceRange` if either time is non-finite, `start_time` is negative,
/// `start_time >= end_time`, or the end lies past the last sample.
pub fn slice_buffer(buffer: &AudioBuffer, start_time: f64, end_time: f64) -> Result<AudioBuffer> {
    let invalid = |reason: String| AudioError::InvalidSliceRange {
        start_secs: start_time,
        end_secs: end_time,
        reason,
    };

    if !start_time.is_finite() || !end_time.is_finite() {
        return Err(invalid("times must be finite".to_string()));
    }
    if start_time < 0.0 {
        return Err(invalid("start time is negative".to_string()));
    }
    if start_time >= end_time {
        return Err(invalid("start time must be before end time".to_string()));
    }

    let rate = buffer.sample_rate() as f64;
    let start_sample = (start_time * rate).floor() as usize;
    let end_sample = (end_time * rate).floor() as usize;

    if end_sample > buffer.len() {
        return Err(invalid(format!(
            "end sample {} is past the buffer length {}",
            end_sample,
            buffer.len()
        )));
    }

    copy_range(buffer, start_sample..end_sample)
}

/// Join buffers end to end
///
/// Returns `Ok(None)` for an empty input. All buffers must share the first
/// buffer's channel count and sample rate.
pub fn concat_buffers<B: Borrow<AudioBuffer>>(buffers: &[B]) -> Result<Option<AudioBuffer>> {
    let buffers: Vec<&AudioBuffer> = buffers.iter().map(Borrow::<AudioBuffer>::borrow).collect();
    let Some(first) = buffers.first() else {
        return Ok(None);
    };

    let channels = first.number_of_channels();
    let sample_rate = first.sample_rate();

    for buffer in &buffers {
        if buffer.number_of_channels() != channels {
            return Err(AudioError::ChannelMismatch {
                expected: channels,
                found: buffer.number_of_channels(),
            });
        }
        if buffer.sample_rate() != sample_rate {
            return Err(AudioError::SampleRateMismatch {
                expected: sample_rate,
                found: buffer.sample_rate(),
            });
        }
    }

    let total: usize = buffers.iter().map(|b| b.len()).sum();
    let mut data: Vec<Vec<f32>> = (0..channels)
        .map(|_| Vec::with_capacity(total))
        .collect();

    for buffer in &buffers {
        for (out, channel) in data.iter_mut().zip(buffer.channels()) {
            out.extend_from_slice(channel);
        }
    }

    debug!(
        "Concatenated {} buffers into {} samples x {} channels",
        buffers.len(),
        total,
        channels
    );

    AudioBuffer::from_channels(data, sample_rate).map(Some)
}

/// Scale every sample in place so the peak absolute amplitude equals `target_level`
///
/// Silent buffers (peak of zero) and buffers whose peak is not finite are left
/// untouched. Returns the same buffer for chaining.
pub fn normalize_buffer(buffer: &mut AudioBuffer, target_level: f32) -> &mut AudioBuffer {
    let peak = peak_amplitude(buffer);

    if peak == 0.0 {
        debug!("Skipping normalization of a silent buffer");
        return buffer;
    }
    if !peak.is_finite() || !target_level.is_finite() {
        warn!(
            "Skipping normalization: peak {} / target {} is not finite",
            peak, target_level
        );
        return buffer;
    }

    let factor = target_level / peak;
    for channel in buffer.channels_mut() {
        for sample in channel.iter_mut() {
            *sample *= factor;
        }
    }

    debug!(
        "Normalized peak {:.4} to {:.4} (factor {:.4})",
        peak, target_level, factor
    );
    buffer
}

/// Find the non-silent segments of channel 0
///
/// A sample is silent when `abs(sample) < threshold`. Runs of sound shorter
/// than `min_duration_secs` are dropped. A run still open at the end of the
/// buffer is closed at the buffer length.
pub fn remove_silence(buffer: &AudioBuffer, threshold: f32, min_duration_secs: f64) -> Vec<Segment> {
    sound_ranges(buffer, threshold, min_duration_secs)
        .into_iter()
        .map(|range| Segment::from_samples(range, buffer.sample_rate()))
        .collect()
}

/// Keep only the non-silent parts of a buffer, joined end to end
///
/// Every channel is cut at the segments found on channel 0. Returns `Ok(None)`
/// when nothing but silence remains.
pub fn trim_silence(
    buffer: &AudioBuffer,
    threshold: f32,
    min_duration_secs: f64,
) -> Result<Option<AudioBuffer>> {
    let pieces: Vec<AudioBuffer> = sound_ranges(buffer, threshold, min_duration_secs)
        .into_iter()
        .map(|range| copy_range(buffer, range))
        .collect::<Result<_>>()?;

    debug!("Keeping {} non-silent segments", pieces.len());
    concat_buffers(&pieces)
}

/// Deep-copy an externally supplied buffer into an [`AudioBuffer`]
///
/// # Errors
/// * `NoChannels` / `InvalidParameter` - the source breaks buffer invariants
/// * `LengthMismatch` - a channel's data does not match the reported length
/// * `InvalidAudio` - a sample cannot be represented as `f32`
pub fn from_real_audio_buffer<S: AudioSource>(source: &S) -> Result<AudioBuffer> {
    let length = source.length();
    let mut channels = Vec::with_capacity(source.number_of_channels());

    for index in 0..source.number_of_channels() {
        let data = source.channel_data(index);
        if data.len() != length {
            return Err(AudioError::LengthMismatch {
                channel: index,
                expected: length,
                found: data.len(),
            });
        }

        let samples = data
            .iter()
            .map(|s| {
                s.to_f32().ok_or_else(|| AudioError::InvalidAudio {
                    reason: format!("sample in channel {} is not representable as f32", index),
                    source: None,
                })
            })
            .collect::<Result<Vec<f32>>>()?;
        channels.push(samples);
    }

    AudioBuffer::from_channels(channels, source.sample_rate())
}

// ============================================================================
// Internal helper functions
// ============================================================================

/// Copy a sample range of every channel into a new buffer
fn copy_range(buffer: &AudioBuffer, range: Range<usize>) -> Result<AudioBuffer> {
    let data: Vec<Vec<f32>> = buffer
        .channels()
        .map(|channel| channel[range.clone()].to_vec())
        .collect();

    AudioBuffer::from_channels(data, buffer.sample_rate())
}

/// Scan channel 0 for sample ranges of sound long enough to keep
fn sound_ranges(buffer: &AudioBuffer, threshold: f32, min_duration_secs: f64) -> Vec<Range<usize>> {
    let data = buffer.channel(0);
    let min_samples = min_duration_secs * buffer.sample_rate() as f64;
    let long_enough = |range: &Range<usize>| (range.end - range.start) as f64 >= min_samples;

    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;

    for (i, sample) in data.iter().enumerate() {
        let silent = sample.abs() < threshold;
        match (open, silent) {
            (None, false) => open = Some(i),
            (Some(start), true) => {
                let range = start..i;
                if long_enough(&range) {
                    ranges.push(range);
                }
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        let range = start..data.len();
        if long_enough(&range) {
            ranges.push(range);
        }
    }

    ranges
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;

    const RATE: u32 = 44100;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32 / len as f32).collect()
    }

    fn square(len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|i| if (i / 50) % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    // ------------------------------------------------------------------------
    // create_buffer
    // ------------------------------------------------------------------------

    #[test]
    fn test_create_buffer_length_rounds_up() {
        let buffer = create_buffer(8000, 2, 0.00001).unwrap();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.number_of_channels(), 2);

        let buffer = create_buffer(RATE, 1, 1.0).unwrap();
        assert_eq!(buffer.len(), 44100);
        assert!(buffer.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_create_buffer_zero_duration() {
        let buffer = create_buffer(RATE, 1, 0.0).unwrap();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_create_buffer_rejects_bad_input() {
        assert!(create_buffer(RATE, 1, -1.0).is_err());
        assert!(create_buffer(RATE, 1, f64::NAN).is_err());
        assert!(create_buffer(0, 1, 1.0).is_err());
        assert!(matches!(
            create_buffer(RATE, 0, 1.0),
            Err(AudioError::NoChannels)
        ));
    }

    #[test]
    fn test_create_buffer_rejects_unallocatable_length() {
        assert!(matches!(
            create_buffer(RATE, 1, 1e20),
            Err(AudioError::InvalidParameter { .. })
        ));
        assert!(matches!(
            create_buffer(u32::MAX, 2, f64::MAX),
            Err(AudioError::InvalidParameter { .. })
        ));
    }

    // ------------------------------------------------------------------------
    // slice_buffer
    // ------------------------------------------------------------------------

    #[test]
    fn test_slice_buffer_copies_range() {
        let buffer =
            AudioBuffer::from_channels(vec![ramp(RATE as usize), square(RATE as usize, 0.3)], RATE)
                .unwrap();
        let sliced = slice_buffer(&buffer, 0.25, 0.5).unwrap();

        let start = (0.25 * RATE as f64).floor() as usize;
        let end = (0.5 * RATE as f64).floor() as usize;
        assert_eq!(sliced.len(), end - start);
        assert_eq!(sliced.sample_rate(), RATE);
        for ch in 0..2 {
            assert_eq!(sliced.channel(ch), &buffer.channel(ch)[start..end]);
        }
    }

    #[test]
    fn test_slice_buffer_does_not_alias() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.5; 100]], 100).unwrap();
        let mut sliced = slice_buffer(&buffer, 0.0, 0.5).unwrap();
        sliced.channel_mut(0)[0] = -1.0;
        assert_eq!(buffer.channel(0)[0], 0.5);
    }

    #[test]
    fn test_slice_buffer_whole_buffer() {
        let buffer = AudioBuffer::from_channels(vec![ramp(100)], 100).unwrap();
        let sliced = slice_buffer(&buffer, 0.0, 1.0).unwrap();
        assert_eq!(sliced, buffer);
    }

    #[test]
    fn test_slice_buffer_rejects_bad_ranges() {
        let buffer = AudioBuffer::new(100, 1, 100).unwrap();
        for (start, end) in [(0.5, 0.5), (0.6, 0.2), (-0.1, 0.5), (0.0, 1.5), (0.0, f64::NAN)] {
            assert!(
                matches!(
                    slice_buffer(&buffer, start, end),
                    Err(AudioError::InvalidSliceRange { .. })
                ),
                "expected {}..{} to be rejected",
                start,
                end
            );
        }
    }

    // ------------------------------------------------------------------------
    // concat_buffers
    // ------------------------------------------------------------------------

    #[test]
    fn test_concat_empty_is_none() {
        let empty: [AudioBuffer; 0] = [];
        assert!(concat_buffers(&empty).unwrap().is_none());
    }

    #[test]
    fn test_concat_joins_in_order() {
        let a = AudioBuffer::from_channels(vec![vec![0.1, 0.2], vec![-0.1, -0.2]], RATE).unwrap();
        let b = AudioBuffer::from_channels(vec![vec![0.3], vec![-0.3]], RATE).unwrap();

        let joined = concat_buffers(&[&a, &b]).unwrap().unwrap();
        assert_eq!(joined.len(), a.len() + b.len());
        assert_eq!(joined.channel(0), &[0.1, 0.2, 0.3]);
        assert_eq!(joined.channel(1), &[-0.1, -0.2, -0.3]);
    }

    #[test]
    fn test_concat_rejects_mismatches() {
        let mono = AudioBuffer::new(RATE, 1, 10).unwrap();
        let stereo = AudioBuffer::new(RATE, 2, 10).unwrap();
        let other_rate = AudioBuffer::new(48000, 1, 10).unwrap();

        assert!(matches!(
            concat_buffers(&[&mono, &stereo]),
            Err(AudioError::ChannelMismatch {
                expected: 1,
                found: 2
            })
        ));
        assert!(matches!(
            concat_buffers(&[&mono, &other_rate]),
            Err(AudioError::SampleRateMismatch {
                expected: 44100,
                found: 48000
            })
        ));
    }

    // ------------------------------------------------------------------------
    // normalize_buffer
    // ------------------------------------------------------------------------

    #[test]
    fn test_normalize_scales_to_target() {
        let mut buffer =
            AudioBuffer::from_channels(vec![vec![0.1, -0.4, 0.2], vec![0.05, 0.3, -0.1]], RATE)
                .unwrap();
        normalize_buffer(&mut buffer, DEFAULT_NORMALIZE_TARGET);

        assert_relative_eq!(peak_amplitude(&buffer), 0.89, epsilon = 1e-6);
        // Uniform scaling keeps ratios
        assert_relative_eq!(buffer.channel(0)[0], 0.89 * 0.25, epsilon = 1e-6);
        assert_relative_eq!(buffer.channel(1)[1], 0.89 * 0.75, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut buffer = AudioBuffer::from_channels(vec![square(1000, 0.3)], RATE).unwrap();
        normalize_buffer(&mut buffer, 0.5);
        let once = buffer.clone();
        normalize_buffer(&mut buffer, 0.5);

        for (a, b) in once.channel(0).iter().zip(buffer.channel(0)) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_normalize_scales_out_of_range_input() {
        let mut buffer = AudioBuffer::from_channels(vec![vec![2.0, -4.0]], RATE).unwrap();
        normalize_buffer(&mut buffer, 1.0);
        assert_eq!(buffer.channel(0), &[0.5, -1.0]);
    }

    #[test]
    fn test_normalize_silence_is_noop() {
        let mut buffer = AudioBuffer::new(RATE, 2, 100).unwrap();
        let result = normalize_buffer(&mut buffer, 0.89);
        assert!(result.channels().all(|ch| ch.iter().all(|&s| s == 0.0)));

        let mut empty = AudioBuffer::new(RATE, 1, 0).unwrap();
        assert!(normalize_buffer(&mut empty, 0.89).is_empty());
    }

    // ------------------------------------------------------------------------
    // remove_silence / trim_silence
    // ------------------------------------------------------------------------

    /// 0.2s silence, 0.3s square tone at 0.5, 0.2s silence
    fn silence_tone_silence() -> AudioBuffer {
        let silence = (0.2 * RATE as f64) as usize;
        let tone = (0.3 * RATE as f64) as usize;
        let mut data = vec![0.0; silence];
        data.extend(square(tone, 0.5));
        data.extend(vec![0.0; silence]);
        AudioBuffer::from_channels(vec![data], RATE).unwrap()
    }

    #[test]
    fn test_remove_silence_all_silent() {
        let buffer = AudioBuffer::from_channels(vec![vec![0.005; 4410]], RATE).unwrap();
        assert!(remove_silence(&buffer, 0.01, 0.1).is_empty());
    }

    #[test]
    fn test_remove_silence_finds_tone() {
        let buffer = silence_tone_silence();
        let segments = remove_silence(
            &buffer,
            DEFAULT_SILENCE_THRESHOLD,
            DEFAULT_MIN_SEGMENT_SECS,
        );

        assert_eq!(segments.len(), 1);
        let one_sample = 1.0 / RATE as f64;
        assert!((segments[0].start - 0.2).abs() <= one_sample);
        assert!((segments[0].end - 0.5).abs() <= one_sample);
        assert!(segments[0].start < segments[0].end);
    }

    #[test]
    fn test_remove_silence_discards_short_bursts() {
        let mut data = vec![0.0; 1000];
        data[100..150].fill(0.8);
        data[400..900].fill(0.8);
        let buffer = AudioBuffer::from_channels(vec![data], 1000).unwrap();

        let segments = remove_silence(&buffer, 0.01, 0.1);
        assert_eq!(segments, vec![Segment { start: 0.4, end: 0.9 }]);
    }

    #[test]
    fn test_remove_silence_closes_trailing_segment() {
        let mut data = vec![0.0; 1000];
        data[700..].fill(-0.5);
        let buffer = AudioBuffer::from_channels(vec![data], 1000).unwrap();

        let segments = remove_silence(&buffer, 0.01, 0.1);
        assert_eq!(segments, vec![Segment { start: 0.7, end: 1.0 }]);
    }

    #[test]
    fn test_remove_silence_uses_channel_zero_only() {
        let buffer =
            AudioBuffer::from_channels(vec![vec![0.0; 1000], vec![0.9; 1000]], 1000).unwrap();
        assert!(remove_silence(&buffer, 0.01, 0.1).is_empty());
    }

    #[test]
    fn test_trim_silence_keeps_sound() {
        let buffer = silence_tone_silence();
        let trimmed = trim_silence(&buffer, 0.01, 0.1).unwrap().unwrap();
        assert_eq!(trimmed.len(), (0.3 * RATE as f64) as usize);
        assert!(trimmed.channel(0).iter().all(|s| s.abs() == 0.5));

        let silent = AudioBuffer::new(RATE, 1, 1000).unwrap();
        assert!(trim_silence(&silent, 0.01, 0.1).unwrap().is_none());
    }

    // ------------------------------------------------------------------------
    // from_real_audio_buffer
    // ------------------------------------------------------------------------

    struct DecodedF64 {
        rate: u32,
        data: Vec<Vec<f64>>,
        reported_len: usize,
    }

    impl AudioSource for DecodedF64 {
        type Sample = f64;

        fn number_of_channels(&self) -> usize {
            self.data.len()
        }

        fn length(&self) -> usize {
            self.reported_len
        }

        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn channel_data(&self, index: usize) -> &[f64] {
            &self.data[index]
        }
    }

    #[test]
    fn test_from_real_audio_buffer_converts_samples() {
        let source = DecodedF64 {
            rate: 16000,
            data: vec![vec![0.25, -0.5], vec![1.5, 0.0]],
            reported_len: 2,
        };
        let buffer = from_real_audio_buffer(&source).unwrap();

        assert_eq!(buffer.sample_rate(), 16000);
        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.channel(0), &[0.25, -0.5]);
        assert_eq!(buffer.channel(1), &[1.5, 0.0]);
    }

    #[test]
    fn test_from_real_audio_buffer_rejects_bad_length() {
        let source = DecodedF64 {
            rate: 16000,
            data: vec![vec![0.25, -0.5]],
            reported_len: 3,
        };
        assert!(matches!(
            from_real_audio_buffer(&source),
            Err(AudioError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_from_real_audio_buffer_is_deep_copy() {
        let original = AudioBuffer::from_channels(vec![vec![0.1, 0.2]], RATE).unwrap();
        let mut copy = from_real_audio_buffer(&original).unwrap();
        copy.channel_mut(0)[0] = 0.9;
        assert_eq!(original.channel(0)[0], 0.1);
        assert_eq!(copy.channel(0)[1], 0.2);
    }
}
