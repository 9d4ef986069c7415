//! Audio Engine Module
//!
//! Core audio handling:
//! - Audio buffer type
//! - Buffer utilities (slice, concat, normalize, silence detection)
//! - 16-bit PCM WAV encoding
//! - WAV file decoding

pub mod buffer;
pub mod io;
pub mod utils;
pub mod wav;

pub use buffer::{calculate_peak_db, linear_to_db, peak_amplitude, AudioBuffer};
pub use io::{generate_test_tone, import_audio};
pub use utils::{
    concat_buffers, create_buffer, from_real_audio_buffer, normalize_buffer, remove_silence,
    slice_buffer, trim_silence, AudioSource, Segment, DEFAULT_MIN_SEGMENT_SECS,
    DEFAULT_NORMALIZE_TARGET, DEFAULT_SILENCE_THRESHOLD,
};
pub use wav::{
    audio_buffer_to_wav, download_audio_buffer_as_wav, float_to_pcm16, read_wav_header, save_wav,
    write_wav, WavBlob, WavHeader, WAV_MIME_TYPE,
};
