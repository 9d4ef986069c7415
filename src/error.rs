//! Error handling for glassy-audio
//!
//! Buffer operations fail fast on contract violations instead of producing
//! silently malformed audio. Every error carries recovery suggestions.

use thiserror::Error;

/// Result type alias for glassy-audio operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Main error type for buffer, encoder and I/O operations
#[derive(Error, Debug)]
pub enum AudioError {
    // Buffer Contract Errors
    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("Invalid slice range {start_secs}s..{end_secs}s: {reason}")]
    InvalidSliceRange {
        start_secs: f64,
        end_secs: f64,
        reason: String,
    },

    #[error("Channel count mismatch: expected {expected}, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Sample rate mismatch: expected {expected} Hz, found {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("Channel {channel} has {found} samples, expected {expected}")]
    LengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Audio buffer must have at least one channel")]
    NoChannels,

    #[error("Channel index {index} out of range (buffer has {channels} channels)")]
    ChannelOutOfRange { index: usize, channels: usize },

    // Encoder Errors
    #[error("Audio too large for a WAV container: {reason}")]
    WavTooLarge { reason: String },

    #[error("Invalid WAV header: {reason}")]
    InvalidWav { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound {
        path: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AudioError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            AudioError::InvalidParameter { .. } => "INVALID_PARAMETER",
            AudioError::InvalidSliceRange { .. } => "INVALID_SLICE_RANGE",
            AudioError::ChannelMismatch { .. } => "CHANNEL_MISMATCH",
            AudioError::SampleRateMismatch { .. } => "SAMPLE_RATE_MISMATCH",
            AudioError::LengthMismatch { .. } => "LENGTH_MISMATCH",
            AudioError::NoChannels => "NO_CHANNELS",
            AudioError::ChannelOutOfRange { .. } => "CHANNEL_OUT_OF_RANGE",
            AudioError::WavTooLarge { .. } => "WAV_TOO_LARGE",
            AudioError::InvalidWav { .. } => "INVALID_WAV",
            AudioError::FileNotFound { .. } => "FILE_NOT_FOUND",
            AudioError::InvalidAudio { .. } => "INVALID_AUDIO",
            AudioError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AudioError::InvalidConfig { .. } => "INVALID_CONFIG",
            AudioError::Io(_) => "IO_ERROR",
            AudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable by changing the input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AudioError::InvalidSliceRange { .. }
                | AudioError::ChannelMismatch { .. }
                | AudioError::SampleRateMismatch { .. }
                | AudioError::FileNotFound { .. }
                | AudioError::InvalidAudio { .. }
                | AudioError::UnsupportedFormat { .. }
                | AudioError::InvalidConfig { .. }
        )
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            AudioError::InvalidSliceRange { .. } => vec![
                "Make sure the start time is before the end time",
                "Keep the end time within the buffer duration",
            ],
            AudioError::ChannelMismatch { .. } => vec![
                "Convert all inputs to the same channel layout before concatenating",
            ],
            AudioError::SampleRateMismatch { .. } => vec![
                "Resample all inputs to a common sample rate before concatenating",
            ],
            AudioError::WavTooLarge { .. } => vec![
                "Split the recording into shorter segments",
                "Reduce the number of channels",
            ],
            AudioError::FileNotFound { .. } => vec![
                "Check the file path is correct",
                "Verify the file hasn't been moved or deleted",
            ],
            AudioError::InvalidAudio { .. } => vec![
                "Check if the file plays in another application",
                "The file may be corrupted - try re-exporting from source",
            ],
            AudioError::UnsupportedFormat { .. } => vec![
                "Convert to 8, 16, 24 or 32-bit PCM WAV, or 32-bit float WAV",
            ],
            AudioError::InvalidConfig { .. } => vec![
                "Check the configuration file against the documented fields",
                "Remove the file to fall back to defaults",
            ],
            _ => vec![],
        }
    }
}
