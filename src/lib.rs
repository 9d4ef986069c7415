//! Glassy Audio - voice note buffer utilities and WAV encoding
//!
//! Recordings arrive as in-memory float buffers. This crate slices,
//! concatenates, normalizes and scans them for silence, then serializes the
//! result to a canonical 16-bit PCM WAV file for storage or upload.
//!
//! # Architecture
//!
//! - `engine::buffer`: the `AudioBuffer` type
//! - `engine::utils`: pure buffer transformations
//! - `engine::wav`: byte-exact WAV encoder and save helpers
//! - `engine::io`: WAV decoding and test tones
//! - `config`: processing defaults
//! - `cli`: command-line front end

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;

pub use config::ProcessingConfig;
pub use engine::{AudioBuffer, Segment, WavBlob};
pub use error::{AudioError, Result};
