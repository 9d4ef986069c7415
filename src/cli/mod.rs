//! CLI Module
//!
//! Command-line interface over the buffer utilities and WAV encoder.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Glassy Audio - voice note buffer tools and 16-bit WAV encoder
#[derive(Parser, Debug)]
#[command(name = "glassy-audio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with processing defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print channel count, sample rate, length and peak level
    #[command(name = "info")]
    Info {
        /// Input WAV file
        input: PathBuf,
    },

    /// Re-encode a WAV file as 16-bit PCM
    #[command(name = "encode")]
    Encode {
        /// Input WAV file
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Cut a time range out of a WAV file
    #[command(name = "slice")]
    Slice {
        /// Input WAV file
        input: PathBuf,

        /// Start time in seconds
        #[arg(long)]
        start: f64,

        /// End time in seconds
        #[arg(long)]
        end: f64,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Join WAV files end to end
    #[command(name = "concat")]
    Concat {
        /// Input WAV files, in order
        inputs: Vec<PathBuf>,

        /// Also append every .wav file in this directory, sorted by name
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Scale a WAV file so its peak hits the target level
    #[command(name = "normalize")]
    Normalize {
        /// Input WAV file
        input: PathBuf,

        /// Target peak level (linear)
        #[arg(short, long)]
        target: Option<f32>,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the non-silent segments of a WAV file
    #[command(name = "segments")]
    Segments {
        /// Input WAV file
        input: PathBuf,

        /// Silence threshold (linear amplitude)
        #[arg(long)]
        threshold: Option<f32>,

        /// Minimum segment duration in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop silence from a WAV file
    #[command(name = "trim")]
    Trim {
        /// Input WAV file
        input: PathBuf,

        /// Silence threshold (linear amplitude)
        #[arg(long)]
        threshold: Option<f32>,

        /// Minimum segment duration in seconds
        #[arg(long)]
        min_duration: Option<f64>,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a sine test tone
    #[command(name = "tone")]
    Tone {
        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,

        /// Duration in seconds
        #[arg(long, default_value_t = 1.0)]
        duration: f64,

        /// Sample rate in Hz
        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        /// Number of channels
        #[arg(long, default_value_t = 1)]
        channels: usize,

        /// Peak amplitude
        #[arg(long, default_value_t = 0.5)]
        amplitude: f32,
    },
}
