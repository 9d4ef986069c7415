//! Glassy Audio CLI
//!
//! Command-line interface for the voice note buffer tools and WAV encoder.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use glassy_audio::cli::{commands, Cli, Commands};
use glassy_audio::ProcessingConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    info!("Glassy Audio v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => ProcessingConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => ProcessingConfig::default(),
    };
    debug!("Using {:?}", config);

    handle_command(cli.command, &config)
}

fn handle_command(cmd: Commands, config: &ProcessingConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Info { input } => commands::info(&input)?,
        Commands::Encode { input, output } => commands::encode(&input, &output)?,
        Commands::Slice {
            input,
            start,
            end,
            output,
        } => commands::slice(&input, start, end, &output)?,
        Commands::Concat {
            inputs,
            dir,
            output,
        } => commands::concat(&inputs, dir.as_deref(), &output)?,
        Commands::Normalize {
            input,
            target,
            output,
        } => commands::normalize(
            &input,
            target.unwrap_or(config.normalize_target),
            &output,
        )?,
        Commands::Segments {
            input,
            threshold,
            min_duration,
            json,
        } => {
            commands::segments(
                &input,
                threshold.unwrap_or(config.silence_threshold),
                min_duration.unwrap_or(config.min_segment_secs),
                json,
            )?;
        }
        Commands::Trim {
            input,
            threshold,
            min_duration,
            output,
        } => commands::trim(
            &input,
            threshold.unwrap_or(config.silence_threshold),
            min_duration.unwrap_or(config.min_segment_secs),
            &output,
        )?,
        Commands::Tone {
            output,
            frequency,
            duration,
            sample_rate,
            channels,
            amplitude,
        } => commands::tone(&output, frequency, duration, sample_rate, channels, amplitude)?,
    }

    Ok(())
}
