//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::{
    audio_buffer_to_wav, calculate_peak_db, concat_buffers, generate_test_tone, import_audio,
    normalize_buffer, read_wav_header, remove_silence, save_wav, slice_buffer, trim_silence,
    AudioBuffer, Segment,
};
use crate::error::{AudioError, Result};

/// Print basic facts about a WAV file.
pub fn info(input: &Path) -> Result<()> {
    let buffer = import_audio(input)?;

    println!("File:        {}", input.display());
    println!("Channels:    {}", buffer.number_of_channels());
    println!("Sample rate: {} Hz", buffer.sample_rate());
    println!("Length:      {} samples", buffer.len());
    println!("Duration:    {:.3}s", buffer.duration_secs());
    println!("Peak:        {:.2} dBFS", calculate_peak_db(&buffer));

    match read_wav_header(input) {
        Ok(header) => {
            println!("Encoding:    16-bit PCM");
            println!("Byte rate:   {} B/s", header.byte_rate);
            println!("Block align: {} bytes", header.block_align);
            println!("Data size:   {} bytes", header.data_size);
        }
        Err(AudioError::InvalidWav { reason }) => {
            debug!("Header is not canonical 16-bit PCM: {}", reason);
            println!("Encoding:    other (re-encode with `encode`)");
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

/// Decode any supported WAV file and write it back as 16-bit PCM.
pub fn encode(input: &Path, output: &Path) -> Result<()> {
    info!("Encoding {} -> {}", input.display(), output.display());

    let buffer = import_audio(input)?;
    let blob = audio_buffer_to_wav(&buffer)?;
    fs::write(output, blob.as_bytes())?;

    println!("Wrote {} ({} bytes, {})", output.display(), blob.size(), blob.mime_type());
    println!("SHA-256: {}", blob.sha256_hex());

    Ok(())
}

/// Write the `[start, end)` range of a file.
pub fn slice(input: &Path, start: f64, end: f64, output: &Path) -> Result<()> {
    info!("Slicing {} from {}s to {}s", input.display(), start, end);

    let buffer = import_audio(input)?;
    let sliced = slice_buffer(&buffer, start, end)?;
    save_wav(&sliced, output)?;

    println!(
        "Wrote {} ({:.3}s)",
        output.display(),
        sliced.duration_secs()
    );

    Ok(())
}

/// Join files end to end, appending any `.wav` files found in `dir`.
pub fn concat(inputs: &[PathBuf], dir: Option<&Path>, output: &Path) -> Result<()> {
    let paths = collect_inputs(inputs, dir)?;
    info!("Concatenating {} files into {}", paths.len(), output.display());

    let buffers = paths
        .iter()
        .map(|path| import_audio(path))
        .collect::<Result<Vec<AudioBuffer>>>()?;

    let joined = concat_buffers(&buffers)?.ok_or_else(|| AudioError::InvalidParameter {
        reason: "no input files to concatenate".to_string(),
    })?;
    save_wav(&joined, output)?;

    println!(
        "Wrote {} ({} files, {:.3}s)",
        output.display(),
        buffers.len(),
        joined.duration_secs()
    );

    Ok(())
}

/// Normalize a file's peak level.
pub fn normalize(input: &Path, target: f32, output: &Path) -> Result<()> {
    info!("Normalizing {} to peak {}", input.display(), target);

    let mut buffer = import_audio(input)?;
    let before = calculate_peak_db(&buffer);
    normalize_buffer(&mut buffer, target);
    save_wav(&buffer, output)?;

    println!(
        "Wrote {} (peak {:.2} dBFS -> {:.2} dBFS)",
        output.display(),
        before,
        calculate_peak_db(&buffer)
    );

    Ok(())
}

/// Print the non-silent segments of a file.
pub fn segments(input: &Path, threshold: f32, min_duration: f64, json: bool) -> Result<Vec<Segment>> {
    let buffer = import_audio(input)?;
    if buffer.number_of_channels() > 1 {
        info!("Detecting silence on channel 0 of {}", buffer.number_of_channels());
    }

    let segments = remove_silence(&buffer, threshold, min_duration);

    if json {
        println!("{}", serde_json::to_string_pretty(&segments)?);
    } else if segments.is_empty() {
        println!("No non-silent segments found.");
    } else {
        println!("Segments:");
        println!("{:-<40}", "");
        for (i, segment) in segments.iter().enumerate() {
            println!(
                "{:>3}. {:>9.3}s - {:>9.3}s ({:.3}s)",
                i + 1,
                segment.start,
                segment.end,
                segment.duration()
            );
        }
    }

    Ok(segments)
}

/// Write a file with its silent stretches removed.
pub fn trim(input: &Path, threshold: f32, min_duration: f64, output: &Path) -> Result<()> {
    info!("Trimming silence from {}", input.display());

    let buffer = import_audio(input)?;
    match trim_silence(&buffer, threshold, min_duration)? {
        Some(trimmed) => {
            save_wav(&trimmed, output)?;
            println!(
                "Wrote {} ({:.3}s -> {:.3}s)",
                output.display(),
                buffer.duration_secs(),
                trimmed.duration_secs()
            );
        }
        None => {
            warn!("{} contains only silence, nothing written", input.display());
            println!("No non-silent audio in {}", input.display());
        }
    }

    Ok(())
}

/// Write a sine test tone.
pub fn tone(
    output: &Path,
    frequency: f32,
    duration: f64,
    sample_rate: u32,
    channels: usize,
    amplitude: f32,
) -> Result<()> {
    let buffer = generate_test_tone(frequency, duration, sample_rate, channels, amplitude)?;
    save_wav(&buffer, output)?;

    println!(
        "Wrote {} ({} Hz, {:.3}s, {} channels)",
        output.display(),
        frequency,
        buffer.duration_secs(),
        channels
    );

    Ok(())
}

/// Explicit inputs first, then `.wav` files from `dir` sorted by file name.
fn collect_inputs(inputs: &[PathBuf], dir: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut paths = inputs.to_vec();

    if let Some(dir) = dir {
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| AudioError::Io(e.into()))?;
            let is_wav = entry
                .path()
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if entry.file_type().is_file() && is_wav {
                paths.push(entry.into_path());
            }
        }
    }

    Ok(paths)
}
