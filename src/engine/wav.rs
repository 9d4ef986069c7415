//! 16-bit PCM WAV encoder
//!
//! Serializes an [`AudioBuffer`] into a canonical RIFF/WAVE file: a 44-byte
//! header followed by interleaved little-endian `i16` samples. The output is
//! byte-exact so it can be checked by inspecting the header directly.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use sha2::{Digest, Sha256};

use crate::engine::buffer::AudioBuffer;
use crate::error::{AudioError, Result};

/// MIME type of encoded output
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// File name used by [`download_audio_buffer_as_wav`] when none is given
pub const DEFAULT_WAV_FILENAME: &str = "audio.wav";

/// Size of the canonical PCM header in bytes
pub const WAV_HEADER_SIZE: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = 2;
const FMT_CHUNK_SIZE: u32 = 16;
const FORMAT_PCM: u16 = 1;

// ============================================================================
// Header
// ============================================================================

/// The fields of a canonical 44-byte PCM WAV header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bytes per second of audio
    pub byte_rate: u32,
    /// Bytes per frame (all channels of one sample index)
    pub block_align: u16,
    /// Bits per sample, always 16 for this encoder
    pub bits_per_sample: u16,
    /// Size of the sample data in bytes
    pub data_size: u32,
}

impl WavHeader {
    /// Compute the header for a buffer
    ///
    /// # Errors
    /// `WavTooLarge` if the channel count, byte rate or data size cannot be
    /// represented in the header's fixed-width fields.
    pub fn for_buffer(buffer: &AudioBuffer) -> Result<Self> {
        let too_large = |reason: String| AudioError::WavTooLarge { reason };

        let channels = buffer.number_of_channels();
        let block_align = channels
            .checked_mul(BYTES_PER_SAMPLE as usize)
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| too_large(format!("{} channels", channels)))?;

        let byte_rate = buffer
            .sample_rate()
            .checked_mul(block_align as u32)
            .ok_or_else(|| {
                too_large(format!(
                    "byte rate of {} Hz x {} channels",
                    buffer.sample_rate(),
                    channels
                ))
            })?;

        let data_size = buffer
            .len()
            .checked_mul(block_align as usize)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| n.checked_add(36).is_some())
            .ok_or_else(|| too_large(format!("{} frames", buffer.len())))?;

        Ok(Self {
            // block_align fits u16, so the channel count does too
            channels: channels as u16,
            sample_rate: buffer.sample_rate(),
            byte_rate,
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        })
    }

    /// Value of the RIFF chunk size field (file size minus 8)
    pub fn riff_size(&self) -> u32 {
        36 + self.data_size
    }

    /// Total file size described by this header
    pub fn file_size(&self) -> usize {
        WAV_HEADER_SIZE + self.data_size as usize
    }

    /// Write the 44 header bytes
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Serialize the header
    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut out = [0u8; WAV_HEADER_SIZE];

        // RIFF header
        out[0..4].copy_from_slice(b"RIFF");
        out[4..8].copy_from_slice(&self.riff_size().to_le_bytes());
        out[8..12].copy_from_slice(b"WAVE");

        // fmt chunk
        out[12..16].copy_from_slice(b"fmt ");
        out[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
        out[20..22].copy_from_slice(&FORMAT_PCM.to_le_bytes());
        out[22..24].copy_from_slice(&self.channels.to_le_bytes());
        out[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[28..32].copy_from_slice(&self.byte_rate.to_le_bytes());
        out[32..34].copy_from_slice(&self.block_align.to_le_bytes());
        out[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        // data chunk
        out[36..40].copy_from_slice(b"data");
        out[40..44].copy_from_slice(&self.data_size.to_le_bytes());

        out
    }

    /// Read a canonical PCM header back from the start of a WAV file
    ///
    /// Only the exact layout this encoder writes is accepted: no extra
    /// chunks, fmt size 16, format tag 1.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let invalid = |reason: &str| AudioError::InvalidWav {
            reason: reason.to_string(),
        };

        if bytes.len() < WAV_HEADER_SIZE {
            return Err(invalid("shorter than 44 bytes"));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(invalid("missing RIFF/WAVE magic"));
        }
        if &bytes[12..16] != b"fmt " || read_u32(bytes, 16) != FMT_CHUNK_SIZE {
            return Err(invalid("fmt chunk is not a 16-byte PCM chunk"));
        }
        if read_u16(bytes, 20) != FORMAT_PCM {
            return Err(invalid("audio format is not PCM"));
        }
        if &bytes[36..40] != b"data" {
            return Err(invalid("data chunk does not follow fmt chunk"));
        }

        let header = Self {
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        };

        if header.channels == 0 {
            return Err(invalid("channel count is zero"));
        }
        if header.bits_per_sample != BITS_PER_SAMPLE {
            return Err(invalid("sample width is not 16 bits"));
        }
        if header.block_align as u32 != header.channels as u32 * BYTES_PER_SAMPLE as u32 {
            return Err(invalid("block align does not match channel count"));
        }
        if header.sample_rate.checked_mul(header.block_align as u32) != Some(header.byte_rate) {
            return Err(invalid("byte rate does not match sample rate and block align"));
        }
        if header.data_size.checked_add(36) != Some(read_u32(bytes, 4)) {
            return Err(invalid("RIFF size does not match data size"));
        }

        Ok(header)
    }
}

/// Read and parse the header at the start of a WAV file on disk
///
/// # Errors
/// `InvalidWav` if the file is not a canonical 16-bit PCM file
pub fn read_wav_header(path: &Path) -> Result<WavHeader> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AudioError::FileNotFound {
                path: path.display().to_string(),
                source: Some(e),
            }
        } else {
            AudioError::Io(e)
        }
    })?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE);
    file.take(WAV_HEADER_SIZE as u64).read_to_end(&mut bytes)?;
    WavHeader::parse(&bytes)
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

// ============================================================================
// Encoded output
// ============================================================================

/// An encoded WAV file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavBlob {
    bytes: Vec<u8>,
}

impl WavBlob {
    /// MIME type of the blob, always `audio/wav`
    pub fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Borrow the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take ownership of the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Hex SHA-256 of the encoded bytes
    pub fn sha256_hex(&self) -> String {
        let hash = Sha256::digest(&self.bytes);
        format!("{:x}", hash)
    }
}

impl AsRef<[u8]> for WavBlob {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

// ============================================================================
// Encoder
// ============================================================================

/// Convert a float sample to 16-bit PCM
///
/// The sample is clamped to [-1, 1]. Negative values scale by 32768 and the
/// rest by 32767, so both -32768 and 32767 are reachable. NaN maps to 0.
#[inline]
pub fn float_to_pcm16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0) as f64;
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

/// Stream a buffer as a 16-bit PCM WAV file into `writer`
pub fn write_wav<W: Write>(writer: &mut W, buffer: &AudioBuffer) -> Result<WavHeader> {
    let header = WavHeader::for_buffer(buffer)?;
    header.write_to(writer)?;

    let mut frame = Vec::with_capacity(header.block_align as usize);
    for i in 0..buffer.len() {
        frame.clear();
        for channel in buffer.channels() {
            frame.extend_from_slice(&float_to_pcm16(channel[i]).to_le_bytes());
        }
        writer.write_all(&frame)?;
    }

    Ok(header)
}

/// Encode a buffer into an in-memory WAV blob
///
/// The blob is exactly `44 + length * channels * 2` bytes. A zero-length
/// buffer yields the bare header.
pub fn audio_buffer_to_wav(buffer: &AudioBuffer) -> Result<WavBlob> {
    let header = WavHeader::for_buffer(buffer)?;
    let mut bytes = Vec::with_capacity(header.file_size());
    write_wav(&mut bytes, buffer)?;

    debug!(
        "Encoded {} frames x {} channels at {} Hz into {} bytes",
        buffer.len(),
        header.channels,
        header.sample_rate,
        bytes.len()
    );

    Ok(WavBlob { bytes })
}

/// Encode a buffer and write it to `path`
pub fn save_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AudioError::FileNotFound {
                path: path.display().to_string(),
                source: Some(e),
            }
        } else {
            AudioError::Io(e)
        }
    })?;

    let mut writer = BufWriter::new(file);
    let header = write_wav(&mut writer, buffer)?;
    writer.flush()?;

    debug!("Wrote {} bytes to {}", header.file_size(), path.display());
    Ok(())
}

/// Save a buffer as a WAV file in `dir`, named `filename` or `audio.wav`
///
/// # Returns
/// The path of the written file
pub fn download_audio_buffer_as_wav(
    buffer: &AudioBuffer,
    dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf> {
    let path = dir.join(filename.unwrap_or(DEFAULT_WAV_FILENAME));
    save_wav(buffer, &path)?;
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
