//! Processing configuration
//!
//! Defaults for normalization and silence detection, optionally loaded from a
//! JSON file. Missing fields fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::utils::{
    DEFAULT_MIN_SEGMENT_SECS, DEFAULT_NORMALIZE_TARGET, DEFAULT_SILENCE_THRESHOLD,
};
use crate::error::{AudioError, Result};

/// Tunables shared by the buffer utilities and the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Peak level targeted by normalization
    pub normalize_target: f32,
    /// Amplitude below which a sample counts as silent
    pub silence_threshold: f32,
    /// Minimum length of a kept non-silent segment, in seconds
    pub min_segment_secs: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            normalize_target: DEFAULT_NORMALIZE_TARGET,
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            min_segment_secs: DEFAULT_MIN_SEGMENT_SECS,
        }
    }
}

impl ProcessingConfig {
    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AudioError::FileNotFound {
                    path: path.display().to_string(),
                    source: Some(e),
                }
            } else {
                AudioError::Io(e)
            }
        })?;

        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.normalize_target.is_finite() && self.normalize_target > 0.0) {
            return Err(AudioError::InvalidConfig {
                reason: format!(
                    "normalize_target must be positive, got {}",
                    self.normalize_target
                ),
            });
        }
        if !(self.silence_threshold.is_finite() && self.silence_threshold >= 0.0) {
            return Err(AudioError::InvalidConfig {
                reason: format!(
                    "silence_threshold must be non-negative, got {}",
                    self.silence_threshold
                ),
            });
        }
        if !(self.min_segment_secs.is_finite() && self.min_segment_secs >= 0.0) {
            return Err(AudioError::InvalidConfig {
                reason: format!(
                    "min_segment_secs must be non-negative, got {}",
                    self.min_segment_secs
                ),
            });
        }
        Ok(())
    }
}
