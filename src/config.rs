//! Engine configuration
//!
//! All fields have defaults, so a config file only needs the keys it
//! overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SoundDeckError};

/// Maximum simultaneous voices
pub const MAX_CONCURRENT: usize = 8;

/// Gain used when a pad has no stored volume
pub const DEFAULT_VOLUME: f32 = 0.8;

/// Uploads larger than this are rejected before decoding (25 MiB)
pub const MAX_FILE_SIZE: u64 = 25 * 1024 * 1024;

/// Export bundle schema version
pub const EXPORT_VERSION: u32 = 2;

/// Tunable engine and pipeline parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Polyphony ceiling for tracked voices
    pub max_concurrent: usize,
    /// Gain for `play_default` in [0, 1]
    pub default_volume: f32,
    /// Upload size limit in bytes
    pub max_file_size: u64,
    /// Version stamped into export bundles
    pub export_version: u32,
    /// Amplitude below which edge samples are trimmed
    pub trim_threshold: f32,
    /// Amplitude above which a sample counts as sound when segmenting
    pub segment_threshold: f32,
    /// Minimum silence run that separates two segments
    pub min_silence_secs: f64,
    /// Fade-in/fade-out length applied on ingest and chop
    pub fade_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: MAX_CONCURRENT,
            default_volume: DEFAULT_VOLUME,
            max_file_size: MAX_FILE_SIZE,
            export_version: EXPORT_VERSION,
            trim_threshold: crate::dsp::DEFAULT_TRIM_THRESHOLD,
            segment_threshold: crate::dsp::DEFAULT_SEGMENT_THRESHOLD,
            min_silence_secs: crate::dsp::DEFAULT_MIN_SILENCE_SECS,
            fade_ms: crate::dsp::DEFAULT_FADE_MS,
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a JSON file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(SoundDeckError::Config {
                reason: "max_concurrent must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(SoundDeckError::Config {
                reason: format!("default_volume {} is outside [0, 1]", self.default_volume),
            });
        }
        if self.trim_threshold <= 0.0 || self.segment_threshold <= 0.0 {
            return Err(SoundDeckError::Config {
                reason: "thresholds must be positive".to_string(),
            });
        }
        if self.min_silence_secs < 0.0 || self.fade_ms < 0.0 {
            return Err(SoundDeckError::Config {
                reason: "durations must not be negative".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_concurrent, 8);
        assert_eq!(config.max_file_size, 25 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_concurrent": 4 }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.default_volume, DEFAULT_VOLUME);
        assert_eq!(config.export_version, EXPORT_VERSION);
    }

    #[test]
    fn test_validate_rejects_zero_polyphony() {
        let config = EngineConfig {
            max_concurrent: 0,
            ..EngineConfig::default()
        };
        match config.validate() {
            Err(SoundDeckError::Config { reason }) => assert!(reason.contains("max_concurrent")),
            other => panic!("Expected Config error, got: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_volume() {
        let config = EngineConfig {
            default_volume: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
