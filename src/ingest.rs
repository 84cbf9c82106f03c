//! Ingestion Orchestrator
//!
//! Turns uploaded, recorded or chopped audio into clips ready for storage:
//! decode, then trim, normalize and fade in that fixed order, then encode.
//! Trimming first keeps leading silence out of the peak measurement, and
//! fading last keeps normalization from undoing the envelope.

use std::fmt;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::config::EngineConfig;
use crate::dsp::{self, Region, Segment};
use crate::engine::PcmBuffer;
use crate::error::{Result, SoundDeckError};

/// Shortest selection the chopper will save
pub const MIN_SELECTION_SECS: f64 = 0.02;

// ============================================================================
// Pipeline stages
// ============================================================================

/// One step of the ingest pipeline, declared in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Trim = 0,
    Normalize = 1,
    Fade = 2,
}

impl Stage {
    /// Run this stage with the thresholds from `config`
    pub fn apply(self, buffer: &PcmBuffer, config: &EngineConfig) -> PcmBuffer {
        match self {
            Stage::Trim => dsp::trim_silence(buffer, config.trim_threshold),
            Stage::Normalize => dsp::normalize(buffer),
            Stage::Fade => dsp::fade_in_out(buffer, config.fade_ms),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Trim => write!(f, "trim"),
            Stage::Normalize => write!(f, "normalize"),
            Stage::Fade => write!(f, "fade"),
        }
    }
}

/// Which ingest stages to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub trim: bool,
    pub normalize: bool,
    pub fade: bool,
}

impl ProcessingOptions {
    /// Every stage enabled, as used for microphone recordings
    pub fn all() -> Self {
        Self {
            trim: true,
            normalize: true,
            fade: true,
        }
    }

    /// Enabled stages in execution order
    pub fn stages(&self) -> Vec<Stage> {
        [
            (self.trim, Stage::Trim),
            (self.normalize, Stage::Normalize),
            (self.fade, Stage::Fade),
        ]
        .into_iter()
        .filter_map(|(enabled, stage)| enabled.then_some(stage))
        .collect()
    }
}

/// Run the enabled stages over a decoded buffer
pub fn process_buffer(
    buffer: &PcmBuffer,
    options: ProcessingOptions,
    config: &EngineConfig,
) -> PcmBuffer {
    let mut current = buffer.clone();
    for stage in options.stages() {
        current = stage.apply(&current, config);
        debug!("{}: {} frames", stage, current.len());
    }
    current
}

/// Decode, process and re-encode an uploaded or recorded file
///
/// # Errors
/// * `Decode` - the bytes are not a readable container
/// * `Encode` - the result is too large for a RIFF container
pub fn process_file(
    file_bytes: &[u8],
    options: ProcessingOptions,
    config: &EngineConfig,
) -> Result<Vec<u8>> {
    let buffer = codec::decode(file_bytes)?;
    let processed = process_buffer(&buffer, options, config);
    info!(
        "Processed clip: {} -> {} frames ({:?})",
        buffer.len(),
        processed.len(),
        options
    );
    codec::encode(&processed)
}

/// Read a file from disk, refusing anything over the configured size limit
pub fn read_clip_file(path: &Path, config: &EngineConfig) -> Result<Vec<u8>> {
    let size = std::fs::metadata(path)?.len();
    check_size(size, config)?;
    Ok(std::fs::read(path)?)
}

fn check_size(size: u64, config: &EngineConfig) -> Result<()> {
    if size > config.max_file_size {
        return Err(SoundDeckError::FileTooLarge {
            size,
            limit: config.max_file_size,
        });
    }
    Ok(())
}

/// Read and process a file without blocking the caller's runtime
///
/// Several files can be ingested concurrently, e.g. with `tokio::join!`.
#[cfg(feature = "async")]
pub async fn process_path(
    path: &Path,
    options: ProcessingOptions,
    config: &EngineConfig,
) -> Result<Vec<u8>> {
    let size = tokio::fs::metadata(path).await?.len();
    check_size(size, config)?;
    let bytes = tokio::fs::read(path).await?;
    process_file(&bytes, options, config)
}

// ============================================================================
// Chopper
// ============================================================================

/// A chopped clip ready for storage
#[derive(Debug, Clone, PartialEq)]
pub struct Chop {
    pub region: Region,
    pub bytes: Vec<u8>,
}

/// Extract, normalize, fade and encode one selection
///
/// Returns `Ok(None)` for selections shorter than 20ms or that fall outside
/// the buffer.
pub fn save_region(
    buffer: &PcmBuffer,
    region: &Region,
    config: &EngineConfig,
) -> Result<Option<Vec<u8>>> {
    if region.duration_secs() < MIN_SELECTION_SECS {
        debug!("Selection '{}' too short", region.label);
        return Ok(None);
    }

    let Some(extracted) = dsp::extract_region(buffer, region.start, region.end) else {
        debug!("Selection '{}' is empty", region.label);
        return Ok(None);
    };

    let processed = dsp::fade_in_out(&dsp::normalize(&extracted), config.fade_ms);
    codec::encode(&processed).map(Some)
}

/// Split a buffer at its silences and save every segment
///
/// Regions are labelled `Auto N`, numbered and coloured from
/// `first_index + 1` so they continue an existing region list.
pub fn auto_split(
    buffer: &PcmBuffer,
    first_index: usize,
    config: &EngineConfig,
) -> Result<Vec<Chop>> {
    let segments: Vec<Segment> =
        dsp::detect_silences(buffer, config.segment_threshold, config.min_silence_secs);

    let mut chops = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let index = first_index + i;
        let region = Region::new(
            segment.start,
            segment.end,
            format!("Auto {}", index + 1),
            index,
        );
        if let Some(bytes) = save_region(buffer, &region, config)? {
            chops.push(Chop { region, bytes });
        }
    }

    info!("Auto-split found {} segments", chops.len());
    Ok(chops)
}
