//! Silence-based segmentation
//!
//! Splits a recording into the stretches of sound between silences, as used
//! by the chopper's auto-split.

use serde::{Deserialize, Serialize};

use crate::engine::PcmBuffer;

/// Amplitude above which a sample counts as sound
pub const DEFAULT_SEGMENT_THRESHOLD: f32 = 0.03;

/// Quiet run that ends a segment
pub const DEFAULT_MIN_SILENCE_SECS: f64 = 0.15;

/// Segments shorter than this are discarded
pub const MIN_SEGMENT_SECS: f64 = 0.05;

/// A sound-present interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Outside,
    InSound {
        sound_start: usize,
        silence_start: Option<usize>,
    },
}

/// Find the sound segments of channel 0 that are separated by silence
///
/// A segment opens on the first sample louder than `threshold` and closes
/// at the start of the first quiet run lasting `min_silence_secs`. A louder
/// sample before the run is long enough cancels it. A segment still open at
/// the end of the buffer ends at the buffer's duration. Segments shorter than
/// 50ms are dropped. Results are in chronological order.
pub fn detect_silences(buffer: &PcmBuffer, threshold: f32, min_silence_secs: f64) -> Vec<Segment> {
    let data = buffer.channel(0);
    let sample_rate = buffer.sample_rate() as f64;
    let min_run = (min_silence_secs * sample_rate).floor() as usize;

    let mut segments = Vec::new();
    let mut state = ScanState::Outside;

    for (i, &sample) in data.iter().enumerate() {
        let loud = sample.abs() > threshold;

        state = match state {
            ScanState::Outside if loud => ScanState::InSound {
                sound_start: i,
                silence_start: None,
            },
            ScanState::Outside => ScanState::Outside,
            ScanState::InSound { sound_start, .. } if loud => ScanState::InSound {
                sound_start,
                silence_start: None,
            },
            ScanState::InSound {
                sound_start,
                silence_start,
            } => {
                let quiet_from = silence_start.unwrap_or(i);
                if i + 1 - quiet_from >= min_run {
                    segments.push(Segment {
                        start: sound_start as f64 / sample_rate,
                        end: quiet_from as f64 / sample_rate,
                    });
                    ScanState::Outside
                } else {
                    ScanState::InSound {
                        sound_start,
                        silence_start: Some(quiet_from),
                    }
                }
            }
        };
    }

    if let ScanState::InSound { sound_start, .. } = state {
        segments.push(Segment {
            start: sound_start as f64 / sample_rate,
            end: buffer.duration_secs(),
        });
    }

    segments.retain(|s| s.duration_secs() >= MIN_SEGMENT_SECS);
    segments
}
