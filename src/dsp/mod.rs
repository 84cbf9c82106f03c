//! Signal Processing Pipeline
//!
//! Pure transforms over `PcmBuffer`s used when ingesting or chopping clips.
//! Every function leaves its input untouched and returns a new buffer, and
//! all of them are total over well-formed buffers.

mod fade;
mod normalize;
mod region;
mod segment;
mod trim;

pub use fade::{fade_frames, fade_in_out, DEFAULT_FADE_MS};
pub use normalize::{normalize, NORMALIZE_FLOOR, NORMALIZE_TARGET};
pub use region::{extract_region, Region, REGION_PALETTE};
pub use segment::{
    detect_silences, Segment, DEFAULT_MIN_SILENCE_SECS, DEFAULT_SEGMENT_THRESHOLD,
    MIN_SEGMENT_SECS,
};
pub use trim::{trim_silence, DEFAULT_TRIM_THRESHOLD};
