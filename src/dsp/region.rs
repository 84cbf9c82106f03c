//! Region selection and extraction
//!
//! A `Region` only describes a time span of a buffer. Audio is copied out
//! of the source buffer when the region is extracted.

use serde::{Deserialize, Serialize};

use crate::engine::PcmBuffer;

/// Display colours cycled through as regions are created
pub const REGION_PALETTE: [&str; 8] = [
    "#ff3d71", "#00e5a0", "#7b61ff", "#ffaa00", "#3d9eff", "#ff61a6", "#00d4c8", "#ffe144",
];

/// A labelled `[start, end)` selection in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub start: f64,
    pub end: f64,
    pub label: String,
    pub color: String,
}

impl Region {
    /// Create a region, taking the colour for the `index`-th region from the palette
    pub fn new(start: f64, end: f64, label: impl Into<String>, index: usize) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            color: REGION_PALETTE[index % REGION_PALETTE.len()].to_string(),
        }
    }

    pub fn duration_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Copy the frames between `start_secs` and `end_secs` into a new buffer
///
/// Seconds map to frames with `floor(sec * sample_rate)`; the start is
/// clamped to 0 and the end to the buffer length. Returns `None` when the
/// clamped selection is empty.
pub fn extract_region(buffer: &PcmBuffer, start_secs: f64, end_secs: f64) -> Option<PcmBuffer> {
    let sample_rate = buffer.sample_rate() as f64;
    let len = buffer.len() as i64;

    let start = ((start_secs * sample_rate).floor() as i64).clamp(0, len);
    let end = ((end_secs * sample_rate).floor() as i64).min(len);

    if end - start <= 0 {
        return None;
    }

    Some(buffer.slice_frames(start as usize, end as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_buffer(frames: usize, sample_rate: u32) -> PcmBuffer {
        let left: Vec<f32> = (0..frames).map(|i| i as f32 / frames as f32).collect();
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        PcmBuffer::from_channels(vec![left, right], sample_rate).unwrap()
    }

    #[test]
    fn test_extracts_frames() {
        let buffer = ramp_buffer(1000, 1000);
        let region = extract_region(&buffer, 0.25, 0.5).unwrap();

        assert_eq!(region.len(), 250);
        assert_eq!(region.channels(), 2);
        assert_eq!(region.channel(0)[0], buffer.channel(0)[250]);
        assert_eq!(region.channel(1)[249], buffer.channel(1)[499]);
    }

    #[test]
    fn test_zero_width_is_none() {
        let buffer = ramp_buffer(1000, 1000);
        assert!(extract_region(&buffer, 0.5, 0.5).is_none());
        assert!(extract_region(&buffer, 0.7, 0.2).is_none());
    }

    #[test]
    fn test_out_of_range_clamps() {
        let buffer = ramp_buffer(1000, 1000);
        let duration = buffer.duration_secs();
        let region = extract_region(&buffer, -1.0, duration + 5.0).unwrap();

        assert_eq!(region, buffer);
    }

    #[test]
    fn test_selection_past_end_is_none() {
        let buffer = ramp_buffer(1000, 1000);
        assert!(extract_region(&buffer, 2.0, 3.0).is_none());
    }

    #[test]
    fn test_region_palette_cycles() {
        let first = Region::new(0.0, 1.0, "Region 1", 0);
        let ninth = Region::new(0.0, 1.0, "Region 9", 8);
        assert_eq!(first.color, ninth.color);
        assert_eq!(first.duration_secs(), 1.0);
    }
}
