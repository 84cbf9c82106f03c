//! Silence trimming
//!
//! Leading and trailing quiet samples are detected on channel 0 and the
//! same frame range is cut from every channel.

use log::debug;

use crate::engine::PcmBuffer;

/// Amplitude below which an edge sample counts as silence
pub const DEFAULT_TRIM_THRESHOLD: f32 = 0.02;

/// Padding kept around the detected sound on each side
const TRIM_PAD_SECS: f64 = 0.01;

/// Remove leading and trailing silence
///
/// Scans channel 0 from both ends past samples with `|x| < threshold`, then
/// restores up to 10ms of the trimmed silence on each side. Each side's
/// padding is capped by what was trimmed from that side, so the result is
/// never longer than the input.
///
/// A buffer with no sample at or above the threshold collapses to its final
/// frame. An empty buffer is returned unchanged.
pub fn trim_silence(buffer: &PcmBuffer, threshold: f32) -> PcmBuffer {
    let data = buffer.channel(0);
    if data.is_empty() {
        return buffer.clone();
    }

    let last = data.len() - 1;
    let mut start = 0;
    let mut end = last;

    while start < end && data[start].abs() < threshold {
        start += 1;
    }
    while end > start && data[end].abs() < threshold {
        end -= 1;
    }

    if data[start].abs() < threshold {
        debug!("trim_silence: {} frames all below threshold", data.len());
        return buffer.slice_frames(last, last + 1);
    }

    let pad = (buffer.sample_rate() as f64 * TRIM_PAD_SECS).floor() as usize;
    let start = start - pad.min(start);
    let end = end + pad.min(last - end);

    debug!(
        "trim_silence: kept frames {}..={} of {}",
        start,
        end,
        data.len()
    );

    buffer.slice_frames(start, end + 1)
}
