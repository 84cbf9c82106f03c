//! Linear fade envelopes

use crate::engine::PcmBuffer;

/// Fade length used on ingest and when saving chopped regions
pub const DEFAULT_FADE_MS: f64 = 15.0;

/// Number of frames covered by a fade of `ms` milliseconds
pub fn fade_frames(sample_rate: u32, ms: f64) -> usize {
    (sample_rate as f64 * ms / 1000.0).round().max(0.0) as usize
}

/// Apply a linear fade-in and fade-out to every channel
///
/// Frame `i` of the first `n` frames is scaled by `i / n`, and the last `n`
/// frames get the mirrored ramp, where `n = round(sample_rate * ms / 1000)`.
/// When `n` exceeds the buffer length both ramps cover the whole buffer and
/// multiply together.
pub fn fade_in_out(buffer: &PcmBuffer, ms: f64) -> PcmBuffer {
    let n = fade_frames(buffer.sample_rate(), ms);
    let len = buffer.len();
    if n == 0 || len == 0 {
        return buffer.clone();
    }

    let ramp = |i: usize| if i < n { i as f32 / n as f32 } else { 1.0 };

    buffer.map_samples(|_, i, s| s * ramp(i) * ramp(len - 1 - i))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_fade_frames_rounds() {
        assert_eq!(fade_frames(44100, 15.0), 662);
        assert_eq!(fade_frames(48000, 15.0), 720);
        assert_eq!(fade_frames(1000, 0.4), 0);
    }

    #[test]
    fn test_ramps_both_ends() {
        // 10ms at 1kHz = 10 frames
        let buffer = PcmBuffer::mono(vec![1.0; 100], 1000).unwrap();
        let faded = fade_in_out(&buffer, 10.0);
        let data = faded.channel(0);

        assert_eq!(data[0], 0.0);
        assert_abs_diff_eq!(data[5], 0.5);
        assert_eq!(data[10], 1.0);
        assert_eq!(data[50], 1.0);
        assert_abs_diff_eq!(data[94], 0.5);
        assert_eq!(data[99], 0.0);
    }

    #[test]
    fn test_channels_faded_independently() {
        let buffer =
            PcmBuffer::from_channels(vec![vec![1.0; 40], vec![-0.5; 40]], 1000).unwrap();
        let faded = fade_in_out(&buffer, 10.0);

        assert_abs_diff_eq!(faded.channel(0)[2], 0.2);
        assert_abs_diff_eq!(faded.channel(1)[2], -0.1);
        assert_abs_diff_eq!(faded.channel(1)[37], -0.1);
    }

    #[test]
    fn test_fade_longer_than_buffer() {
        let buffer = PcmBuffer::mono(vec![1.0; 5], 1000).unwrap();
        let faded = fade_in_out(&buffer, 100.0);

        assert_eq!(faded.len(), 5);
        assert_eq!(faded.channel(0)[0], 0.0);
        assert_eq!(faded.channel(0)[4], 0.0);
        assert_abs_diff_eq!(faded.channel(0)[2], 0.02 * 0.02);
    }

    #[test]
    fn test_zero_length_fade_is_noop() {
        let buffer = PcmBuffer::mono(vec![0.3; 10], 1000).unwrap();
        assert_eq!(fade_in_out(&buffer, 0.0), buffer);
    }
}
