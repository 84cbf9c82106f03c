//! Peak normalization

use crate::engine::PcmBuffer;

/// Peak level a normalized buffer is scaled to
pub const NORMALIZE_TARGET: f32 = 0.95;

/// Peaks below this are treated as silence and left alone
pub const NORMALIZE_FLOOR: f32 = 0.001;

/// Peaks this close to the target are already normalized
const TARGET_TOLERANCE: f32 = 1e-6;

/// Scale a buffer so its peak absolute sample reaches 0.95
///
/// Near-silent buffers (peak < 0.001) and buffers already near full scale
/// (peak > 0.95) come back unchanged. Repeating the call on its own output
/// is a no-op.
pub fn normalize(buffer: &PcmBuffer) -> PcmBuffer {
    let peak = buffer.peak();

    if peak < NORMALIZE_FLOOR || peak > NORMALIZE_TARGET {
        return buffer.clone();
    }
    if NORMALIZE_TARGET - peak <= TARGET_TOLERANCE {
        return buffer.clone();
    }

    let gain = NORMALIZE_TARGET / peak;
    buffer.map_samples(|_, _, s| s * gain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scales_to_target() {
        let buffer = PcmBuffer::from_channels(vec![vec![0.1, -0.5], vec![0.25, 0.0]], 8000).unwrap();
        let normalized = normalize(&buffer);

        assert_relative_eq!(normalized.peak(), 0.95, epsilon = 1e-6);
        assert_relative_eq!(normalized.channel(0)[0], 0.19, epsilon = 1e-6);
        assert_relative_eq!(normalized.channel(1)[0], 0.475, epsilon = 1e-6);
    }

    #[test]
    fn test_idempotent() {
        for peak in [0.0011_f32, 0.01, 0.3, 0.77, 0.949, 0.95] {
            let buffer = PcmBuffer::mono(vec![0.0, peak * 0.5, -peak, peak * 0.1], 8000).unwrap();
            let once = normalize(&buffer);
            let twice = normalize(&once);
            assert_eq!(once, twice, "not idempotent for peak {}", peak);
        }
    }

    #[test]
    fn test_near_silent_unchanged() {
        let buffer = PcmBuffer::mono(vec![0.0005, -0.0009, 0.0], 8000).unwrap();
        assert_eq!(normalize(&buffer), buffer);
    }

    #[test]
    fn test_hot_signal_unchanged() {
        let buffer = PcmBuffer::mono(vec![0.2, -0.97, 0.5], 8000).unwrap();
        assert_eq!(normalize(&buffer), buffer);
    }

    #[test]
    fn test_empty_unchanged() {
        let buffer = PcmBuffer::mono(Vec::new(), 8000).unwrap();
        assert!(normalize(&buffer).is_empty());
    }
}
