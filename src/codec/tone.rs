//! Procedural tone synthesis
//!
//! Tones are written straight into 16-bit container bytes without building
//! a `PcmBuffer` first.

use std::fmt;
use std::str::FromStr;

use hound::{SampleFormat, WavSpec};
use serde::{Deserialize, Serialize};

use crate::codec::wav::{quantize, write_pcm16, ENCODE_BITS_PER_SAMPLE};
use crate::error::{Result, SoundDeckError};

/// Sample rate of every synthesized tone
pub const TONE_SAMPLE_RATE: u32 = 44100;

/// Overall gain applied after the envelope
const TONE_GAIN: f64 = 0.5;

/// Square wave amplitude before the envelope
const SQUARE_AMPLITUDE: f64 = 0.8;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Sawtooth,
        Waveform::Triangle,
    ];

    /// Raw oscillator value at time `t` seconds, before envelope and gain
    pub fn sample(self, frequency: f64, t: f64) -> f64 {
        let cycles = frequency * t;
        match self {
            Waveform::Sine => (2.0 * std::f64::consts::PI * cycles).sin(),
            Waveform::Square => {
                let s = (2.0 * std::f64::consts::PI * cycles).sin();
                if s > 0.0 {
                    SQUARE_AMPLITUDE
                } else if s < 0.0 {
                    -SQUARE_AMPLITUDE
                } else {
                    0.0
                }
            }
            Waveform::Sawtooth => 2.0 * cycles.rem_euclid(1.0) - 1.0,
            Waveform::Triangle => 4.0 * (cycles.rem_euclid(1.0) - 0.5).abs() - 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Waveform {
    type Err = SoundDeckError;

    fn from_str(s: &str) -> Result<Self> {
        Waveform::ALL
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| SoundDeckError::InvalidTone {
                reason: format!("unknown waveform '{}'", s),
            })
    }
}

/// Number of frames in a tone of `duration_secs`
pub fn tone_length(duration_secs: f64) -> usize {
    (TONE_SAMPLE_RATE as f64 * duration_secs).round() as usize
}

/// Synthesize a decaying tone as mono 44.1kHz 16-bit container bytes
///
/// Each frame is `waveform(t) * max(0, 1 - t/duration) * 0.5`, quantized
/// like `encode`.
///
/// # Errors
/// `InvalidTone` if frequency or duration is not a positive finite number.
pub fn synthesize_tone(frequency: f64, waveform: Waveform, duration_secs: f64) -> Result<Vec<u8>> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(SoundDeckError::InvalidTone {
            reason: format!("frequency must be positive, got {}", frequency),
        });
    }
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Err(SoundDeckError::InvalidTone {
            reason: format!("duration must be positive, got {}", duration_secs),
        });
    }

    let length = tone_length(duration_secs);
    let spec = WavSpec {
        channels: 1,
        sample_rate: TONE_SAMPLE_RATE,
        bits_per_sample: ENCODE_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let samples = (0..length).map(|i| {
        let t = i as f64 / TONE_SAMPLE_RATE as f64;
        let envelope = (1.0 - t / duration_secs).max(0.0);
        quantize((waveform.sample(frequency, t) * envelope * TONE_GAIN) as f32)
    });

    write_pcm16(spec, length, samples)
}

// ============================================================================
// Demo pads
// ============================================================================

/// A tone preset used to seed an empty library
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoTone {
    pub name: &'static str,
    pub icon: &'static str,
    pub category: &'static str,
    pub color: &'static str,
    pub frequency: f64,
    pub waveform: Waveform,
    pub duration_secs: f64,
}

impl DemoTone {
    pub fn synthesize(&self) -> Result<Vec<u8>> {
        synthesize_tone(self.frequency, self.waveform, self.duration_secs)
    }
}

/// Starter pads written when a library has no sounds
pub const DEMO_TONES: [DemoTone; 9] = [
    demo("Air Horn", "📯", "Effects", "red", 440.0, Waveform::Square, 0.8),
    demo("Ding", "🔔", "Alerts", "yellow", 880.0, Waveform::Sine, 0.5),
    demo("Bass Drop", "💥", "Music", "purple", 80.0, Waveform::Sawtooth, 1.0),
    demo("Laser", "⚡", "Effects", "blue", 1200.0, Waveform::Sawtooth, 0.3),
    demo("Sad Trombone", "🎺", "Funny", "orange", 300.0, Waveform::Square, 1.2),
    demo("Cymbal", "🥁", "Music", "teal", 5000.0, Waveform::Triangle, 0.6),
    demo("Boing", "🏀", "Funny", "green", 600.0, Waveform::Sine, 0.4),
    demo("Alert", "🚨", "Alerts", "red", 660.0, Waveform::Square, 0.7),
    demo("Click", "👆", "Effects", "pink", 2000.0, Waveform::Sine, 0.05),
];

const fn demo(
    name: &'static str,
    icon: &'static str,
    category: &'static str,
    color: &'static str,
    frequency: f64,
    waveform: Waveform,
    duration_secs: f64,
) -> DemoTone {
    DemoTone {
        name,
        icon,
        category,
        color,
        frequency,
        waveform,
        duration_secs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::wav::decode;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_waveform_formulas() {
        assert_abs_diff_eq!(Waveform::Sine.sample(1.0, 0.25), 1.0, epsilon = 1e-12);
        assert_eq!(Waveform::Square.sample(1.0, 0.25), 0.8);
        assert_eq!(Waveform::Square.sample(1.0, 0.75), -0.8);
        assert_eq!(Waveform::Square.sample(1.0, 0.0), 0.0);
        assert_abs_diff_eq!(Waveform::Sawtooth.sample(1.0, 0.0), -1.0);
        assert_abs_diff_eq!(Waveform::Sawtooth.sample(1.0, 0.5), 0.0);
        assert_abs_diff_eq!(Waveform::Triangle.sample(1.0, 0.0), 1.0);
        assert_abs_diff_eq!(Waveform::Triangle.sample(1.0, 0.5), -1.0);
        assert_abs_diff_eq!(Waveform::Triangle.sample(1.0, 0.25), 0.0);
    }

    #[test_case("sine", Waveform::Sine ; "sine")]
    #[test_case("SQUARE", Waveform::Square ; "uppercase")]
    #[test_case("Sawtooth", Waveform::Sawtooth ; "mixed case")]
    #[test_case("triangle", Waveform::Triangle ; "triangle")]
    fn test_waveform_parse(name: &str, expected: Waveform) {
        assert_eq!(name.parse::<Waveform>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<Waveform>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_waveform() {
        assert!(matches!(
            "noise".parse::<Waveform>(),
            Err(SoundDeckError::InvalidTone { .. })
        ));
    }

    #[test]
    fn test_sine_tone_decodes() {
        let bytes = synthesize_tone(440.0, Waveform::Sine, 0.5).unwrap();
        let buffer = decode(&bytes).unwrap();

        assert_eq!(buffer.channels(), 1);
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.len(), (44100.0_f64 * 0.5).round() as usize);

        let samples = buffer.channel(0);
        assert!(samples[0].abs() < 1e-4);

        let head_peak = samples[..1000].iter().fold(0.0_f32, |m, s| m.max(s.abs()));
        let tail_peak = samples[samples.len() - 1000..]
            .iter()
            .fold(0.0_f32, |m, s| m.max(s.abs()));
        assert!(head_peak > 0.4 && head_peak <= 0.5);
        assert!(tail_peak < 0.03, "tail peak {} should decay", tail_peak);
    }

    #[test]
    fn test_every_waveform_stays_within_gain() {
        for waveform in Waveform::ALL {
            let buffer = decode(&synthesize_tone(1000.0, waveform, 0.1).unwrap()).unwrap();
            assert!(buffer.peak() <= 0.5 + 1.0 / 32767.0, "{} too loud", waveform);
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(synthesize_tone(0.0, Waveform::Sine, 1.0).is_err());
        assert!(synthesize_tone(440.0, Waveform::Sine, -1.0).is_err());
        assert!(synthesize_tone(f64::NAN, Waveform::Sine, 1.0).is_err());
    }

    #[test]
    fn test_demo_tones_synthesize() {
        for tone in DEMO_TONES.iter() {
            let bytes = tone.synthesize().unwrap();
            let buffer = decode(&bytes).unwrap();
            assert_eq!(buffer.len(), tone_length(tone.duration_secs), "{}", tone.name);
        }
    }
}
