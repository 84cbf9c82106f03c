//! Container Codec
//!
//! Converts between PCM buffers and RIFF/WAVE bytes, and synthesizes tones
//! directly into container bytes.

pub mod tone;
pub mod wav;

pub use tone::{synthesize_tone, tone_length, DemoTone, Waveform, DEMO_TONES, TONE_SAMPLE_RATE};
pub use wav::{decode, encode, inspect, quantize, WavInfo, WAV_HEADER_LEN};
