//! Audio Engine Module
//!
//! Core playback engine including:
//! - PCM buffer type
//! - Audio graph seam and the software mixer behind it
//! - Voice management with polyphony limit and preview slot

pub mod buffer;
pub mod graph;
pub mod mixer;
pub mod playback;

pub use buffer::{ChannelLayout, PcmBuffer};
pub use graph::{AudioGraph, HaltError, SourceId, SourceParams};
pub use mixer::Mixer;
pub use playback::{SoundEngine, Voice, VoiceState};
