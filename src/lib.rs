//! SoundDeck - Soundboard Audio Engine
//!
//! SoundDeck holds everything a soundboard needs below its UI:
//! 1. Clip codec - 16-bit WAV encode/decode and procedural tone synthesis
//! 2. Clip pipeline - trim, normalize and fade on ingest, plus the chopper
//! 3. Playback engine - decoded buffer cache, polyphonic voices and a
//!    single preview slot behind an `AudioGraph` seam
//!
//! # Data flow
//!
//! Raw bytes are decoded into a `PcmBuffer`, transformed by the pipeline and
//! re-encoded for storage. Stored bytes are decoded into the engine's cache
//! and played from there.

pub mod bundle;
pub mod cli;
pub mod codec;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod recorder;
pub mod store;

pub use config::EngineConfig;
pub use engine::{PcmBuffer, SoundEngine};
pub use error::{Result, SoundDeckError};
