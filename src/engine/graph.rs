//! Audio graph seam
//!
//! The playback engine only needs three things from whatever produces sound:
//! start a source, halt a source, and report sources that finished on their
//! own. `Mixer` is the in-process implementation; a host with its own audio
//! backend can implement `AudioGraph` instead.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::engine::PcmBuffer;

/// Handle to one started source, unique for the lifetime of a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source#{}", self.0)
    }
}

/// How a source plays its buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceParams {
    /// Linear gain in [0, 1]
    pub gain: f32,
    /// Restart from the beginning instead of ending
    pub looping: bool,
    /// Playback starts this far into the buffer
    pub offset_secs: f64,
    /// Stop after this much audio; None plays to the end
    pub duration_secs: Option<f64>,
}

impl SourceParams {
    /// Full-buffer playback at `gain`
    pub fn new(gain: f32, looping: bool) -> Self {
        Self {
            gain,
            looping,
            offset_secs: 0.0,
            duration_secs: None,
        }
    }
}

impl Default for SourceParams {
    fn default() -> Self {
        Self::new(1.0, false)
    }
}

/// Halting a source that is no longer running
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltError {
    #[error("{0} has already stopped")]
    AlreadyHalted(SourceId),
}

/// Something that can play PCM buffers
pub trait AudioGraph {
    /// Start playing `buffer` immediately
    fn start_source(&mut self, buffer: Arc<PcmBuffer>, params: SourceParams) -> SourceId;

    /// Stop a source right away
    ///
    /// # Errors
    /// `AlreadyHalted` if the source ended or was halted before.
    fn halt(&mut self, source: SourceId) -> Result<(), HaltError>;

    /// Sources that reached their end since the last call
    fn take_ended(&mut self) -> Vec<SourceId>;
}
