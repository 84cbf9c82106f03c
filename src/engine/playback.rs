//! Playback Engine
//!
//! Owns the decoded-buffer cache and the set of playing voices, enforces the
//! polyphony ceiling, and drives a single preview slot for the chopper.
//!
//! Each sound ID is either idle or playing:
//!
//! ```text
//!   idle --play--> playing --stop / natural end (non-looping)--> idle
//! ```
//!
//! All methods take `&mut self`, so the ceiling check in `play` and the
//! registration of the new voice can never be interleaved with another call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::{debug, warn};

use crate::codec;
use crate::config::EngineConfig;
use crate::engine::graph::{AudioGraph, SourceId, SourceParams};
use crate::engine::mixer::Mixer;
use crate::engine::PcmBuffer;
use crate::error::Result;
use crate::store::ClipStore;

/// Playback state of one sound ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Playing,
}

impl fmt::Display for VoiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoiceState::Idle => write!(f, "Idle"),
            VoiceState::Playing => write!(f, "Playing"),
        }
    }
}

/// One active playback of a sound
#[derive(Debug, Clone)]
pub struct Voice {
    source: SourceId,
    gain: f32,
    looping: bool,
    /// Kept so eviction from the cache never pulls audio from under a voice
    buffer: Arc<PcmBuffer>,
}

impl Voice {
    pub fn source(&self) -> SourceId {
        self.source
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn buffer(&self) -> &Arc<PcmBuffer> {
        &self.buffer
    }
}

/// Soundboard playback engine over an `AudioGraph`
pub struct SoundEngine<G: AudioGraph = Mixer> {
    graph: G,
    cache: HashMap<String, Arc<PcmBuffer>>,
    voices: HashMap<String, Voice>,
    preview: Option<SourceId>,
    max_concurrent: usize,
    default_volume: f32,
}

impl<G: AudioGraph> SoundEngine<G> {
    /// Create an engine with the default configuration
    pub fn new(graph: G) -> Self {
        Self::with_config(graph, &EngineConfig::default())
    }

    /// Create an engine using the polyphony ceiling and volume from `config`
    pub fn with_config(graph: G, config: &EngineConfig) -> Self {
        Self {
            graph,
            cache: HashMap::new(),
            voices: HashMap::new(),
            preview: None,
            max_concurrent: config.max_concurrent,
            default_volume: config.default_volume,
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    // ========================================================================
    // Buffer cache
    // ========================================================================

    /// Decode container bytes and cache the result under `id`
    ///
    /// Any previous entry for `id` is replaced. On failure the cause is
    /// logged, the cache is left as it was, and None is returned.
    pub fn decode(&mut self, id: &str, bytes: &[u8]) -> Option<Arc<PcmBuffer>> {
        match codec::decode(bytes) {
            Ok(buffer) => {
                let buffer = Arc::new(buffer);
                debug!(
                    "Decoded '{}': {} frames, {} ch @ {} Hz",
                    id,
                    buffer.len(),
                    buffer.channels(),
                    buffer.sample_rate()
                );
                self.cache.insert(id.to_string(), Arc::clone(&buffer));
                Some(buffer)
            }
            Err(e) => {
                warn!("Failed to decode audio for '{}': {}", id, e);
                None
            }
        }
    }

    /// Load `id` from a store and decode it into the cache
    ///
    /// Returns `Ok(None)` when the store has no clip for `id` or the clip
    /// does not decode.
    pub fn load_from_store<S: ClipStore + ?Sized>(
        &mut self,
        id: &str,
        store: &S,
    ) -> Result<Option<Arc<PcmBuffer>>> {
        match store.load(id)? {
            Some(bytes) => Ok(self.decode(id, &bytes)),
            None => {
                debug!("No stored clip for '{}'", id);
                Ok(None)
            }
        }
    }

    /// Cached buffer for `id`
    pub fn cached(&self, id: &str) -> Option<&Arc<PcmBuffer>> {
        self.cache.get(id)
    }

    /// Drop the cached buffer for `id`
    ///
    /// A voice already playing `id` keeps going with its own reference.
    pub fn evict(&mut self, id: &str) {
        if self.cache.remove(id).is_some() {
            debug!("Evicted '{}' from cache", id);
        }
    }

    // ========================================================================
    // Voices
    // ========================================================================

    /// Start playing `id` at `volume` (clamped to [0, 1])
    ///
    /// Returns false, without side effects, when the polyphony ceiling is
    /// reached, `id` is already playing, or nothing is cached for `id`.
    pub fn play(&mut self, id: &str, volume: f32, looping: bool) -> bool {
        if self.voices.len() >= self.max_concurrent || self.voices.contains_key(id) {
            debug!(
                "play('{}') refused: {} of {} voices active",
                id,
                self.voices.len(),
                self.max_concurrent
            );
            return false;
        }

        let Some(buffer) = self.cache.get(id).cloned() else {
            debug!("play('{}') refused: not decoded", id);
            return false;
        };

        let gain = volume.clamp(0.0, 1.0);
        let source = self
            .graph
            .start_source(Arc::clone(&buffer), SourceParams::new(gain, looping));
        self.voices.insert(
            id.to_string(),
            Voice {
                source,
                gain,
                looping,
                buffer,
            },
        );
        debug!("Playing '{}' on {} (loop {})", id, source, looping);
        true
    }

    /// `play` with the configured default volume, not looping
    pub fn play_default(&mut self, id: &str) -> bool {
        self.play(id, self.default_volume, false)
    }

    /// Stop `id` if it is playing; unknown or idle IDs are ignored
    pub fn stop(&mut self, id: &str) {
        if let Some(voice) = self.voices.remove(id) {
            // The source may have ended on its own already
            let _ = self.graph.halt(voice.source);
            debug!("Stopped '{}'", id);
        }
    }

    /// Stop every playing voice
    pub fn stop_all(&mut self) {
        for (_, voice) in self.voices.drain() {
            let _ = self.graph.halt(voice.source);
        }
        debug!("Stopped all voices");
    }

    pub fn is_playing(&self, id: &str) -> bool {
        self.voices.contains_key(id)
    }

    pub fn state(&self, id: &str) -> VoiceState {
        if self.is_playing(id) {
            VoiceState::Playing
        } else {
            VoiceState::Idle
        }
    }

    /// IDs of all playing voices, in no particular order
    pub fn active_sounds(&self) -> impl Iterator<Item = &str> {
        self.voices.keys().map(|id| id.as_str())
    }

    pub fn active_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, id: &str) -> Option<&Voice> {
        self.voices.get(id)
    }

    // ========================================================================
    // Preview
    // ========================================================================

    /// Play `buffer` once in the preview slot, replacing any running preview
    ///
    /// Previews ignore the polyphony ceiling and never show up as active
    /// sounds.
    pub fn preview_buffer(
        &mut self,
        buffer: Arc<PcmBuffer>,
        start_secs: f64,
        duration_secs: Option<f64>,
    ) {
        self.stop_preview();
        let params = SourceParams {
            offset_secs: start_secs,
            duration_secs,
            ..SourceParams::default()
        };
        let source = self.graph.start_source(buffer, params);
        debug!("Preview started on {}", source);
        self.preview = Some(source);
    }

    /// Stop the running preview, if any
    pub fn stop_preview(&mut self) {
        if let Some(source) = self.preview.take() {
            let _ = self.graph.halt(source);
        }
    }

    pub fn is_previewing(&self) -> bool {
        self.preview.is_some()
    }

    // ========================================================================
    // Completion
    // ========================================================================

    /// Retire voices and previews whose sources ended on their own
    ///
    /// Completions are matched by source, so a late end event for a voice
    /// that was stopped and restarted cannot remove the newer voice.
    pub fn poll(&mut self) {
        for source in self.graph.take_ended() {
            if self.preview == Some(source) {
                self.preview = None;
                continue;
            }

            let finished = self
                .voices
                .iter()
                .find(|(_, voice)| voice.source == source && !voice.looping)
                .map(|(id, _)| id.clone());

            if let Some(id) = finished {
                self.voices.remove(&id);
                debug!("'{}' finished", id);
            }
        }
    }
}

impl SoundEngine<Mixer> {
    /// Render the next block through the mixer and retire finished voices
    pub fn render(&mut self, out: &mut [f32]) {
        self.graph.render(out);
        self.poll();
    }
}
