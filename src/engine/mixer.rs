//! Software mixer
//!
//! Sums every active source into an interleaved output block. Sources whose
//! sample rate differs from the output rate are stepped through at the
//! rate ratio and read at the nearest earlier frame.

use std::sync::Arc;

use log::debug;

use crate::engine::graph::{AudioGraph, HaltError, SourceId, SourceParams};
use crate::engine::{ChannelLayout, PcmBuffer};

struct MixerSource {
    id: SourceId,
    buffer: Arc<PcmBuffer>,
    gain: f32,
    looping: bool,
    /// Read position in source frames
    position: f64,
    /// One past the last frame to play
    end_frame: usize,
    /// Source frames advanced per output frame
    step: f64,
}

impl MixerSource {
    /// A looping source over zero frames has nothing to repeat and ends
    fn is_finished(&self) -> bool {
        (!self.looping || self.end_frame == 0) && self.position >= self.end_frame as f64
    }

    /// Sample for output channel `out_ch` of an `out_channels`-wide mix
    fn frame_sample(&self, frame: usize, out_ch: usize, out_channels: usize) -> f32 {
        let buffer = &self.buffer;
        if buffer.channels() == 1 {
            buffer.channel(0)[frame]
        } else if out_channels == 1 {
            (buffer.channel(0)[frame] + buffer.channel(1)[frame]) * 0.5
        } else {
            buffer.channel(out_ch.min(1))[frame]
        }
    }
}

/// In-process `AudioGraph` that renders sources into sample blocks
pub struct Mixer {
    sample_rate: u32,
    layout: ChannelLayout,
    sources: Vec<MixerSource>,
    ended: Vec<SourceId>,
    next_id: u64,
}

impl Mixer {
    /// Create a mixer producing `layout` output at `sample_rate`
    pub fn new(sample_rate: u32, layout: ChannelLayout) -> Self {
        Self {
            sample_rate,
            layout,
            sources: Vec::new(),
            ended: Vec::new(),
            next_id: 0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Number of sources currently producing sound
    pub fn active_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn is_active(&self, source: SourceId) -> bool {
        self.sources.iter().any(|s| s.id == source)
    }

    /// Mix the next `out.len() / channels` frames into `out`
    ///
    /// `out` is overwritten, interleaved in the mixer's layout and clamped
    /// to [-1, 1]. Sources that run out during the block are queued for
    /// `take_ended`.
    pub fn render(&mut self, out: &mut [f32]) {
        let channels = self.layout.num_channels();
        out.fill(0.0);

        for source in &mut self.sources {
            for frame_out in out.chunks_exact_mut(channels) {
                if source.position >= source.end_frame as f64 {
                    if source.looping && source.end_frame > 0 {
                        source.position %= source.end_frame as f64;
                    } else {
                        break;
                    }
                }

                let frame = source.position as usize;
                for (ch, sample) in frame_out.iter_mut().enumerate() {
                    *sample += source.frame_sample(frame, ch, channels) * source.gain;
                }
                source.position += source.step;
            }
        }

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }

        let ended = &mut self.ended;
        self.sources.retain(|source| {
            if source.is_finished() {
                debug!("{} reached its end", source.id);
                ended.push(source.id);
                false
            } else {
                true
            }
        });
    }
}

impl AudioGraph for Mixer {
    fn start_source(&mut self, buffer: Arc<PcmBuffer>, params: SourceParams) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;

        let rate = buffer.sample_rate() as f64;
        let len = buffer.len();
        let start_frame = ((params.offset_secs.max(0.0) * rate).floor() as usize).min(len);
        let end_frame = match params.duration_secs {
            Some(duration) if !params.looping => {
                (start_frame + (duration.max(0.0) * rate).floor() as usize).min(len)
            }
            _ => len,
        };

        debug!(
            "{} started: frames {}..{} gain {:.2} loop {}",
            id, start_frame, end_frame, params.gain, params.looping
        );

        self.sources.push(MixerSource {
            id,
            buffer,
            gain: params.gain,
            looping: params.looping,
            position: start_frame as f64,
            end_frame,
            step: rate / self.sample_rate as f64,
        });
        id
    }

    fn halt(&mut self, source: SourceId) -> Result<(), HaltError> {
        match self.sources.iter().position(|s| s.id == source) {
            Some(index) => {
                self.sources.remove(index);
                Ok(())
            }
            None => Err(HaltError::AlreadyHalted(source)),
        }
    }

    fn take_ended(&mut self) -> Vec<SourceId> {
        std::mem::take(&mut self.ended)
    }
}
