//! PCM Buffer
//!
//! Decoded audio as non-interleaved 32-bit float channels. Buffers are
//! treated as values: every pipeline stage builds a new buffer instead of
//! mutating the one it was given.

use crate::error::{Result, SoundDeckError};

// ============================================================================
// Channel Layout
// ============================================================================

/// Audio channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelLayout {
    /// Single channel (mono)
    #[default]
    Mono,
    /// Two channels (stereo: left, right)
    Stereo,
}

impl ChannelLayout {
    /// Returns the number of channels for this layout
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelLayout::Mono => 1,
            ChannelLayout::Stereo => 2,
        }
    }

    /// Create a ChannelLayout from a channel count
    pub fn from_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ChannelLayout::Mono),
            2 => Some(ChannelLayout::Stereo),
            _ => None,
        }
    }
}

// ============================================================================
// PCM Buffer
// ============================================================================

/// Decoded audio: sample rate plus one equal-length `Vec<f32>` per channel
///
/// Samples are nominally in [-1, 1]. Only mono and stereo buffers can be
/// constructed, and all channels always have the same length.
///
/// # Example
/// ```
/// use sounddeck::engine::{ChannelLayout, PcmBuffer};
///
/// let buffer = PcmBuffer::silent(44100, ChannelLayout::Stereo, 44100);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 44100);
/// assert_eq!(buffer.duration_secs(), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    samples: Vec<Vec<f32>>,
    sample_rate: u32,
}

impl PcmBuffer {
    /// Create a zeroed buffer with `num_frames` samples per channel
    pub fn silent(num_frames: usize, layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; num_frames]; layout.num_channels()],
            sample_rate,
        }
    }

    /// Create a buffer from per-channel sample vectors
    ///
    /// # Errors
    /// `InvalidBuffer` if there are not 1 or 2 channels, the channels differ
    /// in length, or the sample rate is zero.
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        if ChannelLayout::from_count(samples.len()).is_none() {
            return Err(SoundDeckError::InvalidBuffer {
                reason: format!("{} channels (only mono/stereo supported)", samples.len()),
            });
        }
        if sample_rate == 0 {
            return Err(SoundDeckError::InvalidBuffer {
                reason: "sample rate is zero".to_string(),
            });
        }
        let len = samples[0].len();
        if samples.iter().any(|ch| ch.len() != len) {
            return Err(SoundDeckError::InvalidBuffer {
                reason: "channels have different lengths".to_string(),
            });
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Build a buffer whose shape the caller has already checked
    pub(crate) fn from_checked(samples: Vec<Vec<f32>>, sample_rate: u32) -> Self {
        debug_assert!(ChannelLayout::from_count(samples.len()).is_some());
        debug_assert!(sample_rate > 0);
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a mono buffer
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::from_channels(vec![samples], sample_rate)
    }

    /// Create a buffer from interleaved sample data (L, R, L, R, ... for stereo)
    ///
    /// A trailing partial frame is an error rather than being dropped.
    pub fn from_interleaved(
        interleaved: &[f32],
        layout: ChannelLayout,
        sample_rate: u32,
    ) -> Result<Self> {
        let num_channels = layout.num_channels();

        if interleaved.len() % num_channels != 0 {
            return Err(SoundDeckError::InvalidBuffer {
                reason: format!(
                    "interleaved data length {} is not divisible by channel count {}",
                    interleaved.len(),
                    num_channels
                ),
            });
        }

        let num_frames = interleaved.len() / num_channels;
        let mut samples = vec![Vec::with_capacity(num_frames); num_channels];

        for frame in interleaved.chunks_exact(num_channels) {
            for (ch, &sample) in frame.iter().enumerate() {
                samples[ch].push(sample);
            }
        }

        Self::from_channels(samples, sample_rate)
    }

    /// Convert the buffer to interleaved format (left before right)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());

        for frame in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[frame]);
            }
        }

        interleaved
    }

    /// Number of channels (1 or 2)
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Channel layout matching `channels()`
    pub fn layout(&self) -> ChannelLayout {
        if self.channels() == 2 {
            ChannelLayout::Stereo
        } else {
            ChannelLayout::Mono
        }
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel (0 = mono/left, 1 = right)
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Iterate over all channels
    pub fn iter_channels(&self) -> impl Iterator<Item = &[f32]> {
        self.samples.iter().map(|ch| ch.as_slice())
    }

    /// Sample at `channel`/`frame`, or None when out of bounds
    #[inline]
    pub fn get_sample(&self, channel: usize, frame: usize) -> Option<f32> {
        self.samples
            .get(channel)
            .and_then(|ch| ch.get(frame).copied())
    }

    /// Highest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Copy of the frames in `[start, end)` across all channels
    ///
    /// Callers guarantee `start <= end <= len()`.
    pub(crate) fn slice_frames(&self, start: usize, end: usize) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .map(|ch| ch[start..end].to_vec())
                .collect(),
            sample_rate: self.sample_rate,
        }
    }

    /// New buffer with `f(channel, frame, sample)` applied to every sample
    pub(crate) fn map_samples<F>(&self, mut f: F) -> Self
    where
        F: FnMut(usize, usize, f32) -> f32,
    {
        Self {
            samples: self
                .samples
                .iter()
                .enumerate()
                .map(|(ch, data)| {
                    data.iter()
                        .enumerate()
                        .map(|(i, &s)| f(ch, i, s))
                        .collect()
                })
                .collect(),
            sample_rate: self.sample_rate,
        }
    }
}
