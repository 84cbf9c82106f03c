//! Microphone recording
//!
//! The device delivers interleaved blocks through `push`; on `stop` the
//! take is run through every ingest stage and encoded.

use log::{info, warn};

use crate::codec;
use crate::config::EngineConfig;
use crate::engine::{ChannelLayout, PcmBuffer};
use crate::error::{CaptureError, Result};
use crate::ingest::{process_buffer, ProcessingOptions};

/// Format a capture device delivers once opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    pub sample_rate: u32,
    pub layout: ChannelLayout,
}

/// An input device the recorder can open and close
pub trait CaptureDevice {
    /// Acquire the device
    ///
    /// Fails with `PermissionDenied` or `NoDevice` when the user or the
    /// platform refuses access.
    fn open(&mut self) -> std::result::Result<CaptureFormat, CaptureError>;

    /// Release the device
    fn close(&mut self);
}

struct Take {
    format: CaptureFormat,
    interleaved: Vec<f32>,
}

/// Records one take at a time from a `CaptureDevice`
pub struct Recorder<D: CaptureDevice> {
    device: D,
    take: Option<Take>,
}

impl<D: CaptureDevice> Recorder<D> {
    pub fn new(device: D) -> Self {
        Self { device, take: None }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_recording(&self) -> bool {
        self.take.is_some()
    }

    /// Recorded length so far, in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.take.as_ref().map_or(0.0, |take| {
            let channels = take.format.layout.num_channels();
            (take.interleaved.len() / channels) as f64 / f64::from(take.format.sample_rate)
        })
    }

    /// Open the device and begin a new take
    pub fn start(&mut self) -> std::result::Result<CaptureFormat, CaptureError> {
        if self.take.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let format = self.device.open()?;
        if format.sample_rate == 0 {
            self.device.close();
            return Err(CaptureError::Device {
                reason: "device reported a sample rate of 0".to_string(),
            });
        }

        info!(
            "Recording started: {} Hz, {} channel(s)",
            format.sample_rate,
            format.layout.num_channels()
        );
        self.take = Some(Take {
            format,
            interleaved: Vec::new(),
        });
        Ok(format)
    }

    /// Append an interleaved block from the device
    pub fn push(&mut self, block: &[f32]) -> std::result::Result<(), CaptureError> {
        let take = self.take.as_mut().ok_or(CaptureError::NotRecording)?;
        take.interleaved.extend_from_slice(block);
        Ok(())
    }

    /// Close the device and return the processed, encoded take
    ///
    /// A trailing partial frame is dropped.
    pub fn stop(&mut self, config: &EngineConfig) -> Result<Vec<u8>> {
        let take = self.take.take().ok_or(CaptureError::NotRecording)?;
        self.device.close();

        let channels = take.format.layout.num_channels();
        let whole = take.interleaved.len() - take.interleaved.len() % channels;
        if whole != take.interleaved.len() {
            warn!("Dropping {} samples of a partial frame", take.interleaved.len() - whole);
        }

        let raw = PcmBuffer::from_interleaved(
            &take.interleaved[..whole],
            take.format.layout,
            take.format.sample_rate,
        )?;
        info!("Recording stopped after {:.2}s", raw.duration_secs());

        let processed = process_buffer(&raw, ProcessingOptions::all(), config);
        codec::encode(&processed)
    }

    /// Abandon the current take, if any
    pub fn cancel(&mut self) {
        if self.take.take().is_some() {
            self.device.close();
            info!("Recording cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SoundDeckError;

    struct FakeDevice {
        result: std::result::Result<CaptureFormat, CaptureError>,
        open: bool,
    }

    impl FakeDevice {
        fn mono(sample_rate: u32) -> Self {
            Self {
                result: Ok(CaptureFormat {
                    sample_rate,
                    layout: ChannelLayout::Mono,
                }),
                open: false,
            }
        }
    }

    impl CaptureDevice for FakeDevice {
        fn open(&mut self) -> std::result::Result<CaptureFormat, CaptureError> {
            self.open = self.result.is_ok();
            self.result.clone()
        }

        fn close(&mut self) {
            self.open = false;
        }
    }

    #[test]
    fn test_record_processes_take() {
        let mut recorder = Recorder::new(FakeDevice::mono(8000));
        recorder.start().unwrap();
        assert!(recorder.device().open);

        recorder.push(&vec![0.0; 800]).unwrap();
        let loud: Vec<f32> = (0..1600).map(|i| if i % 2 == 0 { 0.3 } else { -0.3 }).collect();
        recorder.push(&loud).unwrap();
        recorder.push(&vec![0.0; 800]).unwrap();
        assert!((recorder.elapsed_secs() - 0.4).abs() < 1e-9);

        let bytes = recorder.stop(&EngineConfig::default()).unwrap();
        assert!(!recorder.is_recording());
        assert!(!recorder.device().open);

        let clip = codec::decode(&bytes).unwrap();
        // 1600 loud frames + 80 frames padding each side
        assert_eq!(clip.len(), 1760);
        assert!((clip.peak() - 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut recorder = Recorder::new(FakeDevice::mono(8000));
        recorder.start().unwrap();
        assert_eq!(recorder.start(), Err(CaptureError::AlreadyRecording));
    }

    #[test]
    fn test_not_recording() {
        let mut recorder = Recorder::new(FakeDevice::mono(8000));
        assert_eq!(recorder.push(&[0.1]), Err(CaptureError::NotRecording));
        assert!(matches!(
            recorder.stop(&EngineConfig::default()),
            Err(SoundDeckError::Capture(CaptureError::NotRecording))
        ));
    }

    #[test]
    fn test_permission_denied() {
        let mut recorder = Recorder::new(FakeDevice {
            result: Err(CaptureError::PermissionDenied),
            open: false,
        });
        let err: SoundDeckError = recorder.start().unwrap_err().into();
        assert_eq!(err.friendly_message(), "Microphone access denied");
        assert!(!recorder.is_recording());
    }

    #[test]
    fn test_cancel_discards_take() {
        let mut recorder = Recorder::new(FakeDevice::mono(8000));
        recorder.start().unwrap();
        recorder.push(&[0.5; 100]).unwrap();
        recorder.cancel();

        assert!(!recorder.is_recording());
        assert!(!recorder.device().open);
        assert_eq!(recorder.elapsed_secs(), 0.0);
    }
}
