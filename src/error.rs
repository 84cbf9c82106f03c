//! Error handling for SoundDeck
//!
//! Decode and capture failures are surfaced to the caller and leave prior
//! state untouched. Normal "no effect" outcomes (polyphony ceiling reached,
//! empty chopper selection) are not errors and never appear here.

use thiserror::Error;

/// Result type alias for SoundDeck operations
pub type Result<T> = std::result::Result<T, SoundDeckError>;

/// Failure to parse container bytes into a PCM buffer
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Bad RIFF/WAVE header, truncated data or an unsupported format code
    #[error("malformed audio container: {0}")]
    Malformed(#[from] hound::Error),

    #[error("unsupported channel count: {channels} (only mono/stereo)")]
    UnsupportedChannels { channels: u16 },

    #[error("unsupported bit depth: {bits}-bit {format}")]
    UnsupportedBitDepth { bits: u16, format: &'static str },

    #[error("invalid sample rate: {sample_rate} Hz")]
    InvalidSampleRate { sample_rate: u32 },
}

/// Failure to acquire or drive a capture device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("microphone access denied")]
    PermissionDenied,

    #[error("no microphone found")]
    NoDevice,

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("no recording in progress")]
    NotRecording,

    #[error("recording failed: {reason}")]
    Device { reason: String },
}

/// Main error type for SoundDeck operations
#[derive(Error, Debug)]
pub enum SoundDeckError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Invalid PCM buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("File too large: {size} bytes (limit {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Invalid tone parameters: {reason}")]
    InvalidTone { reason: String },

    #[error("Encode error: {reason}")]
    Encode { reason: String },

    #[error("Bundle error: {reason}")]
    Bundle { reason: String },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Clip not found: {id}")]
    ClipNotFound { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SoundDeckError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundDeckError::Decode(_) => "DECODE_ERROR",
            SoundDeckError::Capture(_) => "CAPTURE_ERROR",
            SoundDeckError::InvalidBuffer { .. } => "INVALID_BUFFER",
            SoundDeckError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            SoundDeckError::InvalidTone { .. } => "INVALID_TONE",
            SoundDeckError::Encode { .. } => "ENCODE_ERROR",
            SoundDeckError::Bundle { .. } => "BUNDLE_ERROR",
            SoundDeckError::Config { .. } => "CONFIG_ERROR",
            SoundDeckError::ClipNotFound { .. } => "CLIP_NOT_FOUND",
            SoundDeckError::Io(_) => "IO_ERROR",
            SoundDeckError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if the user can recover by retrying with different input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SoundDeckError::Decode(_)
                | SoundDeckError::Capture(_)
                | SoundDeckError::FileTooLarge { .. }
                | SoundDeckError::InvalidTone { .. }
                | SoundDeckError::Bundle { .. }
                | SoundDeckError::ClipNotFound { .. }
        )
    }

    /// Short text for a transient user notification
    pub fn friendly_message(&self) -> String {
        match self {
            SoundDeckError::Decode(_) => "Could not read that audio file".to_string(),
            SoundDeckError::Capture(CaptureError::PermissionDenied) => {
                "Microphone access denied".to_string()
            }
            SoundDeckError::Capture(CaptureError::NoDevice) => "No microphone found".to_string(),
            SoundDeckError::Capture(err) => format!("Recording failed: {}", err),
            SoundDeckError::FileTooLarge { limit, .. } => {
                format!("File too large (max {} MB)", limit / (1024 * 1024))
            }
            SoundDeckError::Bundle { .. } => "Invalid file".to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = SoundDeckError::ClipNotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.error_code(), "CLIP_NOT_FOUND");

        let err: SoundDeckError = CaptureError::NoDevice.into();
        assert_eq!(err.error_code(), "CAPTURE_ERROR");
    }

    #[test]
    fn test_friendly_messages() {
        let err: SoundDeckError = CaptureError::PermissionDenied.into();
        assert_eq!(err.friendly_message(), "Microphone access denied");
        assert!(err.is_recoverable());

        let err = SoundDeckError::FileTooLarge {
            size: 30 * 1024 * 1024,
            limit: 25 * 1024 * 1024,
        };
        assert_eq!(err.friendly_message(), "File too large (max 25 MB)");
    }

    #[test]
    fn test_decode_error_wraps_hound() {
        let err: SoundDeckError = DecodeError::from(hound::Error::Unsupported).into();
        assert_eq!(err.error_code(), "DECODE_ERROR");
        assert!(err.to_string().contains("malformed"));
    }
}
