//! RIFF/WAVE codec
//!
//! Decoding accepts any integer PCM depth `hound` understands (8/16/24/32)
//! plus 32-bit float, mono or stereo. Encoding always produces 16-bit PCM
//! with the canonical 44-byte header.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::PcmBuffer;
use crate::error::{DecodeError, Result, SoundDeckError};

/// Size of the canonical PCM header written by `encode`
pub const WAV_HEADER_LEN: usize = 44;

/// Bit depth of everything this crate writes
pub const ENCODE_BITS_PER_SAMPLE: u16 = 16;

/// Full-scale value for 16-bit quantization
const I16_SCALE: f32 = 32767.0;

/// Header fields of a container, read without decoding the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub is_float: bool,
    /// Frames (samples per channel) declared by the data chunk
    pub frames: u32,
}

impl WavInfo {
    /// Declared duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Read the header of a container
pub fn inspect(bytes: &[u8]) -> std::result::Result<WavInfo, DecodeError> {
    let reader = WavReader::new(bytes)?;
    let spec = reader.spec();
    check_spec(&spec)?;

    Ok(WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        is_float: spec.sample_format == SampleFormat::Float,
        frames: reader.duration(),
    })
}

/// Decode container bytes into a PCM buffer
///
/// # Errors
/// * `Malformed` - bad header, unsupported format code, or a data chunk
///   shorter than its declared size
/// * `UnsupportedChannels` - anything but mono or stereo
/// * `UnsupportedBitDepth` - e.g. 64-bit float
/// * `InvalidSampleRate` - a zero sample rate
pub fn decode(bytes: &[u8]) -> std::result::Result<PcmBuffer, DecodeError> {
    let reader = WavReader::new(bytes)?;
    let spec = reader.spec();
    check_spec(&spec)?;

    let interleaved = read_samples_as_f32(reader, &spec)?;
    let channels = deinterleave(&interleaved, spec.channels as usize);

    Ok(PcmBuffer::from_checked(channels, spec.sample_rate))
}

/// Encode a PCM buffer as 16-bit PCM container bytes
///
/// Channels are interleaved left/right and every sample is quantized as
/// `round(clamp(x, -1, 1) * 32767)`.
///
/// # Errors
/// `Encode` only if the data would not fit a RIFF chunk (over 4 GiB).
pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: ENCODE_BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let interleaved = buffer.to_interleaved();
    write_pcm16(spec, interleaved.len(), interleaved.into_iter().map(quantize))
}

/// Quantize a float sample to 16-bit
#[inline]
pub fn quantize(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * I16_SCALE).round() as i16
}

/// Write 16-bit samples behind a canonical header
pub(crate) fn write_pcm16<I>(spec: WavSpec, sample_count: usize, samples: I) -> Result<Vec<u8>>
where
    I: Iterator<Item = i16>,
{
    let data_len = sample_count as u64 * 2;
    if data_len + (WAV_HEADER_LEN as u64 - 8) > u32::MAX as u64 {
        return Err(SoundDeckError::Encode {
            reason: format!("{} bytes of sample data exceed the RIFF size limit", data_len),
        });
    }

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + data_len as usize));
    {
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(encode_error)?;
        for sample in samples {
            writer.write_sample(sample).map_err(encode_error)?;
        }
        writer.finalize().map_err(encode_error)?;
    }

    Ok(cursor.into_inner())
}

// ============================================================================
// Internal helper functions
// ============================================================================

fn encode_error(e: hound::Error) -> SoundDeckError {
    SoundDeckError::Encode {
        reason: e.to_string(),
    }
}

fn check_spec(spec: &WavSpec) -> std::result::Result<(), DecodeError> {
    if spec.channels == 0 || spec.channels > 2 {
        return Err(DecodeError::UnsupportedChannels {
            channels: spec.channels,
        });
    }
    if spec.sample_rate == 0 {
        return Err(DecodeError::InvalidSampleRate {
            sample_rate: spec.sample_rate,
        });
    }
    Ok(())
}

/// Read samples from WAV reader and convert to f32
fn read_samples_as_f32<R: std::io::Read>(
    mut reader: WavReader<R>,
    spec: &WavSpec,
) -> std::result::Result<Vec<f32>, DecodeError> {
    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 8) => reader
            .samples::<i8>()
            .map(|s| s.map(|v| v as f32 / 128.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        // Symmetric scale so that decode(encode(x)) stays within one step
        (SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(|v| (v as f32 / I16_SCALE).max(-1.0)))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 24) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (SampleFormat::Int, 32) => reader
            .samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        (format, bits) => {
            return Err(DecodeError::UnsupportedBitDepth {
                bits,
                format: match format {
                    SampleFormat::Float => "float",
                    SampleFormat::Int => "integer",
                },
            })
        }
    };

    Ok(samples)
}

/// De-interleave samples from [L,R,L,R,...] to [[L,L,...], [R,R,...]]
///
/// A trailing partial frame is dropped.
fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut result = vec![Vec::with_capacity(frames); channels];

    for frame in samples.chunks_exact(channels) {
        for (ch, &sample) in frame.iter().enumerate() {
            result[ch].push(sample);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ChannelLayout;

    fn read_u16(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn read_u32(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    fn sine(frequency: f32, frames: usize, sample_rate: u32) -> Vec<f32> {
        (0..frames)
            .map(|i| {
                (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
                    * 0.7
            })
            .collect()
    }

    #[test]
    fn test_encode_header_layout() {
        let buffer = PcmBuffer::from_channels(vec![vec![0.0; 10], vec![0.0; 10]], 22050).unwrap();
        let bytes = encode(&buffer).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 10 * 2 * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(read_u32(&bytes, 4), 36 + 40);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(read_u32(&bytes, 16), 16);
        assert_eq!(read_u16(&bytes, 20), 1);
        assert_eq!(read_u16(&bytes, 22), 2);
        assert_eq!(read_u32(&bytes, 24), 22050);
        assert_eq!(read_u32(&bytes, 28), 22050 * 2 * 2);
        assert_eq!(read_u16(&bytes, 32), 4);
        assert_eq!(read_u16(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(read_u32(&bytes, 40), 40);
    }

    #[test]
    fn test_encode_interleaves_and_clamps() {
        let buffer =
            PcmBuffer::from_channels(vec![vec![1.5, 0.5], vec![-2.0, -0.25]], 8000).unwrap();
        let bytes = encode(&buffer).unwrap();
        let data = &bytes[WAV_HEADER_LEN..];
        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        assert_eq!(samples, vec![32767, -32767, 16384, -8192]);
    }

    #[test]
    fn test_round_trip_mono() {
        let original = PcmBuffer::mono(sine(440.0, 4410, 44100), 44100).unwrap();
        let decoded = decode(&encode(&original).unwrap()).unwrap();

        assert_eq!(decoded.len(), original.len());
        assert_eq!(decoded.channels(), 1);
        assert_eq!(decoded.sample_rate(), 44100);
        for (orig, dec) in original.channel(0).iter().zip(decoded.channel(0)) {
            assert!(
                (orig - dec).abs() <= 1.0 / 32767.0,
                "Sample mismatch: {} vs {}",
                orig,
                dec
            );
        }
    }

    #[test]
    fn test_round_trip_stereo_full_scale() {
        let left = vec![1.0, -1.0, 0.0, 0.999, -0.999];
        let right = vec![-1.0, 1.0, 0.5, -0.5, 0.00001];
        let original = PcmBuffer::from_channels(vec![left, right], 8000).unwrap();
        let decoded = decode(&encode(&original).unwrap()).unwrap();

        assert_eq!(decoded.layout(), ChannelLayout::Stereo);
        for ch in 0..2 {
            for (orig, dec) in original.channel(ch).iter().zip(decoded.channel(ch)) {
                assert!((orig - dec).abs() <= 1.0 / 32767.0);
            }
        }
    }

    #[test]
    fn test_decode_float_and_24bit() {
        for (bits, format) in [(32, SampleFormat::Float), (24, SampleFormat::Int)] {
            let spec = WavSpec {
                channels: 1,
                sample_rate: 48000,
                bits_per_sample: bits,
                sample_format: format,
            };
            let mut cursor = Cursor::new(Vec::new());
            {
                let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
                for i in 0..100 {
                    let value = (i as f32 / 100.0) - 0.5;
                    match format {
                        SampleFormat::Float => writer.write_sample(value).unwrap(),
                        SampleFormat::Int => {
                            writer.write_sample((value * 8_388_607.0) as i32).unwrap()
                        }
                    }
                }
                writer.finalize().unwrap();
            }

            let decoded = decode(cursor.get_ref()).unwrap();
            assert_eq!(decoded.len(), 100);
            assert!((decoded.channel(0)[0] + 0.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode(b"definitely not a wav file at all, just some bytes");
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_truncated_data() {
        let buffer = PcmBuffer::mono(vec![0.25; 1000], 8000).unwrap();
        let bytes = encode(&buffer).unwrap();
        let truncated = &bytes[..WAV_HEADER_LEN + 500];

        assert!(matches!(decode(truncated), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_decode_rejects_unsupported_format_code() {
        let buffer = PcmBuffer::mono(vec![0.0; 8], 8000).unwrap();
        let mut bytes = encode(&buffer).unwrap();
        // A-law
        bytes[20] = 6;

        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_decode_rejects_multichannel() {
        let spec = WavSpec {
            channels: 4,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..8 {
                writer.write_sample(0_i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        match decode(cursor.get_ref()) {
            Err(DecodeError::UnsupportedChannels { channels }) => assert_eq!(channels, 4),
            other => panic!("Expected UnsupportedChannels, got: {:?}", other),
        }
    }

    #[test]
    fn test_inspect_reports_header() {
        let buffer = PcmBuffer::mono(vec![0.0; 22050], 44100).unwrap();
        let info = inspect(&encode(&buffer).unwrap()).unwrap();

        assert_eq!(info.sample_rate, 44100);
        assert_eq!(info.channels, 1);
        assert_eq!(info.bits_per_sample, 16);
        assert!(!info.is_float);
        assert_eq!(info.frames, 22050);
        assert_eq!(info.duration_secs(), 0.5);
    }

    #[test]
    fn test_empty_buffer_round_trip() {
        let buffer = PcmBuffer::mono(Vec::new(), 44100).unwrap();
        let bytes = encode(&buffer).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN);

        let decoded = decode(&bytes).unwrap();
        assert!(decoded.is_empty());
    }
}
