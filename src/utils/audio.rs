//! WAV input loading
//!
//! Loads the audio file sent with every audio-mode request and extracts the
//! raw LINEAR16 payload. The request config assumes 16 kHz mono 16-bit PCM,
//! so anything else is rejected here, at the file boundary, before any
//! request is dispatched. Resampling is out of scope; use an external tool
//! to produce a conforming file.

use std::path::Path;

use bytes::Bytes;
use hound::{SampleFormat, WavReader};
use tracing::debug;

use crate::core::QueryInput;
use crate::errors::ConfigError;

/// Sample rate the request configuration is built around
pub const REQUIRED_SAMPLE_RATE: u32 = 16_000;

/// Channel count required for speech recognition input
pub const REQUIRED_CHANNELS: u16 = 1;

/// Load a 16 kHz mono LINEAR16 WAV file as a query input
pub fn load_linear16_wav(path: &Path) -> Result<QueryInput, ConfigError> {
    let reader = WavReader::open(path).map_err(|e| {
        ConfigError::InvalidAudio(format!("failed to open {}: {e}", path.display()))
    })?;

    let spec = reader.spec();
    if spec.sample_rate != REQUIRED_SAMPLE_RATE {
        return Err(ConfigError::InvalidAudio(format!(
            "{} is {} Hz; expected {} Hz",
            path.display(),
            spec.sample_rate,
            REQUIRED_SAMPLE_RATE
        )));
    }
    if spec.channels != REQUIRED_CHANNELS {
        return Err(ConfigError::InvalidAudio(format!(
            "{} has {} channels; expected mono",
            path.display(),
            spec.channels
        )));
    }
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(ConfigError::InvalidAudio(format!(
            "{} is not 16-bit integer PCM",
            path.display()
        )));
    }

    let mut bytes = Vec::with_capacity(reader.len() as usize * 2);
    for sample in reader.into_samples::<i16>() {
        let sample = sample.map_err(|e| {
            ConfigError::InvalidAudio(format!("failed to decode {}: {e}", path.display()))
        })?;
        bytes.extend_from_slice(&sample.to_le_bytes());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "loaded audio input");

    Ok(QueryInput::Audio {
        bytes: Bytes::from(bytes),
        sample_rate_hertz: REQUIRED_SAMPLE_RATE,
        encoding: "linear16".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_load_conforming_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.wav");
        write_wav(&path, 16_000, 1, &[0, 1, -1, i16::MAX]);

        let input = load_linear16_wav(&path).unwrap();
        match input {
            QueryInput::Audio {
                bytes,
                sample_rate_hertz,
                encoding,
            } => {
                assert_eq!(bytes.len(), 8);
                assert_eq!(sample_rate_hertz, 16_000);
                assert_eq!(encoding, "linear16");
                // Little-endian sample payload
                assert_eq!(&bytes[..4], &[0, 0, 1, 0]);
            }
            other => panic!("expected audio input, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_wrong_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.wav");
        write_wav(&path, 8_000, 1, &[0; 8]);

        let err = load_linear16_wav(&path).unwrap_err();
        assert!(err.to_string().contains("8000 Hz"));
    }

    #[test]
    fn test_rejects_stereo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.wav");
        write_wav(&path, 16_000, 2, &[0; 8]);

        let err = load_linear16_wav(&path).unwrap_err();
        assert!(err.to_string().contains("mono"));
    }

    #[test]
    fn test_rejects_missing_file() {
        let err = load_linear16_wav(Path::new("/nonexistent/input.wav")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAudio(_)));
    }
}
