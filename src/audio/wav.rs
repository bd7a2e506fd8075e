//! WAV decoding for looped playback.

use crate::error::{HavenError, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A decoded track held in memory as mono f32 samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Decode a WAV file from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| HavenError::AudioDecode {
            locator: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Decode from any reader. `locator` only labels errors.
    pub fn from_reader<R: Read>(reader: R, locator: &str) -> Result<Self> {
        let decode_err = |message: String| HavenError::AudioDecode {
            locator: locator.to_string(),
            message,
        };
        let mut wav_reader =
            hound::WavReader::new(reader).map_err(|e| decode_err(e.to_string()))?;

        let spec = wav_reader.spec();
        let channels = usize::from(spec.channels.max(1));

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => wav_reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| decode_err(e.to_string()))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                wav_reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| decode_err(e.to_string()))?
            }
        };

        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        };

        if samples.is_empty() {
            return Err(decode_err("no audio samples".to_string()));
        }

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Convert to `target_rate`.
    pub fn resampled(self, target_rate: u32) -> Self {
        if self.sample_rate == target_rate {
            return self;
        }
        Self {
            samples: resample(&self.samples, self.sample_rate, target_rate),
            sample_rate: target_rate,
        }
    }
}

/// Endless reader over a decoded buffer, wrapping at the end.
#[derive(Debug, Clone)]
pub struct LoopCursor {
    samples: Vec<f32>,
    position: usize,
}

impl LoopCursor {
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            samples: audio.samples,
            position: 0,
        }
    }

    /// Next sample. An empty buffer yields silence.
    pub fn next_sample(&mut self) -> f32 {
        let Some(&sample) = self.samples.get(self.position) else {
            return 0.0;
        };
        self.position += 1;
        if self.position >= self.samples.len() {
            self.position = 0;
        }
        sample
    }
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = (source_pos - source_idx as f64) as f32;

            match samples.get(source_idx + 1) {
                Some(&right) => {
                    let left = samples[source_idx];
                    left + (right - left) * fraction
                }
                None => samples[source_idx],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn from_reader_mono_scales_to_unit_range() {
        let wav = make_wav_data(44100, 1, &[0, 16384, -32768]);
        let audio = DecodedAudio::from_reader(Cursor::new(wav), "test.wav").unwrap();

        assert_eq!(audio.sample_rate, 44100);
        assert_eq!(audio.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn from_reader_stereo_downmixes_to_mono() {
        let wav = make_wav_data(48000, 2, &[16384, 0, -16384, -16384]);
        let audio = DecodedAudio::from_reader(Cursor::new(wav), "test.wav").unwrap();

        assert_eq!(audio.samples, vec![0.25, -0.5]);
    }

    #[test]
    fn from_reader_rejects_garbage() {
        let err = DecodedAudio::from_reader(Cursor::new(b"not a wav".to_vec()), "bad.wav")
            .unwrap_err();
        match err {
            HavenError::AudioDecode { locator, .. } => assert_eq!(locator, "bad.wav"),
            other => panic!("Expected AudioDecode, got {other:?}"),
        }
    }

    #[test]
    fn from_reader_rejects_empty_wav() {
        let wav = make_wav_data(16000, 1, &[]);
        assert!(DecodedAudio::from_reader(Cursor::new(wav), "empty.wav").is_err());
    }

    #[test]
    fn from_file_missing_is_decode_error() {
        let err = DecodedAudio::from_file(Path::new("/nonexistent/rain.wav")).unwrap_err();
        assert!(matches!(err, HavenError::AudioDecode { .. }));
    }

    #[test]
    fn resample_halves_length_when_halving_rate() {
        let input = vec![0.0f32; 48000];
        let output = resample(&input, 48000, 24000);
        assert_eq!(output.len(), 24000);
    }

    #[test]
    fn resample_interpolates_between_samples() {
        let output = resample(&[0.0, 1.0], 1, 2);
        assert_eq!(output, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn loop_cursor_wraps() {
        let mut cursor = LoopCursor::new(DecodedAudio {
            samples: vec![0.1, 0.2],
            sample_rate: 8000,
        });
        let taken: Vec<f32> = (0..5).map(|_| cursor.next_sample()).collect();
        assert_eq!(taken, vec![0.1, 0.2, 0.1, 0.2, 0.1]);
    }

    #[test]
    fn loop_cursor_empty_is_silent() {
        let mut cursor = LoopCursor::new(DecodedAudio {
            samples: Vec::new(),
            sample_rate: 8000,
        });
        assert_eq!(cursor.next_sample(), 0.0);
    }
}
