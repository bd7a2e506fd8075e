use crate::audio::catalog::AudioTrack;
use crate::error::{HavenError, Result};
use std::sync::{Arc, Mutex};

/// Trait for audio output devices.
///
/// The engine drives one output; swapping implementations lets the session
/// logic run against a real device, a silent sink, or a recording mock.
pub trait AudioOutput: Send + Sync {
    /// Start looping `track` at `volume`, replacing whatever was playing.
    fn start(&mut self, track: &AudioTrack, volume: f32) -> Result<()>;

    /// Change the gain of the current playback.
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Halt playback. Stopping an idle output is not an error.
    fn stop(&mut self) -> Result<()>;
}

/// Output that plays nothing.
#[derive(Debug, Default, Clone)]
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn start(&mut self, track: &AudioTrack, volume: f32) -> Result<()> {
        tracing::debug!(track = track.id, volume, "null output start");
        Ok(())
    }

    fn set_volume(&mut self, _volume: f32) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        tracing::debug!("null output stop");
        Ok(())
    }
}

/// A call observed by [`MockAudioOutput`].
#[derive(Debug, Clone, PartialEq)]
pub enum OutputCall {
    Start { track_id: String, volume: f32 },
    SetVolume(f32),
    Stop,
}

/// Mock audio output for testing.
///
/// Clones share one call log, so a test can keep a clone after handing the
/// output to an engine.
#[derive(Debug, Clone)]
pub struct MockAudioOutput {
    calls: Arc<Mutex<Vec<OutputCall>>>,
    should_fail_start: bool,
    should_fail_set_volume: bool,
    error_message: String,
}

impl MockAudioOutput {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail_start: false,
            should_fail_set_volume: false,
            error_message: "mock output error".to_string(),
        }
    }

    /// Configure the mock to fail on start
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on set_volume
    pub fn with_set_volume_failure(mut self) -> Self {
        self.should_fail_set_volume = true;
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<OutputCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Volumes passed to `set_volume`, in order.
    pub fn volumes(&self) -> Vec<f32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                OutputCall::SetVolume(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    /// The last volume the output was told to play at.
    pub fn last_volume(&self) -> Option<f32> {
        self.calls().into_iter().rev().find_map(|c| match c {
            OutputCall::SetVolume(v) => Some(v),
            OutputCall::Start { volume, .. } => Some(volume),
            OutputCall::Stop => None,
        })
    }

    fn record(&self, call: OutputCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn failure(&self) -> HavenError {
        HavenError::AudioPlayback {
            message: self.error_message.clone(),
        }
    }
}

impl Default for MockAudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for MockAudioOutput {
    fn start(&mut self, track: &AudioTrack, volume: f32) -> Result<()> {
        if self.should_fail_start {
            return Err(self.failure());
        }
        self.record(OutputCall::Start {
            track_id: track.id.to_string(),
            volume,
        });
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        if self.should_fail_set_volume {
            return Err(self.failure());
        }
        self.record(OutputCall::SetVolume(volume));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(OutputCall::Stop);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::catalog::get_track;

    #[test]
    fn test_mock_output_records_calls_across_clones() {
        let mock = MockAudioOutput::new();
        let mut output: Box<dyn AudioOutput> = Box::new(mock.clone());
        let track = get_track("nat1").unwrap();

        output.start(track, 0.5).unwrap();
        output.set_volume(0.25).unwrap();
        output.stop().unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                OutputCall::Start {
                    track_id: "nat1".to_string(),
                    volume: 0.5
                },
                OutputCall::SetVolume(0.25),
                OutputCall::Stop,
            ]
        );
        assert_eq!(mock.volumes(), vec![0.25]);
    }

    #[test]
    fn test_mock_output_start_failure() {
        let mut mock = MockAudioOutput::new()
            .with_start_failure()
            .with_error_message("device unplugged");
        let result = mock.start(get_track("amb1").unwrap(), 0.5);

        match result {
            Err(HavenError::AudioPlayback { message }) => {
                assert_eq!(message, "device unplugged");
            }
            _ => panic!("Expected AudioPlayback error"),
        }
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_mock_output_last_volume() {
        let mut mock = MockAudioOutput::new();
        assert_eq!(mock.last_volume(), None);
        mock.start(get_track("amb1").unwrap(), 0.7).unwrap();
        assert_eq!(mock.last_volume(), Some(0.7));
        mock.set_volume(0.1).unwrap();
        assert_eq!(mock.last_volume(), Some(0.1));
    }

    #[test]
    fn test_null_output_never_fails() {
        let mut output = NullOutput;
        assert!(output.start(get_track("ins2").unwrap(), 1.0).is_ok());
        assert!(output.set_volume(0.0).is_ok());
        assert!(output.stop().is_ok());
        assert!(output.stop().is_ok());
    }
}
