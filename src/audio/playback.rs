//! Real audio playback using CPAL (Cross-Platform Audio Library).

use crate::audio::catalog::AudioTrack;
use crate::audio::output::AudioOutput;
use crate::audio::wav::{DecodedAudio, LoopCursor};
use crate::error::{HavenError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// List output device names.
pub fn list_output_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.output_devices();
        (host, devices)
    });
    let _ = host; // keep host alive while iterating devices
    let devices = devices.map_err(|e| HavenError::AudioPlayback {
        message: format!("Failed to enumerate output devices: {}", e),
    })?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

fn find_output_device(device_name: Option<&str>) -> Result<cpal::Device> {
    with_suppressed_stderr(|| {
        let host = cpal::default_host();

        let Some(name) = device_name else {
            return host
                .default_output_device()
                .ok_or_else(|| HavenError::AudioDeviceNotFound {
                    device: "default".to_string(),
                });
        };

        let devices = host
            .output_devices()
            .map_err(|e| HavenError::AudioPlayback {
                message: format!("Failed to enumerate devices: {}", e),
            })?;

        for dev in devices {
            if let Ok(dev_name) = dev.name()
                && dev_name == name
            {
                return Ok(dev);
            }
        }

        Err(HavenError::AudioDeviceNotFound {
            device: name.to_string(),
        })
    })
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: the stream is only touched through the Mutex in StreamSlot,
/// from one thread at a time.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Gain shared with the audio callback, stored as f32 bits.
#[derive(Debug, Default)]
struct SharedGain(AtomicU32);

impl SharedGain {
    fn set(&self, volume: f32) {
        self.0.store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// Holds the live stream. Streams are built off-thread; one built for a
/// superseded start is handed back instead of installed.
#[derive(Debug)]
struct StreamSlot<T> {
    generation: AtomicU64,
    stream: Mutex<Option<T>>,
}

impl<T> StreamSlot<T> {
    fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            stream: Mutex::new(None),
        }
    }

    /// Invalidate pending builds and return the generation for a new one.
    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install `stream` if `generation` is still current, else return it.
    fn install(&self, generation: u64, stream: T) -> Option<T> {
        let mut slot = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        if self.generation.load(Ordering::SeqCst) != generation {
            return Some(stream);
        }
        *slot = Some(stream);
        None
    }

    /// Invalidate pending builds and take the live stream.
    fn clear(&self) -> Option<T> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Looping WAV playback on a CPAL output device.
///
/// Each track is decoded fully into memory on a worker thread, resampled to
/// the device rate and written to every output channel. `start` returns once
/// the file is found; decode and stream failures after that are logged.
pub struct CpalAudioOutput {
    device: cpal::Device,
    audio_dir: PathBuf,
    slot: Arc<StreamSlot<SendableStream>>,
    gain: Arc<SharedGain>,
}

impl CpalAudioOutput {
    /// Open `device_name`, or the default output device when None.
    /// Track locators are resolved against `audio_dir`.
    pub fn new(device_name: Option<&str>, audio_dir: impl Into<PathBuf>) -> Result<Self> {
        let device = find_output_device(device_name)?;
        Ok(Self {
            device,
            audio_dir: audio_dir.into(),
            slot: Arc::new(StreamSlot::new()),
            gain: Arc::new(SharedGain::default()),
        })
    }
}

fn build_stream(
    device: &cpal::Device,
    audio: DecodedAudio,
    gain: Arc<SharedGain>,
) -> Result<cpal::Stream> {
    use cpal::SampleFormat;

    let default_config = device
        .default_output_config()
        .map_err(|e| HavenError::AudioPlayback {
            message: format!("Failed to query default output config: {}", e),
        })?;

    let native_rate = default_config.sample_rate().0;
    let channels = usize::from(default_config.channels().max(1));
    let stream_config: cpal::StreamConfig = default_config.clone().into();

    let cursor = Arc::new(Mutex::new(LoopCursor::new(audio.resampled(native_rate))));

    let err_callback = |err| {
        tracing::warn!("Audio stream error: {}", err);
    };

    match default_config.sample_format() {
        SampleFormat::F32 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, channels, &cursor, &gain, |s| s);
                },
                err_callback,
                None,
            )
            .map_err(|e| HavenError::AudioPlayback {
                message: format!("Failed to build f32 output stream: {}", e),
            }),
        SampleFormat::I16 => device
            .build_output_stream(
                &stream_config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    fill_frames(data, channels, &cursor, &gain, |s| {
                        (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
                    });
                },
                err_callback,
                None,
            )
            .map_err(|e| HavenError::AudioPlayback {
                message: format!("Failed to build i16 output stream: {}", e),
            }),
        fmt => Err(HavenError::AudioPlayback {
            message: format!(
                "Unsupported output sample format: {:?}. \
                 Try setting audio.device in the config.",
                fmt
            ),
        }),
    }
}

fn open_stream(device: &cpal::Device, path: &Path, gain: Arc<SharedGain>) -> Result<cpal::Stream> {
    let audio = DecodedAudio::from_file(path)?;
    let stream = build_stream(device, audio, gain)?;
    stream.play().map_err(|e| HavenError::AudioPlayback {
        message: format!("Failed to start output stream: {}", e),
    })?;
    Ok(stream)
}

fn pause(stream: SendableStream) -> Result<()> {
    stream.0.pause().map_err(|e| HavenError::AudioPlayback {
        message: format!("Failed to stop output stream: {}", e),
    })
}

/// Write one mono sample per frame, copied to every channel.
fn fill_frames<T: Copy>(
    data: &mut [T],
    channels: usize,
    cursor: &Mutex<LoopCursor>,
    gain: &SharedGain,
    convert: impl Fn(f32) -> T,
) {
    let volume = gain.get();
    let Ok(mut cursor) = cursor.lock() else {
        for sample in data.iter_mut() {
            *sample = convert(0.0);
        }
        return;
    };
    for frame in data.chunks_mut(channels) {
        let value = convert(cursor.next_sample() * volume);
        for sample in frame.iter_mut() {
            *sample = value;
        }
    }
}

impl AudioOutput for CpalAudioOutput {
    fn start(&mut self, track: &AudioTrack, volume: f32) -> Result<()> {
        self.stop()?;

        let path = self.audio_dir.join(track.locator);
        if !path.is_file() {
            return Err(HavenError::AudioDecode {
                locator: track.locator.to_string(),
                message: format!("file not found: {}", path.display()),
            });
        }
        self.gain.set(volume);

        let generation = self.slot.begin();
        let device = self.device.clone();
        let slot = Arc::clone(&self.slot);
        let gain = Arc::clone(&self.gain);
        let track_id = track.id;
        thread::Builder::new()
            .name("haven-decode".to_string())
            .spawn(move || match open_stream(&device, &path, gain) {
                Ok(stream) => match slot.install(generation, SendableStream(stream)) {
                    None => {
                        tracing::debug!(track = track_id, path = %path.display(), "output stream started");
                    }
                    Some(stale) => {
                        if let Err(e) = pause(stale) {
                            tracing::debug!("{}", e);
                        }
                    }
                },
                Err(e) => tracing::warn!(track = track_id, "{}", e),
            })
            .map_err(|e| HavenError::AudioPlayback {
                message: format!("Failed to spawn decode thread: {}", e),
            })?;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.gain.set(volume);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match self.slot.clear() {
            Some(stream) => pause(stream),
            None => Ok(()),
        }
    }
}
