//! Therapeutic audio: catalog, playback session and learned preferences.

pub mod catalog;
pub mod engine;
pub mod output;
#[cfg(feature = "cpal-audio")]
pub mod playback;
pub mod preferences;
pub mod wav;

pub use catalog::{AudioCategory, AudioTrack, get_track};
pub use engine::{AudioEngine, AudioEngineConfig, FadeOut};
pub use output::{AudioOutput, MockAudioOutput, NullOutput};
#[cfg(feature = "cpal-audio")]
pub use playback::CpalAudioOutput;
pub use preferences::{JsonFileStorage, MemoryStorage, PreferenceMap, PreferenceStorage};
