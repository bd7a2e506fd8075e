//! Default configuration constants for haven.
//!
//! Shared by the config layer and the engines so that a default-constructed
//! engine behaves the same as one built from an empty config file.

/// Default playback volume (0.0 to 1.0).
pub const DEFAULT_VOLUME: f32 = 0.5;

/// Number of discrete volume steps in a fade.
pub const FADE_STEPS: u32 = 20;

/// Default fade-in duration in milliseconds when audio starts after a reply.
pub const FADE_IN_MS: u64 = 2000;

/// Default fade-out duration in milliseconds when a visualization closes.
pub const FADE_OUT_MS: u64 = 2000;

/// Default fade-in duration in milliseconds for audio started by a visualization.
pub const VISUALIZATION_FADE_IN_MS: u64 = 3000;

/// Number of recent turns rendered into the chat prompt.
pub const MAX_HISTORY_FOR_PROMPT: usize = 3;

/// Number of turns the companion keeps as the caller-side history window.
pub const HISTORY_WINDOW: usize = 6;

/// Bounded wait for the chat backend, in seconds.
///
/// An elapsed timeout is handled exactly like any other backend failure.
pub const CHAT_TIMEOUT_SECS: u64 = 30;

/// Intensity above which a reply that suggests audio starts playback on its own.
pub const AUTO_AUDIO_INTENSITY: f32 = 0.5;

/// Number of recommendations shown when no emotion has been detected yet.
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 5;

/// File name of the persisted preference map.
pub const PREFERENCES_FILE: &str = "audio-preferences.json";

/// Application directory name under the XDG config/data dirs.
pub const APP_DIR: &str = "haven";

/// Directory (relative to the working directory) holding the track files.
pub const AUDIO_DIR: &str = "audio";
