//! Error types for haven.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HavenError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio playback failed: {message}")]
    AudioPlayback { message: String },

    #[error("Audio decode failed for {locator}: {message}")]
    AudioDecode { locator: String, message: String },

    // Chat backend errors
    #[error("Chat request failed: {message}")]
    ChatRequest { message: String },

    #[error("Chat backend returned an empty response")]
    ChatEmptyResponse,

    #[error("Chat backend timed out after {seconds}s")]
    ChatTimeout { seconds: u64 },

    // Preference storage errors
    #[error("Failed to load preferences from {path}: {message}")]
    PreferenceLoad { path: String, message: String },

    #[error("Failed to save preferences to {path}: {message}")]
    PreferenceSave { path: String, message: String },

    // Catalog errors
    #[error("Invalid catalog entry {id}: {message}")]
    CatalogInvalid { id: String, message: String },

    #[error("Unknown emotion: {0}")]
    UnknownEmotion(String),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, HavenError>;
