use crate::audio::AudioEngineConfig;
use crate::defaults;
use crate::error::{HavenError, Result};
use crate::response::OrchestratorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub conversation: ConversationConfig,
    pub storage: StorageConfig,
}

/// Audio playback configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name; None uses the system default
    pub device: Option<String>,
    /// Directory holding the track files; None uses the data dir
    pub audio_dir: Option<PathBuf>,
    pub default_volume: f32,
    pub fade_in_ms: u64,
    pub fade_out_ms: u64,
    pub visualization_fade_in_ms: u64,
    pub fade_steps: u32,
}

/// Conversation flow configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationConfig {
    /// Turns included in the prompt as recent context
    pub max_history_for_prompt: usize,
    /// Turns kept in the conversation history
    pub history_window: usize,
    /// Chat backend timeout; 0 disables it
    pub chat_timeout_secs: u64,
    /// Intensity above which suggested audio starts on its own
    pub auto_audio_intensity: f32,
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    pub preferences_path: Option<PathBuf>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            audio_dir: None,
            default_volume: defaults::DEFAULT_VOLUME,
            fade_in_ms: defaults::FADE_IN_MS,
            fade_out_ms: defaults::FADE_OUT_MS,
            visualization_fade_in_ms: defaults::VISUALIZATION_FADE_IN_MS,
            fade_steps: defaults::FADE_STEPS,
        }
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_history_for_prompt: defaults::MAX_HISTORY_FOR_PROMPT,
            history_window: defaults::HISTORY_WINDOW,
            chat_timeout_secs: defaults::CHAT_TIMEOUT_SECS,
            auto_audio_intensity: defaults::AUTO_AUDIO_INTENSITY,
        }
    }
}

impl AudioConfig {
    /// Configured audio directory, or ~/.local/share/haven/audio.
    pub fn resolved_audio_dir(&self) -> PathBuf {
        self.audio_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(defaults::APP_DIR)
                .join(defaults::AUDIO_DIR)
        })
    }

    pub fn engine_config(&self) -> AudioEngineConfig {
        AudioEngineConfig {
            default_volume: self.default_volume,
            fade_steps: self.fade_steps,
        }
    }
}

impl ConversationConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            chat_timeout: (self.chat_timeout_secs > 0)
                .then(|| Duration::from_secs(self.chat_timeout_secs)),
        }
    }
}

impl StorageConfig {
    /// Configured preference file, or ~/.local/share/haven/audio-preferences.json.
    pub fn resolved_preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(crate::audio::JsonFileStorage::default_path)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing, contains invalid TOML or
    /// holds out-of-range values. Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HavenError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                HavenError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(HavenError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| {
            Err(HavenError::ConfigInvalidValue {
                key: key.to_string(),
                message: message.to_string(),
            })
        };
        if !(0.0..=1.0).contains(&self.audio.default_volume) {
            return invalid("audio.default_volume", "must be between 0 and 1");
        }
        if self.audio.fade_steps == 0 {
            return invalid("audio.fade_steps", "must be at least 1");
        }
        if self.conversation.history_window == 0 {
            return invalid("conversation.history_window", "must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.conversation.auto_audio_intensity) {
            return invalid(
                "conversation.auto_audio_intensity",
                "must be between 0 and 1",
            );
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - HAVEN_AUDIO_DIR → audio.audio_dir
    /// - HAVEN_AUDIO_DEVICE → audio.device
    /// - HAVEN_PREFERENCES → storage.preferences_path
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("HAVEN_AUDIO_DIR")
            && !dir.is_empty()
        {
            self.audio.audio_dir = Some(PathBuf::from(dir));
        }

        if let Ok(device) = std::env::var("HAVEN_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(path) = std::env::var("HAVEN_PREFERENCES")
            && !path.is_empty()
        {
            self.storage.preferences_path = Some(PathBuf::from(path));
        }

        self
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HavenError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/haven/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::APP_DIR)
            .join("config.toml")
    }
}
