//! haven - an emotionally-responsive companion
//!
//! Detects affect in text, answers with empathy, plays soundscapes that learn
//! what the user likes, and paces guided visualizations.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod companion;
pub mod config;
pub mod conversation;
pub mod defaults;
pub mod emotion;
pub mod error;
pub mod random;
pub mod report;
pub mod response;
pub mod timer;
pub mod visualization;

// Composition root for the binary
#[cfg(feature = "cli")]
pub mod app;

// Core seams
pub use audio::{AudioEngine, AudioOutput, PreferenceStorage};
pub use random::RandomSource;
pub use report::ErrorReporter;
pub use response::ChatBackend;

// Flow
pub use companion::{Companion, CompanionConfig, Exchange};
pub use emotion::{EmotionLabel, EmotionResult, classify};
pub use response::{EmpatheticReply, ResponseOrchestrator};
pub use visualization::VisualizationPlayer;

// Error handling
pub use error::{HavenError, Result};

// Config
pub use config::Config;

/// `CARGO_PKG_VERSION`, plus `+<git short hash>` when built from a checkout.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{version}+{hash}"),
        _ => version.to_string(),
    }
}
