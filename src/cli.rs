//! Command-line interface for haven
//!
//! Provides argument parsing using clap derive macros.

use crate::emotion::EmotionLabel;
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// An emotionally-responsive companion for the terminal
#[derive(Parser, Debug)]
#[command(
    name = "haven",
    version,
    about = "An emotionally-responsive companion for the terminal"
)]
pub struct Cli {
    /// Subcommand to execute (default: chat)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: info logs, -vv: debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// The clap command with the build's full version string.
    pub fn command_with_version() -> clap::Command {
        Self::command().version(crate::version_string())
    }

    /// Parse process arguments, exiting on `--help`, `--version` or errors.
    pub fn parse_with_version() -> Self {
        let matches = Self::command_with_version().get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

fn parse_emotion(s: &str) -> Result<EmotionLabel, String> {
    s.parse::<EmotionLabel>().map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Talk with the companion (default)
    Chat,

    /// Detect the emotion in a piece of text
    Classify {
        /// Text to classify
        text: String,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List audio tracks, ranked for an emotion when one is given
    Tracks {
        /// Emotion to rank tracks for (e.g., calm, sad)
        #[arg(long, short, value_name = "EMOTION", value_parser = parse_emotion)]
        emotion: Option<EmotionLabel>,
        /// Maximum number of tracks to list
        #[arg(long, short = 'n', value_name = "N", default_value = "5")]
        limit: usize,
    },

    /// List guided visualization scripts
    Scripts,

    /// Run a guided visualization in the terminal
    Visualize {
        /// Emotion to pick a script for
        #[arg(value_parser = parse_emotion)]
        emotion: EmotionLabel,
    },

    /// Show learned audio preferences
    Prefs,

    /// Print the effective configuration as TOML
    Config,

    /// List available audio output devices
    #[cfg(feature = "cpal-audio")]
    Devices,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
