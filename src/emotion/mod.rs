//! Lexicon-driven emotion detection.

pub mod classifier;
pub mod label;

pub use classifier::{EmotionResult, classify};
pub use label::EmotionLabel;
