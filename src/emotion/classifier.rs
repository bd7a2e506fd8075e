//! Keyword-scoring emotion classifier.
//!
//! Every lexicon phrase that occurs as a substring of the lower-cased input
//! adds one point to its emotion. The highest score wins, earlier labels win
//! ties, and an input without any hit is neutral.

use crate::emotion::label::EmotionLabel;
use serde::{Deserialize, Serialize};

/// Confidence reported when no lexicon phrase matched.
pub const NO_MATCH_CONFIDENCE: f32 = 0.3;

/// Intensity before any intensifier or diminisher is applied.
pub const BASE_INTENSITY: f32 = 0.5;

/// Amount each intensifier adds to (or each diminisher removes from) intensity.
pub const INTENSITY_STEP: f32 = 0.2;

/// Lexicons in priority order. Index order must match `EmotionLabel::ALL`.
const LEXICONS: [(EmotionLabel, &[&str]); 8] = [
    (
        EmotionLabel::Sad,
        &[
            "sad",
            "depressed",
            "down",
            "unhappy",
            "crying",
            "tears",
            "heartbroken",
            "grief",
            "loss",
            "miss",
            "blue",
            "miserable",
            "hopeless",
            "devastated",
            "hurt",
            "pain",
            "sorrow",
            "melancholy",
            "gloomy",
            "disappointed",
        ],
    ),
    (
        EmotionLabel::Anxious,
        &[
            "anxious",
            "worried",
            "nervous",
            "panic",
            "fear",
            "scared",
            "overwhelmed",
            "stress",
            "tense",
            "uneasy",
            "restless",
            "jittery",
            "on edge",
            "freaking out",
            "terrified",
            "afraid",
            "concerned",
            "apprehensive",
            "dread",
        ],
    ),
    (
        EmotionLabel::Stressed,
        &[
            "stressed",
            "pressure",
            "overwhelmed",
            "busy",
            "exhausted",
            "tired",
            "burnout",
            "too much",
            "swamped",
            "overworked",
            "drained",
            "worn out",
            "frazzled",
            "stretched",
            "burden",
            "heavy",
            "weighed down",
        ],
    ),
    (
        EmotionLabel::Angry,
        &[
            "angry",
            "mad",
            "furious",
            "frustrated",
            "annoyed",
            "irritated",
            "rage",
            "hate",
            "pissed",
            "upset",
            "livid",
            "outraged",
            "resentful",
            "bitter",
            "hostile",
            "aggravated",
            "infuriated",
            "enraged",
        ],
    ),
    (
        EmotionLabel::Lonely,
        &[
            "lonely",
            "alone",
            "isolated",
            "nobody",
            "empty",
            "abandoned",
            "disconnected",
            "solitary",
            "friendless",
            "unwanted",
            "rejected",
            "excluded",
            "left out",
            "invisible",
            "forgotten",
        ],
    ),
    (
        EmotionLabel::Excited,
        &[
            "excited",
            "happy",
            "joy",
            "great",
            "amazing",
            "wonderful",
            "love",
            "thrilled",
            "awesome",
            "fantastic",
            "brilliant",
            "excellent",
            "delighted",
            "ecstatic",
            "elated",
            "cheerful",
            "glad",
            "pleased",
            "pumped",
            "stoked",
            "energized",
        ],
    ),
    (
        EmotionLabel::Calm,
        &[
            "calm",
            "peaceful",
            "relaxed",
            "content",
            "serene",
            "tranquil",
            "okay",
            "fine",
            "chill",
            "mellow",
            "composed",
            "balanced",
            "centered",
            "at ease",
            "comfortable",
            "settled",
        ],
    ),
    (
        EmotionLabel::Neutral,
        &[
            "neutral",
            "normal",
            "regular",
            "usual",
            "ordinary",
            "nothing special",
        ],
    ),
];

/// Phrases that raise intensity.
const INTENSIFIERS: &[&str] = &[
    "very",
    "extremely",
    "really",
    "so",
    "incredibly",
    "totally",
    "completely",
];

/// Phrases that lower intensity.
const DIMINISHERS: &[&str] = &["a bit", "slightly", "somewhat", "kind of", "sort of", "little"];

/// Outcome of classifying one piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionResult {
    pub label: EmotionLabel,
    /// Share of all keyword hits that belong to `label` (0.0 to 1.0).
    pub confidence: f32,
    /// Heuristic strength of the feeling (0.0 to 1.0), independent of confidence.
    pub intensity: f32,
    /// Every lexicon phrase found, in lexicon order. May contain repeats.
    pub matched_keywords: Vec<String>,
}

/// Classify free text into an emotion.
///
/// Total over all inputs: empty or whitespace-only text yields a neutral result.
pub fn classify(text: &str) -> EmotionResult {
    let lower = text.to_lowercase();

    let mut scores = [0u32; LEXICONS.len()];
    let mut matched_keywords = Vec::new();

    for (slot, (_, phrases)) in LEXICONS.iter().enumerate() {
        for phrase in phrases.iter() {
            if lower.contains(phrase) {
                scores[slot] += 1;
                matched_keywords.push((*phrase).to_string());
            }
        }
    }

    // Strict comparison keeps the earliest label on ties.
    let mut label = EmotionLabel::Neutral;
    let mut best = 0u32;
    for (slot, &score) in scores.iter().enumerate() {
        if score > best {
            best = score;
            label = LEXICONS[slot].0;
        }
    }

    let total: u32 = scores.iter().sum();
    let confidence = if total > 0 {
        best as f32 / total as f32
    } else {
        NO_MATCH_CONFIDENCE
    };

    EmotionResult {
        label,
        confidence,
        intensity: intensity_of(&lower),
        matched_keywords,
    }
}

/// Intensity of already lower-cased text. Clamped after every step.
fn intensity_of(lower: &str) -> f32 {
    let mut intensity = BASE_INTENSITY;
    for word in INTENSIFIERS {
        if lower.contains(word) {
            intensity = (intensity + INTENSITY_STEP).min(1.0);
        }
    }
    for word in DIMINISHERS {
        if lower.contains(word) {
            intensity = (intensity - INTENSITY_STEP).max(0.0);
        }
    }
    intensity
}
