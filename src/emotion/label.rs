use crate::error::HavenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of affect tags used by classification, catalogs and preferences.
///
/// Declaration order is the tie-break priority of the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Sad,
    Anxious,
    Stressed,
    Angry,
    Lonely,
    Excited,
    Calm,
    Neutral,
}

impl EmotionLabel {
    /// All labels in priority order.
    pub const ALL: [EmotionLabel; 8] = [
        EmotionLabel::Sad,
        EmotionLabel::Anxious,
        EmotionLabel::Stressed,
        EmotionLabel::Angry,
        EmotionLabel::Lonely,
        EmotionLabel::Excited,
        EmotionLabel::Calm,
        EmotionLabel::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmotionLabel::Sad => "sad",
            EmotionLabel::Anxious => "anxious",
            EmotionLabel::Stressed => "stressed",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Lonely => "lonely",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Calm => "calm",
            EmotionLabel::Neutral => "neutral",
        }
    }

    /// Display color as a `#RRGGBB` hex string.
    pub fn color(self) -> &'static str {
        match self {
            EmotionLabel::Sad => "#6B7FD7",
            EmotionLabel::Anxious => "#E07856",
            EmotionLabel::Stressed => "#D97757",
            EmotionLabel::Angry => "#E63946",
            EmotionLabel::Lonely => "#8B7FB8",
            EmotionLabel::Excited => "#FFB703",
            EmotionLabel::Calm => "#06D6A0",
            EmotionLabel::Neutral => "#8D99AE",
        }
    }

    /// Color as an RGB triple, for terminals that support truecolor.
    pub fn rgb(self) -> (u8, u8, u8) {
        let hex = &self.color()[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = HavenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        EmotionLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == needle)
            .ok_or_else(|| HavenError::UnknownEmotion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_label() {
        for label in EmotionLabel::ALL {
            assert_eq!(label.as_str().parse::<EmotionLabel>().unwrap(), label);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Calm".parse::<EmotionLabel>().unwrap(), EmotionLabel::Calm);
        assert_eq!(" SAD ".parse::<EmotionLabel>().unwrap(), EmotionLabel::Sad);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "bored".parse::<EmotionLabel>().unwrap_err();
        assert!(matches!(err, HavenError::UnknownEmotion(ref s) if s == "bored"));
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&EmotionLabel::Lonely).unwrap();
        assert_eq!(json, "\"lonely\"");
    }

    #[test]
    fn rgb_decodes_hex() {
        assert_eq!(EmotionLabel::Angry.rgb(), (0xE6, 0x39, 0x46));
        assert_eq!(EmotionLabel::Calm.rgb(), (0x06, 0xD6, 0xA0));
    }

    #[test]
    fn ordering_follows_priority() {
        assert!(EmotionLabel::Sad < EmotionLabel::Anxious);
        assert!(EmotionLabel::Calm < EmotionLabel::Neutral);
    }
}
