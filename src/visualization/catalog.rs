//! Guided visualization scripts.

use crate::audio::catalog;
use crate::emotion::EmotionLabel;
use crate::error::{HavenError, Result};
use crate::random::{self, RandomSource};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Imagery a script is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneType {
    Forest,
    Ocean,
    Mountain,
    Space,
    Garden,
}

impl fmt::Display for SceneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneType::Forest => "forest",
            SceneType::Ocean => "ocean",
            SceneType::Mountain => "mountain",
            SceneType::Space => "space",
            SceneType::Garden => "garden",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizationScript {
    pub id: &'static str,
    pub emotion: EmotionLabel,
    pub title: &'static str,
    pub total_duration_seconds: u32,
    pub sentences: &'static [&'static str],
    pub scene: SceneType,
    /// Audio catalog id to play underneath
    pub suggested_audio_track_id: Option<&'static str>,
}

impl VisualizationScript {
    /// Milliseconds each sentence stays on screen.
    pub fn sentence_interval_ms(&self) -> u64 {
        let count = self.sentences.len().max(1) as u64;
        u64::from(self.total_duration_seconds) * 1000 / count
    }
}

pub const SCRIPTS: &[VisualizationScript] = &[
    VisualizationScript {
        id: "vis-sad-1",
        emotion: EmotionLabel::Sad,
        title: "Healing Light",
        total_duration_seconds: 180,
        scene: SceneType::Forest,
        suggested_audio_track_id: Some("nat1"),
        sentences: &[
            "Close your eyes and take a deep breath.",
            "Imagine yourself in a peaceful forest clearing.",
            "Soft rain falls gently around you, washing away your sadness.",
            "Each drop carries away a piece of your pain.",
            "You feel lighter with every breath.",
            "The forest embraces you with warmth and acceptance.",
            "You are safe here. You are held.",
            "Your feelings are valid, and they will pass.",
            "Like the rain, this too shall flow away.",
            "Take one more deep breath, and when you're ready, open your eyes.",
        ],
    },
    VisualizationScript {
        id: "vis-anxious-1",
        emotion: EmotionLabel::Anxious,
        title: "Grounding Breath",
        total_duration_seconds: 150,
        scene: SceneType::Ocean,
        suggested_audio_track_id: Some("nat3"),
        sentences: &[
            "Let's ground together. Take a slow breath in.",
            "Imagine standing on a calm beach.",
            "Feel the sand beneath your feet, solid and supportive.",
            "Watch the waves roll in... and out... in... and out.",
            "Your breath matches the rhythm of the ocean.",
            "In... and out. Steady. Calm.",
            "Notice five things you can see around you.",
            "Four things you can touch.",
            "Three things you can hear.",
            "Two things you can smell.",
            "One thing you can taste.",
            "You are here. You are present. You are safe.",
        ],
    },
    VisualizationScript {
        id: "vis-stressed-1",
        emotion: EmotionLabel::Stressed,
        title: "Mountain Release",
        total_duration_seconds: 200,
        scene: SceneType::Mountain,
        suggested_audio_track_id: Some("med1"),
        sentences: &[
            "Breathe deeply. You've been carrying so much.",
            "Imagine yourself on a mountain peak.",
            "The air is crisp and clear.",
            "With each exhale, release one burden.",
            "Let it fall away into the valley below.",
            "You don't need to hold everything.",
            "Some things can be set down.",
            "Feel your shoulders relax.",
            "Your jaw unclench.",
            "Your breath deepen.",
            "You are more than your to-do list.",
            "You are enough, exactly as you are.",
            "Rest here for a moment.",
        ],
    },
    VisualizationScript {
        id: "vis-lonely-1",
        emotion: EmotionLabel::Lonely,
        title: "Connected Universe",
        total_duration_seconds: 180,
        scene: SceneType::Space,
        suggested_audio_track_id: Some("amb2"),
        sentences: &[
            "Close your eyes and breathe.",
            "Imagine floating gently in space.",
            "You see Earth below, glowing softly.",
            "Billions of hearts beating together.",
            "You are part of this vast, connected web.",
            "Your loneliness is felt by others too.",
            "You are not alone in feeling alone.",
            "Somewhere, someone is thinking of you.",
            "Somewhere, someone needs exactly what you offer.",
            "You are a unique thread in the fabric of existence.",
            "And you matter.",
            "Take a breath, and feel that connection.",
        ],
    },
    VisualizationScript {
        id: "vis-calm-1",
        emotion: EmotionLabel::Calm,
        title: "Garden of Peace",
        total_duration_seconds: 120,
        scene: SceneType::Garden,
        suggested_audio_track_id: Some("nat2"),
        sentences: &[
            "You're already in a peaceful place.",
            "Let's deepen that feeling.",
            "Imagine a beautiful garden.",
            "Flowers bloom in every color.",
            "Birds sing softly.",
            "A gentle breeze carries the scent of jasmine.",
            "You sit on a comfortable bench.",
            "Nothing to do. Nowhere to be.",
            "Just this moment.",
            "Just this breath.",
            "Just this peace.",
            "Carry this feeling with you.",
        ],
    },
];

/// Get all scripts in catalog order.
pub fn list_scripts() -> &'static [VisualizationScript] {
    SCRIPTS
}

/// Find a script by id.
pub fn get_script(id: &str) -> Option<&'static VisualizationScript> {
    SCRIPTS.iter().find(|s| s.id == id)
}

/// Pick one of the scripts written for `emotion`, or None if there are none.
pub fn script_for_emotion(
    emotion: EmotionLabel,
    random: &dyn RandomSource,
) -> Option<&'static VisualizationScript> {
    let candidates: Vec<&'static VisualizationScript> =
        SCRIPTS.iter().filter(|s| s.emotion == emotion).collect();
    random::choose(random, &candidates).copied()
}

/// Check that every script can be played.
pub fn validate_catalog() -> Result<()> {
    validate_scripts(SCRIPTS)
}

/// Check a set of scripts: unique ids, a positive duration, at least one
/// sentence, no blank sentence, and suggested tracks present in the audio
/// catalog.
pub fn validate_scripts(scripts: &[VisualizationScript]) -> Result<()> {
    let mut seen = HashSet::new();
    for script in scripts {
        let invalid = |message: &str| HavenError::CatalogInvalid {
            id: script.id.to_string(),
            message: message.to_string(),
        };
        if !seen.insert(script.id) {
            return Err(invalid("duplicate script id"));
        }
        if script.total_duration_seconds == 0 {
            return Err(invalid("duration must be positive"));
        }
        if script.sentences.is_empty() {
            return Err(invalid("script has no sentences"));
        }
        if script.sentences.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("script contains an empty sentence"));
        }
        if let Some(track_id) = script.suggested_audio_track_id
            && catalog::get_track(track_id).is_none()
        {
            return Err(HavenError::CatalogInvalid {
                id: script.id.to_string(),
                message: format!("suggested track {track_id} is not in the audio catalog"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    fn script(id: &'static str) -> VisualizationScript {
        VisualizationScript {
            id,
            emotion: EmotionLabel::Calm,
            title: "Test",
            total_duration_seconds: 30,
            sentences: &["One.", "Two.", "Three."],
            scene: SceneType::Garden,
            suggested_audio_track_id: None,
        }
    }

    #[test]
    fn shipped_catalog_is_valid() {
        assert!(validate_catalog().is_ok());
        assert_eq!(list_scripts().len(), 5);
    }

    #[test]
    fn get_script_by_id() {
        let s = get_script("vis-anxious-1").unwrap();
        assert_eq!(s.title, "Grounding Breath");
        assert_eq!(s.sentences.len(), 12);
        assert_eq!(s.scene, SceneType::Ocean);
        assert!(get_script("vis-angry-1").is_none());
    }

    #[test]
    fn script_for_emotion_matches_emotion() {
        let random = SequenceRandom::fixed(0);
        for emotion in [
            EmotionLabel::Sad,
            EmotionLabel::Anxious,
            EmotionLabel::Stressed,
            EmotionLabel::Lonely,
            EmotionLabel::Calm,
        ] {
            let s = script_for_emotion(emotion, &random).unwrap();
            assert_eq!(s.emotion, emotion);
        }
    }

    #[test]
    fn script_for_emotion_without_script_is_none() {
        let random = SequenceRandom::fixed(0);
        assert!(script_for_emotion(EmotionLabel::Angry, &random).is_none());
        assert!(script_for_emotion(EmotionLabel::Excited, &random).is_none());
        assert!(script_for_emotion(EmotionLabel::Neutral, &random).is_none());
    }

    #[test]
    fn sentence_interval_divides_duration() {
        assert_eq!(script("a").sentence_interval_ms(), 10_000);
        assert_eq!(get_script("vis-sad-1").unwrap().sentence_interval_ms(), 18_000);
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let err = validate_scripts(&[script("a"), script("a")]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let mut s = script("a");
        s.total_duration_seconds = 0;
        assert!(validate_scripts(&[s]).is_err());
    }

    #[test]
    fn validate_rejects_empty_sentences() {
        let mut s = script("a");
        s.sentences = &[];
        assert!(validate_scripts(&[s.clone()]).is_err());
        s.sentences = &["Fine.", "  "];
        assert!(validate_scripts(&[s]).is_err());
    }

    #[test]
    fn validate_rejects_unknown_track() {
        let mut s = script("a");
        s.suggested_audio_track_id = Some("missing");
        let err = validate_scripts(&[s]).unwrap_err();
        assert!(matches!(err, HavenError::CatalogInvalid { .. }));
        assert!(err.to_string().contains("missing"));
    }
}
