//! Therapeutic audio track catalog.
//!
//! A fixed, compiled-in table of tracks tagged with the emotions they suit.
//! Locators are file names resolved against the configured audio directory.

use crate::emotion::EmotionLabel;
use serde::Serialize;
use std::fmt;

/// Broad kind of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCategory {
    Ambient,
    Nature,
    Meditation,
    Binaural,
    Instrumental,
}

impl fmt::Display for AudioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioCategory::Ambient => "ambient",
            AudioCategory::Nature => "nature",
            AudioCategory::Meditation => "meditation",
            AudioCategory::Binaural => "binaural",
            AudioCategory::Instrumental => "instrumental",
        };
        f.write_str(name)
    }
}

/// Metadata for one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrack {
    /// Stable identifier (e.g., "nat1")
    pub id: &'static str,
    pub name: &'static str,
    pub category: AudioCategory,
    /// File name relative to the audio directory
    pub locator: &'static str,
    /// Nominal length in seconds
    pub duration_seconds: u32,
    pub emotions: &'static [EmotionLabel],
    pub tags: &'static [&'static str],
}

impl AudioTrack {
    pub fn suits(&self, emotion: EmotionLabel) -> bool {
        self.emotions.contains(&emotion)
    }

    /// Duration as `m:ss`.
    pub fn format_duration(&self) -> String {
        format!(
            "{}:{:02}",
            self.duration_seconds / 60,
            self.duration_seconds % 60
        )
    }
}

use EmotionLabel::*;

pub const TRACKS: &[AudioTrack] = &[
    AudioTrack {
        id: "amb1",
        name: "Peaceful Pad",
        category: AudioCategory::Ambient,
        locator: "ambient-1.wav",
        duration_seconds: 180,
        emotions: &[Calm, Neutral],
        tags: &["soft", "gentle"],
    },
    AudioTrack {
        id: "amb2",
        name: "Deep Space",
        category: AudioCategory::Ambient,
        locator: "ambient-2.wav",
        duration_seconds: 240,
        emotions: &[Calm, Lonely],
        tags: &["spacious", "ethereal"],
    },
    AudioTrack {
        id: "nat1",
        name: "Rain on Leaves",
        category: AudioCategory::Nature,
        locator: "rain.wav",
        duration_seconds: 300,
        emotions: &[Sad, Calm],
        tags: &["rain", "soothing"],
    },
    AudioTrack {
        id: "nat2",
        name: "Forest Birds",
        category: AudioCategory::Nature,
        locator: "forest.wav",
        duration_seconds: 240,
        emotions: &[Calm, Excited],
        tags: &["birds", "morning"],
    },
    AudioTrack {
        id: "nat3",
        name: "Ocean Waves",
        category: AudioCategory::Nature,
        locator: "ocean.wav",
        duration_seconds: 360,
        emotions: &[Calm, Stressed],
        tags: &["waves", "beach"],
    },
    AudioTrack {
        id: "med1",
        name: "Singing Bowl",
        category: AudioCategory::Meditation,
        locator: "bowl.wav",
        duration_seconds: 180,
        emotions: &[Anxious, Stressed],
        tags: &["tibetan", "healing"],
    },
    AudioTrack {
        id: "med2",
        name: "Gentle Chimes",
        category: AudioCategory::Meditation,
        locator: "chimes.wav",
        duration_seconds: 200,
        emotions: &[Anxious, Calm],
        tags: &["bells", "peaceful"],
    },
    AudioTrack {
        id: "bin1",
        name: "432Hz Healing",
        category: AudioCategory::Binaural,
        locator: "432hz.wav",
        duration_seconds: 300,
        emotions: &[Stressed, Anxious],
        tags: &["healing", "frequency"],
    },
    AudioTrack {
        id: "bin2",
        name: "528Hz Love",
        category: AudioCategory::Binaural,
        locator: "528hz.wav",
        duration_seconds: 300,
        emotions: &[Sad, Lonely],
        tags: &["love", "frequency"],
    },
    AudioTrack {
        id: "ins1",
        name: "Soft Piano",
        category: AudioCategory::Instrumental,
        locator: "piano.wav",
        duration_seconds: 220,
        emotions: &[Sad, Calm],
        tags: &["piano", "gentle"],
    },
    AudioTrack {
        id: "ins2",
        name: "Acoustic Guitar",
        category: AudioCategory::Instrumental,
        locator: "guitar.wav",
        duration_seconds: 180,
        emotions: &[Calm, Neutral],
        tags: &["guitar", "warm"],
    },
];

/// Find a track by id.
pub fn get_track(id: &str) -> Option<&'static AudioTrack> {
    TRACKS.iter().find(|t| t.id == id)
}

/// Get all tracks in catalog order.
pub fn list_tracks() -> &'static [AudioTrack] {
    TRACKS
}

/// Tracks associated with `emotion`, in catalog order.
pub fn tracks_for(emotion: EmotionLabel) -> impl Iterator<Item = &'static AudioTrack> {
    TRACKS.iter().filter(move |t| t.suits(emotion))
}
