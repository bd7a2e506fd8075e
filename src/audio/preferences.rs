//! Learned per-emotion track preferences and their storage.
//!
//! The map is read once when the engine is built and written back whole after
//! every change.

use crate::defaults;
use crate::emotion::EmotionLabel;
use crate::error::{HavenError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Emotion → recency-ordered liked track ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferenceMap {
    entries: BTreeMap<EmotionLabel, Vec<String>>,
}

impl PreferenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Liked ids for `emotion`, oldest like first.
    pub fn get(&self, emotion: EmotionLabel) -> &[String] {
        self.entries.get(&emotion).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Apply one feedback event. Returns true if the map changed.
    pub fn record(&mut self, emotion: EmotionLabel, track_id: &str, liked: bool) -> bool {
        if liked {
            let ids = self.entries.entry(emotion).or_default();
            if ids.iter().any(|id| id == track_id) {
                return false;
            }
            ids.push(track_id.to_string());
            return true;
        }

        let Some(ids) = self.entries.get_mut(&emotion) else {
            return false;
        };
        let before = ids.len();
        ids.retain(|id| id != track_id);
        let changed = ids.len() != before;
        if ids.is_empty() {
            self.entries.remove(&emotion);
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, &[String])> {
        self.entries.iter().map(|(e, ids)| (*e, ids.as_slice()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Parse a stored map, dropping duplicate ids within an emotion.
    pub fn from_json(s: &str) -> Result<Self> {
        let raw: BTreeMap<EmotionLabel, Vec<String>> = serde_json::from_str(s)?;
        let mut map = Self::new();
        for (emotion, ids) in raw {
            for id in ids {
                map.record(emotion, &id, true);
            }
        }
        Ok(map)
    }
}

/// Durable slot for the preference map.
pub trait PreferenceStorage: Send + Sync {
    /// Read the stored map. A slot that was never written yields an empty map.
    fn load(&self) -> Result<PreferenceMap>;

    /// Overwrite the stored map.
    fn save(&self, map: &PreferenceMap) -> Result<()>;
}

/// JSON file storage.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns ~/.local/share/haven/audio-preferences.json on Linux.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(defaults::APP_DIR)
            .join(defaults::PREFERENCES_FILE)
    }
}

impl PreferenceStorage for JsonFileStorage {
    fn load(&self) -> Result<PreferenceMap> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferenceMap::new());
            }
            Err(e) => {
                return Err(HavenError::PreferenceLoad {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                });
            }
        };
        PreferenceMap::from_json(&contents).map_err(|e| HavenError::PreferenceLoad {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    fn save(&self, map: &PreferenceMap) -> Result<()> {
        let save_err = |message: String| HavenError::PreferenceSave {
            path: self.path.display().to_string(),
            message,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
        }
        let json = map.to_json().map_err(|e| save_err(e.to_string()))?;
        // Write-then-rename so a crash never leaves a half-written map.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| save_err(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| save_err(e.to_string()))?;
        Ok(())
    }
}

/// In-memory storage for testing.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stored: Mutex<Option<PreferenceMap>>,
    should_fail_save: bool,
    saves: Mutex<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-stored map.
    pub fn with_map(map: PreferenceMap) -> Self {
        Self {
            stored: Mutex::new(Some(map)),
            ..Self::default()
        }
    }

    /// Configure the storage to fail on save.
    pub fn with_save_failure(mut self) -> Self {
        self.should_fail_save = true;
        self
    }

    /// The last map written, if any.
    pub fn stored(&self) -> Option<PreferenceMap> {
        self.stored.lock().ok().and_then(|s| s.clone())
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }
}

impl PreferenceStorage for MemoryStorage {
    fn load(&self) -> Result<PreferenceMap> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, map: &PreferenceMap) -> Result<()> {
        if self.should_fail_save {
            return Err(HavenError::PreferenceSave {
                path: "memory".to_string(),
                message: "mock storage failure".to_string(),
            });
        }
        if let Ok(mut stored) = self.stored.lock() {
            *stored = Some(map.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_like_appends_once() {
        let mut map = PreferenceMap::new();
        assert!(map.record(EmotionLabel::Calm, "nat1", true));
        assert!(map.record(EmotionLabel::Calm, "amb1", true));
        assert!(!map.record(EmotionLabel::Calm, "nat1", true));
        assert_eq!(map.get(EmotionLabel::Calm), ["nat1", "amb1"]);
    }

    #[test]
    fn record_dislike_removes() {
        let mut map = PreferenceMap::new();
        map.record(EmotionLabel::Sad, "ins1", true);
        assert!(map.record(EmotionLabel::Sad, "ins1", false));
        assert!(map.get(EmotionLabel::Sad).is_empty());
        assert!(!map.record(EmotionLabel::Sad, "ins1", false));
        assert_eq!(map, PreferenceMap::new());
    }

    #[test]
    fn emotions_are_independent() {
        let mut map = PreferenceMap::new();
        map.record(EmotionLabel::Sad, "nat1", true);
        map.record(EmotionLabel::Calm, "nat1", true);
        map.record(EmotionLabel::Sad, "nat1", false);
        assert!(map.get(EmotionLabel::Sad).is_empty());
        assert_eq!(map.get(EmotionLabel::Calm), ["nat1"]);
    }

    #[test]
    fn json_uses_emotion_names_as_keys() {
        let mut map = PreferenceMap::new();
        map.record(EmotionLabel::Anxious, "med1", true);
        let json = map.to_json().unwrap();
        assert!(json.contains("\"anxious\""));
        assert_eq!(PreferenceMap::from_json(&json).unwrap(), map);
    }

    #[test]
    fn from_json_drops_duplicates() {
        let map = PreferenceMap::from_json(r#"{"calm": ["a", "b", "a"]}"#).unwrap();
        assert_eq!(map.get(EmotionLabel::Calm), ["a", "b"]);
    }

    #[test]
    fn from_json_rejects_unknown_emotion() {
        assert!(PreferenceMap::from_json(r#"{"bored": ["a"]}"#).is_err());
    }

    #[test]
    fn file_storage_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("prefs.json"));
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn file_storage_round_trips_and_creates_parent() {
        let dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(dir.path().join("nested").join("prefs.json"));

        let mut map = PreferenceMap::new();
        map.record(EmotionLabel::Lonely, "bin2", true);
        map.record(EmotionLabel::Lonely, "amb2", true);
        storage.save(&map).unwrap();

        let loaded = JsonFileStorage::new(storage.path()).load().unwrap();
        assert_eq!(loaded.get(EmotionLabel::Lonely), ["bin2", "amb2"]);
    }

    #[test]
    fn file_storage_corrupt_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let err = JsonFileStorage::new(&path).load().unwrap_err();
        assert!(matches!(err, HavenError::PreferenceLoad { .. }));
    }

    #[test]
    fn memory_storage_failure_reports_save_error() {
        let storage = MemoryStorage::new().with_save_failure();
        let err = storage.save(&PreferenceMap::new()).unwrap_err();
        assert!(matches!(err, HavenError::PreferenceSave { .. }));
        assert_eq!(storage.save_count(), 0);
    }

    #[test]
    fn default_path_is_under_app_dir() {
        let path = JsonFileStorage::default_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.contains("haven"));
        assert!(path_str.ends_with("audio-preferences.json"));
    }
}
