//! End-to-end conversation flow with on-disk preferences.

use haven::audio::{
    AudioEngine, AudioEngineConfig, JsonFileStorage, MockAudioOutput, PreferenceStorage, get_track,
};
use haven::companion::{Companion, CompanionConfig};
use haven::random::SequenceRandom;
use haven::response::{OfflineChat, OrchestratorConfig, ReplySource, ResponseOrchestrator};
use haven::visualization::{VisualizationPlayer, validate_catalog};
use haven::{EmotionLabel, classify};
use std::path::Path;
use std::sync::Arc;

fn companion_at(path: &Path, output: &MockAudioOutput) -> Companion {
    let engine = AudioEngine::new(
        Box::new(output.clone()),
        Arc::new(JsonFileStorage::new(path)),
        AudioEngineConfig::default(),
    );
    let orchestrator = ResponseOrchestrator::new(OrchestratorConfig::default())
        .with_random(Arc::new(SequenceRandom::fixed(0)));
    Companion::new(
        engine,
        VisualizationPlayer::new(),
        orchestrator,
        CompanionConfig::default(),
    )
    .with_random(Arc::new(SequenceRandom::fixed(0)))
}

#[test]
fn bundled_catalogs_are_consistent() {
    assert!(validate_catalog().is_ok());
}

#[tokio::test(start_paused = true)]
async fn offline_conversation_uses_fallback_replies() {
    let dir = tempfile::tempdir().unwrap();
    let output = MockAudioOutput::new();
    let mut companion = companion_at(&dir.path().join("prefs.json"), &output);

    let exchange = companion
        .handle_message("I'm worried about tomorrow", &OfflineChat)
        .await;

    assert_eq!(exchange.result.label, EmotionLabel::Anxious);
    assert_eq!(exchange.reply.source, ReplySource::Fallback);
    assert!(!exchange.reply.text.is_empty());
    assert_eq!(companion.history().len(), 2);
}

#[test]
fn fresh_engine_recommends_catalog_order() {
    let dir = tempfile::tempdir().unwrap();
    let companion = companion_at(&dir.path().join("prefs.json"), &MockAudioOutput::new());

    let ids: Vec<&str> = companion
        .audio()
        .recommend(EmotionLabel::Calm, 2)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["amb1", "amb2"]);
}

#[tokio::test(start_paused = true)]
async fn liked_track_is_remembered_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("prefs.json");

    {
        let companion = companion_at(&path, &MockAudioOutput::new());
        companion.audio().play(get_track("ins2").unwrap());
        let liked = companion.feedback(EmotionLabel::Calm, true).unwrap();
        assert_eq!(liked.map(|t| t.id), Some("ins2"));
    }

    let stored = JsonFileStorage::new(&path).load().unwrap();
    assert_eq!(stored.get(EmotionLabel::Calm), ["ins2".to_string()]);

    let companion = companion_at(&path, &MockAudioOutput::new());
    let ids: Vec<&str> = companion
        .audio()
        .recommend(EmotionLabel::Calm, 2)
        .iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(ids, vec!["ins2", "amb1"]);
}

#[tokio::test(start_paused = true)]
async fn intense_message_starts_audio_that_fades_in() {
    let dir = tempfile::tempdir().unwrap();
    let output = MockAudioOutput::new();
    let mut companion = companion_at(&dir.path().join("prefs.json"), &output);

    let text = "I am so very sad";
    assert!(classify(text).intensity > 0.5);
    let exchange = companion.handle_message(text, &OfflineChat).await;

    let track = exchange.auto_played.unwrap();
    assert_eq!(companion.audio().current_track().map(|t| t.id), Some(track.id));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;
    assert!(!companion.audio().is_fading());
    assert_eq!(output.last_volume(), Some(companion.audio().volume()));
}
