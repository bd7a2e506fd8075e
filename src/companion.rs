//! Conversation flow tying classification, replies, audio and visualizations
//! together.
//!
//! message → classify → reply → maybe start suggested audio

use crate::audio::{AudioEngine, AudioTrack, FadeOut, get_track};
use crate::config::Config;
use crate::conversation::{ConversationHistory, ConversationTurn};
use crate::defaults;
use crate::emotion::{EmotionLabel, EmotionResult, classify};
use crate::error::Result;
use crate::random::{RandomSource, ThreadRandom};
use crate::response::{ChatBackend, EmpatheticReply, ResponseOrchestrator};
use crate::visualization::{VisualizationPlayer, VisualizationScript, script_for_emotion};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Flow tuning, usually taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompanionConfig {
    pub history_window: usize,
    pub max_history_for_prompt: usize,
    pub auto_audio_intensity: f32,
    pub fade_in: Duration,
    pub fade_out: Duration,
    pub visualization_fade_in: Duration,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            history_window: defaults::HISTORY_WINDOW,
            max_history_for_prompt: defaults::MAX_HISTORY_FOR_PROMPT,
            auto_audio_intensity: defaults::AUTO_AUDIO_INTENSITY,
            fade_in: Duration::from_millis(defaults::FADE_IN_MS),
            fade_out: Duration::from_millis(defaults::FADE_OUT_MS),
            visualization_fade_in: Duration::from_millis(defaults::VISUALIZATION_FADE_IN_MS),
        }
    }
}

impl From<&Config> for CompanionConfig {
    fn from(config: &Config) -> Self {
        Self {
            history_window: config.conversation.history_window,
            max_history_for_prompt: config.conversation.max_history_for_prompt,
            auto_audio_intensity: config.conversation.auto_audio_intensity,
            fade_in: Duration::from_millis(config.audio.fade_in_ms),
            fade_out: Duration::from_millis(config.audio.fade_out_ms),
            visualization_fade_in: Duration::from_millis(config.audio.visualization_fade_in_ms),
        }
    }
}

/// Outcome of one user message.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub result: EmotionResult,
    pub reply: EmpatheticReply,
    /// Track started because the reply suggested audio at high intensity
    pub auto_played: Option<&'static AudioTrack>,
}

/// One user's companion session.
pub struct Companion {
    audio: AudioEngine,
    player: VisualizationPlayer,
    orchestrator: ResponseOrchestrator,
    history: ConversationHistory,
    random: Arc<dyn RandomSource>,
    config: CompanionConfig,
    current_emotion: Option<EmotionLabel>,
}

impl Companion {
    pub fn new(
        audio: AudioEngine,
        player: VisualizationPlayer,
        orchestrator: ResponseOrchestrator,
        config: CompanionConfig,
    ) -> Self {
        Self {
            audio,
            player,
            orchestrator,
            history: ConversationHistory::new(config.history_window),
            random: Arc::new(ThreadRandom),
            config,
            current_emotion: None,
        }
    }

    /// Sets the random source used for script selection.
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    /// Classify `text`, reply to it, and start suggested audio when the
    /// emotion runs high.
    pub async fn handle_message(&mut self, text: &str, chat: &dyn ChatBackend) -> Exchange {
        let result = classify(text);
        debug!(
            emotion = %result.label,
            confidence = result.confidence,
            intensity = result.intensity,
            "classified message"
        );

        let context = self.history.turns();
        self.history
            .push(ConversationTurn::user(text, Some(result.label)));

        let reply = self
            .orchestrator
            .respond(
                text,
                &result,
                &context,
                self.config.max_history_for_prompt,
                chat,
            )
            .await;

        self.history
            .push(ConversationTurn::assistant(reply.text.clone(), reply.emotion));
        self.current_emotion = Some(reply.emotion);

        let mut auto_played = None;
        if reply.suggest_audio && result.intensity > self.config.auto_audio_intensity {
            if let Some(track) = self.audio.recommend(reply.emotion, 1).first().copied() {
                info!(track = track.id, emotion = %reply.emotion, "auto-playing suggested audio");
                self.audio.play(track);
                self.audio.fade_in(self.config.fade_in);
                auto_played = Some(track);
            }
        }

        Exchange {
            result,
            reply,
            auto_played,
        }
    }

    /// Record whether the user liked the track that is playing.
    ///
    /// A dislike removes the track from the emotion's preferences. Returns
    /// the track the feedback applied to.
    pub fn feedback(
        &self,
        emotion: EmotionLabel,
        liked: bool,
    ) -> Result<Option<&'static AudioTrack>> {
        let Some(track) = self.audio.current_track() else {
            return Ok(None);
        };
        if let Err(e) = self.audio.record_preference(emotion, track.id, liked) {
            warn!("{}", e);
            return Err(e);
        }
        Ok(Some(track))
    }

    /// Pick a script for `emotion`, start its suggested track and play it.
    ///
    /// Returns None when no script exists for the emotion.
    pub fn start_visualization<S, C>(
        &self,
        emotion: EmotionLabel,
        on_sentence: S,
        on_complete: C,
    ) -> Option<&'static VisualizationScript>
    where
        S: FnMut(&str, usize, usize) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let script = script_for_emotion(emotion, self.random.as_ref())?;

        if let Some(track) = script.suggested_audio_track_id.and_then(get_track) {
            self.audio.play(track);
            self.audio.fade_in(self.config.visualization_fade_in);
        }
        self.player.play(script, on_sentence, on_complete);
        Some(script)
    }

    /// Stop the visualization and fade its audio out.
    pub fn close_visualization(&self) -> FadeOut {
        self.player.stop();
        self.audio.fade_out(self.config.fade_out)
    }

    /// Emotion of the last reply.
    pub fn current_emotion(&self) -> Option<EmotionLabel> {
        self.current_emotion
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn player(&self) -> &VisualizationPlayer {
        &self.player
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::{MockAudioOutput, OutputCall};
    use crate::audio::{AudioEngineConfig, MemoryStorage};
    use crate::conversation::TurnRole;
    use crate::random::SequenceRandom;
    use crate::response::{MockChat, OrchestratorConfig, ReplySource, prompts};

    fn companion(mock: &MockAudioOutput) -> Companion {
        let audio = AudioEngine::new(
            Box::new(mock.clone()),
            Arc::new(MemoryStorage::new()),
            AudioEngineConfig::default(),
        );
        let orchestrator = ResponseOrchestrator::new(OrchestratorConfig::default())
            .with_random(Arc::new(SequenceRandom::fixed(0)));
        Companion::new(
            audio,
            VisualizationPlayer::new(),
            orchestrator,
            CompanionConfig::default(),
        )
        .with_random(Arc::new(SequenceRandom::fixed(0)))
    }

    #[tokio::test(start_paused = true)]
    async fn message_is_classified_and_answered() {
        let mut companion = companion(&MockAudioOutput::new());
        let chat = MockChat::new().with_reply("I'm right here with you.");

        let exchange = companion.handle_message("I feel sad", &chat).await;

        assert_eq!(exchange.result.label, EmotionLabel::Sad);
        assert_eq!(exchange.reply.text, "I'm right here with you.");
        assert_eq!(exchange.reply.source, ReplySource::Generated);
        assert_eq!(companion.current_emotion(), Some(EmotionLabel::Sad));

        let turns = companion.history().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_context_excludes_current_message() {
        let mut companion = companion(&MockAudioOutput::new());
        let chat = MockChat::new().with_reply("ok");

        companion.handle_message("first message", &chat).await;
        companion.handle_message("second message", &chat).await;

        let requests = chat.requests();
        assert!(!requests[0][1].content.contains("Recent context"));
        let second = &requests[1][1].content;
        assert!(second.starts_with("Recent context:\nuser: first message\nassistant: ok\n\n"));
        assert!(second.contains("User: second message"));
    }

    #[tokio::test(start_paused = true)]
    async fn high_intensity_auto_plays_top_recommendation() {
        let mock = MockAudioOutput::new();
        let mut companion = companion(&mock);

        let exchange = companion
            .handle_message("I am so very sad", &MockChat::new().with_failure())
            .await;

        assert!(exchange.result.intensity > 0.5);
        assert_eq!(exchange.auto_played.map(|t| t.id), Some("nat1"));
        assert_eq!(companion.audio().current_track().map(|t| t.id), Some("nat1"));
        assert!(companion.audio().is_fading());
    }

    #[tokio::test(start_paused = true)]
    async fn baseline_intensity_does_not_auto_play() {
        let mock = MockAudioOutput::new();
        let mut companion = companion(&mock);

        let exchange = companion
            .handle_message("I feel sad", &MockChat::new().with_failure())
            .await;

        assert_eq!(exchange.reply.source, ReplySource::Fallback);
        assert!(exchange.reply.suggest_audio);
        assert_eq!(exchange.result.intensity, 0.5);
        assert!(exchange.auto_played.is_none());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_chat_uses_fallback_text() {
        let mut companion = companion(&MockAudioOutput::new());
        let exchange = companion
            .handle_message("I'm so lonely", &MockChat::new().with_failure())
            .await;

        assert_eq!(exchange.reply.emotion, EmotionLabel::Lonely);
        assert_eq!(
            exchange.reply.text,
            prompts::fallback_message(EmotionLabel::Lonely)
        );
    }

    #[test]
    fn feedback_without_playback_records_nothing() {
        let companion = companion(&MockAudioOutput::new());
        let applied = companion.feedback(EmotionLabel::Calm, true).unwrap();
        assert!(applied.is_none());
        assert!(companion.audio().preferences(EmotionLabel::Calm).is_empty());
    }

    #[test]
    fn feedback_like_records_current_track() {
        let companion = companion(&MockAudioOutput::new());
        companion.audio().play(get_track("ins2").unwrap());

        let applied = companion.feedback(EmotionLabel::Calm, true).unwrap();

        assert_eq!(applied.map(|t| t.id), Some("ins2"));
        assert_eq!(companion.audio().preferences(EmotionLabel::Calm), ["ins2"]);
        assert_eq!(
            companion.audio().recommend(EmotionLabel::Calm, 1)[0].id,
            "ins2"
        );
    }

    #[test]
    fn feedback_dislike_forgets_liked_track() {
        let companion = companion(&MockAudioOutput::new());
        companion.audio().play(get_track("ins2").unwrap());
        companion.feedback(EmotionLabel::Calm, true).unwrap();

        let applied = companion.feedback(EmotionLabel::Calm, false).unwrap();

        assert_eq!(applied.map(|t| t.id), Some("ins2"));
        assert!(companion.audio().preferences(EmotionLabel::Calm).is_empty());
        assert_eq!(
            companion.audio().recommend(EmotionLabel::Calm, 1)[0].id,
            "amb1"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn visualization_plays_suggested_track() {
        let mock = MockAudioOutput::new();
        let companion = companion(&mock);

        let script = companion
            .start_visualization(EmotionLabel::Anxious, |_, _, _| {}, || {})
            .unwrap();

        assert_eq!(script.id, "vis-anxious-1");
        assert!(companion.player().is_active());
        assert_eq!(companion.audio().current_track().map(|t| t.id), Some("nat3"));
        assert_eq!(mock.volumes().first().copied(), Some(0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn visualization_unavailable_for_excited() {
        let mock = MockAudioOutput::new();
        let companion = companion(&mock);

        assert!(
            companion
                .start_visualization(EmotionLabel::Excited, |_, _, _| {}, || {})
                .is_none()
        );
        assert!(!companion.player().is_active());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn close_visualization_stops_player_and_audio() {
        let mock = MockAudioOutput::new();
        let companion = companion(&mock);
        companion.start_visualization(EmotionLabel::Calm, |_, _, _| {}, || {});

        companion.close_visualization().await;

        assert!(!companion.player().is_active());
        assert!(!companion.audio().is_playing());
        assert_eq!(mock.calls().last(), Some(&OutputCall::Stop));
    }
}
