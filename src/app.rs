//! Command runners for the haven binary.
//!
//! Builds the audio engine, player and orchestrator from [`Config`] and
//! drives them from the terminal.

use crate::audio::{
    AudioEngine, AudioOutput, AudioTrack, JsonFileStorage, NullOutput, PreferenceStorage,
};
use crate::companion::{Companion, CompanionConfig};
use crate::config::Config;
use crate::emotion::{EmotionLabel, classify};
use crate::error::Result;
use crate::report::{ErrorReporter, LogReporter};
use crate::response::{ChatBackend, OfflineChat, ReplySource, ResponseOrchestrator};
use crate::visualization::{VisualizationPlayer, list_scripts};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// One line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Message(String),
    Like,
    Dislike,
    Visualize(Option<EmotionLabel>),
    Stop,
    Tracks,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

/// Parse a prompt line. Lines starting with `/` are commands.
pub fn parse_chat_input(line: &str) -> ChatInput {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatInput::Message(line.to_string());
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();
    match name.as_str() {
        "like" => ChatInput::Like,
        "dislike" => ChatInput::Dislike,
        "visualize" | "vis" => match arg.map(str::parse::<EmotionLabel>) {
            None => ChatInput::Visualize(None),
            Some(Ok(emotion)) => ChatInput::Visualize(Some(emotion)),
            Some(Err(_)) => ChatInput::Unknown(line.to_string()),
        },
        "stop" => ChatInput::Stop,
        "tracks" => ChatInput::Tracks,
        "help" | "?" => ChatInput::Help,
        "quit" | "exit" | "q" => ChatInput::Quit,
        _ => ChatInput::Unknown(line.to_string()),
    }
}

/// Open the configured output device, falling back to silent playback.
fn build_output(config: &Config) -> Box<dyn AudioOutput> {
    #[cfg(feature = "cpal-audio")]
    {
        let audio_dir = config.audio.resolved_audio_dir();
        match crate::audio::CpalAudioOutput::new(config.audio.device.as_deref(), audio_dir) {
            Ok(output) => return Box::new(output),
            Err(e) => tracing::warn!("Audio output unavailable, continuing silently: {}", e),
        }
    }
    #[cfg(not(feature = "cpal-audio"))]
    let _ = config;
    Box::new(NullOutput)
}

fn build_engine(config: &Config, output: Box<dyn AudioOutput>) -> AudioEngine {
    let storage: Arc<dyn PreferenceStorage> = Arc::new(JsonFileStorage::new(
        config.storage.resolved_preferences_path(),
    ));
    let reporter: Arc<dyn ErrorReporter> = Arc::new(LogReporter);
    AudioEngine::new(output, storage, config.audio.engine_config()).with_error_reporter(reporter)
}

/// Wire up a companion with real audio output and on-disk preferences.
pub fn build_companion(config: &Config) -> Companion {
    let engine = build_engine(config, build_output(config));
    let player = VisualizationPlayer::new();
    let orchestrator = ResponseOrchestrator::new(config.conversation.orchestrator_config());
    Companion::new(engine, player, orchestrator, CompanionConfig::from(config))
}

fn paint(text: &str, emotion: EmotionLabel) -> String {
    let (r, g, b) = emotion.rgb();
    text.truecolor(r, g, b).to_string()
}

fn track_line(track: &AudioTrack) -> String {
    format!(
        "{:<6} {:<24} {:<12} {}",
        track.id,
        track.name,
        track.category.to_string(),
        track.format_duration().dimmed()
    )
}

fn print_help() {
    println!("  {}  tell haven how you feel", "<text>".bold());
    println!("  {}  you liked the track that is playing", "/like".bold());
    println!("  {}  you did not like it", "/dislike".bold());
    println!(
        "  {}  start a guided visualization",
        "/visualize [emotion]".bold()
    );
    println!("  {}  stop audio and visualization", "/stop".bold());
    println!("  {}  suggested tracks for your mood", "/tracks".bold());
    println!("  {}  leave", "/quit".bold());
}

/// Tags visualization sessions so a completion from a replaced or stopped
/// session is ignored.
#[derive(Debug, Default)]
struct VisualizationTags {
    current: u64,
}

impl VisualizationTags {
    /// Tag for a session that is about to start.
    fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    /// Forget the running session.
    fn end(&mut self) {
        self.current += 1;
    }

    fn is_current(&self, tag: u64) -> bool {
        tag == self.current
    }
}

fn give_feedback(companion: &Companion, liked: bool) {
    let emotion = companion.current_emotion().unwrap_or(EmotionLabel::Neutral);
    match companion.feedback(emotion, liked) {
        Ok(Some(track)) if liked => println!("Noted. I'll remember you like {}.", track.name),
        Ok(Some(track)) => println!("Noted. I won't suggest {} for {} first.", track.name, emotion),
        Ok(None) => println!("Nothing is playing right now."),
        Err(e) => eprintln!("{} {}", "Could not save preference:".red(), e),
    }
}

/// Interactive conversation over stdin.
pub async fn run_chat(config: Config, quiet: bool) -> Result<()> {
    let mut companion = build_companion(&config);
    let chat: Arc<dyn ChatBackend> = Arc::new(OfflineChat);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<u64>();
    let mut tags = VisualizationTags::default();

    if !quiet {
        println!("{}", "haven: a quiet place to talk. Type /help for commands.".dimmed());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            Some(tag) = done_rx.recv() => {
                if !tags.is_current(tag) {
                    continue;
                }
                tags.end();
                println!("{}", "The visualization has ended.".dimmed());
                companion.close_visualization().await;
                continue;
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_chat_input(&line) {
            ChatInput::Empty => {}
            ChatInput::Message(text) => {
                let exchange = companion.handle_message(&text, chat.as_ref()).await;
                let emotion = exchange.reply.emotion;
                if !quiet {
                    println!(
                        "{} {}",
                        paint(&format!("[{}]", emotion), emotion),
                        format!("{:.0}%", exchange.result.intensity * 100.0).dimmed()
                    );
                }
                println!("{}", exchange.reply.text);
                if let Some(affirmation) = &exchange.reply.affirmation {
                    println!("{}", paint(affirmation, emotion).italic());
                }
                if exchange.reply.source == ReplySource::Fallback {
                    tracing::debug!("reply came from the fallback pool");
                }
                if let Some(track) = exchange.auto_played {
                    println!("{} {}", "Now playing:".dimmed(), track.name);
                }
                if exchange.reply.suggest_visualization && !quiet {
                    println!(
                        "{}",
                        "A guided visualization might help. Try /visualize.".dimmed()
                    );
                }
            }
            ChatInput::Like => give_feedback(&companion, true),
            ChatInput::Dislike => give_feedback(&companion, false),
            ChatInput::Visualize(emotion) => {
                let emotion = emotion
                    .or(companion.current_emotion())
                    .unwrap_or(EmotionLabel::Calm);
                let done = done_tx.clone();
                let tag = tags.begin();
                let started = companion.start_visualization(
                    emotion,
                    move |sentence, index, total| {
                        println!(
                            "{} {}",
                            format!("[{}/{}]", index + 1, total).dimmed(),
                            paint(sentence, emotion)
                        );
                    },
                    move || {
                        done.send(tag).ok();
                    },
                );
                match started {
                    Some(script) => println!("{}", script.title.bold()),
                    None => println!("No visualization for {} yet.", emotion),
                }
            }
            ChatInput::Stop => {
                tags.end();
                companion.close_visualization().await;
                println!("{}", "Stopped.".dimmed());
            }
            ChatInput::Tracks => {
                let suggestions = companion.audio().recommend_or_default(
                    companion.current_emotion(),
                    crate::defaults::DEFAULT_RECOMMENDATION_LIMIT,
                );
                for track in suggestions {
                    println!("  {}", track_line(track));
                }
            }
            ChatInput::Help => print_help(),
            ChatInput::Quit => break,
            ChatInput::Unknown(command) => {
                println!("Unknown command: {} (try /help)", command);
            }
        }
    }

    companion.close_visualization().await;
    if !quiet {
        println!("{}", "Take care.".dimmed());
    }
    Ok(())
}

/// Print the detected emotion for `text`.
pub fn run_classify(text: &str, json: bool) -> Result<()> {
    let result = classify(text);
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{}  confidence {:.2}  intensity {:.2}",
        paint(result.label.as_str(), result.label).bold(),
        result.confidence,
        result.intensity
    );
    if !result.matched_keywords.is_empty() {
        println!("{} {}", "matched:".dimmed(), result.matched_keywords.join(", "));
    }
    Ok(())
}

/// List tracks, ranked by learned preference when an emotion is given.
pub fn run_tracks(config: &Config, emotion: Option<EmotionLabel>, limit: usize) -> Result<()> {
    let engine = build_engine(config, Box::new(NullOutput));
    let tracks = engine.recommend_or_default(emotion, limit);

    if tracks.is_empty() {
        println!("No tracks found");
        return Ok(());
    }
    for track in tracks {
        println!("  {}", track_line(track));
    }
    Ok(())
}

/// List the visualization catalog.
pub fn run_scripts() {
    for script in list_scripts() {
        println!(
            "  {:<12} {:<28} {:<9} {} sentences, {}s",
            script.id,
            script.title,
            paint(script.emotion.as_str(), script.emotion),
            script.sentences.len(),
            script.total_duration_seconds
        );
    }
}

/// Play one guided visualization to completion, or until Ctrl+C.
pub async fn run_visualize(config: Config, emotion: EmotionLabel, quiet: bool) -> Result<()> {
    let companion = build_companion(&config);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();

    let started = companion.start_visualization(
        emotion,
        move |sentence, index, total| {
            if quiet {
                println!("{}", sentence);
            } else {
                println!(
                    "{} {}",
                    format!("[{}/{}]", index + 1, total).dimmed(),
                    paint(sentence, emotion)
                );
            }
        },
        move || {
            done_tx.send(()).ok();
        },
    );
    let Some(script) = started else {
        eprintln!("No visualization for {}", emotion);
        return Ok(());
    };
    if !quiet {
        println!("{}", script.title.bold());
    }

    tokio::select! {
        _ = done_rx.recv() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Visualization interrupted");
        }
    }
    companion.close_visualization().await;
    Ok(())
}

/// Print learned preferences per emotion.
pub fn run_prefs(config: &Config) -> Result<()> {
    let storage = JsonFileStorage::new(config.storage.resolved_preferences_path());
    let map = storage.load()?;
    if map.is_empty() {
        println!("No preferences recorded yet");
        return Ok(());
    }

    for (emotion, ids) in map.iter() {
        println!("{}", paint(emotion.as_str(), emotion).bold());
        for id in ids {
            match crate::audio::get_track(id) {
                Some(track) => println!("  {}", track_line(track)),
                None => println!("  {} {}", id, "(no longer in catalog)".dimmed()),
            }
        }
    }
    Ok(())
}

/// Print the effective configuration.
pub fn run_config(config: &Config) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}

/// List audio output devices.
#[cfg(feature = "cpal-audio")]
pub fn run_devices() -> Result<()> {
    let devices = crate::audio::playback::list_output_devices()?;
    if devices.is_empty() {
        println!("No audio output devices found");
        return Ok(());
    }

    println!("Available audio output devices:");
    for (idx, device) in devices.iter().enumerate() {
        println!("  [{}] {}", idx, device);
    }
    Ok(())
}
