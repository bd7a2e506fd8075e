//! Playback session, fades and learned preferences.
//!
//! One engine owns one output and one session slot. The slot lives behind a
//! mutex shared with fade timers; every fade step re-checks under that mutex
//! that it still belongs to the current session and to the current fade.

use crate::audio::catalog::{self, AudioTrack};
use crate::audio::output::AudioOutput;
use crate::audio::preferences::{PreferenceMap, PreferenceStorage};
use crate::defaults;
use crate::emotion::EmotionLabel;
use crate::error::Result;
use crate::report::{ErrorReporter, LogReporter};
use crate::timer::{self, TickControl, TimerHandle};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

const COMPONENT: &str = "audio";

/// Engine tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEngineConfig {
    /// Initial volume in [0, 1]
    pub default_volume: f32,
    /// Steps per fade
    pub fade_steps: u32,
}

impl Default for AudioEngineConfig {
    fn default() -> Self {
        Self {
            default_volume: defaults::DEFAULT_VOLUME,
            fade_steps: defaults::FADE_STEPS,
        }
    }
}

struct ActiveFade {
    id: u64,
    session: u64,
    _timer: TimerHandle,
    done: Option<oneshot::Sender<()>>,
}

struct EngineState {
    output: Box<dyn AudioOutput>,
    current: Option<&'static AudioTrack>,
    /// Volume setting; the level fades ramp towards
    volume: f32,
    /// Gain last sent to the output
    applied_volume: f32,
    session: u64,
    next_fade_id: u64,
    fade: Option<ActiveFade>,
    preferences: PreferenceMap,
}

impl EngineState {
    fn owns_fade(&self, session: u64, fade_id: u64) -> bool {
        self.session == session
            && self
                .fade
                .as_ref()
                .is_some_and(|f| f.id == fade_id && f.session == session)
    }

    fn apply_volume(&mut self, level: f32, reporter: &dyn ErrorReporter) {
        self.applied_volume = level;
        if let Err(e) = self.output.set_volume(level) {
            reporter.report(COMPONENT, &e);
        }
    }

    fn end_session(&mut self, reporter: &dyn ErrorReporter) {
        self.fade = None;
        self.session += 1;
        if self.current.take().is_some()
            && let Err(e) = self.output.stop()
        {
            reporter.report(COMPONENT, &e);
        }
        self.applied_volume = 0.0;
    }
}

fn lock(state: &Mutex<EngineState>) -> MutexGuard<'_, EngineState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Completion of a fade-out.
///
/// Resolves when the fade finished and playback stopped, or when the fade was
/// superseded by `play`, `stop` or another fade. The fade runs whether or not
/// this future is polled.
#[derive(Debug)]
#[must_use = "await the FadeOut to wait for the fade to finish"]
pub struct FadeOut {
    rx: Option<oneshot::Receiver<()>>,
}

impl FadeOut {
    fn ready() -> Self {
        Self { rx: None }
    }
}

impl Future for FadeOut {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        match self.rx.as_mut() {
            None => Poll::Ready(()),
            Some(rx) => Pin::new(rx).poll(cx).map(|_| ()),
        }
    }
}

/// Looping single-track player with fades and per-emotion preferences.
///
/// Clones share the same session.
#[derive(Clone)]
pub struct AudioEngine {
    state: Arc<Mutex<EngineState>>,
    storage: Arc<dyn PreferenceStorage>,
    reporter: Arc<dyn ErrorReporter>,
    config: AudioEngineConfig,
}

impl AudioEngine {
    /// Build an engine, loading stored preferences once.
    ///
    /// A preference load failure is logged and the engine starts with no
    /// preferences.
    pub fn new(
        output: Box<dyn AudioOutput>,
        storage: Arc<dyn PreferenceStorage>,
        config: AudioEngineConfig,
    ) -> Self {
        let preferences = storage.load().unwrap_or_else(|e| {
            tracing::warn!("{}; starting with no audio preferences", e);
            PreferenceMap::new()
        });
        let volume = config.default_volume.clamp(0.0, 1.0);

        Self {
            state: Arc::new(Mutex::new(EngineState {
                output,
                current: None,
                volume,
                applied_volume: 0.0,
                session: 0,
                next_fade_id: 0,
                fade: None,
                preferences,
            })),
            storage,
            reporter: Arc::new(LogReporter),
            config,
        }
    }

    /// Set the reporter for swallowed playback failures.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Tracks for `emotion`: liked tracks in the order they were liked, then
    /// catalog tracks for the emotion, without duplicates, at most `limit`.
    pub fn recommend(&self, emotion: EmotionLabel, limit: usize) -> Vec<&'static AudioTrack> {
        let state = lock(&self.state);
        let preferred = state
            .preferences
            .get(emotion)
            .iter()
            .filter_map(|id| catalog::get_track(id));

        let mut out: Vec<&'static AudioTrack> = Vec::with_capacity(limit);
        for track in preferred.chain(catalog::tracks_for(emotion)) {
            if out.len() >= limit {
                break;
            }
            if !out.iter().any(|t| t.id == track.id) {
                out.push(track);
            }
        }
        out
    }

    /// Like [`recommend`](Self::recommend), falling back to the head of the
    /// catalog when there is no current emotion.
    pub fn recommend_or_default(
        &self,
        emotion: Option<EmotionLabel>,
        limit: usize,
    ) -> Vec<&'static AudioTrack> {
        match emotion {
            Some(emotion) => self.recommend(emotion, limit),
            None => catalog::list_tracks().iter().take(limit).collect(),
        }
    }

    /// Replace the current track and start looping it at the current volume.
    ///
    /// Output failures go to the error reporter; the track is still recorded
    /// as current.
    pub fn play(&self, track: &'static AudioTrack) {
        let mut state = lock(&self.state);
        state.end_session(self.reporter.as_ref());

        state.current = Some(track);
        let volume = state.volume;
        state.applied_volume = volume;
        match state.output.start(track, volume) {
            Ok(()) => tracing::info!(track = track.id, "Playing: {}", track.name),
            Err(e) => self.reporter.report(COMPONENT, &e),
        }
    }

    /// Halt playback, clear the current track and cancel any fade.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if state.current.is_some() {
            tracing::debug!("stopping playback");
        }
        state.end_session(self.reporter.as_ref());
    }

    /// Clamp to [0, 1] and apply immediately.
    pub fn set_volume(&self, volume: f32) {
        let mut state = lock(&self.state);
        state.volume = volume.clamp(0.0, 1.0);
        if state.current.is_some() {
            let level = state.volume;
            state.apply_volume(level, self.reporter.as_ref());
        }
    }

    /// Ramp from silence up to the volume setting. No-op when nothing plays.
    pub fn fade_in(&self, duration: Duration) {
        let mut state = lock(&self.state);
        if state.current.is_none() {
            return;
        }
        state.apply_volume(0.0, self.reporter.as_ref());

        let steps = self.steps();
        let reporter = Arc::clone(&self.reporter);
        let started = self.begin_fade(&mut state, duration, None, move |state, tick| {
            let target = state.volume;
            let level = (target * tick as f32 / steps as f32).min(target);
            state.apply_volume(level, reporter.as_ref());
            if tick >= u64::from(steps) {
                state.fade = None;
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });

        if let Err(e) = started {
            self.reporter.report(COMPONENT, &e);
            let target = state.volume;
            state.apply_volume(target, self.reporter.as_ref());
        }
    }

    /// Ramp the current gain down to silence, then stop.
    ///
    /// Resolves immediately when nothing plays.
    pub fn fade_out(&self, duration: Duration) -> FadeOut {
        let mut state = lock(&self.state);
        if state.current.is_none() {
            return FadeOut::ready();
        }

        let (tx, rx) = oneshot::channel();
        let steps = self.steps();
        let start = state.applied_volume;
        let reporter = Arc::clone(&self.reporter);
        let started = self.begin_fade(&mut state, duration, Some(tx), move |state, tick| {
            let level = (start - start * tick as f32 / steps as f32).max(0.0);
            state.apply_volume(level, reporter.as_ref());
            if tick < u64::from(steps) {
                return TickControl::Continue;
            }
            let done = state.fade.take().and_then(|f| f.done);
            state.end_session(reporter.as_ref());
            tracing::debug!("fade out finished");
            if let Some(done) = done
                && done.send(()).is_err()
            {
                tracing::debug!("fade out finished with no waiter");
            }
            TickControl::Stop
        });

        if let Err(e) = started {
            self.reporter.report(COMPONENT, &e);
            state.end_session(self.reporter.as_ref());
            return FadeOut::ready();
        }
        FadeOut { rx: Some(rx) }
    }

    /// Apply one feedback event and persist the whole map.
    ///
    /// The in-memory change is kept even when saving fails.
    pub fn record_preference(
        &self,
        emotion: EmotionLabel,
        track_id: &str,
        liked: bool,
    ) -> Result<()> {
        let snapshot = {
            let mut state = lock(&self.state);
            state.preferences.record(emotion, track_id, liked);
            state.preferences.clone()
        };
        tracing::debug!(%emotion, track_id, liked, "recorded audio preference");
        self.storage.save(&snapshot)
    }

    pub fn current_track(&self) -> Option<&'static AudioTrack> {
        lock(&self.state).current
    }

    /// The volume setting.
    pub fn volume(&self) -> f32 {
        lock(&self.state).volume
    }

    /// The gain currently applied to the output, which differs from
    /// [`volume`](Self::volume) during a fade.
    pub fn output_volume(&self) -> f32 {
        let state = lock(&self.state);
        if state.current.is_some() {
            state.applied_volume
        } else {
            0.0
        }
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).current.is_some()
    }

    /// Returns true while a fade is scheduled.
    pub fn is_fading(&self) -> bool {
        lock(&self.state).fade.is_some()
    }

    /// Liked track ids for `emotion`, oldest like first.
    pub fn preferences(&self, emotion: EmotionLabel) -> Vec<String> {
        lock(&self.state).preferences.get(emotion).to_vec()
    }

    /// Snapshot of every stored preference.
    pub fn all_preferences(&self) -> PreferenceMap {
        lock(&self.state).preferences.clone()
    }

    fn steps(&self) -> u32 {
        self.config.fade_steps.max(1)
    }

    /// Replace any running fade with a new timer driving `step`.
    fn begin_fade<F>(
        &self,
        state: &mut EngineState,
        duration: Duration,
        done: Option<oneshot::Sender<()>>,
        mut step: F,
    ) -> Result<()>
    where
        F: FnMut(&mut EngineState, u64) -> TickControl + Send + 'static,
    {
        state.fade = None;
        state.next_fade_id += 1;
        let fade_id = state.next_fade_id;
        let session = state.session;
        let interval = duration / self.steps();

        let shared = Arc::downgrade(&self.state);
        let timer = timer::start_repeating(interval, move |tick| {
            let Some(shared) = shared.upgrade() else {
                return TickControl::Stop;
            };
            let mut state = lock(&shared);
            if !state.owns_fade(session, fade_id) {
                return TickControl::Stop;
            }
            step(&mut state, tick)
        })?;

        state.fade = Some(ActiveFade {
            id: fade_id,
            session,
            _timer: timer,
            done,
        });
        Ok(())
    }
}

impl std::fmt::Debug for AudioEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("AudioEngine")
            .field("current", &state.current.map(|t| t.id))
            .field("volume", &state.volume)
            .field("session", &state.session)
            .finish()
    }
}
