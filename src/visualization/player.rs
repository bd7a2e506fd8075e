//! Timed sentence-by-sentence playback of a script.
//!
//! `on_sentence` runs while the player's lock is held, which is what keeps a
//! stopped session silent once `stop()` returns. It must not call back into
//! the player. `on_complete` runs after the lock is released and may.

use crate::error::HavenError;
use crate::report::{ErrorReporter, LogReporter};
use crate::timer::{self, TickControl, TimerHandle};
use crate::visualization::catalog::VisualizationScript;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const COMPONENT: &str = "visualization";

/// Receives `(sentence, index, total)`.
pub type SentenceCallback = Box<dyn FnMut(&str, usize, usize) + Send>;
pub type CompleteCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct PlayerState {
    script: Option<&'static VisualizationScript>,
    index: usize,
    session: u64,
    timer: Option<TimerHandle>,
    on_sentence: Option<SentenceCallback>,
    on_complete: Option<CompleteCallback>,
}

impl PlayerState {
    fn reset(&mut self) {
        self.timer = None;
        self.script = None;
        self.index = 0;
        self.on_sentence = None;
        self.on_complete = None;
        self.session += 1;
    }

    fn show_current(&mut self) {
        let Some(script) = self.script else {
            return;
        };
        let total = script.sentences.len();
        if let (Some(sentence), Some(on_sentence)) =
            (script.sentences.get(self.index), self.on_sentence.as_mut())
        {
            on_sentence(sentence, self.index, total);
        }
    }
}

fn lock(state: &Mutex<PlayerState>) -> MutexGuard<'_, PlayerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Single-session visualization player. A new `play` replaces the running
/// session.
#[derive(Clone)]
pub struct VisualizationPlayer {
    state: Arc<Mutex<PlayerState>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl VisualizationPlayer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState::default())),
            reporter: Arc::new(LogReporter),
        }
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Start `script`: the first sentence is delivered before this returns,
    /// the rest one per interval, then `on_complete` once.
    ///
    /// Outside a tokio runtime nothing is delivered and the player stays idle;
    /// the failure goes to the error reporter.
    pub fn play<S, C>(&self, script: &'static VisualizationScript, on_sentence: S, on_complete: C)
    where
        S: FnMut(&str, usize, usize) + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let mut state = lock(&self.state);
        state.reset();
        if script.sentences.is_empty() {
            self.reporter.report(
                COMPONENT,
                &HavenError::CatalogInvalid {
                    id: script.id.to_string(),
                    message: "script has no sentences".to_string(),
                },
            );
            return;
        }

        let session = state.session;
        let interval = Duration::from_millis(script.sentence_interval_ms());
        let shared = Arc::downgrade(&self.state);
        let started = timer::start_repeating(interval, move |_| {
            let Some(shared) = shared.upgrade() else {
                return TickControl::Stop;
            };
            let mut state = lock(&shared);
            if state.session != session {
                return TickControl::Stop;
            }
            let Some(script) = state.script else {
                return TickControl::Stop;
            };

            state.index += 1;
            if state.index < script.sentences.len() {
                state.show_current();
                return TickControl::Continue;
            }

            let on_complete = state.on_complete.take();
            state.reset();
            drop(state);
            tracing::debug!(script = script.id, "visualization complete");
            if let Some(on_complete) = on_complete {
                on_complete();
            }
            TickControl::Stop
        });

        let timer = match started {
            Ok(timer) => timer,
            Err(e) => {
                self.reporter.report(COMPONENT, &e);
                return;
            }
        };

        tracing::info!(
            script = script.id,
            sentences = script.sentences.len(),
            interval_ms = interval.as_millis() as u64,
            "Starting visualization: {}",
            script.title
        );
        state.script = Some(script);
        state.index = 0;
        state.on_sentence = Some(Box::new(on_sentence));
        state.on_complete = Some(Box::new(on_complete));
        state.timer = Some(timer);
        state.show_current();
    }

    /// Cancel the running session. No callback of it fires after this
    /// returns. No-op when idle.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        if let Some(script) = state.script {
            tracing::debug!(script = script.id, "visualization stopped");
            state.reset();
        }
    }

    pub fn current_script(&self) -> Option<&'static VisualizationScript> {
        lock(&self.state).script
    }

    /// Index of the sentence on screen; 0 when idle.
    pub fn current_index(&self) -> usize {
        lock(&self.state).index
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).script.is_some()
    }
}

impl Default for VisualizationPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VisualizationPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("VisualizationPlayer")
            .field("script", &state.script.map(|s| s.id))
            .field("index", &state.index)
            .finish()
    }
}
