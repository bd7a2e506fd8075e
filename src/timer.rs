//! Cancellable repeating timer on the tokio runtime.
//!
//! Fades and sentence pacing are driven by `start_repeating`. The returned
//! handle aborts the task on `cancel()` or drop. Callers that share state with
//! the tick closure still guard each tick with their own session check, since
//! a tick already running on another worker is not interrupted by `cancel()`.

use crate::error::{HavenError, Result};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Shortest interval a timer will run at.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Whether a timer keeps ticking after the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// Handle to a running timer.
#[derive(Debug)]
pub struct TimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Stop the timer. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Returns true once the timer stopped on its own or was cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start a timer that calls `on_tick(n)` every `interval`, first after one
/// full interval, with `n` counting from 1.
///
/// The timer ends when `on_tick` returns `TickControl::Stop` or the handle is
/// cancelled. Must be called from within a tokio runtime.
pub fn start_repeating<F>(interval: Duration, mut on_tick: F) -> Result<TimerHandle>
where
    F: FnMut(u64) -> TickControl + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|e| {
        HavenError::Other(format!("timer requires a tokio runtime: {e}"))
    })?;
    let period = interval.max(MIN_INTERVAL);
    // Scheduled from the call, not from the task's first poll.
    let first = Instant::now() + period;

    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval_at(first, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        let mut count = 0u64;
        loop {
            ticker.tick().await;
            count += 1;
            if on_tick(count) == TickControl::Stop {
                break;
            }
        }
    });

    Ok(TimerHandle { task: Some(task) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_at_each_interval() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&ticks);
        let _handle = start_repeating(Duration::from_millis(100), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();

        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0, "no tick before first interval");

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_timer() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&ticks);
        let handle = start_repeating(Duration::from_millis(10), move |n| {
            seen.store(n, Ordering::SeqCst);
            if n == 3 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        })
        .unwrap();

        for _ in 0..10 {
            tokio::time::advance(Duration::from_millis(10)).await;
            settle().await;
        }
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_further_ticks() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&ticks);
        let mut handle = start_repeating(Duration::from_millis(10), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();

        tokio::time::advance(Duration::from_millis(10)).await;
        settle().await;
        handle.cancel();
        handle.cancel();

        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_cancels() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&ticks);
        let handle = start_repeating(Duration::from_millis(10), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();
        drop(handle);

        tokio::time::advance(Duration::from_millis(50)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn schedule_starts_at_the_call() {
        let ticks = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&ticks);
        let _handle = start_repeating(Duration::from_millis(100), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        })
        .unwrap();

        // No yield between starting and advancing.
        tokio::time::advance(Duration::from_millis(100)).await;
        settle().await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_outside_runtime_is_an_error() {
        let result = start_repeating(Duration::from_millis(10), |_| TickControl::Stop);
        assert!(result.is_err());
    }
}
