//! Reporting for failures that are swallowed instead of returned.

use crate::error::HavenError;
use std::sync::Mutex;

/// Trait for reporting non-fatal component errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from `component` (e.g., "audio").
    fn report(&self, component: &str, error: &HavenError);
}

/// Reporter that logs a warning through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, component: &str, error: &HavenError) {
        tracing::warn!(component, "{}", error);
    }
}

/// Reporter that keeps every report, for tests.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<(String, String)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(component, message)` pairs in report order.
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, component: &str, error: &HavenError) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push((component.to_string(), error.to_string()));
        }
    }
}
