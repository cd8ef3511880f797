//! Caller-owned diagnostic logger.
//!
//! The tracker never reaches for a global logger. Hosts hand it an
//! `Arc<dyn TrackLogger>` at configuration time; [`NoopLogger`] is the
//! default and [`TracingLogger`] forwards into the `tracing` ecosystem.

use fieldtrail_core_types::schema::EVENT_DIAGNOSTIC;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Component name attached to every diagnostic event.
pub const COMPONENT: &str = "fieldtrail";

/// Diagnostic verbosity, most severe first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// True if a message at `self` passes a filter set to `max`.
    pub fn enabled_at(self, max: LogLevel) -> bool {
        self != LogLevel::Off && max != LogLevel::Off && self <= max
    }
}

/// Sink for tracker diagnostics. Logging never affects tracking results.
pub trait TrackLogger: Send + Sync {
    fn log(&self, level: LogLevel, op: &str, message: &str);

    fn warn(&self, op: &str, message: &str) {
        self.log(LogLevel::Warn, op, message);
    }

    fn debug(&self, op: &str, message: &str) {
        self.log(LogLevel::Debug, op, message);
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl TrackLogger for NoopLogger {
    fn log(&self, _level: LogLevel, _op: &str, _message: &str) {}
}

/// Emits `tracing` events carrying the canonical `component`/`op`/`event` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TrackLogger for TracingLogger {
    fn log(&self, level: LogLevel, op: &str, message: &str) {
        match level {
            LogLevel::Off => {}
            LogLevel::Error => {
                tracing::error!(component = COMPONENT, op = op, event = EVENT_DIAGNOSTIC, "{}", message)
            }
            LogLevel::Warn => {
                tracing::warn!(component = COMPONENT, op = op, event = EVENT_DIAGNOSTIC, "{}", message)
            }
            LogLevel::Info => {
                tracing::info!(component = COMPONENT, op = op, event = EVENT_DIAGNOSTIC, "{}", message)
            }
            LogLevel::Debug => {
                tracing::debug!(component = COMPONENT, op = op, event = EVENT_DIAGNOSTIC, "{}", message)
            }
            LogLevel::Trace => {
                tracing::trace!(component = COMPONENT, op = op, event = EVENT_DIAGNOSTIC, "{}", message)
            }
        }
    }
}

/// Drops messages more verbose than `max` before they reach `inner`.
pub struct LevelFilter {
    inner: Arc<dyn TrackLogger>,
    max: LogLevel,
}

impl LevelFilter {
    pub fn new(inner: Arc<dyn TrackLogger>, max: LogLevel) -> Self {
        Self { inner, max }
    }
}

impl TrackLogger for LevelFilter {
    fn log(&self, level: LogLevel, op: &str, message: &str) {
        if level.enabled_at(self.max) {
            self.inner.log(level, op, message);
        }
    }
}

/// A diagnostic kept by [`RecordingLogger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub op: String,
    pub message: String,
}

/// Keeps every diagnostic in memory; useful for hosts' own tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries recorded at exactly `level`.
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl TrackLogger for RecordingLogger {
    fn log(&self, level: LogLevel, op: &str, message: &str) {
        self.entries
            .lock()
            .map(|mut entries| {
                entries.push(LogEntry {
                    level,
                    op: op.to_string(),
                    message: message.to_string(),
                })
            })
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error.enabled_at(LogLevel::Warn));
        assert!(LogLevel::Warn.enabled_at(LogLevel::Warn));
        assert!(!LogLevel::Debug.enabled_at(LogLevel::Warn));
        assert!(!LogLevel::Error.enabled_at(LogLevel::Off));
    }

    #[test]
    fn test_level_filter_drops_verbose_messages() {
        let recorder = RecordingLogger::new();
        let filter = LevelFilter::new(Arc::new(recorder.clone()), LogLevel::Warn);
        filter.debug("resolve", "noise");
        filter.warn("resolve", "dangling");
        let entries = recorder.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "dangling");
    }

    #[test]
    fn test_level_deserializes_lowercase() {
        let level: LogLevel = serde_json::from_str("\"debug\"").unwrap();
        assert_eq!(level, LogLevel::Debug);
    }

    #[test]
    fn test_noop_logger_accepts_everything() {
        NoopLogger.warn("op", "message");
        NoopLogger.log(LogLevel::Trace, "op", "message");
    }
}
