//! Log sink capability
//!
//! Handle operations never log through a global directly. They emit to a
//! [`LogSink`] handed to the manager, so tests can capture what was said.

use std::fmt;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Debug => "debug",
        };
        f.write_str(s)
    }
}

/// Destination for handle log messages
pub trait LogSink: Send + Sync {
    fn emit(&self, severity: Severity, message: &str);
}

/// Forwards messages to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Error => error!(target: "fhandle", "{}", message),
            Severity::Warning => warn!(target: "fhandle", "{}", message),
            Severity::Info => info!(target: "fhandle", "{}", message),
            Severity::Debug => debug!(target: "fhandle", "{}", message),
        }
    }
}

/// Keeps every message in memory
#[derive(Debug, Default)]
pub struct CaptureSink {
    records: Mutex<Vec<(Severity, String)>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything emitted so far
    pub fn records(&self) -> Vec<(Severity, String)> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Whether any message at `severity` contains `needle`
    pub fn contains(&self, severity: Severity, needle: &str) -> bool {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(s, m)| *s == severity && m.contains(needle))
    }

    pub fn clear(&self) {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl LogSink for CaptureSink {
    fn emit(&self, severity: Severity, message: &str) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((severity, message.to_string()));
    }
}
