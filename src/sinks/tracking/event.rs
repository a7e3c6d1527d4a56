//! Event model handed to error-tracking clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity understood by the tracking service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl TrackingLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingLevel::Debug => "debug",
            TrackingLevel::Info => "info",
            TrackingLevel::Warning => "warning",
            TrackingLevel::Error => "error",
            TrackingLevel::Fatal => "fatal",
        }
    }
}

impl fmt::Display for TrackingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One frame of a stack trace.
///
/// Field names follow the Sentry JSON protocol so that a serialized
/// [`StackTrace`] can travel inside a record and be decoded again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abs_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_app: Option<bool>,
}

/// Frames ordered oldest call first, the frame closest to the capture point last
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTrace {
    #[serde(default)]
    pub frames: Vec<StackFrame>,
}

impl StackTrace {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Contents of the reserved `stack` record field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStack {
    pub error: String,
    #[serde(default)]
    pub stacktrace: Option<StackTrace>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedException {
    pub value: String,
    pub stacktrace: Option<StackTrace>,
}

/// An event ready to be sent to the tracking service
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEvent {
    pub message: Option<String>,
    pub level: TrackingLevel,
    pub logger: String,
    pub timestamp: DateTime<Utc>,
    pub exceptions: Vec<TrackedException>,
    /// Every non-reserved record field, rendered as a string
    pub payload: BTreeMap<String, String>,
}

impl TrackedEvent {
    pub fn new(level: TrackingLevel) -> Self {
        Self {
            message: None,
            level,
            logger: env!("CARGO_PKG_NAME").to_string(),
            timestamp: Utc::now(),
            exceptions: Vec::new(),
            payload: BTreeMap::new(),
        }
    }
}
