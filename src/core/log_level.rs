//! Log level definitions

use crate::sinks::tracking::TrackingLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Record severity, in ascending order.
///
/// `NoLevel` marks a record emitted without a severity; it sorts above every
/// real level and is never part of the default [`LevelSet`](super::LevelSet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
    Panic = 6,
    #[serde(rename = "none")]
    NoLevel = 7,
}

impl LogLevel {
    /// All levels a record can be routed at, ascending.
    pub const ALL: [LogLevel; 7] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
        LogLevel::Panic,
    ];

    /// Value of the `level` field on the wire
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
            LogLevel::Panic => "panic",
            LogLevel::NoLevel => "",
        }
    }

    /// Three-letter tag used by the console sink
    pub fn console_abbrev(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRC",
            LogLevel::Debug => "DBG",
            LogLevel::Info => "INF",
            LogLevel::Warn => "WRN",
            LogLevel::Error => "ERR",
            LogLevel::Fatal => "FTL",
            LogLevel::Panic => "PNC",
            LogLevel::NoLevel => "???",
        }
    }

    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Trace => Magenta,
            LogLevel::Debug => Yellow,
            LogLevel::Info => Green,
            LogLevel::Warn => Red,
            LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => BrightRed,
            LogLevel::NoLevel => BrightBlack,
        }
    }

    /// Severity used by the error-tracking service for this level.
    ///
    /// Returns `None` for levels that are never forwarded upstream.
    pub fn tracking_level(&self) -> Option<TrackingLevel> {
        match self {
            LogLevel::Debug => Some(TrackingLevel::Debug),
            LogLevel::Info => Some(TrackingLevel::Info),
            LogLevel::Warn => Some(TrackingLevel::Warning),
            LogLevel::Error => Some(TrackingLevel::Error),
            LogLevel::Fatal | LogLevel::Panic => Some(TrackingLevel::Fatal),
            LogLevel::Trace | LogLevel::NoLevel => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "TRACE" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "FATAL" => Ok(LogLevel::Fatal),
            "PANIC" => Ok(LogLevel::Panic),
            "" | "NONE" => Ok(LogLevel::NoLevel),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}
