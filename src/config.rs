//! Declarative logger configuration
//!
//! The structs here deserialize from any serde format. Reading the file is
//! left to the application.
//!
//! # Example
//!
//! ```
//! use fanout_logger::config::LoggerConfig;
//!
//! let config: LoggerConfig = serde_json::from_str(r#"{
//!     "fields": {"service": "billing"},
//!     "sinks": [
//!         {"kind": "stderr", "min_level": "warn"},
//!         {"kind": "http", "endpoint": "not a url"}
//!     ]
//! }"#).unwrap();
//!
//! let logger = config.build().unwrap();
//! assert_eq!(logger.sinks().len(), 1);
//! ```

use crate::core::{LevelSet, LogLevel, Logger, LoggerBuilder, Result, TimestampFormat};
use crate::sinks::{ConsoleSink, FileConfig, FileSink, HttpSink, TrackingConfig, TrackingSink};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub time_format: TimestampFormat,

    /// Fields added to every record
    pub fields: Map<String, Value>,

    pub sinks: Vec<SinkConfig>,
}

impl LoggerConfig {
    /// Build every sink and assemble the logger.
    ///
    /// # Errors
    ///
    /// Sinks that fail to build are reported and skipped; the call fails
    /// with [`LoggerError::NoWriters`](crate::LoggerError::NoWriters) only
    /// when none could be built.
    pub fn build(self) -> Result<Logger> {
        let mut builder = Logger::builder().time_format(self.time_format);
        for (key, value) in self.fields {
            builder = builder.field(key, value);
        }
        for sink in self.sinks {
            builder = sink.add_to(builder);
        }
        builder.build()
    }
}

/// One sink and the levels it accepts.
///
/// `min_level` and `max_level` narrow `levels` (all levels by default).
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    #[serde(flatten)]
    pub kind: SinkKind,

    #[serde(default)]
    pub levels: LevelSet,

    #[serde(default)]
    pub min_level: Option<LogLevel>,

    #[serde(default)]
    pub max_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkKind {
    Stdout {
        #[serde(default = "default_colors")]
        colors: bool,
        #[serde(default)]
        time_format: Option<String>,
    },
    Stderr {
        #[serde(default = "default_colors")]
        colors: bool,
        #[serde(default)]
        time_format: Option<String>,
    },
    File {
        path: PathBuf,
        #[serde(default)]
        options: FileConfig,
    },
    Http {
        #[serde(default = "default_method")]
        method: String,
        endpoint: String,
    },
    Tracking {
        #[serde(default)]
        options: TrackingConfig,
        /// 0 means the 3 second default
        #[serde(default)]
        flush_timeout_ms: u64,
    },
}

fn default_colors() -> bool {
    true
}

fn default_method() -> String {
    "POST".to_string()
}

impl SinkConfig {
    /// Effective level set after applying the bounds
    pub fn level_set(&self) -> LevelSet {
        let mut levels = self.levels.clone();
        if let Some(min) = self.min_level {
            levels = levels.restrict_min(min);
        }
        if let Some(max) = self.max_level {
            levels = levels.restrict_max(max);
        }
        levels
    }

    fn add_to(self, builder: LoggerBuilder) -> LoggerBuilder {
        let levels = self.level_set();
        match self.kind {
            SinkKind::Stdout { colors, time_format } => {
                builder.sink(console(ConsoleSink::stdout(levels), colors, time_format))
            }
            SinkKind::Stderr { colors, time_format } => {
                builder.sink(console(ConsoleSink::stderr(levels), colors, time_format))
            }
            SinkKind::File { path, options } => builder.sink(FileSink::new(path, options, levels)),
            SinkKind::Http { method, endpoint } => {
                builder.sink(HttpSink::new(&method, &endpoint, levels))
            }
            SinkKind::Tracking {
                options,
                flush_timeout_ms,
            } => builder.sink(TrackingSink::new(
                options,
                Duration::from_millis(flush_timeout_ms),
                levels,
            )),
        }
    }
}

fn console(sink: ConsoleSink, colors: bool, time_format: Option<String>) -> Result<ConsoleSink> {
    let sink = sink.with_colors(colors);
    match time_format {
        Some(format) => sink.try_time_format(format),
        None => Ok(sink),
    }
}
