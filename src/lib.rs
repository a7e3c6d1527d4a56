//! # Fanout Logger
//!
//! Structured JSON logging that fans each record out to several sinks, each
//! with its own set of accepted levels.
//!
//! ## Features
//!
//! - **Per-sink level sets**: a record reaches exactly the sinks whose set contains its level
//! - **Sinks**: console, size-rotated file, HTTP endpoint and error tracking (Sentry)
//! - **Error tracking**: records become tracking events with message, exception, stack and payload
//! - **Synchronous**: no background threads; records are written on the calling thread
//!
//! ## Example
//!
//! ```
//! use fanout_logger::prelude::*;
//! use fanout_logger::sinks::tracking::RecordingClient;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let tracking = Arc::new(RecordingClient::new());
//! let logger = Logger::builder()
//!     .sink(Ok(ConsoleSink::stdout(LevelSet::new().restrict_min(LogLevel::Info))))
//!     .sink(Ok(TrackingSink::with_client(
//!         tracking.clone(),
//!         Duration::from_secs(2),
//!         LevelSet::new().restrict_min(LogLevel::Error),
//!     )))
//!     .build()
//!     .unwrap();
//!
//! logger.info().str("path", "/health").msg("request served");
//! logger.error().int("status", 503).msg("upstream unavailable");
//! logger.skip_tracking().error().msg("not reported upstream");
//!
//! assert_eq!(tracking.events().len(), 1);
//! logger.close().unwrap();
//! ```

pub mod config;
pub mod core;
pub mod global;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        FieldValue, LevelSet, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics, Record,
        Result, Sink, TimestampFormat,
    };
    pub use crate::sinks::{ConsoleSink, FileConfig, FileSink, HttpSink, TrackingConfig, TrackingSink};
}

pub use crate::core::{
    FieldValue, LevelSet, LogContext, LogLevel, Logger, LoggerBuilder, LoggerError, LoggerMetrics,
    MultiWriter, Record, Result, Sink, SkipTracking, TimestampFormat,
};
pub use crate::sinks::{ConsoleSink, FileConfig, FileSink, HttpSink, TrackingConfig, TrackingSink};
