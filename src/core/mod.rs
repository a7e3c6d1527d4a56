//! Core logger types and traits

pub mod error;
pub mod level_set;
pub mod log_context;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod multi_writer;
pub mod record;
pub mod sink;
pub mod timestamp;

pub use error::{LoggerError, Result};
pub use level_set::LevelSet;
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, SkipTracking};
pub use metrics::LoggerMetrics;
pub use multi_writer::MultiWriter;
pub use record::Record;
pub use sink::Sink;
pub use timestamp::TimestampFormat;
