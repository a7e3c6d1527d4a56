//! Sink implementations

pub mod console;
pub mod file;
pub mod http;
pub mod tracking;

pub use console::ConsoleSink;
pub use file::{FileConfig, FileSink};
pub use http::HttpSink;
pub use tracking::{TrackingConfig, TrackingSink};
