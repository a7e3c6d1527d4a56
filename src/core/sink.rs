//! Sink trait for log output destinations

use super::{error::Result, level_set::LevelSet, log_level::LogLevel};

/// A destination for serialized records.
///
/// Sinks receive the exact bytes of one record (a JSON object followed by a
/// newline) and are shared between threads, so they synchronize their own
/// state internally.
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Levels this sink accepts
    fn levels(&self) -> &LevelSet;

    /// Write a record without level filtering
    fn write(&self, record: &[u8]) -> Result<usize>;

    /// Write a record if `level` is in this sink's set.
    ///
    /// A record outside the set is a successful no-op reporting the full length.
    fn write_level(&self, level: LogLevel, record: &[u8]) -> Result<usize> {
        if self.levels().contains(level) {
            self.write(record)
        } else {
            Ok(record.len())
        }
    }

    /// Release the sink's resources, flushing anything buffered
    fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Whether records written here leave the process for an error-tracking service
    fn reports_upstream(&self) -> bool {
        false
    }
}
