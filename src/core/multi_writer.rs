//! Fan-out of one record to many sinks

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
    sink::Sink,
};
use std::fmt;
use std::sync::Arc;

/// Combines several sinks into one writer.
///
/// Each record goes to every sink whose level set contains the record's
/// level. A failing sink does not stop delivery to the sinks after it.
#[derive(Clone, Default)]
pub struct MultiWriter {
    sinks: Vec<Arc<dyn Sink>>,
}

impl MultiWriter {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> Self {
        Self { sinks }
    }

    /// Same sinks minus those that report to an error-tracking service
    #[must_use]
    pub fn without_upstream(&self) -> Self {
        Self {
            sinks: self
                .sinks
                .iter()
                .filter(|s| !s.reports_upstream())
                .cloned()
                .collect(),
        }
    }

    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        &self.sinks
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Route a record at `level` to every matching sink
    pub fn write_level(&self, level: LogLevel, record: &[u8]) -> Result<usize> {
        self.dispatch(record, |sink| sink.write_level(level, record))
    }

    /// Write a record to every sink, ignoring level sets
    pub fn write(&self, record: &[u8]) -> Result<usize> {
        self.dispatch(record, |sink| sink.write(record))
    }

    /// Close every sink in order; failures are collected, not short-circuited
    pub fn close(&self) -> Result<()> {
        let errors = self
            .sinks
            .iter()
            .filter_map(|sink| {
                sink.close()
                    .err()
                    .map(|e| LoggerError::sink(sink.name(), e))
            })
            .collect();
        LoggerError::collect(errors)
    }

    fn dispatch<F>(&self, record: &[u8], write: F) -> Result<usize>
    where
        F: Fn(&dyn Sink) -> Result<usize>,
    {
        let mut errors = Vec::new();
        for sink in &self.sinks {
            if let Err(e) = write(sink.as_ref()) {
                errors.push(LoggerError::sink(sink.name(), e));
            }
        }
        LoggerError::collect(errors).map(|()| record.len())
    }
}

impl fmt::Debug for MultiWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LevelSet;
    use parking_lot::Mutex;

    struct RecordingSink {
        name: String,
        levels: LevelSet,
        upstream: bool,
        fail: bool,
        records: Mutex<Vec<Vec<u8>>>,
        closed: Mutex<u32>,
    }

    impl RecordingSink {
        fn new(name: &str, levels: LevelSet) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                levels,
                upstream: false,
                fail: false,
                records: Mutex::new(Vec::new()),
                closed: Mutex::new(0),
            })
        }

        fn failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                levels: LevelSet::new(),
                upstream: false,
                fail: true,
                records: Mutex::new(Vec::new()),
                closed: Mutex::new(0),
            })
        }

        fn upstream(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                levels: LevelSet::new(),
                upstream: true,
                fail: false,
                records: Mutex::new(Vec::new()),
                closed: Mutex::new(0),
            })
        }

        fn count(&self) -> usize {
            self.records.lock().len()
        }
    }

    fn shared(sink: &Arc<RecordingSink>) -> Arc<dyn Sink> {
        sink.clone()
    }

    impl Sink for RecordingSink {
        fn name(&self) -> &str {
            &self.name
        }

        fn levels(&self) -> &LevelSet {
            &self.levels
        }

        fn write(&self, record: &[u8]) -> Result<usize> {
            if self.fail {
                return Err(LoggerError::writer("refused"));
            }
            self.records.lock().push(record.to_vec());
            Ok(record.len())
        }

        fn close(&self) -> Result<()> {
            *self.closed.lock() += 1;
            if self.fail {
                return Err(LoggerError::writer("close refused"));
            }
            Ok(())
        }

        fn reports_upstream(&self) -> bool {
            self.upstream
        }
    }

    #[test]
    fn test_routes_by_level_set() {
        let low = RecordingSink::new("low", LevelSet::new().restrict_max(LogLevel::Info));
        let high = RecordingSink::new("high", LevelSet::new().restrict_min(LogLevel::Error));
        let writer = MultiWriter::new(vec![shared(&low), shared(&high)]);

        writer.write_level(LogLevel::Debug, b"{}\n").unwrap();
        writer.write_level(LogLevel::Error, b"{}\n").unwrap();
        writer.write_level(LogLevel::Warn, b"{}\n").unwrap();

        assert_eq!(low.count(), 1);
        assert_eq!(high.count(), 1);
    }

    #[test]
    fn test_level_mismatch_is_not_an_error() {
        let sink = RecordingSink::new("errors", LevelSet::of([LogLevel::Error]));
        let writer = MultiWriter::new(vec![shared(&sink)]);

        let written = writer.write_level(LogLevel::Info, b"abc").unwrap();
        assert_eq!(written, 3);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_failing_sink_does_not_block_others() {
        let bad = RecordingSink::failing("bad");
        let good = RecordingSink::new("good", LevelSet::new());
        let writer = MultiWriter::new(vec![shared(&bad), shared(&good)]);

        let err = writer.write_level(LogLevel::Info, b"x").unwrap_err();
        assert!(matches!(err, LoggerError::Sink { ref sink, .. } if sink == "bad"));
        assert_eq!(good.count(), 1);
    }

    #[test]
    fn test_raw_write_ignores_levels() {
        let sink = RecordingSink::new("none", LevelSet::of(Vec::<LogLevel>::new()));
        let writer = MultiWriter::new(vec![shared(&sink)]);
        writer.write(b"raw").unwrap();
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_without_upstream() {
        let local = RecordingSink::new("local", LevelSet::new());
        let remote = RecordingSink::upstream("remote");
        let writer = MultiWriter::new(vec![shared(&local), shared(&remote)]);
        let view = writer.without_upstream();

        assert_eq!(view.len(), 1);
        view.write_level(LogLevel::Error, b"x").unwrap();
        assert_eq!(local.count(), 1);
        assert_eq!(remote.count(), 0);
    }

    #[test]
    fn test_close_accumulates() {
        let first = RecordingSink::failing("first");
        let second = RecordingSink::failing("second");
        let third = RecordingSink::new("third", LevelSet::new());
        let writer = MultiWriter::new(vec![shared(&first), shared(&second), shared(&third)]);

        let err = writer.close().unwrap_err();
        assert!(matches!(err, LoggerError::Aggregate(ref errs) if errs.len() == 2));
        assert_eq!(*first.closed.lock(), 1);
        assert_eq!(*second.closed.lock(), 1);
        assert_eq!(*third.closed.lock(), 1);
    }
}
