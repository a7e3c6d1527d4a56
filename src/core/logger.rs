//! Logger façade
//!
//! A [`Logger`] owns the combined writer over all configured sinks plus a
//! second view over the same sinks minus those that report upstream. Each
//! severity method returns a [`Record`] builder; records are serialized and
//! dispatched synchronously on the calling thread.

use super::{
    error::{LoggerError, Result},
    log_context::{FieldValue, LogContext},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    multi_writer::MultiWriter,
    record::{is_stamped_field, Record},
    sink::Sink,
    timestamp::TimestampFormat,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

macro_rules! level_methods {
    () => {
        pub fn trace(&self) -> Record<'_> {
            self.record(LogLevel::Trace)
        }

        pub fn debug(&self) -> Record<'_> {
            self.record(LogLevel::Debug)
        }

        pub fn info(&self) -> Record<'_> {
            self.record(LogLevel::Info)
        }

        pub fn warn(&self) -> Record<'_> {
            self.record(LogLevel::Warn)
        }

        pub fn error(&self) -> Record<'_> {
            self.record(LogLevel::Error)
        }

        /// Log at fatal level. The process keeps running; callers that
        /// want to exit do so after the record is finalized.
        pub fn fatal(&self) -> Record<'_> {
            self.record(LogLevel::Fatal)
        }

        /// Log at panic level. Does not unwind.
        pub fn panic(&self) -> Record<'_> {
            self.record(LogLevel::Panic)
        }

        /// Record without a severity; only sinks whose set includes
        /// [`LogLevel::NoLevel`] receive it
        pub fn log(&self) -> Record<'_> {
            self.record(LogLevel::NoLevel)
        }

        pub fn with_level(&self, level: LogLevel) -> Record<'_> {
            self.record(level)
        }
    };
}

pub struct Logger {
    writer: MultiWriter,
    no_upstream: MultiWriter,
    time_format: TimestampFormat,
    context: LogContext,
    metrics: LoggerMetrics,
    closed: AtomicBool,
}

impl Logger {
    /// Build a logger from sink construction results.
    ///
    /// Failed sinks are reported on stderr and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::NoWriters`] if no sink could be built.
    pub fn new<I>(sinks: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Arc<dyn Sink>>>,
    {
        Self::assemble(sinks, TimestampFormat::default(), LogContext::new())
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use fanout_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .sink(Ok(ConsoleSink::stderr(LevelSet::new().restrict_min(LogLevel::Warn))))
    ///     .sink(HttpSink::new("POST", "not a url", LevelSet::new()))
    ///     .field("service", "billing")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(logger.sinks().len(), 1);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn assemble<I>(sinks: I, time_format: TimestampFormat, context: LogContext) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Arc<dyn Sink>>>,
    {
        let mut usable = Vec::new();
        for (idx, sink) in sinks.into_iter().enumerate() {
            match sink {
                Ok(sink) => usable.push(sink),
                Err(e) => {
                    eprintln!("[LOGGER WARNING] Sink #{} could not be created and is skipped: {}", idx, e);
                }
            }
        }

        if usable.is_empty() {
            return Err(LoggerError::NoWriters);
        }

        let writer = MultiWriter::new(usable);
        let no_upstream = writer.without_upstream();
        Ok(Self {
            writer,
            no_upstream,
            time_format,
            context,
            metrics: LoggerMetrics::new(),
            closed: AtomicBool::new(false),
        })
    }

    level_methods!();

    fn record(&self, level: LogLevel) -> Record<'_> {
        Record::new(self, &self.writer, level)
    }

    /// View whose records never reach sinks that report upstream.
    ///
    /// Use it for messages about the tracking service itself.
    pub fn skip_tracking(&self) -> SkipTracking<'_> {
        SkipTracking { logger: self }
    }

    /// The combined writer over every sink
    pub fn writer(&self) -> &MultiWriter {
        &self.writer
    }

    pub fn sinks(&self) -> &[Arc<dyn Sink>] {
        self.writer.sinks()
    }

    pub fn time_format(&self) -> &TimestampFormat {
        &self.time_format
    }

    /// Fields added to every record
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close every sink in the order supplied.
    ///
    /// Only the first call does any work; later calls return `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the failures of individual sinks, after all sinks were closed.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.writer.close()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            eprintln!("[LOGGER ERROR] Failed to close sinks during shutdown: {}", e);
        }

        let failures = self.metrics.write_failures();
        if failures > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down with {} failed records (failure rate: {:.2}%)",
                failures,
                self.metrics.failure_rate()
            );
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("writer", &self.writer)
            .field("time_format", &self.time_format)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Logger view that bypasses error-tracking sinks
#[derive(Clone, Copy)]
pub struct SkipTracking<'a> {
    logger: &'a Logger,
}

impl<'a> SkipTracking<'a> {
    level_methods!();

    fn record(&self, level: LogLevel) -> Record<'a> {
        Record::new(self.logger, &self.logger.no_upstream, level)
    }

    pub fn writer(&self) -> &'a MultiWriter {
        &self.logger.no_upstream
    }
}

/// Builder for constructing Logger with a fluent API
pub struct LoggerBuilder {
    sinks: Vec<Result<Arc<dyn Sink>>>,
    time_format: TimestampFormat,
    context: LogContext,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            time_format: TimestampFormat::default(),
            context: LogContext::new(),
        }
    }

    /// Add the result of a sink factory; failures are skipped at build time
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: Result<S>) -> Self {
        self.sinks.push(sink.map(|s| Arc::new(s) as Arc<dyn Sink>));
        self
    }

    /// Add a sink that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(Ok(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn time_format(mut self, format: TimestampFormat) -> Self {
        self.time_format = format;
        self
    }

    /// Add a field written into every record.
    ///
    /// `level` and `time` belong to the logger; such keys are reported and dropped.
    #[must_use = "builder methods return a new value"]
    pub fn field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let key = key.into();
        if is_stamped_field(&key) {
            eprintln!("[LOGGER WARNING] Context field '{}' is set by the logger and is ignored", key);
            return self;
        }
        self.context.add_field(key, value);
        self
    }

    /// Build the Logger
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`] for a time format chrono
    /// cannot render, and [`LoggerError::NoWriters`] if every added sink failed
    /// or none was added.
    pub fn build(self) -> Result<Logger> {
        self.time_format.validate()?;
        Logger::assemble(self.sinks, self.time_format, self.context)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::level_set::LevelSet;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        name: &'static str,
        levels: LevelSet,
        upstream: bool,
        fail_close: bool,
        writes: AtomicUsize,
        closes: AtomicUsize,
        close_log: Option<Arc<Mutex<Vec<&'static str>>>>,
    }

    impl CountingSink {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                levels: LevelSet::new(),
                upstream: false,
                fail_close: false,
                writes: AtomicUsize::new(0),
                closes: AtomicUsize::new(0),
                close_log: None,
            }
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl Sink for CountingSink {
        fn name(&self) -> &str {
            self.name
        }

        fn levels(&self) -> &LevelSet {
            &self.levels
        }

        fn write(&self, record: &[u8]) -> Result<usize> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(record.len())
        }

        fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            if let Some(log) = &self.close_log {
                log.lock().push(self.name);
            }
            if self.fail_close {
                Err(LoggerError::writer(format!("{} refused to close", self.name)))
            } else {
                Ok(())
            }
        }

        fn reports_upstream(&self) -> bool {
            self.upstream
        }
    }

    fn shared(sink: &Arc<CountingSink>) -> Arc<dyn Sink> {
        sink.clone()
    }

    #[test]
    fn test_no_sinks_is_no_writers() {
        let result = Logger::new(Vec::<Result<Arc<dyn Sink>>>::new());
        assert!(matches!(result, Err(LoggerError::NoWriters)));
    }

    #[test]
    fn test_only_failed_sinks_is_no_writers() {
        let result = Logger::builder()
            .sink::<CountingSink>(Err(LoggerError::invalid_url("::", "bad")))
            .sink::<CountingSink>(Err(LoggerError::config("file", "bad dir")))
            .build();
        assert!(matches!(result, Err(LoggerError::NoWriters)));
    }

    #[test]
    fn test_failed_sinks_are_skipped() {
        let good = Arc::new(CountingSink::new("good"));
        let logger = Logger::new(vec![
            Err(LoggerError::invalid_url("::", "bad")),
            Ok(shared(&good)),
        ])
        .unwrap();

        assert_eq!(logger.sinks().len(), 1);
        logger.info().msg("x");
        assert_eq!(good.writes(), 1);
    }

    #[test]
    fn test_skip_tracking_bypasses_upstream_sinks() {
        let local = Arc::new(CountingSink::new("local"));
        let upstream = Arc::new(CountingSink {
            upstream: true,
            ..CountingSink::new("upstream")
        });
        let logger = Logger::builder()
            .shared_sink(shared(&local))
            .shared_sink(shared(&upstream))
            .build()
            .unwrap();

        logger.error().msg("both");
        logger.skip_tracking().error().msg("local only");

        assert_eq!(local.writes(), 2);
        assert_eq!(upstream.writes(), 1);
        assert_eq!(logger.skip_tracking().writer().len(), 1);
    }

    #[test]
    fn test_close_is_ordered_accumulating_and_idempotent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = Arc::new(CountingSink {
            fail_close: true,
            close_log: Some(log.clone()),
            ..CountingSink::new("first")
        });
        let second = Arc::new(CountingSink {
            close_log: Some(log.clone()),
            ..CountingSink::new("second")
        });
        let logger = Logger::builder()
            .shared_sink(shared(&first))
            .shared_sink(shared(&second))
            .build()
            .unwrap();

        assert!(logger.close().is_err());
        assert_eq!(*log.lock(), vec!["first", "second"]);

        assert!(logger.close().is_ok());
        drop(logger);
        assert_eq!(first.closes.load(Ordering::SeqCst), 1);
        assert_eq!(second.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let sink = Arc::new(CountingSink::new("s"));
        {
            let _logger = Logger::builder().shared_sink(shared(&sink)).build().unwrap();
        }
        assert_eq!(sink.closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_write_after_close_fails() {
        let sink = Arc::new(CountingSink::new("s"));
        let logger = Logger::builder().shared_sink(shared(&sink)).build().unwrap();
        logger.close().unwrap();

        assert!(logger.info().try_msg("late").is_err());
        assert_eq!(sink.writes(), 0);
        assert_eq!(logger.metrics().write_failures(), 1);
    }

    #[test]
    fn test_fatal_and_panic_do_not_terminate() {
        let sink = Arc::new(CountingSink::new("s"));
        let logger = Logger::builder().shared_sink(shared(&sink)).build().unwrap();
        logger.fatal().msg("still here");
        logger.panic().msg("still here");
        assert_eq!(sink.writes(), 2);
    }

    #[test]
    fn test_invalid_time_format_is_rejected() {
        let result = Logger::builder()
            .shared_sink(shared(&Arc::new(CountingSink::new("a"))))
            .time_format(TimestampFormat::Custom("%Q".to_string()))
            .build();
        assert!(matches!(result, Err(LoggerError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_context_cannot_replace_stamped_fields() {
        let logger = Logger::builder()
            .shared_sink(shared(&Arc::new(CountingSink::new("a"))))
            .field("level", 7i64)
            .field("time", "forged")
            .field("service", "billing")
            .build()
            .unwrap();

        let keys: Vec<&str> = logger.context().fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["service"]);
    }
}
