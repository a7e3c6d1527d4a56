//! Optional process-wide logger handle
//!
//! Install a [`Logger`] once at startup and close it once at shutdown.
//! Passing a `Logger` explicitly works just as well; this is a convenience.

use crate::core::{Logger, LoggerError, Result};
use std::sync::OnceLock;

static GLOBAL: OnceLock<Logger> = OnceLock::new();

/// Install the process-wide logger.
///
/// # Errors
///
/// Returns [`LoggerError::AlreadyInitialized`] if a logger was installed before;
/// the rejected logger is closed.
pub fn init(logger: Logger) -> Result<()> {
    GLOBAL.set(logger).map_err(|rejected| {
        drop(rejected);
        LoggerError::AlreadyInitialized
    })
}

/// The installed logger, if any
pub fn get() -> Option<&'static Logger> {
    GLOBAL.get()
}

/// Close the installed logger's sinks. A no-op if none is installed.
///
/// The logger stays installed; records emitted afterwards fail and are
/// reported on stderr.
pub fn close() -> Result<()> {
    match GLOBAL.get() {
        Some(logger) => logger.close(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LevelSet;
    use crate::sinks::ConsoleSink;
    use std::io;

    fn quiet_logger() -> Logger {
        Logger::builder()
            .sink(Ok(ConsoleSink::with_writer(Box::new(io::sink()), LevelSet::new())))
            .build()
            .unwrap()
    }

    // One test owns the process-wide slot
    #[test]
    fn test_lifecycle() {
        assert!(close().is_ok());

        init(quiet_logger()).unwrap();
        assert!(matches!(init(quiet_logger()), Err(LoggerError::AlreadyInitialized)));

        let logger = get().unwrap();
        logger.info().msg("via global");
        assert_eq!(logger.metrics().total_logged(), 1);

        close().unwrap();
        assert!(logger.is_closed());
        close().unwrap();
    }
}
