//! Error-tracking sink
//!
//! Translates each JSON record into a [`TrackedEvent`] and hands it to a
//! [`TrackingClient`]. A fatal record blocks until pending events are
//! flushed, so nothing is lost if the process exits right after logging.

mod client;
mod event;
mod sentry_client;
pub mod stack;
mod translate;

pub use self::client::{RecordingClient, TrackingClient};
pub use self::event::{
    ErrorStack, StackFrame, StackTrace, TrackedEvent, TrackedException, TrackingLevel,
};
pub use self::sentry_client::{BeforeBreadcrumb, BeforeSend, SentryClient, TrackingConfig};
pub use self::translate::{translate, Translation};

use crate::core::error::{LoggerError, Result};
use crate::core::level_set::LevelSet;
use crate::core::log_level::LogLevel;
use crate::core::sink::Sink;
use std::sync::Arc;
use std::time::Duration;

/// Flush timeout used when none is configured
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(3);

pub struct TrackingSink {
    client: Arc<dyn TrackingClient>,
    flush_timeout: Duration,
    levels: LevelSet,
}

impl TrackingSink {
    /// Create a sink backed by a Sentry client.
    ///
    /// A zero `flush_timeout` means [`DEFAULT_FLUSH_TIMEOUT`]. Levels that
    /// have no tracking severity (trace and no-level) are dropped from
    /// `levels`.
    pub fn new(config: TrackingConfig, flush_timeout: Duration, levels: LevelSet) -> Result<Self> {
        let client = SentryClient::new(config)?;
        Ok(Self::with_client(Arc::new(client), flush_timeout, levels))
    }

    /// Create a sink around any tracking client
    pub fn with_client(
        client: Arc<dyn TrackingClient>,
        flush_timeout: Duration,
        levels: LevelSet,
    ) -> Self {
        let flush_timeout = if flush_timeout.is_zero() {
            DEFAULT_FLUSH_TIMEOUT
        } else {
            flush_timeout
        };
        Self {
            client,
            flush_timeout,
            levels: levels.filtered(|level| level.tracking_level().is_some()),
        }
    }

    pub fn flush_timeout(&self) -> Duration {
        self.flush_timeout
    }

    pub fn client(&self) -> &Arc<dyn TrackingClient> {
        &self.client
    }
}

impl Sink for TrackingSink {
    fn name(&self) -> &str {
        "tracking"
    }

    fn levels(&self) -> &LevelSet {
        &self.levels
    }

    /// Unleveled bytes carry no severity and are not reported
    fn write(&self, record: &[u8]) -> Result<usize> {
        Ok(record.len())
    }

    fn write_level(&self, level: LogLevel, record: &[u8]) -> Result<usize> {
        if !self.levels.contains(level) {
            return Ok(record.len());
        }

        let severity = level.tracking_level().ok_or_else(|| {
            LoggerError::Invariant(format!("level '{}' has no tracking severity", level))
        })?;

        let translation = match translate(record, severity) {
            Ok(translation) => translation,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Tracking sink dropped a malformed record: {}", e);
                return Ok(record.len());
            }
        };

        if let Some(diagnostic) = translation.diagnostic {
            self.client.capture_event(diagnostic);
        }
        self.client.capture_event(translation.event);

        if severity == TrackingLevel::Fatal && !self.client.flush(self.flush_timeout) {
            eprintln!(
                "[LOGGER WARNING] Tracking flush timed out after {:?}",
                self.flush_timeout
            );
        }

        Ok(record.len())
    }

    fn close(&self) -> Result<()> {
        if !self.client.flush(self.flush_timeout) {
            eprintln!(
                "[LOGGER WARNING] Tracking flush on close timed out after {:?}",
                self.flush_timeout
            );
        }
        Ok(())
    }

    fn reports_upstream(&self) -> bool {
        true
    }
}
