//! Error-tracking client abstraction

use super::event::TrackedEvent;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// The capture/flush contract the tracking sink relies on.
pub trait TrackingClient: Send + Sync {
    /// Queue an event for delivery without waiting for it
    fn capture_event(&self, event: TrackedEvent);

    /// Wait up to `timeout` for queued events; `true` if everything was delivered
    fn flush(&self, timeout: Duration) -> bool;
}

/// Keeps captured events in memory.
///
/// Useful in tests and for applications that inspect what would have been
/// reported.
///
/// # Example
///
/// ```
/// use fanout_logger::sinks::tracking::{RecordingClient, TrackedEvent, TrackingClient, TrackingLevel};
/// use std::time::Duration;
///
/// let client = RecordingClient::new();
/// client.capture_event(TrackedEvent::new(TrackingLevel::Info));
/// assert!(client.flush(Duration::from_secs(1)));
/// assert_eq!(client.events().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct RecordingClient {
    events: Mutex<Vec<TrackedEvent>>,
    flushes: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured events, oldest first
    pub fn events(&self) -> Vec<TrackedEvent> {
        self.events.lock().clone()
    }

    pub fn last_event(&self) -> Option<TrackedEvent> {
        self.events.lock().last().cloned()
    }

    /// Number of flush calls so far
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl TrackingClient for RecordingClient {
    fn capture_event(&self, event: TrackedEvent) {
        self.events.lock().push(event);
    }

    fn flush(&self, _timeout: Duration) -> bool {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        true
    }
}
