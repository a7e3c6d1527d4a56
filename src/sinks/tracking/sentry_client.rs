//! Sentry-backed tracking client

use super::client::TrackingClient;
use super::event::{StackFrame, StackTrace, TrackedEvent, TrackingLevel};
use crate::core::error::{LoggerError, Result};
use sentry::protocol::{Breadcrumb, Context, Event, Exception, Frame, Level, Map, Stacktrace};
use sentry::types::Dsn;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Callback that may rewrite or drop an event before it is sent
pub type BeforeSend = Arc<dyn Fn(Event<'static>) -> Option<Event<'static>> + Send + Sync>;

/// Callback that may rewrite or drop a breadcrumb before it is recorded
pub type BeforeBreadcrumb = Arc<dyn Fn(Breadcrumb) -> Option<Breadcrumb> + Send + Sync>;

/// Options passed through to the Sentry client.
///
/// Callbacks and the transport override cannot come from a config file and
/// are skipped during deserialization.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub dsn: Option<String>,
    pub debug: bool,
    pub attach_stacktrace: bool,
    pub sample_rate: f32,
    pub traces_sample_rate: f32,
    pub server_name: Option<String>,
    pub release: Option<String>,
    pub environment: Option<String>,
    pub max_breadcrumbs: usize,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    #[serde(skip)]
    pub before_send: Option<BeforeSend>,
    #[serde(skip)]
    pub before_breadcrumb: Option<BeforeBreadcrumb>,
    #[serde(skip)]
    pub transport: Option<Arc<dyn sentry::TransportFactory>>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            debug: false,
            attach_stacktrace: false,
            sample_rate: 1.0,
            traces_sample_rate: 0.0,
            server_name: None,
            release: None,
            environment: None,
            max_breadcrumbs: 100,
            http_proxy: None,
            https_proxy: None,
            before_send: None,
            before_breadcrumb: None,
            transport: None,
        }
    }
}

impl fmt::Debug for TrackingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackingConfig")
            .field("dsn", &self.dsn)
            .field("debug", &self.debug)
            .field("sample_rate", &self.sample_rate)
            .field("traces_sample_rate", &self.traces_sample_rate)
            .field("release", &self.release)
            .field("environment", &self.environment)
            .field("before_send", &self.before_send.is_some())
            .field("transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}

impl TrackingConfig {
    fn into_client_options(self) -> Result<sentry::ClientOptions> {
        let dsn = self
            .dsn
            .filter(|dsn| !dsn.is_empty())
            .map(|dsn| {
                dsn.parse::<Dsn>()
                    .map_err(|e| LoggerError::Tracking(format!("invalid DSN '{}': {}", dsn, e)))
            })
            .transpose()?;

        let options = sentry::ClientOptions {
            dsn,
            debug: self.debug,
            attach_stacktrace: self.attach_stacktrace,
            sample_rate: self.sample_rate,
            traces_sample_rate: self.traces_sample_rate,
            server_name: self.server_name.map(Cow::Owned),
            release: self.release.map(Cow::Owned),
            environment: self.environment.map(Cow::Owned),
            max_breadcrumbs: self.max_breadcrumbs,
            http_proxy: self.http_proxy.map(Cow::Owned),
            https_proxy: self.https_proxy.map(Cow::Owned),
            before_send: self.before_send,
            before_breadcrumb: self.before_breadcrumb,
            transport: self.transport,
            ..Default::default()
        };
        Ok(sentry::apply_defaults(options))
    }
}

/// [`TrackingClient`] backed by `sentry::Client`
pub struct SentryClient {
    client: sentry::Client,
}

impl SentryClient {
    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Tracking`] if the DSN does not parse.
    pub fn new(config: TrackingConfig) -> Result<Self> {
        let options = config.into_client_options()?;
        Ok(Self {
            client: sentry::Client::from(options),
        })
    }

    /// Whether the client has both a DSN and a transport
    pub fn is_enabled(&self) -> bool {
        self.client.is_enabled()
    }
}

impl TrackingClient for SentryClient {
    fn capture_event(&self, event: TrackedEvent) {
        self.client.capture_event(to_sentry_event(event), None);
    }

    fn flush(&self, timeout: Duration) -> bool {
        self.client.flush(Some(timeout))
    }
}

fn to_sentry_level(level: TrackingLevel) -> Level {
    match level {
        TrackingLevel::Debug => Level::Debug,
        TrackingLevel::Info => Level::Info,
        TrackingLevel::Warning => Level::Warning,
        TrackingLevel::Error => Level::Error,
        TrackingLevel::Fatal => Level::Fatal,
    }
}

fn to_sentry_stacktrace(trace: StackTrace) -> Stacktrace {
    Stacktrace {
        frames: trace.frames.into_iter().map(to_sentry_frame).collect(),
        ..Default::default()
    }
}

fn to_sentry_frame(frame: StackFrame) -> Frame {
    Frame {
        function: frame.function,
        module: frame.module,
        filename: frame.filename,
        abs_path: frame.abs_path,
        lineno: frame.lineno,
        colno: frame.colno,
        in_app: frame.in_app,
        ..Default::default()
    }
}

fn to_sentry_event(event: TrackedEvent) -> Event<'static> {
    let mut contexts = Map::new();
    if !event.payload.is_empty() {
        let payload = event
            .payload
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        contexts.insert("payload".to_string(), Context::Other(payload));
    }

    let exceptions: Vec<Exception> = event
        .exceptions
        .into_iter()
        .map(|e| Exception {
            ty: "error".to_string(),
            value: Some(e.value),
            stacktrace: e.stacktrace.map(to_sentry_stacktrace),
            ..Default::default()
        })
        .collect();

    Event {
        message: event.message,
        level: to_sentry_level(event.level),
        logger: Some(event.logger),
        timestamp: SystemTime::from(event.timestamp),
        contexts,
        exception: exceptions.into(),
        ..Default::default()
    }
}
