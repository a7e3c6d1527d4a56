//! Record builder
//!
//! A [`Record`] collects typed fields for one log line and, when finalized,
//! serializes them as a single JSON object and pushes the bytes through the
//! logger's writer exactly once.

use super::error::{LoggerError, Result};
use super::log_context::FieldValue;
use super::log_level::LogLevel;
use super::logger::Logger;
use super::multi_writer::MultiWriter;
use crate::sinks::tracking::{stack, ErrorStack};
use chrono::Utc;
use serde_json::{Map, Value};
use std::error::Error;

pub const LEVEL_FIELD: &str = "level";
pub const TIME_FIELD: &str = "time";
pub const MESSAGE_FIELD: &str = "message";
pub const ERROR_FIELD: &str = "error";
/// Carries `{"error": ..., "stacktrace": {"frames": [...]}}`
pub const ERROR_STACK_FIELD: &str = "stack";

/// Fields the logger writes itself and callers may not set
pub(crate) fn is_stamped_field(key: &str) -> bool {
    matches!(key, LEVEL_FIELD | TIME_FIELD)
}

/// Builder for one structured record.
///
/// # Example
///
/// ```
/// use fanout_logger::prelude::*;
/// use std::io;
///
/// let logger = Logger::builder()
///     .sink(Ok(ConsoleSink::with_writer(Box::new(io::sink()), LevelSet::new())))
///     .build()
///     .unwrap();
///
/// logger
///     .info()
///     .str("user", "alice")
///     .int("attempt", 3)
///     .float("latency_ms", 42.5)
///     .msg("login succeeded");
/// ```
#[must_use = "a record is only written when finalized with msg(), send() or try_msg()"]
pub struct Record<'a> {
    logger: &'a Logger,
    writer: &'a MultiWriter,
    level: LogLevel,
    fields: Map<String, Value>,
}

impl<'a> Record<'a> {
    pub(crate) fn new(logger: &'a Logger, writer: &'a MultiWriter, level: LogLevel) -> Self {
        Self {
            logger,
            writer,
            level,
            fields: Map::new(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn str(self, key: &str, value: impl Into<String>) -> Self {
        self.json(key, Value::String(value.into()))
    }

    pub fn int(self, key: &str, value: i64) -> Self {
        self.json(key, Value::from(value))
    }

    pub fn uint(self, key: &str, value: u64) -> Self {
        self.json(key, Value::from(value))
    }

    /// Non-finite values are written as `null`
    pub fn float(self, key: &str, value: f64) -> Self {
        self.field(key, FieldValue::Float(value))
    }

    pub fn bool(self, key: &str, value: bool) -> Self {
        self.json(key, Value::Bool(value))
    }

    pub fn field(self, key: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into().to_json_value();
        self.json(key, value)
    }

    /// Add an arbitrary JSON value. A repeated key replaces the earlier value.
    ///
    /// `level` and `time` are written by the logger; such keys are reported
    /// and dropped.
    pub fn json(mut self, key: &str, value: Value) -> Self {
        if is_stamped_field(key) {
            eprintln!("[LOGGER WARNING] Field '{}' is set by the logger and is ignored", key);
            return self;
        }
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Set the reserved `error` field to the error's display text
    pub fn err(self, err: &dyn Error) -> Self {
        self.str(ERROR_FIELD, err.to_string())
    }

    /// Set the `error` field and a `stack` field holding a stack captured here
    pub fn stack_err(self, err: &dyn Error) -> Self {
        let text = err.to_string();
        let stack = ErrorStack {
            error: text.clone(),
            stacktrace: Some(stack::capture()),
        };
        let encoded = match serde_json::to_value(&stack) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("[LOGGER ERROR] Cannot encode '{}' field: {}", ERROR_STACK_FIELD, e);
                Value::Null
            }
        };
        self.json(ERROR_STACK_FIELD, encoded).str(ERROR_FIELD, text)
    }

    /// Finalize with a message
    pub fn msg(self, message: impl AsRef<str>) {
        // failures are already reported and counted
        let _ = self.try_msg(message);
    }

    /// Finalize without a message
    pub fn send(self) {
        let _ = self.try_msg("");
    }

    /// Finalize with a message and return the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the error of the failing sink, or [`LoggerError::Aggregate`]
    /// if several sinks failed. Healthy sinks still receive the record.
    pub fn try_msg(self, message: impl AsRef<str>) -> Result<usize> {
        let logger = self.logger;
        let result = self.encode(message.as_ref()).and_then(|bytes| {
            if logger.is_closed() {
                return Err(LoggerError::writer("logger is closed"));
            }
            self.writer.write_level(self.level, &bytes)
        });

        match &result {
            Ok(_) => {
                logger.metrics().record_logged();
            }
            Err(e) => {
                logger.metrics().record_failure();
                eprintln!("[LOGGER ERROR] Failed to write {} record: {}", self.level, e);
            }
        }
        result
    }

    fn encode(&self, message: &str) -> Result<Vec<u8>> {
        let mut object = Map::new();
        if self.level != LogLevel::NoLevel {
            object.insert(LEVEL_FIELD.to_string(), Value::from(self.level.to_str()));
        }
        object.insert(
            TIME_FIELD.to_string(),
            self.logger.time_format().to_json_value(&Utc::now()),
        );
        for (key, value) in self.logger.context().fields() {
            object.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.fields {
            object.insert(key.clone(), value.clone());
        }
        if !message.is_empty() {
            object.insert(MESSAGE_FIELD.to_string(), Value::from(message));
        }

        let mut bytes = serde_json::to_vec(&object)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
