//! Human-readable console sink

use crate::core::record::{ERROR_FIELD, LEVEL_FIELD, MESSAGE_FIELD, TIME_FIELD};
use crate::core::timestamp::{try_strftime, validate_strftime};
use crate::core::{LevelSet, LogLevel, Result};
use chrono::DateTime;
use colored::Colorize;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::io::{self, Write};

/// Time layout used when none is configured: `3:04PM`
pub const DEFAULT_CONSOLE_TIME_FORMAT: &str = "%-I:%M%p";

/// Renders JSON records as `<time> <LVL> <message> <fields>`.
///
/// The `error` field comes first, then every other field in ascending key
/// order. A record that is not a JSON object is written verbatim.
pub struct ConsoleSink {
    name: &'static str,
    out: Mutex<Box<dyn Write + Send>>,
    levels: LevelSet,
    use_colors: bool,
    time_format: String,
}

impl ConsoleSink {
    pub fn stdout(levels: LevelSet) -> Self {
        Self::build("stdout", Box::new(io::stdout()), levels)
    }

    pub fn stderr(levels: LevelSet) -> Self {
        Self::build("stderr", Box::new(io::stderr()), levels)
    }

    /// Write to any destination; colors are off by default here
    pub fn with_writer(out: Box<dyn Write + Send>, levels: LevelSet) -> Self {
        Self::build("console", out, levels).with_colors(false)
    }

    fn build(name: &'static str, out: Box<dyn Write + Send>, levels: LevelSet) -> Self {
        Self {
            name,
            out: Mutex::new(out),
            levels,
            use_colors: true,
            time_format: DEFAULT_CONSOLE_TIME_FORMAT.to_string(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Set the strftime layout for the `time` column.
    ///
    /// A pattern chrono cannot render is reported on stderr and the current
    /// layout is kept; use [`try_time_format`](Self::try_time_format) to get
    /// the error instead.
    ///
    /// # Example
    ///
    /// ```
    /// use fanout_logger::{ConsoleSink, LevelSet};
    ///
    /// let sink = ConsoleSink::stdout(LevelSet::new()).with_time_format("%Y-%m-%d %H:%M:%S");
    /// ```
    #[must_use]
    pub fn with_time_format(self, format: impl Into<String>) -> Self {
        let format = format.into();
        match validate_strftime(&format) {
            Ok(()) => Self {
                time_format: format,
                ..self
            },
            Err(e) => {
                eprintln!("[LOGGER WARNING] Console time format kept at '{}': {}", self.time_format, e);
                self
            }
        }
    }

    /// Set the strftime layout for the `time` column, failing on a bad pattern.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidConfiguration`](crate::LoggerError::InvalidConfiguration)
    /// if chrono cannot render `format`.
    pub fn try_time_format(self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        validate_strftime(&format)?;
        Ok(Self {
            time_format: format,
            ..self
        })
    }

    fn render(&self, fields: &Map<String, Value>) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(fields.len() + 3);

        if let Some(time) = fields.get(TIME_FIELD) {
            let time = self.format_time(time);
            parts.push(if self.use_colors {
                time.bright_black().to_string()
            } else {
                time
            });
        }

        let level = fields.get(LEVEL_FIELD).and_then(Value::as_str);
        parts.push(self.format_level(level));

        if let Some(message) = fields.get(MESSAGE_FIELD) {
            let message = text_of(message);
            if !message.is_empty() {
                parts.push(message);
            }
        }

        if let Some(error) = fields.get(ERROR_FIELD) {
            parts.push(self.format_field(ERROR_FIELD, error, true));
        }

        let mut keys: Vec<&String> = fields
            .keys()
            .filter(|k| !matches!(k.as_str(), TIME_FIELD | LEVEL_FIELD | MESSAGE_FIELD | ERROR_FIELD))
            .collect();
        keys.sort();
        for key in keys {
            parts.push(self.format_field(key, &fields[key.as_str()], false));
        }

        parts.join(" ")
    }

    fn format_time(&self, time: &Value) -> String {
        match time {
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(parsed) => try_strftime(&parsed, &self.time_format).unwrap_or_else(|| s.clone()),
                Err(_) => s.clone(),
            },
            other => other.to_string(),
        }
    }

    fn format_level(&self, level: Option<&str>) -> String {
        let parsed = level.and_then(|l| l.parse::<LogLevel>().ok());
        let abbrev = match (level, parsed) {
            (None, _) => LogLevel::NoLevel.console_abbrev().to_string(),
            (Some(_), Some(level)) => level.console_abbrev().to_string(),
            (Some(raw), None) => raw.chars().take(3).collect::<String>().to_uppercase(),
        };

        match (self.use_colors, parsed) {
            (true, Some(level)) => abbrev.color(level.color_code()).bold().to_string(),
            _ => abbrev,
        }
    }

    fn format_field(&self, key: &str, value: &Value, is_error: bool) -> String {
        let rendered = match value {
            Value::String(s) if needs_quote(s) => Value::String(s.clone()).to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        if !self.use_colors {
            return format!("{}={}", key, rendered);
        }
        if is_error {
            format!("{}{}", format!("{}=", key).red(), rendered.red().bold())
        } else {
            format!("{}{}", format!("{}=", key).cyan(), rendered)
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn needs_quote(s: &str) -> bool {
    s.is_empty()
        || s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\\' | '='))
}

impl crate::core::Sink for ConsoleSink {
    fn name(&self) -> &str {
        self.name
    }

    fn levels(&self) -> &LevelSet {
        &self.levels
    }

    fn write(&self, record: &[u8]) -> Result<usize> {
        let line = match serde_json::from_slice::<Map<String, Value>>(record) {
            Ok(fields) => {
                let mut line = self.render(&fields);
                line.push('\n');
                line.into_bytes()
            }
            Err(_) => record.to_vec(),
        };

        let mut out = self.out.lock();
        out.write_all(&line)?;
        out.flush()?;
        Ok(record.len())
    }

    fn close(&self) -> Result<()> {
        self.out.lock().flush()?;
        Ok(())
    }
}
