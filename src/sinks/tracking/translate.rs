//! Record-to-event translation for the tracking sink

use super::event::{ErrorStack, TrackedEvent, TrackedException, TrackingLevel};
use super::stack;
use crate::core::error::Result;
use crate::core::record::{
    ERROR_FIELD, ERROR_STACK_FIELD, LEVEL_FIELD, MESSAGE_FIELD, TIME_FIELD,
};
use serde_json::{Map, Value};

/// Outcome of translating one record
#[derive(Debug)]
pub struct Translation {
    pub event: TrackedEvent,
    /// Set when the `stack` field was present but could not be decoded
    pub diagnostic: Option<TrackedEvent>,
}

/// Build a tracking event from the bytes of a record.
///
/// Reserved fields map onto event attributes; every other field ends up in
/// the payload as a string. A `stack` field that decodes cleanly wins over a
/// plain `error` field. The `error` field's stack is captured here, not where
/// the error was created.
pub fn translate(record: &[u8], level: TrackingLevel) -> Result<Translation> {
    let fields: Map<String, Value> = serde_json::from_slice(record)?;

    let mut event = TrackedEvent::new(level);
    let mut plain_error: Option<TrackedException> = None;
    let mut stack_error: Option<TrackedException> = None;
    let mut diagnostic = None;

    for (key, value) in fields {
        match key.as_str() {
            LEVEL_FIELD | TIME_FIELD => {}
            MESSAGE_FIELD => event.message = Some(into_text(value)),
            ERROR_FIELD => {
                plain_error = Some(TrackedException {
                    value: into_text(value),
                    stacktrace: Some(stack::capture()),
                });
            }
            ERROR_STACK_FIELD => match serde_json::from_value::<ErrorStack>(value) {
                Ok(decoded) => {
                    stack_error = Some(TrackedException {
                        value: decoded.error,
                        stacktrace: decoded.stacktrace,
                    });
                }
                Err(e) => {
                    eprintln!("[LOGGER ERROR] Cannot decode '{}' field: {}", ERROR_STACK_FIELD, e);
                    diagnostic = Some(decode_failure(&e));
                }
            },
            _ => {
                event.payload.insert(key, into_text(value));
            }
        }
    }

    if let Some(exception) = stack_error.or(plain_error) {
        event.exceptions.push(exception);
    }

    Ok(Translation { event, diagnostic })
}

/// Strings keep their content, anything else is rendered as compact JSON
fn into_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn decode_failure(err: &serde_json::Error) -> TrackedEvent {
    let message = format!("failed to decode '{}' field: {}", ERROR_STACK_FIELD, err);
    let mut event = TrackedEvent::new(TrackingLevel::Error);
    event.exceptions.push(TrackedException {
        value: message.clone(),
        stacktrace: Some(stack::capture()),
    });
    event.message = Some(message);
    event
}
