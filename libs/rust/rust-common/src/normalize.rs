//! Error normalization for structured log records.
//!
//! [`normalize`] turns a [`TransportError`] found anywhere in an error's
//! `source()` chain into a flat, serializable [`TransportErrorRecord`]. Any
//! other error passes through by reference so callers can still inspect the
//! original value.

use crate::error::{RequestSnapshot, ResponseSnapshot, TransportError};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::error::Error;

/// A value that is either present or replaced by a fixed description.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Described<T> {
    /// The value was available
    Present(T),
    /// The value was missing
    Missing(&'static str),
}

/// Flattened view of a transport error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransportErrorRecord {
    /// Error name
    pub name: String,
    /// Error message
    pub error: String,
    /// Machine error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Outbound request or `"Empty request"`
    pub config: Described<RequestSnapshot>,
    /// Inbound response or `"Empty response"`
    pub response: Described<ResponseSnapshot>,
    /// Captured backtrace text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl From<&TransportError> for TransportErrorRecord {
    fn from(err: &TransportError) -> Self {
        Self {
            name: err.name.clone(),
            error: err.message.clone(),
            code: err.code.clone(),
            config: err
                .request
                .clone()
                .map_or(Described::Missing("Empty request"), Described::Present),
            response: err
                .response
                .clone()
                .map_or(Described::Missing("Empty response"), Described::Present),
            stack: err.stack.clone(),
        }
    }
}

/// Result of normalizing an error for logging.
#[derive(Debug)]
pub enum NormalizedError<'a> {
    /// A transport error was found and flattened
    Transport(TransportErrorRecord),
    /// Not a transport error; the original value, untouched
    PassThrough(&'a (dyn Error + 'static)),
}

impl NormalizedError<'_> {
    /// Whether the error was recognized as a transport error.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Render as JSON for structured log fields.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Serialize for NormalizedError<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Transport(record) => record.serialize(serializer),
            Self::PassThrough(err) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("error", &err.to_string())?;
                if let Some(source) = err.source() {
                    map.serialize_entry("source", &source.to_string())?;
                }
                map.end()
            }
        }
    }
}

/// Normalize an error for logging.
///
/// Never fails: missing request or response metadata is replaced by the
/// literal `"Empty request"` / `"Empty response"`.
///
/// # Examples
///
/// ```
/// use rust_common::{normalize, NormalizedError, TransportError};
///
/// let plain = std::io::Error::other("bad");
/// assert!(matches!(normalize(&plain), NormalizedError::PassThrough(_)));
///
/// let transport = TransportError::from_status(502);
/// assert!(normalize(&transport).is_transport());
/// ```
#[must_use]
pub fn normalize<'a>(error: &'a (dyn Error + 'static)) -> NormalizedError<'a> {
    find_transport_error(error).map_or(NormalizedError::PassThrough(error), |transport| {
        NormalizedError::Transport(TransportErrorRecord::from(transport))
    })
}

fn find_transport_error<'a>(error: &'a (dyn Error + 'static)) -> Option<&'a TransportError> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(transport) = err.downcast_ref::<TransportError>() {
            return Some(transport);
        }
        current = err.source();
    }
    None
}
