//! Transport error types shared by request executors and retry policies.
//!
//! A [`TransportError`] is the structured failure an executor raises when it
//! has request/response metadata to report. Anything else an executor fails
//! with is carried as [`RequestError::Other`] and treated as transient.

use serde::Serialize;
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::collections::BTreeMap;
use thiserror::Error;

/// Outbound request metadata attached to a transport error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSnapshot {
    /// HTTP method
    pub method: Option<String>,
    /// Fully resolved URL
    pub url: Option<String>,
    /// Base URL the path was resolved against
    #[serde(rename = "baseURL")]
    pub base_url: Option<String>,
    /// Request path
    pub path: Option<String>,
    /// Request headers
    pub headers: Option<BTreeMap<String, String>>,
    /// Request body
    pub data: Option<Value>,
    /// Query parameters
    pub params: Option<BTreeMap<String, String>>,
}

/// Inbound response metadata attached to a transport error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status: Option<u16>,
    /// Canonical reason phrase
    pub status_text: Option<String>,
    /// Response body
    pub data: Option<Value>,
    /// Response headers
    pub headers: Option<BTreeMap<String, String>>,
}

impl ResponseSnapshot {
    /// Create a snapshot carrying only a status code.
    #[must_use]
    pub fn with_status(status: u16) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Structured failure raised by a request executor.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    /// Error name
    pub name: String,
    /// Human-readable message
    pub message: String,
    /// Machine error code (e.g. `ETIMEDOUT`)
    pub code: Option<String>,
    /// The outbound request, when known
    pub request: Option<RequestSnapshot>,
    /// The inbound response, when one was received
    pub response: Option<ResponseSnapshot>,
    /// Backtrace text captured at construction, when enabled
    pub stack: Option<String>,
}

impl TransportError {
    /// Create a transport error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            name: "TransportError".to_string(),
            message: message.into(),
            code: None,
            request: None,
            response: None,
            stack: capture_stack(),
        }
    }

    /// Create a transport error for a received non-success response.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self::new(format!("Request failed with status code {status}"))
            .with_response(ResponseSnapshot::with_status(status))
    }

    /// Set the error name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the machine error code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the outbound request.
    #[must_use]
    pub fn with_request(mut self, request: RequestSnapshot) -> Self {
        self.request = Some(request);
        self
    }

    /// Attach the inbound response.
    #[must_use]
    pub fn with_response(mut self, response: ResponseSnapshot) -> Self {
        self.response = Some(response);
        self
    }

    /// Response status, if a response with a status was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().and_then(|r| r.status)
    }
}

fn capture_stack() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

/// Failure of a single request attempt.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Executor reported a structured transport error
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Executor failed with an error it could not describe
    #[error("{0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RequestError {
    /// Wrap an arbitrary error as an unrecognized request failure.
    #[must_use]
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Other(error.into())
    }

    /// Check if this error is retryable.
    ///
    /// Unrecognized errors and transport errors without a response are
    /// treated as transient, as are 5xx responses. Every other transport
    /// error is final.
    ///
    /// # Examples
    ///
    /// ```
    /// use rust_common::{RequestError, TransportError};
    ///
    /// let err = RequestError::from(TransportError::from_status(503));
    /// assert!(err.is_retryable());
    ///
    /// let err = RequestError::from(TransportError::from_status(404));
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err
                .response
                .as_ref()
                .is_none_or(|response| response.status.is_some_and(|s| (500..600).contains(&s))),
            Self::Other(_) => true,
        }
    }

    /// Response status, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => err.status(),
            Self::Other(_) => None,
        }
    }

    /// Check if the request was rejected with 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The transport error, if this is one.
    #[must_use]
    pub const fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Other(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(RequestError::other("connection reset").is_retryable());
        assert!(RequestError::from(TransportError::new("socket hang up")).is_retryable());
        assert!(RequestError::from(TransportError::from_status(500)).is_retryable());
        assert!(RequestError::from(TransportError::from_status(599)).is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!RequestError::from(TransportError::from_status(400)).is_retryable());
        assert!(!RequestError::from(TransportError::from_status(401)).is_retryable());
        assert!(!RequestError::from(TransportError::from_status(429)).is_retryable());
        assert!(!RequestError::from(TransportError::from_status(600)).is_retryable());

        let no_status = TransportError::new("odd").with_response(ResponseSnapshot::default());
        assert!(!RequestError::from(no_status).is_retryable());
    }

    #[test]
    fn test_unauthorized() {
        assert!(RequestError::from(TransportError::from_status(401)).is_unauthorized());
        assert!(!RequestError::from(TransportError::from_status(403)).is_unauthorized());
        assert!(!RequestError::other("boom").is_unauthorized());
    }

    #[test]
    fn test_error_display() {
        let err = RequestError::from(TransportError::from_status(503));
        assert_eq!(err.to_string(), "Request failed with status code 503");

        let err = RequestError::other("connection refused");
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_builder() {
        let err = TransportError::new("timeout")
            .with_name("ReqwestError")
            .with_code("ETIMEDOUT");
        assert_eq!(err.name, "ReqwestError");
        assert_eq!(err.code.as_deref(), Some("ETIMEDOUT"));
        assert!(err.request.is_none());
        assert_eq!(err.status(), None);
    }
}
