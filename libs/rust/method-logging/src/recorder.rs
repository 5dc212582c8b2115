//! Invocation events and the recorder that emits them.

use crate::args::CapturedArgs;
use crate::sink::LogSink;
use rust_common::{normalize, NormalizedError};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;

/// Stage of an intercepted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationState {
    /// The call was entered
    Invoked,
    /// The call returned successfully
    Success,
    /// The call failed
    Error,
}

impl InvocationState {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invoked => "invoked",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// One structured record for an intercepted call.
#[derive(Debug, Serialize)]
pub struct LogEvent<'a> {
    /// Method name
    pub method: &'a str,
    /// Stage of the call
    pub state: InvocationState,
    /// Captured arguments
    #[serde(skip_serializing_if = "args_are_empty")]
    pub args: &'a CapturedArgs,
    /// Normalized failure, for `error` events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NormalizedError<'a>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn args_are_empty(args: &&CapturedArgs) -> bool {
    args.is_empty()
}

impl<'a> LogEvent<'a> {
    /// Create an event without an error.
    #[must_use]
    pub const fn new(method: &'a str, state: InvocationState, args: &'a CapturedArgs) -> Self {
        Self {
            method,
            state,
            args,
            error: None,
        }
    }

    /// Render the whole event as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Emits the events of one method to a sink.
#[derive(Clone, Copy)]
pub struct InvocationRecorder<'a> {
    sink: &'a dyn LogSink,
    method: &'a str,
}

impl<'a> InvocationRecorder<'a> {
    /// Create a recorder for `method`.
    #[must_use]
    pub const fn new(sink: &'a dyn LogSink, method: &'a str) -> Self {
        Self { sink, method }
    }

    /// Emit an `invoked` event.
    pub fn invoked(&self, args: &CapturedArgs) {
        self.sink
            .log(&LogEvent::new(self.method, InvocationState::Invoked, args));
    }

    /// Emit a `success` event.
    pub fn success(&self, args: &CapturedArgs) {
        self.sink
            .log(&LogEvent::new(self.method, InvocationState::Success, args));
    }

    /// Emit an `error` event carrying the normalized failure.
    pub fn error(&self, args: &CapturedArgs, error: &(dyn Error + 'static)) {
        let event = LogEvent {
            error: Some(normalize(error)),
            ..LogEvent::new(self.method, InvocationState::Error, args)
        };
        self.sink.error(&event);
    }
}

impl std::fmt::Debug for InvocationRecorder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationRecorder")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
