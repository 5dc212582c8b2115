//! Log sinks and the capability that exposes them.

use crate::recorder::LogEvent;
use std::sync::Arc;
use tracing::{error, info};

/// Destination for invocation events.
///
/// Events are borrowed for the duration of the call; sinks that keep them
/// must copy what they need.
pub trait LogSink: Send + Sync {
    /// Record an `invoked` or `success` event.
    fn log(&self, event: &LogEvent<'_>);

    /// Record an `error` event.
    fn error(&self, event: &LogEvent<'_>);
}

impl<S: LogSink + ?Sized> LogSink for Arc<S> {
    fn log(&self, event: &LogEvent<'_>) {
        (**self).log(event);
    }

    fn error(&self, event: &LogEvent<'_>) {
        (**self).error(event);
    }
}

impl<S: LogSink + ?Sized> LogSink for &S {
    fn log(&self, event: &LogEvent<'_>) {
        (**self).log(event);
    }

    fn error(&self, event: &LogEvent<'_>) {
        (**self).error(event);
    }
}

/// Capability of a receiver whose methods are intercepted.
///
/// Returning `None` makes every intercepted call fail with
/// [`InstrumentError::MissingLogSink`](crate::InstrumentError::MissingLogSink).
pub trait Instrumented {
    /// The sink that receives this instance's invocation events.
    fn logger(&self) -> Option<&dyn LogSink>;
}

/// Sink that forwards events to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    context: Option<String>,
}

impl TracingSink {
    /// Create a sink that tags every event with a context label.
    #[must_use]
    pub fn with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
        }
    }

    fn context(&self) -> &str {
        self.context.as_deref().unwrap_or("-")
    }
}

impl LogSink for TracingSink {
    fn log(&self, event: &LogEvent<'_>) {
        info!(
            target: "method_logging",
            context = %self.context(),
            method = %event.method,
            state = event.state.as_str(),
            args = %event.args.to_json(),
            "Method {}",
            event.state.as_str()
        );
    }

    fn error(&self, event: &LogEvent<'_>) {
        let error = event
            .error
            .as_ref()
            .map_or(serde_json::Value::Null, rust_common::NormalizedError::to_json);
        error!(
            target: "method_logging",
            context = %self.context(),
            method = %event.method,
            state = event.state.as_str(),
            args = %event.args.to_json(),
            error = %error,
            "Method {}",
            event.state.as_str()
        );
    }
}
