//! Instrumentation configuration errors.
//!
//! These signal setup mistakes. They are raised as soon as they are
//! detected and are never retried.

use thiserror::Error;

/// Instrumentation configuration error.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstrumentError {
    /// The receiver of an intercepted call has no log sink
    #[error(
        "{class}::{method} is instrumented but {class} has no logger; \
         add a log sink to {class} and return it from `Instrumented::logger`"
    )]
    MissingLogSink {
        /// Type of the receiver
        class: String,
        /// Intercepted method
        method: String,
    },

    /// A method was registered or called in a way the interceptor cannot honor
    #[error("cannot instrument {class}::{method}: {reason}")]
    InvalidTarget {
        /// Type the interceptor was built for
        class: String,
        /// Method name as given
        method: String,
        /// What was wrong
        reason: String,
    },
}

impl InstrumentError {
    /// Create a missing log sink error.
    #[must_use]
    pub fn missing_log_sink(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::MissingLogSink {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Create an invalid target error.
    #[must_use]
    pub fn invalid_target(
        class: impl Into<String>,
        method: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidTarget {
            class: class.into(),
            method: method.into(),
            reason: reason.into(),
        }
    }
}
