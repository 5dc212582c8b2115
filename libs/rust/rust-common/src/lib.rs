//! Shared library for cross-cutting concerns in service instrumentation.
//!
//! This crate provides centralized implementations for:
//! - The structured transport error raised by request executors
//! - Error normalization for structured log records
//! - Retry policies with exponential backoff
//! - Tracing subscriber initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod normalize;
pub mod retry;
pub mod tracing_config;

pub use error::{RequestError, RequestSnapshot, ResponseSnapshot, TransportError};
pub use normalize::{normalize, Described, NormalizedError, TransportErrorRecord};
pub use retry::{RequestSummary, RetryConfig, RetryPolicy};
pub use tracing_config::{init_tracing, TracingConfig};
