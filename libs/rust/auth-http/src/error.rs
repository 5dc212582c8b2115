//! Authenticated client error types.

use rust_common::RequestError;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by [`AuthenticatedClient`](crate::AuthenticatedClient).
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request failed, after retries where they apply
    #[error("{0}")]
    Request(#[from] RequestError),

    /// Authentication failed; every caller that waited on the same attempt
    /// receives the same failure
    #[error("Authentication failed: {0}")]
    Authentication(#[source] Arc<ClientError>),

    /// The authentication response could not be turned into a token
    #[error("Invalid token grant: {0}")]
    InvalidGrant(String),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Create an invalid grant error.
    #[must_use]
    pub fn invalid_grant(reason: impl Into<String>) -> Self {
        Self::InvalidGrant(reason.into())
    }

    /// Response status of the underlying request failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(err) => err.status(),
            Self::Authentication(err) => err.status(),
            Self::InvalidGrant(_) => None,
        }
    }

    /// Check if a request was rejected with 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Request(err) if err.is_unauthorized())
    }

    /// Check if this is an authentication failure.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}
