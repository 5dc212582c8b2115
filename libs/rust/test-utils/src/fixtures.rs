//! Test fixtures with sample data.
//!
//! This module provides pre-built responses, errors and configurations for
//! use in tests.

use auth_http_client::{AuthConfig, HttpResponse};
use rust_common::{RequestSnapshot, ResponseSnapshot, TransportError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Authentication endpoint used by the fixtures.
pub const AUTH_ENDPOINT: &str = "/auth/token";

/// Sample user record for testing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SampleUser {
    /// User ID
    pub id: u32,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl SampleUser {
    /// Create a sample user.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            email: format!("{}@example.com", name.to_lowercase()),
            name,
        }
    }

    /// Render as JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Authentication response with a random token.
#[must_use]
pub fn token_response(expires_in: u64) -> HttpResponse {
    token_response_with(&format!("tok-{}", uuid::Uuid::new_v4()), expires_in)
}

/// Authentication response with a chosen token.
#[must_use]
pub fn token_response_with(token: &str, expires_in: u64) -> HttpResponse {
    HttpResponse::ok(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": expires_in,
    }))
}

/// Bearer configuration against [`AUTH_ENDPOINT`].
#[must_use]
pub fn bearer_config() -> AuthConfig {
    AuthConfig::bearer(
        AUTH_ENDPOINT,
        json!({ "client_id": "test-client", "client_secret": "test-secret" }),
    )
}

/// Transport error for a rejected request with full request and response
/// metadata.
#[must_use]
pub fn http_error(status: u16, method: &str, url: &str) -> TransportError {
    TransportError::from_status(status)
        .with_code("ERR_BAD_RESPONSE")
        .with_request(RequestSnapshot {
            method: Some(method.to_string()),
            url: Some(url.to_string()),
            headers: Some(BTreeMap::from([(
                "Accept".to_string(),
                "application/json".to_string(),
            )])),
            ..RequestSnapshot::default()
        })
        .with_response(ResponseSnapshot {
            status: Some(status),
            status_text: Some(status_text(status).to_string()),
            data: Some(json!({ "error": status_text(status) })),
            headers: None,
        })
}

/// Transport error for a request that never received a response.
#[must_use]
pub fn timeout_error(url: &str) -> TransportError {
    TransportError::new("timeout of 30000ms exceeded")
        .with_code("ETIMEDOUT")
        .with_request(RequestSnapshot {
            url: Some(url.to_string()),
            ..RequestSnapshot::default()
        })
}

const fn status_text(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}
