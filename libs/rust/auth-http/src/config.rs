//! Authentication configuration.

use crate::error::ClientError;
use crate::executor::HttpResponse;
use chrono::Utc;
use rust_common::RetryConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Builds the body of the authentication request.
pub type RequestBuilder = Arc<dyn Fn() -> Value + Send + Sync>;

/// Extracts a token grant from the authentication response.
pub type ResponseExtractor =
    Arc<dyn Fn(&HttpResponse) -> Result<TokenGrant, ClientError> + Send + Sync>;

/// Builds the headers that carry the token on every request.
pub type HeaderBuilder = Arc<dyn Fn(&str) -> BTreeMap<String, String> + Send + Sync>;

/// A token and the time it expires.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Bearer credential
    pub token: String,
    /// Expiry as seconds since the Unix epoch
    pub expires_at: i64,
}

impl TokenGrant {
    /// Create a grant with an absolute expiry.
    #[must_use]
    pub fn new(token: impl Into<String>, expires_at: i64) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Create a grant that expires `ttl` from now.
    #[must_use]
    pub fn expiring_in(token: impl Into<String>, ttl: Duration) -> Self {
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self::new(token, Utc::now().timestamp().saturating_add(ttl))
    }

    /// Extract an `access_token` / `expires_in` grant from a response body.
    ///
    /// `expires_in` is a lifetime in seconds; an absolute `expires_at`
    /// timestamp is accepted instead when present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidGrant`] when the token or its expiry is
    /// missing.
    pub fn from_json(body: &Value) -> Result<Self, ClientError> {
        let token = body
            .get("access_token")
            .or_else(|| body.get("token"))
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::invalid_grant("missing access_token"))?;

        if let Some(expires_at) = body.get("expires_at").and_then(Value::as_i64) {
            return Ok(Self::new(token, expires_at));
        }

        let expires_in = body
            .get("expires_in")
            .and_then(Value::as_u64)
            .ok_or_else(|| ClientError::invalid_grant("missing expires_in"))?;
        Ok(Self::expiring_in(token, Duration::from_secs(expires_in)))
    }
}

impl fmt::Debug for TokenGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenGrant")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authenticated client configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Authentication endpoint
    pub endpoint: String,
    /// Authentication request body
    pub request_builder: RequestBuilder,
    /// Token extraction from the authentication response
    pub response_extractor: ResponseExtractor,
    /// Headers that carry the token
    pub header_builder: HeaderBuilder,
    /// Re-authenticate this long before expiry (default: 60s)
    pub refresh_margin: Duration,
    /// Transport retry settings
    pub retry: RetryConfig,
}

impl AuthConfig {
    /// Create a configuration from its three hooks.
    #[must_use]
    pub fn new<B, X, H>(
        endpoint: impl Into<String>,
        request_builder: B,
        response_extractor: X,
        header_builder: H,
    ) -> Self
    where
        B: Fn() -> Value + Send + Sync + 'static,
        X: Fn(&HttpResponse) -> Result<TokenGrant, ClientError> + Send + Sync + 'static,
        H: Fn(&str) -> BTreeMap<String, String> + Send + Sync + 'static,
    {
        Self {
            endpoint: endpoint.into(),
            request_builder: Arc::new(request_builder),
            response_extractor: Arc::new(response_extractor),
            header_builder: Arc::new(header_builder),
            refresh_margin: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }

    /// Configuration that posts a fixed body, reads an
    /// `access_token`/`expires_in` grant and sends
    /// `Authorization: Bearer <token>`.
    #[must_use]
    pub fn bearer(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(
            endpoint,
            move || body.clone(),
            |response: &HttpResponse| TokenGrant::from_json(&response.data),
            bearer_headers,
        )
    }

    /// Set the refresh margin.
    #[must_use]
    pub const fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Set the retry settings.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the response extractor.
    #[must_use]
    pub fn with_response_extractor<X>(mut self, extractor: X) -> Self
    where
        X: Fn(&HttpResponse) -> Result<TokenGrant, ClientError> + Send + Sync + 'static,
    {
        self.response_extractor = Arc::new(extractor);
        self
    }

    /// Replace the header builder.
    #[must_use]
    pub fn with_header_builder<H>(mut self, builder: H) -> Self
    where
        H: Fn(&str) -> BTreeMap<String, String> + Send + Sync + 'static,
    {
        self.header_builder = Arc::new(builder);
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("endpoint", &self.endpoint)
            .field("refresh_margin", &self.refresh_margin)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// `Authorization: Bearer <token>`.
#[must_use]
pub fn bearer_headers(token: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("Authorization".to_string(), format!("Bearer {token}"))])
}
