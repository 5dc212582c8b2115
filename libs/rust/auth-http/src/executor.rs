//! Request executor abstraction.
//!
//! The authenticated client never talks to the network directly; every raw
//! call goes through a [`RequestExecutor`].

use async_trait::async_trait;
use rust_common::{RequestError, RequestSnapshot, RequestSummary};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Upper-case verb.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether requests with this verb carry a body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request headers and query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// Query parameters
    pub params: BTreeMap<String, String>,
}

impl RequestOptions {
    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Encoded query string, empty if there are no parameters.
    #[must_use]
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.params)
            .finish()
    }
}

/// A request handed to an executor.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP verb
    pub method: HttpMethod,
    /// Absolute URL or path relative to the executor's base URL
    pub url: String,
    /// JSON body
    pub body: Option<Value>,
    /// Headers and query parameters
    pub options: RequestOptions,
}

impl HttpRequest {
    /// Create a request without body or options.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Replace headers and query parameters.
    #[must_use]
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Method, URL and query for retry diagnostics.
    #[must_use]
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            method: self.method.as_str().to_string(),
            url: self.url.clone(),
            query: self.options.query_string(),
        }
    }

    /// Request metadata for a transport error.
    #[must_use]
    pub fn snapshot(&self) -> RequestSnapshot {
        RequestSnapshot {
            method: Some(self.method.as_str().to_string()),
            url: Some(self.url.clone()),
            headers: (!self.options.headers.is_empty()).then(|| self.options.headers.clone()),
            data: self.body.clone(),
            params: (!self.options.params.is_empty()).then(|| self.options.params.clone()),
            ..RequestSnapshot::default()
        }
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase
    pub status_text: String,
    /// Decoded body; `Null` when empty
    pub data: Value,
    /// Response headers
    pub headers: BTreeMap<String, String>,
}

impl HttpResponse {
    /// Create a 200 response with a JSON body.
    #[must_use]
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            data,
            headers: BTreeMap::new(),
        }
    }

    /// Deserialize the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }
}

/// Performs raw HTTP calls.
///
/// Implementations report failures they can describe as
/// [`TransportError`](rust_common::TransportError)s and anything else as
/// [`RequestError::Other`]. Timeouts belong to the executor.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Send one request.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError>;

    /// GET `url`.
    async fn get(&self, url: &str, options: RequestOptions) -> Result<HttpResponse, RequestError> {
        self.send(HttpRequest::new(HttpMethod::Get, url).with_options(options))
            .await
    }

    /// POST `body` to `url`.
    async fn post(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.send(
            HttpRequest::new(HttpMethod::Post, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// PUT `body` to `url`.
    async fn put(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.send(
            HttpRequest::new(HttpMethod::Put, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// PATCH `url` with `body`.
    async fn patch(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.send(
            HttpRequest::new(HttpMethod::Patch, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// DELETE `url`.
    async fn delete(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse, RequestError> {
        self.send(HttpRequest::new(HttpMethod::Delete, url).with_options(options))
            .await
    }
}
