//! `reqwest`-backed request executor.

use crate::executor::{HttpMethod, HttpRequest, HttpResponse, RequestExecutor};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, Response};
use rust_common::{RequestError, ResponseSnapshot, TransportError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL that relative request paths are resolved against
    pub base_url: Option<String>,
    /// Request timeout (default: 30s)
    pub timeout: Duration,
    /// Connection timeout (default: 10s)
    pub connect_timeout: Duration,
    /// Pool idle timeout (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Maximum idle connections per host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("HTTP_BASE_URL").ok(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: concat!("auth-http-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Build a configured HTTP client.
///
/// # Errors
///
/// Returns an error if the client cannot be built (e.g., TLS initialization fails).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .use_rustls_tls()
        .build()
}

/// Executor that sends requests with `reqwest`.
///
/// Non-2xx responses become [`TransportError`]s carrying the response;
/// timeouts and connection failures become [`TransportError`]s without one.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    client: Client,
    base_url: Option<Url>,
}

impl ReqwestExecutor {
    /// Create an executor from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Other`] if the base URL does not parse or the
    /// client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, RequestError> {
        let base_url = config
            .base_url
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(RequestError::other)?;
        let client = build_http_client(config).map_err(RequestError::other)?;
        Ok(Self { client, base_url })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn from_client(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    fn resolve(&self, path: &str) -> Result<Url, RequestError> {
        match &self.base_url {
            Some(base) => base.join(path),
            None => Url::parse(path),
        }
        .map_err(RequestError::other)
    }

    fn transport_error(&self, request: &HttpRequest, message: String) -> TransportError {
        let mut snapshot = request.snapshot();
        snapshot.base_url = self.base_url.as_ref().map(ToString::to_string);
        snapshot.path = Some(request.url.clone());
        TransportError::new(message).with_request(snapshot)
    }

    fn send_error(&self, request: &HttpRequest, err: &reqwest::Error) -> TransportError {
        let code = if err.is_timeout() {
            "ETIMEDOUT"
        } else if err.is_connect() {
            "ECONNREFUSED"
        } else {
            "ERR_NETWORK"
        };
        self.transport_error(request, err.to_string()).with_code(code)
    }
}

const fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn header_map(response: &Response) -> BTreeMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn decode_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice(bytes)
    }
}

/// JSON bodies decode to their value; anything else is kept as text.
fn body_value(bytes: &[u8]) -> Value {
    decode_body(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[async_trait]
impl RequestExecutor for ReqwestExecutor {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let url = self.resolve(&request.url)?;

        let mut builder = self
            .client
            .request(to_reqwest_method(request.method), url)
            .query(&request.options.params);
        for (name, value) in &request.options.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.send_error(&request, &err))?;

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let headers = header_map(&response);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.send_error(&request, &err))?;

        if !status.is_success() {
            let response = ResponseSnapshot {
                status: Some(status.as_u16()),
                status_text: Some(status_text),
                data: Some(body_value(&bytes)),
                headers: Some(headers),
            };
            let message = format!("Request failed with status code {}", status.as_u16());
            return Err(self
                .transport_error(&request, message)
                .with_code("ERR_BAD_RESPONSE")
                .with_response(response)
                .into());
        }

        Ok(HttpResponse {
            status: status.as_u16(),
            status_text,
            data: body_value(&bytes),
            headers,
        })
    }
}
