//! HTTP client that maintains a bearer credential.
//!
//! Authentication is single-flight: concurrent callers that find the token
//! missing or about to expire await one shared attempt and observe the same
//! outcome. A 401 from a request triggers exactly one forced
//! re-authentication and one more attempt.

use crate::config::AuthConfig;
use crate::error::{ClientError, ClientResult};
use crate::executor::{HttpMethod, HttpRequest, HttpResponse, RequestExecutor, RequestOptions};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rust_common::{normalize, RetryPolicy};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

/// Shared handle of an in-flight authentication attempt.
type InflightAuth = Shared<BoxFuture<'static, Result<(), Arc<ClientError>>>>;

#[derive(Default)]
struct AuthState {
    token: Option<SecretString>,
    token_expiry: Option<i64>,
}

struct Inner {
    executor: Arc<dyn RequestExecutor>,
    config: AuthConfig,
    retry: RetryPolicy,
    state: RwLock<AuthState>,
    inflight: Mutex<Option<InflightAuth>>,
}

/// Client that authenticates on demand and attaches the credential to
/// every request.
///
/// Cloning is cheap; clones share the credential and the in-flight
/// authentication.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

impl AuthenticatedClient {
    /// Create a client over an executor.
    #[must_use]
    pub fn new(executor: Arc<dyn RequestExecutor>, config: AuthConfig) -> Self {
        let retry = RetryPolicy::new(config.retry.clone());
        Self {
            inner: Arc::new(Inner {
                executor,
                config,
                retry,
                state: RwLock::new(AuthState::default()),
                inflight: Mutex::new(None),
            }),
        }
    }

    /// Create a client that owns its executor.
    #[must_use]
    pub fn with_executor<E: RequestExecutor + 'static>(executor: E, config: AuthConfig) -> Self {
        Self::new(Arc::new(executor), config)
    }

    /// Authenticate eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`] if authentication fails.
    pub async fn startup(&self) -> ClientResult<()> {
        self.ensure_authenticated().await
    }

    /// Authenticate if the token is unset or within the refresh margin of
    /// its expiry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`] carrying the shared failure of
    /// the attempt this call waited on.
    pub async fn ensure_authenticated(&self) -> ClientResult<()> {
        if !self.inner.needs_authentication().await {
            return Ok(());
        }
        self.authenticate(false).await
    }

    /// Join the in-flight attempt or start one.
    ///
    /// Without `force`, freshness is re-checked under the guard so a caller
    /// arriving just after an attempt completed does not start another.
    async fn authenticate(&self, force: bool) -> ClientResult<()> {
        let attempt = {
            let mut inflight = self.inner.inflight.lock().await;

            if let Some(attempt) = inflight.as_ref() {
                debug!("Joining in-flight authentication");
                attempt.clone()
            } else {
                if !force && !self.inner.needs_authentication().await {
                    return Ok(());
                }
                let inner = Arc::clone(&self.inner);
                let attempt: BoxFuture<'static, Result<(), Arc<ClientError>>> =
                    Box::pin(async move {
                        let result = inner.fetch_token().await.map_err(Arc::new);
                        inner.inflight.lock().await.take();
                        result
                    });
                let attempt = attempt.shared();
                *inflight = Some(attempt.clone());
                attempt
            }
        };

        attempt.await.map_err(ClientError::Authentication)
    }

    /// Send a request with the credential attached.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Authentication`] if the credential cannot be
    /// obtained, or [`ClientError::Request`] with the last request failure.
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn request(&self, request: HttpRequest) -> ClientResult<HttpResponse> {
        self.ensure_authenticated().await?;

        match self.dispatch(&request).await {
            Err(err) if err.is_unauthorized() => {
                warn!("Request unauthorized, re-authenticating once");
                self.authenticate(true).await?;
                self.dispatch(&request).await
            }
            outcome => outcome,
        }
    }

    async fn dispatch(&self, request: &HttpRequest) -> ClientResult<HttpResponse> {
        let mut request = request.clone();
        request.options.headers.extend(self.inner.auth_headers().await);

        let summary = request.summary();
        let executor = &self.inner.executor;
        let response = self
            .inner
            .retry
            .execute(&summary, || executor.send(request.clone()))
            .await?;
        Ok(response)
    }

    /// GET `url`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn get(&self, url: &str, options: RequestOptions) -> ClientResult<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::Get, url).with_options(options))
            .await
    }

    /// POST `body` to `url`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn post(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> ClientResult<HttpResponse> {
        self.request(
            HttpRequest::new(HttpMethod::Post, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// PUT `body` to `url`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn put(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> ClientResult<HttpResponse> {
        self.request(
            HttpRequest::new(HttpMethod::Put, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// PATCH `url` with `body`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn patch(
        &self,
        url: &str,
        body: Value,
        options: RequestOptions,
    ) -> ClientResult<HttpResponse> {
        self.request(
            HttpRequest::new(HttpMethod::Patch, url)
                .with_body(body)
                .with_options(options),
        )
        .await
    }

    /// DELETE `url`.
    ///
    /// # Errors
    ///
    /// See [`AuthenticatedClient::request`].
    pub async fn delete(&self, url: &str, options: RequestOptions) -> ClientResult<HttpResponse> {
        self.request(HttpRequest::new(HttpMethod::Delete, url).with_options(options))
            .await
    }

    /// Whether a token is held and has not expired.
    pub async fn is_authenticated(&self) -> bool {
        let state = self.inner.state.read().await;
        match (&state.token, state.token_expiry) {
            (Some(_), Some(expiry)) => Utc::now().timestamp() < expiry,
            _ => false,
        }
    }

    /// Expiry of the held token.
    pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        let expiry = self.inner.state.read().await.token_expiry?;
        DateTime::from_timestamp(expiry, 0)
    }
}

impl Inner {
    async fn needs_authentication(&self) -> bool {
        let state = self.state.read().await;
        match (&state.token, state.token_expiry) {
            (Some(_), Some(expiry)) => {
                let margin =
                    i64::try_from(self.config.refresh_margin.as_secs()).unwrap_or(i64::MAX);
                Utc::now().timestamp().saturating_add(margin) >= expiry
            }
            _ => true,
        }
    }

    async fn auth_headers(&self) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        state
            .token
            .as_ref()
            .map(|token| (self.config.header_builder)(token.expose_secret()))
            .unwrap_or_default()
    }

    async fn fetch_token(&self) -> ClientResult<()> {
        let endpoint = &self.config.endpoint;
        let request =
            HttpRequest::new(HttpMethod::Post, endpoint).with_body((self.config.request_builder)());
        let summary = request.summary();
        info!(endpoint = %endpoint, "Authenticating");

        let result = match self
            .retry
            .execute(&summary, || self.executor.send(request.clone()))
            .await
        {
            Ok(response) => (self.config.response_extractor)(&response),
            Err(err) => Err(ClientError::from(err)),
        };

        match result {
            Ok(grant) => {
                let mut state = self.state.write().await;
                state.token = Some(SecretString::from(grant.token));
                state.token_expiry = Some(grant.expires_at);
                info!(endpoint = %endpoint, expires_at = grant.expires_at, "Authenticated");
                Ok(())
            }
            Err(err) => {
                error!(
                    endpoint = %endpoint,
                    error = %normalize(&err).to_json(),
                    "Authentication failed"
                );
                Err(err)
            }
        }
    }
}

impl fmt::Debug for AuthenticatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedClient")
            .field("config", &self.inner.config)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
