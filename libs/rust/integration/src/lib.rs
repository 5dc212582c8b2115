//! Sample instrumented service used by the end-to-end tests.
//!
//! `OrderService` routes every public method through a
//! [`ClassInterceptor`] and calls a remote orders API through an
//! [`AuthenticatedClient`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use auth_http_client::{AuthenticatedClient, ClientError, RequestOptions};
use method_logging::{
    call_args, param_names, ClassInterceptor, InstrumentError, Instrumented, LogOptions, LogSink,
};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Order service errors.
#[derive(Error, Debug)]
pub enum OrderError {
    /// Remote call failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Instrumentation is misconfigured
    #[error(transparent)]
    Instrument(#[from] InstrumentError),

    /// Order ID failed validation
    #[error("order {0} is invalid")]
    Invalid(u32),
}

/// Orders API client with method-level logging.
pub struct OrderService {
    client: AuthenticatedClient,
    logger: Option<Arc<dyn LogSink>>,
    methods: ClassInterceptor,
}

impl Instrumented for OrderService {
    fn logger(&self) -> Option<&dyn LogSink> {
        self.logger.as_deref()
    }
}

impl OrderService {
    /// Create a service logging to `logger`.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError`] if the method registrations are invalid.
    pub fn new(
        client: AuthenticatedClient,
        logger: Option<Arc<dyn LogSink>>,
    ) -> Result<Self, InstrumentError> {
        let methods = ClassInterceptor::builder("OrderService", LogOptions::on_invoke())
            .method("list_orders", param_names!(status))
            .method_with("get_order", param_names!(id), LogOptions::default())
            .method("validate", param_names!(id))
            .method("health", &[])
            .exclude("health")
            .build()?;
        Ok(Self {
            client,
            logger,
            methods,
        })
    }

    /// List orders with a status.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Client`] if the request fails.
    pub async fn list_orders(&self, status: &str) -> Result<Value, OrderError> {
        self.methods
            .call_async("list_orders", self, &call_args![status], async {
                let options = RequestOptions::default().with_param("status", status);
                let response = self.client.get("/orders", options).await?;
                Ok::<_, OrderError>(response.data)
            })
            .await
    }

    /// Fetch one order.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Client`] if the request fails.
    pub async fn get_order(&self, id: u32) -> Result<Value, OrderError> {
        self.methods
            .call_async("get_order", self, &call_args![id], async {
                let response = self
                    .client
                    .get(&format!("/orders/{id}"), RequestOptions::default())
                    .await?;
                Ok::<_, OrderError>(response.data)
            })
            .await
    }

    /// Check an order ID locally.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::Invalid`] for ID zero.
    pub fn validate(&self, id: u32) -> Result<u32, OrderError> {
        self.methods.call("validate", self, &call_args![id], || {
            if id == 0 {
                Err(OrderError::Invalid(id))
            } else {
                Ok(id)
            }
        })
    }

    /// Liveness check; never logged.
    ///
    /// # Errors
    ///
    /// Never fails once the service is built.
    pub fn health(&self) -> Result<&'static str, OrderError> {
        self.methods.call("health", self, &[], || Ok("ok"))
    }
}
