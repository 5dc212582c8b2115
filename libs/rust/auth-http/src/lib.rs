//! Authenticated HTTP client.
//!
//! [`AuthenticatedClient`] issues requests through a [`RequestExecutor`],
//! obtaining a bearer credential on demand, refreshing it before expiry,
//! coalescing concurrent authentication attempts and recovering once from a
//! 401. Every raw call, authentication included, goes through the transport
//! retry policy from `rust-common`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod reqwest_executor;

pub use client::AuthenticatedClient;
pub use config::{
    bearer_headers, AuthConfig, HeaderBuilder, RequestBuilder, ResponseExtractor, TokenGrant,
};
pub use error::{ClientError, ClientResult};
pub use executor::{HttpMethod, HttpRequest, HttpResponse, RequestExecutor, RequestOptions};
pub use reqwest_executor::{build_http_client, HttpConfig, ReqwestExecutor};
