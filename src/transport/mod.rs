//! HTTP boundary
//!
//! Steps only see [`HttpTransport`]. TLS, redirects, cookies and connection
//! reuse belong to the implementation.

pub mod reqwest_client;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::payload::Form;

pub use reqwest_client::ReqwestTransport;

/// Request headers, name → value
pub type Headers = BTreeMap<String, String>;

/// Status and decoded text of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The exchange never produced a response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("invalid header '{name}'")]
    InvalidHeader { name: String },

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, headers: &Headers) -> Result<HttpResponse, TransportFailure>;

    /// POST `form` as `application/x-www-form-urlencoded`
    async fn post_form(
        &self,
        url: &str,
        headers: &Headers,
        form: &Form,
    ) -> Result<HttpResponse, TransportFailure>;
}
