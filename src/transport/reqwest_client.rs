//! reqwest-backed transport
//!
//! One client per handshake run; its cookie jar carries the service session
//! from the ticket page through to the status poll.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use super::{Headers, HttpResponse, HttpTransport, TransportFailure};
use crate::config::HttpSettings;
use crate::payload::Form;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .cookie_store(settings.cookie_store)
            .user_agent(settings.user_agent.as_str())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    async fn send(request: RequestBuilder) -> Result<HttpResponse, TransportFailure> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure::Body(e.to_string()))?;
        debug!(status, bytes = body.len(), "response received");
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportFailure {
    if error.is_timeout() {
        TransportFailure::Timeout(error.to_string())
    } else {
        TransportFailure::Connect(error.to_string())
    }
}

fn header_map(headers: &Headers) -> Result<HeaderMap, TransportFailure> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let invalid = || TransportFailure::InvalidHeader { name: name.clone() };
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<HttpResponse, TransportFailure> {
        debug!(url, "GET");
        let request = self.client.get(url).headers(header_map(headers)?);
        Self::send(request).await
    }

    async fn post_form(
        &self,
        url: &str,
        headers: &Headers,
        form: &Form,
    ) -> Result<HttpResponse, TransportFailure> {
        debug!(url, fields = form.len(), "POST");
        let request = self
            .client
            .post(url)
            .headers(header_map(headers)?)
            .form(form);
        Self::send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderProfile;
    use crate::steps::StepKind;

    #[test]
    fn test_default_headers_convert() {
        let profile = HeaderProfile::default();
        for step in StepKind::ALL {
            let map = header_map(&profile.for_step(step)).unwrap();
            assert!(map.contains_key("accept"));
        }
    }

    #[test]
    fn test_invalid_header_name() {
        let mut headers = Headers::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert_eq!(
            header_map(&headers).unwrap_err(),
            TransportFailure::InvalidHeader {
                name: "bad header".to_string()
            }
        );
    }

    #[test]
    fn test_client_builds_from_defaults() {
        assert!(ReqwestTransport::new(&HttpSettings::default()).is_ok());
    }
}
