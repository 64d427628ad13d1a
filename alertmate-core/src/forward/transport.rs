//! HTTP transport for the ingestion endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::config::ForwarderConfig;
use crate::error::{Error, Result};

/// Content type of every forwarded body
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Sends one serialized event to an endpoint.
///
/// Implementations return the response status for any completed exchange and
/// an error only when no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, endpoint: &str, body: String) -> Result<StatusCode>;
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport from configuration
    pub fn new(config: &ForwarderConfig) -> Result<Self> {
        config.validate()?;
        Self::with_timeout(config.timeout())
    }

    /// Create a transport with an optional request timeout
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, endpoint: &str, body: String) -> Result<StatusCode> {
        let response = self
            .http_client
            .post(endpoint)
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Forward(format!("HTTP request failed: {}", e)))?;

        Ok(response.status())
    }
}
