//! Token Provider seam
//!
//! The proxy never talks HTTP directly; every call goes through a
//! [`TokenProvider`] that attaches credentials. The default implementation is
//! [`BearerTokenProvider`], which sends the long-lived OAuth access token with
//! every request and enforces a per-call timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

/// One authenticated call to the Resource Service
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw answer from the Resource Service
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
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

/// Failures the provider reports instead of a response
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Credentials were refused
    #[error("credentials rejected: {0}")]
    AuthRejected(String),

    /// The call did not complete in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection or protocol failure
    #[error("request failed: {0}")]
    Network(String),
}

/// Issues authenticated requests against the Resource Service
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Send one request with credentials attached
    async fn authenticated_request(
        &self,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError>;
}

/// Sends the configured access token as a bearer credential
pub struct BearerTokenProvider {
    http_client: reqwest::Client,
    access_token: String,
}

impl BearerTokenProvider {
    pub fn new(access_token: &str, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            access_token: access_token.to_string(),
        })
    }
}

#[async_trait]
impl TokenProvider for BearerTokenProvider {
    fn name(&self) -> &str {
        "bearer"
    }

    async fn authenticated_request(
        &self,
        request: UpstreamRequest,
    ) -> Result<UpstreamResponse, TransportError> {
        let mut builder = self
            .http_client
            .request(request.method, &request.url)
            .bearer_auth(&self.access_token)
            .header("accept", "application/json")
            .query(&request.params);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(TransportError::AuthRejected(format!(
                "HTTP 401 from {}",
                request.url
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(UpstreamResponse { status, body })
    }
}
