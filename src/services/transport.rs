// src/services/transport.rs

//! HTTP transport seam shared by every source client and the remote sink.
//!
//! Clients talk to upstreams only through [`HttpTransport`], so a run can be
//! replayed against canned responses in tests.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::HttpConfig;
use crate::utils::http::create_client;

/// Query, form or header pairs.
pub type Params = [(String, String)];

/// Status and body of a completed HTTP exchange.
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

    /// Turn a non-2xx status into a transport error.
    pub fn error_for_status(self, context: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(AppError::transport(
                context,
                format!("HTTP {}: {}", self.status, snippet(&self.body)),
            ))
        }
    }

    /// Parse the body as JSON after checking the status.
    pub fn json(self, context: &str) -> Result<Value> {
        let response = self.error_for_status(context)?;
        serde_json::from_str(&response.body)
            .map_err(|e| AppError::parse(context, format!("malformed JSON: {e}")))
    }
}

/// First characters of a body, for diagnostics.
fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Minimal HTTP surface used by the collector.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET with query parameters.
    async fn get(&self, url: &str, query: &Params) -> Result<HttpResponse>;

    /// POST with an urlencoded form body.
    async fn post_form(&self, url: &str, form: &Params) -> Result<HttpResponse>;

    /// POST one JSON document with extra headers. The content type is set
    /// by the transport.
    async fn post_json(&self, url: &str, headers: &Params, body: &Value) -> Result<HttpResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the configured user agent and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
        })
    }

    async fn finish(url: &str, request: reqwest::RequestBuilder) -> Result<HttpResponse> {
        let response = request.send().await.map_err(|e| send_error(url, e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| send_error(url, e))?;
        Ok(HttpResponse { status, body })
    }
}

/// Classify a reqwest failure into the transport taxonomy.
///
/// The request URL is dropped from the reqwest error: its query string
/// carries API keys. `url` is the bare endpoint.
fn send_error(url: &str, error: reqwest::Error) -> AppError {
    let error = error.without_url();
    if error.is_timeout() {
        AppError::transport(url, format!("request timed out: {error}"))
    } else if error.is_connect() {
        AppError::transport(url, format!("connection failed: {error}"))
    } else {
        AppError::transport(url, error)
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, query: &Params) -> Result<HttpResponse> {
        Self::finish(url, self.client.get(url).query(query)).await
    }

    async fn post_form(&self, url: &str, form: &Params) -> Result<HttpResponse> {
        Self::finish(url, self.client.post(url).form(form)).await
    }

    async fn post_json(&self, url: &str, headers: &Params, body: &Value) -> Result<HttpResponse> {
        let request = headers
            .iter()
            .fold(self.client.post(url).json(body), |request, (name, value)| {
                request.header(name.as_str(), value.as_str())
            });
        Self::finish(url, request).await
    }
}

/// Build an owned parameter list from string pairs.
pub fn params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Vec<(String, String)>
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
