use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::LazyLock;

/// A fully built outbound request to an upstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Status and raw body of an upstream answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: String,
}

/// Trait for HTTP client operations to enable testing with mocks.
///
/// This trait abstracts HTTP operations to allow dependency injection
/// for testing purposes, preventing tests from making real network calls.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send one request and return the status and body, whatever the status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the body cannot be read.
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse>;
}

/// Production HTTP client implementation using reqwest.
///
/// This client wraps `reqwest::Client` to implement the `HttpClient` trait
/// for production use.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        // The URL may carry the credential as a query parameter; keep it out of errors.
        let response = builder
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to send request to upstream API")?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read upstream response body")?;

        Ok(UpstreamResponse { status, body })
    }
}

/// Global HTTP client for production use
pub static HTTP_CLIENT: LazyLock<ReqwestClient> =
    LazyLock::new(|| ReqwestClient::new(Client::new()));
