//! Inbound request decoded from an API Gateway or Function URL event.

use anyhow::{Context, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::models::error::ProxyError;

/// API Gateway proxy event, REST (v1) and HTTP API / Function URL (v2) shapes.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GatewayEvent {
    /// v1 only
    http_method: Option<String>,
    request_context: Option<RequestContext>,
    headers: Option<HashMap<String, String>>,
    body: Option<Value>,
    #[serde(default)]
    is_base64_encoded: bool,
}

#[derive(Deserialize, Debug)]
struct RequestContext {
    /// v2 only
    http: Option<HttpContext>,
}

#[derive(Deserialize, Debug)]
struct HttpContext {
    method: Option<String>,
}

/// A decoded inbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub method: Method,
    /// Header names are lowercased.
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl ProxyRequest {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HashMap::new(),
            body: None,
            is_base64_encoded: false,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Decodes a Lambda event payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is not an HTTP proxy event or carries
    /// an unknown method.
    pub fn from_event(payload: Value) -> Result<Self> {
        let event: GatewayEvent =
            serde_json::from_value(payload).context("Event is not an HTTP proxy event")?;

        let method_name = event
            .http_method
            .or_else(|| event.request_context.and_then(|rc| rc.http).and_then(|h| h.method))
            .context("Event has no HTTP method")?;
        let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("Invalid HTTP method: {method_name}"))?;

        let headers = event
            .headers
            .unwrap_or_default()
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();

        // Direct invocations may pass the body as a JSON value rather than a string.
        let body = match event.body {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        };

        Ok(Self {
            method,
            headers,
            body,
            is_base64_encoded: event.is_base64_encoded,
        })
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parses the body as JSON. A missing or blank body yields `None`.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::InvalidBody` if the body is base64-encoded or not JSON.
    pub fn json_body(&self) -> Result<Option<Value>, ProxyError> {
        let Some(body) = self.body.as_deref().filter(|b| !b.trim().is_empty()) else {
            return Ok(None);
        };
        if self.is_base64_encoded {
            return Err(ProxyError::InvalidBody(
                "base64-encoded bodies are not supported".to_string(),
            ));
        }
        serde_json::from_str(body)
            .map(Some)
            .map_err(|e| ProxyError::InvalidBody(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_rest_api_event() {
        let request = ProxyRequest::from_event(json!({
            "httpMethod": "GET",
            "path": "/api/hobbies",
            "headers": { "Origin": "https://site.webflow.io" },
            "body": null,
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.header("origin"), Some("https://site.webflow.io"));
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_from_http_api_event() {
        let request = ProxyRequest::from_event(json!({
            "version": "2.0",
            "rawPath": "/api/generate-description",
            "requestContext": { "http": { "method": "post" } },
            "headers": { "content-type": "application/json" },
            "body": "{\"prompt\":\"hi\"}",
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        assert_eq!(request.json_body().unwrap(), Some(json!({ "prompt": "hi" })));
    }

    #[test]
    fn test_from_event_with_object_body() {
        let request = ProxyRequest::from_event(json!({
            "httpMethod": "POST",
            "body": { "prompt": "hi" }
        }))
        .unwrap();

        assert_eq!(request.json_body().unwrap(), Some(json!({ "prompt": "hi" })));
    }

    #[test]
    fn test_from_event_without_method() {
        let err = ProxyRequest::from_event(json!({ "body": "{}" })).unwrap_err();
        assert!(err.to_string().contains("no HTTP method"));
    }

    #[test]
    fn test_json_body_invalid() {
        let request = ProxyRequest::new(Method::POST).with_body("not json");
        assert!(matches!(request.json_body(), Err(ProxyError::InvalidBody(_))));
    }

    #[test]
    fn test_json_body_blank_is_none() {
        let request = ProxyRequest::new(Method::POST).with_body("  ");
        assert_eq!(request.json_body().unwrap(), None);
    }

    #[test]
    fn test_json_body_base64_rejected() {
        let mut request = ProxyRequest::new(Method::POST).with_body("eyJwcm9tcHQiOiJoaSJ9");
        request.is_base64_encoded = true;
        assert!(matches!(request.json_body(), Err(ProxyError::InvalidBody(_))));
    }
}
