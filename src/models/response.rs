//! Proxy outcome and the API Gateway response it becomes.

use reqwest::StatusCode;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::error::ProxyError;

/// API Gateway proxy integration response.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

/// Outcome of one proxy call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyResult {
    /// `body` is already-serialized JSON, or empty for pre-flight.
    Success { status: StatusCode, body: String },
    Failure(ProxyError),
}

impl ProxyResult {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Success { status, .. } => *status,
            Self::Failure(err) => err.status(),
        }
    }

    /// Attaches the CORS headers and produces the response sent to the caller.
    #[must_use]
    pub fn into_response(self, mut headers: BTreeMap<String, String>) -> ProxyResponse {
        let status_code = self.status().as_u16();
        let body = match self {
            Self::Success { body, .. } => body,
            Self::Failure(err) => err.envelope().to_string(),
        };
        if !body.is_empty() {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }

        ProxyResponse {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }
}

impl From<ProxyError> for ProxyResult {
    fn from(error: ProxyError) -> Self {
        Self::Failure(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_success_has_no_content_type() {
        let response = ProxyResult::Success {
            status: StatusCode::OK,
            body: String::new(),
        }
        .into_response(BTreeMap::new());

        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert!(!response.headers.contains_key("Content-Type"));
    }

    #[test]
    fn test_failure_serializes_envelope() {
        let response = ProxyResult::from(ProxyError::MethodNotAllowed).into_response(BTreeMap::new());
        assert_eq!(response.status_code, 405);
        assert_eq!(response.body, r#"{"error":"Method Not Allowed"}"#);
        assert_eq!(response.headers["Content-Type"], "application/json");
    }

    #[test]
    fn test_response_serializes_in_gateway_shape() {
        let response = ProxyResult::Success {
            status: StatusCode::OK,
            body: "{}".to_string(),
        }
        .into_response(BTreeMap::new());

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "application/json" },
                "body": "{}",
                "isBase64Encoded": false
            })
        );
    }
}
