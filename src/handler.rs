use lambda_runtime::tracing::{debug, error, info, warn};
use lambda_runtime::{Diagnostic, LambdaEvent};
use reqwest::{Method, StatusCode};
use serde::de::IgnoredAny;
use serde_json::{Value, json};

use crate::config::{CredentialPlacement, RESOURCE_ID_PLACEHOLDER, SuccessMapping, UpstreamConfig};
use crate::cors::cors_headers;
use crate::http::{HttpClient, UpstreamRequest, UpstreamResponse};
use crate::models::{ProxyError, ProxyRequest, ProxyResponse, ProxyResult};

/// Runs one request through the proxy and attaches CORS headers to the result.
///
/// Never fails: every error ends up as a JSON envelope with the matching status.
pub async fn handle(
    request: &ProxyRequest,
    config: &UpstreamConfig,
    client: &dyn HttpClient,
) -> ProxyResponse {
    let cors = cors_headers(config, request.header("origin"));
    proxy(request, config, client).await.into_response(cors)
}

/// Produces the outcome of one request, making at most one upstream call.
pub async fn proxy(
    request: &ProxyRequest,
    config: &UpstreamConfig,
    client: &dyn HttpClient,
) -> ProxyResult {
    // Pre-flight never depends on configuration.
    if request.method == Method::OPTIONS {
        debug!(service = config.service, "Answering CORS pre-flight");
        return ProxyResult::Success {
            status: StatusCode::OK,
            body: String::new(),
        };
    }

    match forward(request, config, client).await {
        Ok(result) => result,
        Err(err) => {
            log_failure(config, &err);
            err.into()
        }
    }
}

async fn forward(
    request: &ProxyRequest,
    config: &UpstreamConfig,
    client: &dyn HttpClient,
) -> Result<ProxyResult, ProxyError> {
    if request.method != config.allowed_method {
        return Err(ProxyError::MethodNotAllowed);
    }

    let (credential, resource_id) = config.require_settings()?;

    let payload = match config.payload_builder {
        Some(build) => Some(build(request.json_body()?.as_ref())?),
        None => None,
    };

    let upstream_request = build_upstream_request(config, credential, resource_id, payload);
    let response = client.send(upstream_request).await?;
    info!(
        service = config.service,
        status = response.status.as_u16(),
        "Received upstream response"
    );

    if !response.status.is_success() {
        return Err(upstream_failure(config, &response));
    }

    map_success(config.success_mapping, &response.body)
}

/// Builds the single outbound request for a validated call.
#[must_use]
pub fn build_upstream_request(
    config: &UpstreamConfig,
    credential: &str,
    resource_id: Option<&str>,
    payload: Option<Value>,
) -> UpstreamRequest {
    let mut url = resource_id.map_or_else(
        || config.url_template.clone(),
        |id| {
            config
                .url_template
                .replace(RESOURCE_ID_PLACEHOLDER, &urlencoding::encode(id))
        },
    );
    debug!(service = config.service, url = %url, "Calling upstream");

    let mut headers: Vec<(String, String)> = config
        .upstream_headers
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect();

    match config.credential_placement {
        CredentialPlacement::BearerHeader => {
            headers.push(("Authorization".to_string(), format!("Bearer {credential}")));
        }
        CredentialPlacement::QueryParam(name) => {
            let separator = if url.contains('?') { '&' } else { '?' };
            url = format!("{url}{separator}{name}={}", urlencoding::encode(credential));
        }
    }

    UpstreamRequest {
        method: config.allowed_method.clone(),
        url,
        headers,
        body: payload,
    }
}

/// Pulls the most specific message out of an upstream error body.
///
/// Looks for `error.message`, `message`, then a string `error`; anything else
/// is returned as raw text.
#[must_use]
pub fn upstream_details(status: StatusCode, body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Unknown upstream error")
            .to_string();
    }

    let message = serde_json::from_str::<Value>(trimmed).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .or_else(|| value.get("message").and_then(Value::as_str))
            .or_else(|| value.get("error").and_then(Value::as_str))
            .map(str::to_string)
    });

    message.unwrap_or_else(|| trimmed.to_string())
}

fn upstream_failure(config: &UpstreamConfig, response: &UpstreamResponse) -> ProxyError {
    ProxyError::Upstream {
        status: response.status,
        description: config.upstream_error,
        details: upstream_details(response.status, &response.body),
    }
}

fn map_success(mapping: SuccessMapping, body: &str) -> Result<ProxyResult, ProxyError> {
    let body = match mapping {
        SuccessMapping::Relay => {
            // Relayed byte-for-byte; only checked to be JSON.
            serde_json::from_str::<IgnoredAny>(body).map_err(|e| {
                ProxyError::Transport(format!("Upstream returned invalid JSON: {e}"))
            })?;
            body.to_string()
        }
        SuccessMapping::ExtractText(extract) => {
            let value: Value = serde_json::from_str(body).map_err(|e| {
                ProxyError::Transport(format!("Upstream returned invalid JSON: {e}"))
            })?;
            json!({ "generatedText": extract(&value) }).to_string()
        }
    };

    Ok(ProxyResult::Success {
        status: StatusCode::OK,
        body,
    })
}

fn log_failure(config: &UpstreamConfig, err: &ProxyError) {
    match err {
        ProxyError::MethodNotAllowed | ProxyError::MissingField(_) | ProxyError::InvalidBody(_) => {
            warn!(service = config.service, error = %err, "Rejected request");
        }
        ProxyError::Configuration(_) => {
            error!(service = config.service, error = %err, "Proxy is misconfigured");
        }
        ProxyError::Upstream { .. } => {
            error!(service = config.service, error = %err, "Upstream API error");
        }
        ProxyError::Transport(_) => {
            error!(service = config.service, error = %err, "Proxy request failed");
        }
    }
}

/// Lambda event handler. Decodes an API Gateway or Function URL event and
/// proxies it through `config`.
/// Logs full event when `RUST_LOG=debug/trace`, only the method in production.
///
/// # Errors
///
/// Returns a `Diagnostic` with `error_type` `InvalidInput` when the event is
/// not an HTTP proxy event. Every HTTP-level failure is a normal response.
pub async fn function_handler(
    event: LambdaEvent<Value>,
    config: &UpstreamConfig,
    client: &dyn HttpClient,
) -> Result<ProxyResponse, Diagnostic> {
    let (payload, context) = event.into_parts();
    debug!(request_id = %context.request_id, "Received event: {:?}", payload);

    let request = ProxyRequest::from_event(payload).map_err(|e| {
        error!(error = %format!("{e:#}"), "Failed to decode event");
        Diagnostic {
            error_type: "InvalidInput".to_string(),
            error_message: format!("{e:#}"),
        }
    })?;

    info!(
        service = config.service,
        method = %request.method,
        "Handling proxy request"
    );

    Ok(handle(&request, config, client).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_details_nested_error_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid"}}"#;
        assert_eq!(
            upstream_details(StatusCode::BAD_REQUEST, body),
            "API key not valid"
        );
    }

    #[test]
    fn test_upstream_details_top_level_message() {
        assert_eq!(
            upstream_details(StatusCode::NOT_FOUND, r#"{"message":"not found"}"#),
            "not found"
        );
    }

    #[test]
    fn test_upstream_details_string_error() {
        assert_eq!(
            upstream_details(StatusCode::UNAUTHORIZED, r#"{"error":"bad token"}"#),
            "bad token"
        );
    }

    #[test]
    fn test_upstream_details_skips_non_string_candidates() {
        assert_eq!(
            upstream_details(StatusCode::UNAUTHORIZED, r#"{"message":5,"error":"bad token"}"#),
            "bad token"
        );
        assert_eq!(
            upstream_details(
                StatusCode::BAD_REQUEST,
                r#"{"error":{"code":400},"message":"quota exceeded"}"#
            ),
            "quota exceeded"
        );
    }

    #[test]
    fn test_upstream_details_raw_text() {
        assert_eq!(
            upstream_details(StatusCode::BAD_GATEWAY, "  upstream exploded \n"),
            "upstream exploded"
        );
    }

    #[test]
    fn test_upstream_details_unrecognised_json_is_raw() {
        assert_eq!(
            upstream_details(StatusCode::CONFLICT, r#"{"code":"E1"}"#),
            r#"{"code":"E1"}"#
        );
    }

    #[test]
    fn test_upstream_details_empty_body() {
        assert_eq!(
            upstream_details(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    fn shout(value: &Value) -> String {
        value["text"].as_str().unwrap_or_default().to_uppercase()
    }

    #[test]
    fn test_extract_text_wraps_result() {
        let result = map_success(SuccessMapping::ExtractText(shout), r#"{"text":"hi"}"#).unwrap();
        assert_eq!(
            result,
            ProxyResult::Success {
                status: StatusCode::OK,
                body: r#"{"generatedText":"HI"}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_extract_text_rejects_non_json() {
        let err = map_success(SuccessMapping::ExtractText(shout), "oops").unwrap_err();
        assert!(matches!(err, ProxyError::Transport(_)));
    }

    #[test]
    fn test_relay_rejects_non_json() {
        let err = map_success(SuccessMapping::Relay, "<html>").unwrap_err();
        assert!(matches!(err, ProxyError::Transport(_)));
    }
}
