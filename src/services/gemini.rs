//! Gemini `generateContent` text generation (generation proxy).

use reqwest::Method;
use serde_json::{Value, json};

use crate::config::{
    CredentialPlacement, DEFAULT_ALLOWED_HEADERS, RESOURCE_ID_PLACEHOLDER, Setting,
    SuccessMapping, UpstreamConfig, allowed_origins_from_lookup, optional_from_lookup,
};
use crate::models::error::ProxyError;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
pub const MODEL_VAR: &str = "GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "GEMINI_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

pub const UPSTREAM_ERROR: &str = "Failed to get response from Gemini API";

/// Location of the first candidate's text in a `generateContent` answer.
pub const GENERATED_TEXT_POINTER: &str = "/candidates/0/content/parts/0/text";
pub const NO_CONTENT: &str = "No content generated.";

/// Builds the description generator configuration from the process environment.
#[must_use]
pub fn config_from_env() -> UpstreamConfig {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Builds the description generator configuration from `lookup`.
#[must_use]
pub fn config_from_lookup<F>(lookup: F) -> UpstreamConfig
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = optional_from_lookup(BASE_URL_VAR, DEFAULT_BASE_URL, &lookup);
    let model = optional_from_lookup(MODEL_VAR, DEFAULT_MODEL, &lookup);

    UpstreamConfig {
        service: "generate-description",
        url_template: format!("{base_url}/v1beta/models/{RESOURCE_ID_PLACEHOLDER}:generateContent"),
        credential: Setting::lookup(API_KEY_VAR, &lookup),
        credential_placement: CredentialPlacement::QueryParam("key"),
        resource_id: Some(Setting::present(MODEL_VAR, model)),
        allowed_origins: allowed_origins_from_lookup(&lookup),
        allowed_method: Method::POST,
        allowed_headers: DEFAULT_ALLOWED_HEADERS,
        upstream_headers: vec![("Content-Type", "application/json".to_string())],
        payload_builder: Some(build_payload),
        success_mapping: SuccessMapping::ExtractText(extract_generated_text),
        upstream_error: UPSTREAM_ERROR,
    }
}

/// Turns `{"prompt": "..."}` into a single-turn `generateContent` payload.
///
/// # Errors
///
/// Returns `ProxyError::MissingField("Prompt")` when `prompt` is absent,
/// not a string, or empty.
pub fn build_payload(body: Option<&Value>) -> Result<Value, ProxyError> {
    let prompt = body
        .and_then(|b| b.get("prompt"))
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .ok_or(ProxyError::MissingField("Prompt"))?;

    Ok(json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": prompt }]
        }],
        "generationConfig": {}
    }))
}

/// Extracts the first candidate's text, or the fallback message when it is
/// absent or empty.
#[must_use]
pub fn extract_generated_text(response: &Value) -> String {
    response
        .pointer(GENERATED_TEXT_POINTER)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .unwrap_or(NO_CONTENT)
        .to_string()
}
