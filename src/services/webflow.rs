//! Webflow CMS collection listing (read proxy).

use reqwest::Method;

use crate::config::{
    CredentialPlacement, RESOURCE_ID_PLACEHOLDER, Setting, SuccessMapping, UpstreamConfig,
    allowed_origins_from_lookup, optional_from_lookup,
};

pub const API_TOKEN_VAR: &str = "WEBFLOW_API_TOKEN";
pub const COLLECTION_ID_VAR: &str = "WEBFLOW_COLLECTION_ID";
pub const BASE_URL_VAR: &str = "WEBFLOW_API_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://api.webflow.com";

pub const UPSTREAM_ERROR: &str = "Failed to fetch data from Webflow API";

/// Browsers embedding the site send the wider header set.
const ALLOWED_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Authorization";

/// Builds the hobbies proxy configuration from the process environment.
#[must_use]
pub fn config_from_env() -> UpstreamConfig {
    config_from_lookup(|name| std::env::var(name).ok())
}

/// Builds the hobbies proxy configuration from `lookup`.
#[must_use]
pub fn config_from_lookup<F>(lookup: F) -> UpstreamConfig
where
    F: Fn(&str) -> Option<String>,
{
    let base_url = optional_from_lookup(BASE_URL_VAR, DEFAULT_BASE_URL, &lookup);

    UpstreamConfig {
        service: "hobbies",
        url_template: format!("{base_url}/collections/{RESOURCE_ID_PLACEHOLDER}/items?live=true"),
        credential: Setting::lookup(API_TOKEN_VAR, &lookup),
        credential_placement: CredentialPlacement::BearerHeader,
        resource_id: Some(Setting::lookup(COLLECTION_ID_VAR, &lookup)),
        allowed_origins: allowed_origins_from_lookup(&lookup),
        allowed_method: Method::GET,
        allowed_headers: ALLOWED_HEADERS,
        upstream_headers: vec![
            ("accept", "application/json".to_string()),
            (
                "User-Agent",
                format!("lambda-cors-proxy/{}", env!("CARGO_PKG_VERSION")),
            ),
            ("Accept-Version", "1.0.0".to_string()),
        ],
        payload_builder: None,
        success_mapping: SuccessMapping::Relay,
        upstream_error: UPSTREAM_ERROR,
    }
}
