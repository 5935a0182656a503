//! CORS response headers.

use std::collections::BTreeMap;

use lambda_runtime::tracing::warn;

use crate::config::UpstreamConfig;

pub const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
pub const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
pub const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
pub const VARY: &str = "Vary";

/// Picks the `Access-Control-Allow-Origin` value for a request.
///
/// A request origin found in the allow-list is echoed back, `*` allows
/// anything, and every other case gets the first configured origin, which
/// the browser will then reject.
#[must_use]
pub fn resolve_origin<'a>(allowed: &'a [String], request_origin: Option<&'a str>) -> &'a str {
    let fallback = allowed.first().map_or("*", String::as_str);

    let Some(origin) = request_origin.map(|o| o.trim_end_matches('/')) else {
        return fallback;
    };

    if allowed.iter().any(|a| a == "*") {
        return "*";
    }

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(origin)) {
        origin
    } else {
        warn!(origin = %origin, "Request origin is not in the allow-list");
        fallback
    }
}

/// Builds the CORS headers attached to every response.
#[must_use]
pub fn cors_headers(config: &UpstreamConfig, request_origin: Option<&str>) -> BTreeMap<String, String> {
    let origin = resolve_origin(&config.allowed_origins, request_origin);

    let mut headers = BTreeMap::from([
        (ALLOW_ORIGIN.to_string(), origin.to_string()),
        (
            ALLOW_METHODS.to_string(),
            format!("{}, OPTIONS", config.allowed_method),
        ),
        (ALLOW_HEADERS.to_string(), config.allowed_headers.to_string()),
    ]);

    // The header value depends on the request only when several origins are allowed.
    if config.allowed_origins.len() > 1 && origin != "*" {
        headers.insert(VARY.to_string(), "Origin".to_string());
    }

    headers
}
