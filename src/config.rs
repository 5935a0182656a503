//! Per-service proxy configuration.
//!
//! An [`UpstreamConfig`] is built once at startup and shared by every
//! invocation. Constructors take a lookup function instead of reading the
//! process environment directly, so tests can feed values from a map.

use lambda_runtime::tracing::warn;
use reqwest::Method;
use serde_json::Value;
use std::fmt;

use crate::models::error::ProxyError;

/// Placeholder in [`UpstreamConfig::url_template`] replaced by the resource id.
pub const RESOURCE_ID_PLACEHOLDER: &str = "{resource_id}";

/// Origin allowed when `ALLOWED_ORIGIN` is not set.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://webflow-portfolio-site---project.webflow.io";

pub const ALLOWED_ORIGIN_VAR: &str = "ALLOWED_ORIGIN";

/// Request headers browsers may send, when a service does not widen the list.
pub const DEFAULT_ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Maps the inbound JSON body onto the upstream payload, validating it.
pub type PayloadBuilder = fn(Option<&Value>) -> Result<Value, ProxyError>;

/// Where the credential goes on the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// `Authorization: Bearer <token>`
    BearerHeader,
    /// `?<name>=<token>` appended to the URL.
    QueryParam(&'static str),
}

/// How a 2xx upstream answer is turned into the proxy response body.
#[derive(Debug, Clone, Copy)]
pub enum SuccessMapping {
    /// Send the upstream JSON body back unchanged.
    Relay,
    /// Pull one string out of the upstream JSON and answer `{"generatedText": ...}`.
    ExtractText(fn(&Value) -> String),
}

/// A required setting together with the environment variable it came from.
#[derive(Clone, PartialEq, Eq)]
pub struct Setting {
    pub name: &'static str,
    pub value: Option<String>,
}

// Values are credentials; never print them.
impl fmt::Debug for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setting")
            .field("name", &self.name)
            .field("value", &self.value.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Setting {
    /// Reads `name` through `lookup`. Blank values count as absent.
    #[must_use]
    pub fn lookup<F>(name: &'static str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self { name, value }
    }

    #[must_use]
    pub fn present(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: Some(value.into()),
        }
    }

    #[must_use]
    pub const fn absent(name: &'static str) -> Self {
        Self { name, value: None }
    }

    /// Returns the value or a configuration error naming the variable.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Configuration` when the setting is absent.
    pub fn require(&self) -> Result<&str, ProxyError> {
        self.value
            .as_deref()
            .ok_or_else(|| ProxyError::Configuration(self.name.to_string()))
    }
}

/// Static description of one proxy instance.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Short service name used in logs.
    pub service: &'static str,
    /// Upstream URL with an optional `{resource_id}` placeholder.
    pub url_template: String,
    pub credential: Setting,
    pub credential_placement: CredentialPlacement,
    /// Substituted into the URL template. `None` when the template has no placeholder.
    pub resource_id: Option<Setting>,
    /// Browser origins allowed to call this proxy. The first entry is the default.
    pub allowed_origins: Vec<String>,
    pub allowed_method: Method,
    pub allowed_headers: &'static str,
    /// Fixed headers sent on every upstream request.
    pub upstream_headers: Vec<(&'static str, String)>,
    /// `None` for read-only proxies, which send no body.
    pub payload_builder: Option<PayloadBuilder>,
    pub success_mapping: SuccessMapping,
    /// Generic description placed in the `error` field of upstream failures.
    pub upstream_error: &'static str,
}

impl UpstreamConfig {
    /// Checks every required setting, returning the credential and resource id.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError::Configuration` naming the first missing variable.
    pub fn require_settings(&self) -> Result<(&str, Option<&str>), ProxyError> {
        let credential = self.credential.require()?;
        let resource_id = self.resource_id.as_ref().map(Setting::require).transpose()?;
        Ok((credential, resource_id))
    }
}

/// Parses a comma-separated origin list, falling back to the default origin.
#[must_use]
pub fn allowed_origins_from_lookup<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    let origins: Vec<String> = lookup(ALLOWED_ORIGIN_VAR)
        .unwrap_or_default()
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect();

    if origins.is_empty() {
        warn!(
            default = DEFAULT_ALLOWED_ORIGIN,
            "ALLOWED_ORIGIN not set, using default origin"
        );
        vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
    } else {
        origins
    }
}

/// Reads an optional setting, falling back to `default` when blank or unset.
#[must_use]
pub fn optional_from_lookup<F>(name: &str, default: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().trim_end_matches('/').to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_blank_setting_is_absent() {
        let setting = Setting::lookup("TOKEN", lookup_from(&[("TOKEN", "   ")]));
        assert_eq!(setting.value, None);
        assert_eq!(
            setting.require(),
            Err(ProxyError::Configuration("TOKEN".to_string()))
        );
    }

    #[test]
    fn test_setting_is_trimmed() {
        let setting = Setting::lookup("TOKEN", lookup_from(&[("TOKEN", " abc \n")]));
        assert_eq!(setting.require(), Ok("abc"));
    }

    #[test]
    fn test_setting_debug_redacts_value() {
        let setting = Setting::present("GEMINI_API_KEY", "secret-key");
        let printed = format!("{setting:?}");
        assert!(printed.contains("GEMINI_API_KEY"));
        assert!(!printed.contains("secret-key"));
    }

    #[test]
    fn test_allowed_origins_default() {
        assert_eq!(
            allowed_origins_from_lookup(lookup_from(&[])),
            vec![DEFAULT_ALLOWED_ORIGIN.to_string()]
        );
    }

    #[test]
    fn test_allowed_origins_list() {
        let origins = allowed_origins_from_lookup(lookup_from(&[(
            ALLOWED_ORIGIN_VAR,
            "https://site.webflow.io/, http://localhost:3000,,",
        )]));
        assert_eq!(
            origins,
            vec![
                "https://site.webflow.io".to_string(),
                "http://localhost:3000".to_string()
            ]
        );
    }

    #[test]
    fn test_optional_from_lookup() {
        assert_eq!(
            optional_from_lookup("BASE", "https://default", lookup_from(&[])),
            "https://default"
        );
        assert_eq!(
            optional_from_lookup("BASE", "https://default", lookup_from(&[("BASE", "http://x/")])),
            "http://x"
        );
    }
}
