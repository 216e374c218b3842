//! Static client configuration, set once at construction.

use std::fmt;

use crate::error::ApiError;

/// Default API root for the synthetics service.
pub const DEFAULT_BASE_URL: &str = "https://synthetics.newrelic.com/synthetics/api/v3";

/// Header carrying the account's admin API key on every request.
pub const API_KEY_HEADER: &str = "X-Api-Key";

pub const API_KEY_ENV: &str = "SYNTHETICS_API_KEY";
pub const BASE_URL_ENV: &str = "SYNTHETICS_BASE_URL";

#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
}

impl ClientConfig {
    /// Fails with `InvalidArgument` when `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ApiError::InvalidArgument(
                "synthetics api key not provided".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Read `SYNTHETICS_API_KEY` (required) and `SYNTHETICS_BASE_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let api_key = lookup(API_KEY_ENV)
            .ok_or_else(|| ApiError::InvalidArgument(format!("{API_KEY_ENV} is not set")))?;
        let config = Self::new(api_key)?;
        Ok(match lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            Some(url) => config.with_base_url(url.trim()),
            None => config,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn blank_api_key_is_rejected() {
        assert!(matches!(ClientConfig::new(""), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(ClientConfig::new("  "), Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn defaults_to_public_endpoint() {
        let config = ClientConfig::new("key").unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.api_key(), "key");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("key")
            .unwrap()
            .with_base_url("http://localhost:3000/api/");
        assert_eq!(config.base_url(), "http://localhost:3000/api");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ClientConfig::new("super-secret").unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn env_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn env_overrides_base_url() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "key"),
            (BASE_URL_ENV, "http://127.0.0.1:9000/v3/"),
        ]))
        .unwrap();
        assert_eq!(config.base_url(), "http://127.0.0.1:9000/v3");

        let config =
            ClientConfig::from_lookup(lookup(&[(API_KEY_ENV, "key"), (BASE_URL_ENV, "")])).unwrap();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
    }
}
