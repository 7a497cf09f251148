use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{DEFAULT_API_BASE_URL, DEFAULT_PICKER_QUALITY, DEFAULT_REQUEST_TIMEOUT_MS, TOKEN_KEY};

/// Upper bound a shell may wait for one HTTP exchange.
pub const MAX_TIMEOUT_MS: u64 = 300_000;
const MAX_TOKEN_KEY_LEN: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid API base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("picker quality {0} is outside 0..=1")]
    InvalidPickerQuality(f32),
    #[error("request timeout {0}ms is outside 1..={max}ms", max = MAX_TIMEOUT_MS)]
    InvalidTimeout(u64),
    #[error("invalid token key '{0}': must be 1..=128 characters without whitespace")]
    InvalidTokenKey(String),
}

/// Everything the core needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Url,
    pub picker_quality: f32,
    pub token_key: String,
    pub request_timeout_ms: u64,
}

// The default URL is a literal covered by the `defaults` test below.
#[allow(clippy::expect_used)]
impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL).expect("default base URL parses"),
            picker_quality: DEFAULT_PICKER_QUALITY,
            token_key: TOKEN_KEY.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Self::default().with_base_url(api_base_url)
    }

    pub fn with_base_url(mut self, api_base_url: &str) -> Result<Self, ConfigError> {
        self.api_base_url = parse_base_url(api_base_url)?;
        Ok(self)
    }

    pub fn with_picker_quality(mut self, quality: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(ConfigError::InvalidPickerQuality(quality));
        }
        self.picker_quality = quality;
        Ok(self)
    }

    pub fn with_token_key(mut self, key: &str) -> Result<Self, ConfigError> {
        check_token_key(key)?;
        self.token_key = key.to_string();
        Ok(self)
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Result<Self, ConfigError> {
        if timeout_ms == 0 || timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout(timeout_ms));
        }
        self.request_timeout_ms = timeout_ms;
        Ok(self)
    }

    /// Re-checks a config that came from deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(self.api_base_url.as_str())?;
        if !(0.0..=1.0).contains(&self.picker_quality) {
            return Err(ConfigError::InvalidPickerQuality(self.picker_quality));
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::InvalidTimeout(self.request_timeout_ms));
        }
        check_token_key(&self.token_key)
    }
}

fn check_token_key(key: &str) -> Result<(), ConfigError> {
    if key.is_empty() || key.len() > MAX_TOKEN_KEY_LEN || key.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidTokenKey(key.to_string()));
    }
    Ok(())
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:8000/");
        assert!((config.picker_quality - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.token_key, "token");
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn base_url_validation() {
        assert!(Config::new("http://192.168.1.4:8000").is_ok());
        assert!(Config::new("https://api.arogya.example/v1/").is_ok());
        assert!(matches!(
            Config::new("ftp://host"),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(Config::new("not a url").is_err());
        assert!(Config::new("http://host:8000/?debug=1").is_err());
    }

    #[test]
    fn quality_and_timeout_bounds() {
        assert!(Config::default().with_picker_quality(1.2).is_err());
        assert!(Config::default().with_picker_quality(f32::NAN).is_err());
        assert!(Config::default().with_picker_quality(0.5).is_ok());

        assert!(Config::default().with_request_timeout_ms(0).is_err());
        assert!(Config::default().with_request_timeout_ms(MAX_TIMEOUT_MS + 1).is_err());
        assert!(Config::default().with_request_timeout_ms(5_000).is_ok());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url":"http://10.0.2.2:8000","token_key":"session"}"#)
                .unwrap();
        assert_eq!(config.api_base_url.host_str(), Some("10.0.2.2"));
        assert_eq!(config.token_key, "session");
        assert!((config.picker_quality - DEFAULT_PICKER_QUALITY).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);
    }

    #[test]
    fn token_key_validation() {
        assert_eq!(
            Config::default().with_token_key("auth_token").unwrap().token_key,
            "auth_token"
        );
        assert!(matches!(
            Config::default().with_token_key(""),
            Err(ConfigError::InvalidTokenKey(_))
        ));
        assert!(Config::default().with_token_key("two words").is_err());

        let mut config = Config::default();
        config.token_key = String::new();
        assert!(config.validate().is_err());
    }
}
