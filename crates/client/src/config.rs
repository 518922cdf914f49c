//! Client configuration.
//!
//! The API base URL is resolved per environment: an explicit URL wins
//! everywhere; development falls back to the local backend; production
//! without a URL is an error.
//!
//! # Environment Variables
//!
//! - `LUMINA_ENV` - `development` (default) or `production`
//! - `LUMINA_API_URL` - API base URL

use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Local backend used in development when no URL is configured.
pub const DEV_BASE_URL: &str = "http://localhost:4000";

/// Blanket request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment environment of the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(ClientError::Config(format!(
                "unknown environment '{other}'"
            ))),
        }
    }
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// Explicit API base URL; may carry whitespace or trailing slashes.
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Config pointing at an explicit base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    /// Load from `LUMINA_ENV` and `LUMINA_API_URL`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if `LUMINA_ENV` is not a known value.
    pub fn from_env() -> Result<Self, ClientError> {
        let environment = match std::env::var("LUMINA_ENV") {
            Ok(value) if !value.trim().is_empty() => value.parse()?,
            _ => Environment::default(),
        };
        let base_url = std::env::var("LUMINA_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Ok(Self {
            environment,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// The normalized base URL: trimmed, without trailing slashes.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` in production without a URL, or when
    /// the URL does not parse as http(s).
    pub fn resolve_base_url(&self) -> Result<String, ClientError> {
        let raw = match self.base_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => match self.environment {
                Environment::Development => DEV_BASE_URL,
                Environment::Production => {
                    return Err(ClientError::Config(
                        "LUMINA_API_URL must be set in production".to_string(),
                    ));
                }
            },
        };

        let normalized = raw.trim_end_matches('/');
        let parsed = Url::parse(normalized)
            .map_err(|e| ClientError::Config(format!("invalid API URL '{normalized}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "API URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        Ok(normalized.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(environment: Environment, base_url: Option<&str>) -> ClientConfig {
        ClientConfig {
            environment,
            base_url: base_url.map(String::from),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[test]
    fn test_explicit_url_is_trimmed() {
        let url = config(Environment::Production, Some("  https://api.lumina.shop/// "))
            .resolve_base_url()
            .unwrap();
        assert_eq!(url, "https://api.lumina.shop");
    }

    #[test]
    fn test_development_falls_back_to_local() {
        assert_eq!(
            config(Environment::Development, None).resolve_base_url().unwrap(),
            DEV_BASE_URL
        );
        assert_eq!(
            config(Environment::Development, Some("   ")).resolve_base_url().unwrap(),
            DEV_BASE_URL
        );
    }

    #[test]
    fn test_production_requires_url() {
        assert!(matches!(
            config(Environment::Production, None).resolve_base_url(),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(config(Environment::Development, Some("not a url")).resolve_base_url().is_err());
        assert!(config(Environment::Development, Some("ftp://lumina.shop")).resolve_base_url().is_err());
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!("Production".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().is_err());
    }
}
