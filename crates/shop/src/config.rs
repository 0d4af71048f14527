//! Shop configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TERMINAL_BEARER_TOKEN` - Personal access token for the commerce API
//!
//! ## Optional
//! - `TERMINAL_ENVIRONMENT` - `production` or `dev` (default: production)
//! - `TERMINAL_BASE_URL` - Override the API base URL (e.g., a local mock)
//! - `TERMINAL_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of placeholder phrases (case-insensitive).
///
/// Tokens look like `trm_live_<random>` / `trm_test_<random>` with an
/// alphanumeric tail, so only separator-bearing phrases are matched.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "change-me",
    "change_me",
    "placeholder",
    "replace-me",
    "replace_me",
    "insert-",
    "insert_",
    "<token>",
    "xxxxx",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which deployment of the commerce API to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalEnvironment {
    #[default]
    Production,
    Dev,
}

impl TerminalEnvironment {
    /// Default API base URL for this environment.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Production => "https://api.terminal.shop",
            Self::Dev => "https://api.dev.terminal.shop",
        }
    }
}

impl FromStr for TerminalEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "dev" | "development" => Ok(Self::Dev),
            other => Err(format!("expected 'production' or 'dev', got '{other}'")),
        }
    }
}

/// Shop application configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Commerce API configuration
    pub terminal: TerminalConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Commerce API configuration.
///
/// Implements `Debug` manually to redact the bearer token.
#[derive(Clone)]
pub struct TerminalConfig {
    /// Selected deployment
    pub environment: TerminalEnvironment,
    /// API base URL (defaults to the environment's URL)
    pub base_url: Url,
    /// Bearer token sent with every request
    pub bearer_token: SecretString,
    /// Optional per-request timeout; requests wait indefinitely when unset
    pub request_timeout: Option<Duration>,
}

impl std::fmt::Debug for TerminalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalConfig")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            terminal: TerminalConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl TerminalConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = get_env_or_default("TERMINAL_ENVIRONMENT", "production")
            .parse::<TerminalEnvironment>()
            .map_err(|e| ConfigError::InvalidEnvVar("TERMINAL_ENVIRONMENT".to_string(), e))?;

        let base_url = get_optional_env("TERMINAL_BASE_URL")
            .unwrap_or_else(|| environment.base_url().to_string());
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("TERMINAL_BASE_URL".to_string(), e.to_string())
        })?;

        let request_timeout = get_optional_env("TERMINAL_REQUEST_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "TERMINAL_REQUEST_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })
            })
            .transpose()?;

        Ok(Self {
            environment,
            base_url,
            bearer_token: get_validated_secret("TERMINAL_BEARER_TOKEN")?,
            request_timeout,
        })
    }

    /// Build a configuration for an explicit base URL and token.
    ///
    /// Used by tests and tools pointing at a mock server.
    #[must_use]
    pub const fn new(base_url: Url, bearer_token: SecretString) -> Self {
        Self {
            environment: TerminalEnvironment::Production,
            base_url,
            bearer_token,
            request_timeout: None,
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the token from your account settings."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Expose the bearer token for an `Authorization` header.
pub(crate) fn bearer_header(config: &TerminalConfig) -> String {
    format!("Bearer {}", config.bearer_token.expose_secret())
}
