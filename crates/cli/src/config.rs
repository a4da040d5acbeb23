//! Pipeline configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `SHOP_LEDGER_CLIENTS_URL` - Page holding the client table (default: `https://bigdatalab.ai/assignment_pd001_data/`)
//! - `SHOP_LEDGER_API_URL` - REST API base (default: `https://fakestoreapi.com`)
//! - `SHOP_LEDGER_OUTPUT_DIR` - Directory the CSV files are written to (default: `.`)
//! - `SHOP_LEDGER_REQUEST_DELAY_MS` - Pause between per-record API requests (default: 7000)
//! - `SHOP_LEDGER_STAGE_DELAY_MS` - Pause between pipeline stages (default: 3000)
//! - `SHOP_LEDGER_PAGE_DELAY_MS` - Pause between client table pages (default: 2000)
//! - `SHOP_LEDGER_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SHOP_LEDGER_MAX_RETRIES` - Retries on rate limiting and transport errors (default: 2)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CLIENTS_URL: &str = "https://bigdatalab.ai/assignment_pd001_data/";
const DEFAULT_API_URL: &str = "https://fakestoreapi.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Page holding the paginated client table
    pub clients_url: Url,
    /// Base URL of the carts/users/products API
    pub api_url: Url,
    /// Directory the output tables are written to
    pub output_dir: PathBuf,
    /// Pause between per-record API requests
    pub request_delay: Duration,
    /// Pause between pipeline stages
    pub stage_delay: Duration,
    /// Pause between client table pages
    pub page_delay: Duration,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Retries per request on rate limiting or transport failure
    pub max_retries: u32,
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        Ok(Self {
            clients_url: env.url("SHOP_LEDGER_CLIENTS_URL", DEFAULT_CLIENTS_URL)?,
            api_url: env.url("SHOP_LEDGER_API_URL", DEFAULT_API_URL)?,
            output_dir: PathBuf::from(env.get_or_default("SHOP_LEDGER_OUTPUT_DIR", ".")),
            request_delay: Duration::from_millis(env.parsed("SHOP_LEDGER_REQUEST_DELAY_MS", 7000)?),
            stage_delay: Duration::from_millis(env.parsed("SHOP_LEDGER_STAGE_DELAY_MS", 3000)?),
            page_delay: Duration::from_millis(env.parsed("SHOP_LEDGER_PAGE_DELAY_MS", 2000)?),
            http_timeout: Duration::from_secs(env.parsed("SHOP_LEDGER_HTTP_TIMEOUT_SECS", 10)?),
            max_retries: env.parsed("SHOP_LEDGER_MAX_RETRIES", 2)?,
        })
    }

    /// Zero every pause. Used for fixture runs and `--no-delay`.
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.request_delay = Duration::ZERO;
        self.stage_delay = Duration::ZERO;
        self.page_delay = Duration::ZERO;
        self
    }

    /// Endpoint URL under the API base, e.g. `carts` or `users/3`.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is not valid.
    pub fn api_endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let mut base = self.api_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional environment variable; blank values count as unset.
    fn get_optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get an environment variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.get_optional(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get_optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    fn url(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let raw = self.get_or_default(key, default);
        let url = Url::parse(raw.trim())
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<PipelineConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        PipelineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.clients_url.as_str(), DEFAULT_CLIENTS_URL);
        assert_eq!(config.api_url.as_str(), "https://fakestoreapi.com/");
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.request_delay, Duration::from_secs(7));
        assert_eq!(config.stage_delay, Duration::from_secs(3));
        assert_eq!(config.page_delay, Duration::from_secs(2));
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("SHOP_LEDGER_API_URL", "http://localhost:8080/api"),
            ("SHOP_LEDGER_OUTPUT_DIR", "/tmp/out"),
            ("SHOP_LEDGER_REQUEST_DELAY_MS", "250"),
            ("SHOP_LEDGER_MAX_RETRIES", " 5 "),
        ])
        .unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/api");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.request_delay, Duration::from_millis(250));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = config_from(&[("SHOP_LEDGER_STAGE_DELAY_MS", "  ")]).unwrap();
        assert_eq!(config.stage_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("SHOP_LEDGER_PAGE_DELAY_MS", "soon")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOP_LEDGER_PAGE_DELAY_MS")
        );
    }

    #[test]
    fn test_invalid_url() {
        let err = config_from(&[("SHOP_LEDGER_CLIENTS_URL", "not a url")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "SHOP_LEDGER_CLIENTS_URL")
        );

        let err = config_from(&[("SHOP_LEDGER_API_URL", "ftp://example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, ref reason) if reason.contains("ftp")));
    }

    #[test]
    fn test_without_delays() {
        let config = config_from(&[]).unwrap().without_delays();
        assert_eq!(config.request_delay, Duration::ZERO);
        assert_eq!(config.stage_delay, Duration::ZERO);
        assert_eq!(config.page_delay, Duration::ZERO);
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_api_endpoint() {
        let config = config_from(&[]).unwrap();
        assert_eq!(
            config.api_endpoint("users/3").unwrap().as_str(),
            "https://fakestoreapi.com/users/3"
        );

        let nested = config_from(&[("SHOP_LEDGER_API_URL", "http://localhost:8080/api")]).unwrap();
        assert_eq!(
            nested.api_endpoint("carts").unwrap().as_str(),
            "http://localhost:8080/api/carts"
        );
    }
}
