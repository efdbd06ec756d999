//! Defines the core runtime `Config` struct, its defaults, and related utilities.
//! Submodules handle loading, building, and validation.

pub(crate) mod builder;
pub(crate) mod file;
pub(crate) mod loading;
pub(crate) mod validation;

pub use builder::ConfigBuilder;
pub use file::ConfigFile;

use crate::core::error::Result;
use std::time::Duration;

/// Most recent results kept after a bulk job completes.
pub const BULK_RESULTS_CAP: usize = 1000;

/// Most recent results kept after a single-email check.
///
/// Deliberately distinct from [`BULK_RESULTS_CAP`]; the single path truncates
/// the whole accumulated list to this size.
pub const SINGLE_RESULTS_CAP: usize = 50;

/// Largest batch accepted for one bulk job.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Fixed period between job status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Per-request HTTP timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration settings used by the verification client.
#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub token_file: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,

    pub poll_interval: Duration,
    /// Zero means unlimited.
    pub max_poll_attempts: u32,
    /// Zero means unlimited.
    pub max_consecutive_poll_errors: u32,
    pub poll_timeout: Option<Duration>,

    pub max_batch_size: usize,
    pub bulk_results_cap: usize,
    pub single_results_cap: usize,
    pub max_concurrency: usize,

    pub loaded_config_path: Option<String>,
}

impl Config {
    fn build_default() -> Self {
        Config {
            api_base_url: "http://localhost:8080".to_string(),
            api_token: None,
            token_file: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("bulk-verify/{}", env!("CARGO_PKG_VERSION")),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: 600,
            max_consecutive_poll_errors: 10,
            poll_timeout: None,
            max_batch_size: MAX_BATCH_SIZE,
            bulk_results_cap: BULK_RESULTS_CAP,
            single_results_cap: SINGLE_RESULTS_CAP,
            max_concurrency: std::thread::available_parallelism()
                .map_or(1, |n| n.get())
                .max(1),
            loaded_config_path: None,
        }
    }

    /// Resolves the bearer token: an explicit token wins, otherwise the
    /// trimmed contents of `token_file`. Returns `Ok(None)` when neither is set.
    pub fn resolve_token(&self) -> Result<Option<String>> {
        if let Some(ref token) = self.api_token {
            let token = token.trim();
            if !token.is_empty() {
                return Ok(Some(token.to_string()));
            }
        }
        if let Some(ref path) = self.token_file {
            tracing::debug!("Reading API token from file: {}", path);
            let content = std::fs::read_to_string(path)?;
            let token = content.trim();
            if !token.is_empty() {
                return Ok(Some(token.to_string()));
            }
            tracing::warn!("Token file '{}' is empty.", path);
        }
        Ok(None)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::build_default()
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("token_file", &self.token_file)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field(
                "max_consecutive_poll_errors",
                &self.max_consecutive_poll_errors,
            )
            .field("poll_timeout", &self.poll_timeout)
            .field("max_batch_size", &self.max_batch_size)
            .field("bulk_results_cap", &self.bulk_results_cap)
            .field("single_results_cap", &self.single_results_cap)
            .field("max_concurrency", &self.max_concurrency)
            .field("loaded_config_path", &self.loaded_config_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_keep_distinct_caps() {
        let config = Config::default();
        assert_eq!(config.bulk_results_cap, 1000);
        assert_eq!(config.single_results_cap, 50);
        assert_eq!(config.max_batch_size, 1000);
        assert_eq!(config.poll_interval, Duration::from_secs(3));
        assert!(config.max_concurrency >= 1);
    }

    #[test]
    fn test_resolve_token_prefers_explicit_value() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let config = Config {
            api_token: Some("  explicit ".to_string()),
            token_file: Some(file.path().to_string_lossy().into_owned()),
            ..Config::default()
        };
        assert_eq!(config.resolve_token().unwrap().as_deref(), Some("explicit"));
    }

    #[test]
    fn test_resolve_token_falls_back_to_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  secret-token  ").unwrap();
        let config = Config {
            token_file: Some(file.path().to_string_lossy().into_owned()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_token().unwrap().as_deref(),
            Some("secret-token")
        );
    }

    #[test]
    fn test_resolve_token_none_when_unset() {
        assert!(Config::default().resolve_token().unwrap().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config {
            api_token: Some("super-secret".to_string()),
            ..Config::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
