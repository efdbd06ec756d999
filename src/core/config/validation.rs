//! Contains validation logic for the final Config struct.

use super::{Config, Result, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
use crate::core::error::AppError;
use url::Url;

/// Validates the configuration settings after loading and potential overrides.
/// Mutates the config to clamp values or set defaults where applicable.
pub(crate) fn validate_config(config: &mut Config) -> Result<()> {
    let base = Url::parse(&config.api_base_url).map_err(|e| {
        AppError::Config(format!(
            "Invalid API base URL '{}': {}",
            config.api_base_url, e
        ))
    })?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(AppError::Config(format!(
            "API base URL must use http or https, got '{}'",
            base.scheme()
        )));
    }
    if config.request_timeout.is_zero() {
        tracing::warn!(
            "Request timeout was set to 0. Using default of {:?}.",
            DEFAULT_REQUEST_TIMEOUT
        );
        config.request_timeout = DEFAULT_REQUEST_TIMEOUT;
    }
    if config.poll_interval.is_zero() {
        tracing::warn!(
            "Poll interval was set to 0. Using default of {:?}.",
            DEFAULT_POLL_INTERVAL
        );
        config.poll_interval = DEFAULT_POLL_INTERVAL;
    }
    if config.max_batch_size == 0 {
        return Err(AppError::Config(
            "Maximum batch size must be at least 1.".to_string(),
        ));
    }
    if config.bulk_results_cap == 0 || config.single_results_cap == 0 {
        return Err(AppError::Config(
            "Result caps must be at least 1.".to_string(),
        ));
    }
    if config.single_results_cap > config.bulk_results_cap {
        tracing::warn!(
            "Single result cap ({}) exceeds bulk result cap ({}).",
            config.single_results_cap,
            config.bulk_results_cap
        );
    }
    if config.max_concurrency == 0 {
        tracing::warn!("Max concurrency was set to 0. Setting to 1.");
        config.max_concurrency = 1;
    }
    if config.max_poll_attempts == 0
        && config.max_consecutive_poll_errors == 0
        && config.poll_timeout.is_none()
    {
        tracing::warn!("Polling has no attempt, error, or time ceiling. A stuck job will be polled until cancelled.");
    }
    if config.api_token.is_some() && config.token_file.is_some() {
        tracing::warn!("Both an API token and a token file were provided. The explicit token wins.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config {
            api_base_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            validate_config(&mut config),
            Err(AppError::Config(_))
        ));

        let mut config = Config {
            api_base_url: "ftp://files.example.com".to_string(),
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }

    #[test]
    fn test_clamps_zero_values() {
        let mut config = Config {
            request_timeout: Duration::ZERO,
            poll_interval: Duration::ZERO,
            max_concurrency: 0,
            ..Config::default()
        };
        validate_config(&mut config).unwrap();
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_concurrency, 1);
    }

    #[test]
    fn test_rejects_zero_caps() {
        let mut config = Config {
            single_results_cap: 0,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());

        let mut config = Config {
            max_batch_size: 0,
            ..Config::default()
        };
        assert!(validate_config(&mut config).is_err());
    }
}
