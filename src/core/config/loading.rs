//! Handles loading configuration from files and applying it to the Config struct.

use super::{Config, ConfigFile};
use anyhow::Context;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Loads configuration settings from a TOML file.
/// Returns the parsed `ConfigFile` content.
pub(crate) fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() || !path.is_file() {
        return Err(anyhow::anyhow!(
            "File not found or is not a file: {}",
            file_path
        ));
    }
    tracing::debug!("Attempting to read config file: {}", file_path);
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config_file_content: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::debug!("Successfully parsed configuration file: {}", file_path);
    Ok(config_file_content)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Applies settings from a parsed `ConfigFile` onto a mutable `Config` instance.
/// Only fields present in `file_config` are changed.
pub(crate) fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    // API
    if let Some(ref url) = file_config.api.base_url {
        config.api_base_url = url.trim().to_string();
    }
    if let Some(ref token) = file_config.api.token {
        config.api_token = non_empty(token);
    }
    if let Some(ref path) = file_config.api.token_file {
        config.token_file = non_empty(path);
    }
    if let Some(timeout) = file_config.api.request_timeout_ms {
        config.request_timeout = Duration::from_millis(timeout);
    }
    if let Some(ref user_agent) = file_config.api.user_agent {
        config.user_agent = user_agent.clone();
    }

    // Polling
    if let Some(interval) = file_config.polling.interval_ms {
        config.poll_interval = Duration::from_millis(interval);
    }
    if let Some(attempts) = file_config.polling.max_attempts {
        config.max_poll_attempts = attempts;
    }
    if let Some(errors) = file_config.polling.max_consecutive_errors {
        config.max_consecutive_poll_errors = errors;
    }
    if let Some(timeout) = file_config.polling.timeout_ms {
        config.poll_timeout = (timeout > 0).then(|| Duration::from_millis(timeout));
    }

    // Limits
    if let Some(size) = file_config.limits.max_batch_size {
        config.max_batch_size = size;
    }
    if let Some(cap) = file_config.limits.bulk_results_cap {
        config.bulk_results_cap = cap;
    }
    if let Some(cap) = file_config.limits.single_results_cap {
        config.single_results_cap = cap;
    }
    if let Some(concurrency) = file_config.limits.max_concurrency {
        config.max_concurrency = concurrency;
    }
}
