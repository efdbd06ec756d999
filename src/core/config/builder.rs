//! Provides the `ConfigBuilder` for fluent configuration construction.

use super::loading::{apply_file_config, load_config_file};
use super::validation::validate_config;
use super::{Config, ConfigFile, Result};
use crate::AppError;
use std::path::Path;
use std::time::Duration;

/// Builder pattern for creating `Config` instances fluently.
///
/// This is the primary way callers should create a `Config` object.
/// It handles loading from files, applying overrides, and validation.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
    config_file_path: Option<String>,
    skip_default_files: bool,
    overrides: ConfigFile,
}

impl ConfigBuilder {
    /// Creates a new builder with default configuration values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify an optional configuration file path to load.
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Do not look for `./bulk-verify.toml` / `./config.toml` when no file is given.
    pub fn skip_default_files(mut self) -> Self {
        self.skip_default_files = true;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.overrides.api.base_url = Some(url.into());
        self
    }
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.overrides.api.token = Some(token.into());
        self
    }
    pub fn token_file(mut self, path: impl Into<String>) -> Self {
        self.overrides.api.token_file = Some(path.into());
        self
    }
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.overrides.api.request_timeout_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.overrides.api.user_agent = Some(value.into());
        self
    }
    pub fn poll_interval(mut self, duration: Duration) -> Self {
        self.overrides.polling.interval_ms = Some(duration.as_millis() as u64);
        self
    }
    pub fn max_poll_attempts(mut self, value: u32) -> Self {
        self.overrides.polling.max_attempts = Some(value);
        self
    }
    pub fn max_consecutive_poll_errors(mut self, value: u32) -> Self {
        self.overrides.polling.max_consecutive_errors = Some(value);
        self
    }
    pub fn poll_timeout(mut self, duration: Option<Duration>) -> Self {
        self.overrides.polling.timeout_ms = Some(duration.map_or(0, |d| d.as_millis() as u64));
        self
    }
    pub fn max_batch_size(mut self, value: usize) -> Self {
        self.overrides.limits.max_batch_size = Some(value);
        self
    }
    pub fn bulk_results_cap(mut self, value: usize) -> Self {
        self.overrides.limits.bulk_results_cap = Some(value);
        self
    }
    pub fn single_results_cap(mut self, value: usize) -> Self {
        self.overrides.limits.single_results_cap = Some(value);
        self
    }
    pub fn max_concurrency(mut self, value: usize) -> Self {
        self.overrides.limits.max_concurrency = Some(value);
        self
    }

    /// Builds the final `Config` object, applying defaults, file settings, overrides, and validation.
    pub fn build(mut self) -> Result<Config> {
        let mut loaded_path: Option<String> = None;

        if let Some(ref path) = self.config_file_path {
            match load_config_file(path) {
                Ok(file_config) => {
                    apply_file_config(&mut self.config, &file_config);
                    loaded_path = Some(path.clone());
                    tracing::info!("Loaded base configuration from specified file: {}", path);
                }
                Err(e) => {
                    tracing::error!("Failed to load specified config file '{}': {}", path, e);
                    return Err(AppError::Config(format!(
                        "Failed to load specified configuration file '{}': {:#}",
                        path, e
                    )));
                }
            }
        } else if !self.skip_default_files {
            tracing::debug!("No config file specified, checking default locations.");
            for path_str in ["./bulk-verify.toml", "./config.toml"] {
                if Path::new(path_str).exists() {
                    match load_config_file(path_str) {
                        Ok(file_config) => {
                            apply_file_config(&mut self.config, &file_config);
                            loaded_path = Some(path_str.to_string());
                            tracing::info!(
                                "Loaded base configuration from default location: {}",
                                path_str
                            );
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to load or parse default config '{}': {}",
                                path_str,
                                e
                            );
                        }
                    }
                }
            }
            if loaded_path.is_none() {
                tracing::info!("No configuration file found. Using default values and overrides.");
            }
        }

        apply_file_config(&mut self.config, &self.overrides);
        self.config.loaded_config_path = loaded_path;
        validate_config(&mut self.config)?;

        tracing::debug!("Final configuration built successfully.");
        Ok(self.config)
    }
}
