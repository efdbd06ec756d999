//! Defines the structure mirroring the TOML configuration file format.

use serde::Deserialize;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub(crate) api: ApiConfig,
    #[serde(default)]
    pub(crate) polling: PollingConfig,
    #[serde(default)]
    pub(crate) limits: LimitsConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ApiConfig {
    pub(crate) base_url: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) token_file: Option<String>,
    pub(crate) request_timeout_ms: Option<u64>,
    pub(crate) user_agent: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct PollingConfig {
    pub(crate) interval_ms: Option<u64>,
    pub(crate) max_attempts: Option<u32>,
    pub(crate) max_consecutive_errors: Option<u32>,
    /// Overall deadline in milliseconds; 0 disables it.
    pub(crate) timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct LimitsConfig {
    pub(crate) max_batch_size: Option<usize>,
    pub(crate) bulk_results_cap: Option<usize>,
    pub(crate) single_results_cap: Option<usize>,
    pub(crate) max_concurrency: Option<usize>,
}
