use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{ProviderDefaults, ProviderResolvedConfig};

/// SATS provider configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SatsConfig {
    /// API root, with trailing slash.
    /// TOML: `providers.sats.base_url`. Default: `https://hfnapi.sats.com/v1/api/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    #[serde(default)]
    pub proxy: Option<Url>,

    #[serde(default)]
    pub retry_max_times: Option<usize>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// TOML: `providers.sats.max_days_per_request`. Default: `14`.
    #[serde(default = "default_max_days_per_request")]
    pub max_days_per_request: u32,

    /// Clubs per schedule request.
    /// TOML: `providers.sats.max_locations_per_request`. Default: `5`.
    #[serde(default = "default_max_locations_per_request")]
    pub max_locations_per_request: usize,
}

impl SatsConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> ProviderResolvedConfig {
        ProviderResolvedConfig {
            base_url: self.base_url.clone(),
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            retry_max_times: self.retry_max_times.unwrap_or(defaults.retry_max_times),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(defaults.timeout_secs)),
            user_agent: defaults.user_agent.clone(),
            max_days_per_request: self.max_days_per_request.max(1),
            max_locations_per_request: self.max_locations_per_request.max(1),
        }
    }
}

impl Default for SatsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy: None,
            retry_max_times: None,
            timeout_secs: None,
            max_days_per_request: default_max_days_per_request(),
            max_locations_per_request: default_max_locations_per_request(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://hfnapi.sats.com/v1/api/").expect("invalid fixed SATS URL")
}

fn default_max_days_per_request() -> u32 {
    14
}

fn default_max_locations_per_request() -> usize {
    5
}
