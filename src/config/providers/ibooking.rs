use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::{ProviderDefaults, ProviderResolvedConfig};

/// iBooking provider configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IbookingConfig {
    /// API root, with trailing slash.
    /// TOML: `providers.ibooking.base_url`. Default: `https://ibooking.sit.no/webapp/api/`.
    #[serde(default = "default_base_url")]
    pub base_url: Url,

    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Falls back to `providers.defaults.retry_max_times` when unset.
    #[serde(default)]
    pub retry_max_times: Option<usize>,

    /// Falls back to `providers.defaults.timeout_secs` when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Longest day range one schedule request may cover.
    /// TOML: `providers.ibooking.max_days_per_request`. Default: `7`.
    #[serde(default = "default_max_days_per_request")]
    pub max_days_per_request: u32,
}

impl IbookingConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> ProviderResolvedConfig {
        ProviderResolvedConfig {
            base_url: self.base_url.clone(),
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            retry_max_times: self.retry_max_times.unwrap_or(defaults.retry_max_times),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(defaults.timeout_secs)),
            user_agent: defaults.user_agent.clone(),
            max_days_per_request: self.max_days_per_request.max(1),
            // The schedule endpoint accepts a comma-separated studio list.
            max_locations_per_request: 8,
        }
    }
}

impl Default for IbookingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            proxy: None,
            retry_max_times: None,
            timeout_secs: None,
            max_days_per_request: default_max_days_per_request(),
        }
    }
}

fn default_base_url() -> Url {
    Url::parse("https://ibooking.sit.no/webapp/api/").expect("invalid fixed iBooking URL")
}

fn default_max_days_per_request() -> u32 {
    7
}
