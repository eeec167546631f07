use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

use super::{ProviderDefaults, ProviderResolvedConfig};

/// BRP Systems provider configuration managed by Figment.
///
/// Every BRP operator runs its own instance, so base URLs are keyed by chain id.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BrpConfig {
    /// TOML: `providers.brp.base_urls`, e.g. `{ "3t" = "https://3t.brpsystems.com/brponline/api/ver3/" }`.
    #[serde(default = "default_base_urls")]
    pub base_urls: BTreeMap<String, Url>,

    #[serde(default)]
    pub proxy: Option<Url>,

    #[serde(default)]
    pub retry_max_times: Option<usize>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// TOML: `providers.brp.max_days_per_request`. Default: `7`.
    #[serde(default = "default_max_days_per_request")]
    pub max_days_per_request: u32,
}

impl BrpConfig {
    pub fn resolve(&self, chain: &str, defaults: &ProviderDefaults) -> Option<ProviderResolvedConfig> {
        let base_url = self.base_urls.get(chain)?.clone();
        Some(ProviderResolvedConfig {
            base_url,
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            retry_max_times: self.retry_max_times.unwrap_or(defaults.retry_max_times),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(defaults.timeout_secs)),
            user_agent: defaults.user_agent.clone(),
            max_days_per_request: self.max_days_per_request.max(1),
            // Business unit is part of the path.
            max_locations_per_request: 1,
        })
    }
}

impl Default for BrpConfig {
    fn default() -> Self {
        Self {
            base_urls: default_base_urls(),
            proxy: None,
            retry_max_times: None,
            timeout_secs: None,
            max_days_per_request: default_max_days_per_request(),
        }
    }
}

fn default_base_urls() -> BTreeMap<String, Url> {
    [
        ("3t", "https://3t.brpsystems.com/brponline/api/ver3/"),
        ("fsc", "https://fsc.brpsystems.com/brponline/api/ver3/"),
    ]
    .into_iter()
    .map(|(chain, url)| {
        (
            chain.to_string(),
            Url::parse(url).expect("invalid fixed BRP URL"),
        )
    })
    .collect()
}

fn default_max_days_per_request() -> u32 {
    7
}
