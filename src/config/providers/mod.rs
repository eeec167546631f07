mod brp;
mod ibooking;
mod sats;

pub use brp::BrpConfig;
pub use ibooking::IbookingConfig;
pub use sats::SatsConfig;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Global provider defaults (used when provider-level config is unset).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderDefaults {
    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.defaults.proxy`. Example: `http://127.0.0.1:1080`.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Network-level retries of 5xx responses inside a single provider call.
    /// TOML: `providers.defaults.retry_max_times`. Default: `2`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,

    /// Per-request timeout in seconds.
    /// TOML: `providers.defaults.timeout_secs`. Default: `30`.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TOML: `providers.defaults.user_agent`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ProviderDefaults {
    fn default() -> Self {
        Self {
            proxy: None,
            retry_max_times: default_retry_max_times(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// All provider configurations.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProvidersConfig {
    /// Global defaults for providers (overridden per provider if set).
    #[serde(default)]
    pub defaults: ProviderDefaults,

    /// iBooking-style provider (Sit).
    #[serde(default)]
    pub ibooking: IbookingConfig,

    /// BRP Systems provider (3T, FSC).
    #[serde(default)]
    pub brp: BrpConfig,

    /// SATS provider.
    #[serde(default)]
    pub sats: SatsConfig,
}

/// Effective settings of one provider instance after falling back to the defaults.
#[derive(Debug, Clone)]
pub struct ProviderResolvedConfig {
    pub base_url: Url,
    pub proxy: Option<Url>,
    pub retry_max_times: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_days_per_request: u32,
    pub max_locations_per_request: usize,
}

fn default_retry_max_times() -> usize {
    2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("slotbot/", env!("CARGO_PKG_VERSION")).to_string()
}
