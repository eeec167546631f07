mod basic;
mod chains;
mod cron;
mod engine;
mod notify;
mod providers;

pub use basic::BasicConfig;
pub use chains::ChainConfig;
pub use cron::CronConfig;
pub use engine::EngineConfig;
pub use notify::NotifyConfig;
pub use providers::{
    BrpConfig, IbookingConfig, ProviderDefaults, ProviderResolvedConfig, ProvidersConfig,
    SatsConfig,
};

use crate::error::SlotbotError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Retry bounds, search windows and fan-out limits of the booking engine.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Trigger compilation and crontab settings.
    #[serde(default)]
    pub cron: CronConfig,

    #[serde(default)]
    pub notify: NotifyConfig,

    /// Remote booking protocol settings (see `providers` table in config.toml).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Per-chain overrides keyed by chain id (extra locations, timezone, enable flag).
    #[serde(default)]
    pub chains: BTreeMap<String, ChainConfig>,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const CONFIG_FILE_ENV: &str = "SLOTBOT_CONFIG";

impl Config {
    /// Builds a Figment that merges defaults, a config TOML file and `SLOTBOT_*` variables.
    ///
    /// The file path defaults to `config.toml` and can be moved with `SLOTBOT_CONFIG`. Nested
    /// keys use `__`, e.g. `SLOTBOT_ENGINE__BOOKING_MAX_ATTEMPTS=3`.
    pub fn figment() -> Figment {
        let path = std::env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if path.is_file() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(
            Env::prefixed("SLOTBOT_")
                .ignore(&["CONFIG"])
                .split("__"),
        )
    }

    /// Extracts and validates the configuration.
    pub fn load() -> Result<Self, SlotbotError> {
        let cfg: Self = Self::figment().extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), SlotbotError> {
        self.engine.validate()?;
        self.cron.validate()?;
        Ok(())
    }

    pub fn ibooking(&self) -> ProviderResolvedConfig {
        self.providers.ibooking.resolve(&self.providers.defaults)
    }

    pub fn brp(&self, chain: &str) -> Option<ProviderResolvedConfig> {
        self.providers.brp.resolve(chain, &self.providers.defaults)
    }

    pub fn sats(&self) -> ProviderResolvedConfig {
        self.providers.sats.resolve(&self.providers.defaults)
    }

    pub fn chain(&self, chain: &str) -> ChainConfig {
        self.chains.get(chain).cloned().unwrap_or_default()
    }
}
