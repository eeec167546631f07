use crate::types::Location;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Per-chain overrides on top of the built-in chain definitions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
    /// TOML: `chains.<id>.enabled`. Default: `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// TOML: `chains.<id>.timezone`, e.g. `Europe/Oslo`.
    #[serde(default)]
    pub timezone: Option<Tz>,

    /// Extra or replacement locations, e.g.
    /// `locations = [{ id = 9, key = 312, name = "Moholt" }]`.
    #[serde(default)]
    pub locations: Vec<Location>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            timezone: None,
            locations: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}
