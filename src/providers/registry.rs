use super::{BookingProvider, brp::BrpProvider, build_client, ibooking::IbookingProvider, sats::SatsProvider};
use crate::config::{Config, ProviderResolvedConfig};
use crate::error::SlotbotError;
use crate::providers::chains::CHAIN_DEFINITIONS;
use crate::types::{ChainId, LocationTable, ProviderKind};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// A gym chain: identity, timezone, branch table and the provider instance it books through.
pub struct Chain {
    pub id: ChainId,
    pub name: String,
    pub timezone: Tz,
    pub locations: LocationTable,
    pub provider: Arc<dyn BookingProvider>,
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("id", &self.id)
            .field("provider", &self.provider.kind())
            .field("timezone", &self.timezone)
            .field("locations", &self.locations.len())
            .finish()
    }
}

/// Chain-id keyed registry of enabled chains.
#[derive(Clone, Default)]
pub struct ChainRegistry {
    chains: Arc<BTreeMap<ChainId, Arc<Chain>>>,
}

impl ChainRegistry {
    pub fn new(chains: impl IntoIterator<Item = Chain>) -> Self {
        let chains = chains
            .into_iter()
            .map(|chain| (chain.id.clone(), Arc::new(chain)))
            .collect();
        Self {
            chains: Arc::new(chains),
        }
    }

    /// Builds every enabled built-in chain with its provider client.
    pub fn from_config(cfg: &Config) -> Result<Self, SlotbotError> {
        let defaults = &cfg.providers.defaults;
        info!(
            providers_defaults_proxy = %defaults.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
            providers_defaults_retry_max_times = defaults.retry_max_times,
            providers_defaults_timeout_secs = defaults.timeout_secs,
            "Provider defaults loaded"
        );

        let mut chains = Vec::with_capacity(CHAIN_DEFINITIONS.len());
        for def in CHAIN_DEFINITIONS {
            let overrides = cfg.chain(def.id);
            if !overrides.enabled {
                info!(chain = def.id, "Chain disabled by config");
                continue;
            }

            let resolved = match def.provider {
                ProviderKind::Ibooking => Some(cfg.ibooking()),
                ProviderKind::Brp => cfg.brp(def.id),
                ProviderKind::Sats => Some(cfg.sats()),
            };
            let Some(resolved) = resolved else {
                warn!(chain = def.id, "No provider endpoint configured; chain skipped");
                continue;
            };

            let timezone = overrides.timezone.unwrap_or(def.timezone);
            log_effective(def.id, def.provider, &resolved);

            let client = build_client(&resolved)?;
            let provider: Arc<dyn BookingProvider> = match def.provider {
                ProviderKind::Ibooking => {
                    Arc::new(IbookingProvider::new(resolved, client, timezone))
                }
                ProviderKind::Brp => Arc::new(BrpProvider::new(resolved, client, timezone)),
                ProviderKind::Sats => Arc::new(SatsProvider::new(resolved, client)),
            };

            chains.push(Chain {
                id: ChainId::new(def.id),
                name: def.name.to_string(),
                timezone,
                locations: def.location_table(&overrides.locations),
                provider,
            });
        }

        Ok(Self::new(chains))
    }

    pub fn get(&self, id: &ChainId) -> Result<Arc<Chain>, SlotbotError> {
        self.chains
            .get(id)
            .cloned()
            .ok_or_else(|| SlotbotError::UnknownChain(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ChainId> {
        self.chains.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chain>> {
        self.chains.values()
    }
}

fn log_effective(chain: &str, kind: ProviderKind, cfg: &ProviderResolvedConfig) {
    info!(
        chain,
        provider = %kind,
        base_url = %cfg.base_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        retry_max_times = cfg.retry_max_times,
        timeout = ?cfg.timeout,
        max_days_per_request = cfg.max_days_per_request,
        max_locations_per_request = cfg.max_locations_per_request,
        "Chain provider config (effective)"
    );
}
