//! Booking orchestration: authentication, search, booking, reconciliation and trigger upkeep.
//!
//! The components are independent and take their collaborators explicitly; [`Engine`] wires
//! them to the configuration, chain registry, store, notifier and crontab of one process.

pub mod auth;
pub mod executor;
pub mod fetcher;
pub mod locator;
pub mod reconcile;
pub mod retry;

mod reminder;
mod run;

pub use auth::AuthSession;
pub use executor::BookingExecutor;
pub use fetcher::{ScheduleBatch, ScheduleFetcher, plan_batches};
pub use locator::ClassLocator;
pub use reconcile::{SessionReconciler, merge};
pub use retry::{RetryError, RetryPolicy};
pub use run::{RunMode, RunReport, RunState};

use crate::config::Config;
use crate::cron::{CronJob, CronTable, booking_jobs, job_prefix};
use crate::db::Store;
use crate::error::SlotbotError;
use crate::notify::Notifier;
use crate::providers::{Chain, ChainRegistry};
use crate::types::{ChainId, ChainUser, Credentials};
use chrono::{DateTime, Local, Utc};
use futures::{StreamExt, stream};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome counts of a bulk operation over chain users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BulkSummary {
    fn record(&mut self, outcome: BulkOutcome) {
        match outcome {
            BulkOutcome::Succeeded => self.succeeded += 1,
            BulkOutcome::Skipped => self.skipped += 1,
            BulkOutcome::Failed => self.failed += 1,
        }
    }
}

enum BulkOutcome {
    Succeeded,
    Skipped,
    Failed,
}

pub struct Engine {
    config: Arc<Config>,
    chains: ChainRegistry,
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    crontab: Arc<dyn CronTable>,
    auth: AuthSession,
    cron_lock: Mutex<()>,
}

impl Engine {
    pub fn new(
        config: Arc<Config>,
        chains: ChainRegistry,
        store: Arc<dyn Store>,
        notifier: Arc<dyn Notifier>,
        crontab: Arc<dyn CronTable>,
    ) -> Self {
        let auth = AuthSession::new(store.clone(), config.engine.auth_max_attempts);
        Self {
            config,
            chains,
            store,
            notifier,
            crontab,
            auth,
            cron_lock: Mutex::new(()),
        }
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn fetcher(&self, chain: &Arc<Chain>) -> ScheduleFetcher {
        ScheduleFetcher::new(chain.clone(), self.config.engine.fetch_parallelism)
    }

    pub fn locator(&self, chain: &Arc<Chain>) -> ClassLocator {
        ClassLocator::new(
            self.fetcher(chain),
            self.config.engine.search_window_days,
            self.config.engine.search_max_windows,
        )
    }

    pub fn executor(&self) -> BookingExecutor {
        BookingExecutor::new(
            self.config.engine.booking_max_attempts,
            self.notifier.clone(),
        )
    }

    pub fn reconciler(&self, chain: &Arc<Chain>) -> SessionReconciler {
        SessionReconciler::new(
            self.fetcher(chain),
            self.store.clone(),
            self.config.engine.forecast_days,
        )
    }

    async fn credentials(&self, chain: &ChainId, user_id: i64) -> Result<Credentials, SlotbotError> {
        self.store
            .credentials(user_id, chain)
            .await?
            .ok_or_else(|| SlotbotError::MissingCredentials {
                user_id,
                chain: chain.to_string(),
            })
    }

    /// Pulls and persists sessions of every matching chain user.
    ///
    /// Users are processed with bounded parallelism under a per-second rate limit; one user's
    /// failure is logged and counted, never aborting the rest.
    pub async fn pull_sessions(
        &self,
        chain: Option<ChainId>,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<BulkSummary, SlotbotError> {
        let users = self.store.chain_users(chain, user_id).await?;
        let summary = self
            .for_each_user(users, move |user| async move {
                match self.pull_user(&user, now).await {
                    Ok(true) => BulkOutcome::Succeeded,
                    Ok(false) => BulkOutcome::Skipped,
                    Err(e) => {
                        warn!(chain = %user.chain, user_id = user.user_id, error = %e, "Session pull failed");
                        BulkOutcome::Failed
                    }
                }
            })
            .await;
        info!(?summary, "Session pull finished");
        Ok(summary)
    }

    async fn pull_user(&self, user: &ChainUser, now: DateTime<Utc>) -> Result<bool, SlotbotError> {
        let chain = self.chains.get(&user.chain)?;
        let auth = self
            .auth
            .handle(&chain, user.user_id, &user.credentials)
            .await?;
        let pulled = self.reconciler(&chain).pull(user.user_id, &auth, now).await?;
        Ok(pulled.is_some())
    }

    /// Recompiles the cron jobs of every matching chain user.
    pub async fn refresh_cron(
        &self,
        chain: Option<ChainId>,
        user_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<BulkSummary, SlotbotError> {
        let users = self.store.chain_users(chain, user_id).await?;
        let summary = self
            .for_each_user(users, move |user| async move {
                let result = match self.chains.get(&user.chain) {
                    Ok(chain) => self.refresh_user_cron(&chain, user.user_id, now).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(_) => BulkOutcome::Succeeded,
                    Err(e) => {
                        warn!(chain = %user.chain, user_id = user.user_id, error = %e, "Cron refresh failed");
                        BulkOutcome::Failed
                    }
                }
            })
            .await;
        info!(?summary, "Cron refresh finished");
        Ok(summary)
    }

    /// Replaces the user's jobs on one chain with triggers for each recurring config's next
    /// opening. Configs that cannot be located lose their jobs. Returns the number of jobs.
    pub async fn refresh_user_cron(
        &self,
        chain: &Arc<Chain>,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<usize, SlotbotError> {
        let configs = self.store.recurring_configs(user_id, &chain.id).await?;
        let locator = self.locator(chain);
        let cron = &self.config.cron;

        let mut jobs: Vec<CronJob> = Vec::new();
        for config in &configs {
            let class = match locator.locate(None, config, now).await {
                Ok(class) => class,
                Err(e) => {
                    warn!(
                        chain = %chain.id,
                        user_id,
                        config_id = config.id,
                        error = %e,
                        "Recurring booking not located; no trigger scheduled"
                    );
                    continue;
                }
            };
            let opens = class.booking_opens_at;
            jobs.extend(match cron.timezone {
                Some(tz) => booking_jobs(cron, user_id, &chain.id, config.id, opens, &tz),
                None => booking_jobs(cron, user_id, &chain.id, config.id, opens, &Local),
            });
        }

        let prefix = job_prefix(&cron.prefix, user_id, &chain.id);
        let _guard = self.cron_lock.lock().await;
        self.crontab.refresh(&prefix, &jobs).await?;
        info!(chain = %chain.id, user_id, jobs = jobs.len(), "Cron jobs refreshed");
        Ok(jobs.len())
    }

    async fn for_each_user<F, Fut>(&self, users: Vec<ChainUser>, op: F) -> BulkSummary
    where
        F: Fn(ChainUser) -> Fut,
        Fut: Future<Output = BulkOutcome>,
    {
        let rps = NonZeroU32::new(self.config.engine.pull_rps).unwrap_or(NonZeroU32::MIN);
        let limiter = RateLimiter::direct(Quota::per_second(rps));
        let limiter = &limiter;
        let op = &op;

        let outcomes: Vec<BulkOutcome> = stream::iter(users)
            .map(|user| async move {
                limiter.until_ready().await;
                op(user).await
            })
            .buffer_unordered(self.config.engine.pull_parallelism.max(1))
            .collect()
            .await;

        let mut summary = BulkSummary::default();
        for outcome in outcomes {
            summary.record(outcome);
        }
        summary
    }
}
