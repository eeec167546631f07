use super::retry::RetryPolicy;
use crate::db::Store;
use crate::error::AuthenticationError;
use crate::providers::Chain;
use crate::types::{AuthHandle, ChainId, Credentials};
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

type AuthCacheStore = Cache<(i64, ChainId), AuthHandle>;

/// Hands out provider auth handles per (user, chain).
///
/// A handle is reused across calls (in-process cache, then the persisted one) only after the
/// provider accepted it again. A rejected handle is dropped from both caches and exactly one
/// retried credential exchange follows.
pub struct AuthSession {
    store: Arc<dyn Store>,
    cache: AuthCacheStore,
    policy: RetryPolicy,
}

impl AuthSession {
    pub fn new(store: Arc<dyn Store>, max_attempts: usize) -> Self {
        let cache = AuthCacheStore::builder()
            .time_to_idle(Duration::from_secs(60 * 60))
            .max_capacity(4096)
            .build();
        Self {
            store,
            cache,
            policy: RetryPolicy::new(max_attempts),
        }
    }

    pub async fn handle(
        &self,
        chain: &Chain,
        user_id: i64,
        credentials: &Credentials,
    ) -> Result<AuthHandle, AuthenticationError> {
        if let Some(cached) = self.cached(&chain.id, user_id).await {
            match chain.provider.validate(&cached).await {
                Ok(()) => {
                    debug!(chain = %chain.id, user_id, "Reusing cached auth handle");
                    return Ok(cached);
                }
                Err(e) => {
                    info!(chain = %chain.id, user_id, error = %e, "Cached auth handle rejected");
                    self.invalidate(&chain.id, user_id).await;
                }
            }
        }
        self.authenticate(chain, user_id, credentials).await
    }

    /// Credential exchange under the retry policy; the fresh handle replaces any cached one.
    pub async fn authenticate(
        &self,
        chain: &Chain,
        user_id: i64,
        credentials: &Credentials,
    ) -> Result<AuthHandle, AuthenticationError> {
        let handle = self
            .policy
            .run("authenticate", move || chain.provider.authenticate(credentials))
            .await?;

        info!(chain = %chain.id, user_id, "Authenticated");
        self.cache.insert((user_id, chain.id.clone()), handle.clone());
        if let Err(e) = self
            .store
            .set_cached_auth(user_id, &chain.id, Some(handle.clone()))
            .await
        {
            warn!(chain = %chain.id, user_id, error = %e, "Failed to persist auth handle");
        }
        Ok(handle)
    }

    pub async fn invalidate(&self, chain: &ChainId, user_id: i64) {
        self.cache.invalidate(&(user_id, chain.clone()));
        if let Err(e) = self.store.set_cached_auth(user_id, chain, None).await {
            warn!(chain = %chain, user_id, error = %e, "Failed to clear persisted auth handle");
        }
    }

    async fn cached(&self, chain: &ChainId, user_id: i64) -> Option<AuthHandle> {
        let key = (user_id, chain.clone());
        if let Some(handle) = self.cache.get(&key) {
            return Some(handle);
        }
        match self.store.cached_auth(user_id, chain).await {
            Ok(Some(handle)) => {
                self.cache.insert(key, handle.clone());
                Some(handle)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(chain = %chain, user_id, error = %e, "Failed to read persisted auth handle");
                None
            }
        }
    }
}
