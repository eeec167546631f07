use crate::error::SlotbotError;
use crate::types::{AuthHandle, ChainId, ChainUser, Credentials, RecurringBookingConfig, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Persistence contract of the booking engine.
///
/// The engine treats storage as a black box; [`super::DbActorHandle`] is the SQLite
/// implementation.
#[async_trait]
pub trait Store: Send + Sync {
    /// Memberships, optionally narrowed to one chain and/or one user.
    async fn chain_users(
        &self,
        chain: Option<ChainId>,
        user_id: Option<i64>,
    ) -> Result<Vec<ChainUser>, SlotbotError>;

    async fn credentials(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<Credentials>, SlotbotError>;

    async fn add_chain_user(&self, user: ChainUser) -> Result<(), SlotbotError>;

    async fn recurring_configs(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Vec<RecurringBookingConfig>, SlotbotError>;

    async fn recurring_config(&self, id: i64)
    -> Result<Option<RecurringBookingConfig>, SlotbotError>;

    /// Stores a new config and returns its id; `config.id` is ignored.
    async fn add_recurring_config(
        &self,
        config: RecurringBookingConfig,
    ) -> Result<i64, SlotbotError>;

    /// Replaces the user's session view on a chain.
    ///
    /// `sessions` is upserted, then rows that are neither CONFIRMED nor part of `sessions` are
    /// dropped, in one transaction. CONFIRMED rows therefore survive even when absent from
    /// `sessions`, and kept rows retain their reminder mark.
    async fn upsert_sessions(
        &self,
        user_id: i64,
        chain: &ChainId,
        sessions: Vec<Session>,
    ) -> Result<(), SlotbotError>;

    async fn sessions(&self, user_id: i64, chain: &ChainId) -> Result<Vec<Session>, SlotbotError>;

    /// Sessions of all users whose class starts in `[from, to)` and that were never reminded.
    async fn pending_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SlotbotError>;

    async fn mark_reminded(&self, session: &Session, at: DateTime<Utc>) -> Result<(), SlotbotError>;

    async fn cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<AuthHandle>, SlotbotError>;

    /// `None` clears the cached handle.
    async fn set_cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
        handle: Option<AuthHandle>,
    ) -> Result<(), SlotbotError>;
}
