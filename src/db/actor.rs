use crate::db::models::{DbChainUser, DbRecurringBooking, DbSession, decode_auth_handle};
use crate::db::schema::SQLITE_INIT;
use crate::db::store::Store;
use crate::error::SlotbotError;
use crate::types::{AuthHandle, ChainId, ChainUser, Credentials, RecurringBookingConfig, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

type Reply<T> = RpcReplyPort<Result<T, SlotbotError>>;

#[derive(Debug)]
pub enum DbActorMessage {
    /// List memberships, optionally filtered by chain and user.
    ChainUsers(Option<ChainId>, Option<i64>, Reply<Vec<ChainUser>>),

    /// Credentials of one membership.
    Credentials(i64, ChainId, Reply<Option<Credentials>>),

    /// Create or update a membership; changed credentials drop the cached handle.
    AddChainUser(ChainUser, Reply<()>),

    /// Recurring configs of one user on one chain.
    RecurringConfigs(i64, ChainId, Reply<Vec<RecurringBookingConfig>>),

    /// Recurring config by id.
    RecurringConfig(i64, Reply<Option<RecurringBookingConfig>>),

    /// Insert a recurring config and return its id.
    AddRecurringConfig(RecurringBookingConfig, Reply<i64>),

    /// Upsert the given sessions and drop other non-CONFIRMED rows of (user, chain).
    UpsertSessions(i64, ChainId, Vec<Session>, Reply<()>),

    /// Stored sessions of one user on one chain.
    Sessions(i64, ChainId, Reply<Vec<Session>>),

    /// Unreminded sessions of every user starting in `[from, to)`.
    PendingReminders(DateTime<Utc>, DateTime<Utc>, Reply<Vec<Session>>),

    /// Stamp one session as reminded.
    MarkReminded(ChainId, String, i64, DateTime<Utc>, Reply<()>),

    /// Cached auth handle of one membership.
    CachedAuth(i64, ChainId, Reply<Option<AuthHandle>>),

    /// Replace (or clear with `None`) the cached auth handle.
    SetCachedAuth(i64, ChainId, Option<AuthHandle>, Reply<()>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

fn rpc_failed(op: &str, e: impl std::fmt::Display) -> SlotbotError {
    SlotbotError::RactorError(format!("DbActor {op} RPC failed: {e}"))
}

#[async_trait]
impl Store for DbActorHandle {
    async fn chain_users(
        &self,
        chain: Option<ChainId>,
        user_id: Option<i64>,
    ) -> Result<Vec<ChainUser>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::ChainUsers, chain, user_id)
            .map_err(|e| rpc_failed("ChainUsers", e))?
    }

    async fn credentials(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<Credentials>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::Credentials, user_id, chain.clone())
            .map_err(|e| rpc_failed("Credentials", e))?
    }

    async fn add_chain_user(&self, user: ChainUser) -> Result<(), SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::AddChainUser, user)
            .map_err(|e| rpc_failed("AddChainUser", e))?
    }

    async fn recurring_configs(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Vec<RecurringBookingConfig>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::RecurringConfigs, user_id, chain.clone())
            .map_err(|e| rpc_failed("RecurringConfigs", e))?
    }

    async fn recurring_config(
        &self,
        id: i64,
    ) -> Result<Option<RecurringBookingConfig>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::RecurringConfig, id)
            .map_err(|e| rpc_failed("RecurringConfig", e))?
    }

    async fn add_recurring_config(
        &self,
        config: RecurringBookingConfig,
    ) -> Result<i64, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::AddRecurringConfig, config)
            .map_err(|e| rpc_failed("AddRecurringConfig", e))?
    }

    async fn upsert_sessions(
        &self,
        user_id: i64,
        chain: &ChainId,
        sessions: Vec<Session>,
    ) -> Result<(), SlotbotError> {
        ractor::call!(
            self.actor,
            DbActorMessage::UpsertSessions,
            user_id,
            chain.clone(),
            sessions
        )
        .map_err(|e| rpc_failed("UpsertSessions", e))?
    }

    async fn sessions(&self, user_id: i64, chain: &ChainId) -> Result<Vec<Session>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::Sessions, user_id, chain.clone())
            .map_err(|e| rpc_failed("Sessions", e))?
    }

    async fn pending_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::PendingReminders, from, to)
            .map_err(|e| rpc_failed("PendingReminders", e))?
    }

    async fn mark_reminded(&self, session: &Session, at: DateTime<Utc>) -> Result<(), SlotbotError> {
        ractor::call!(
            self.actor,
            DbActorMessage::MarkReminded,
            session.chain.clone(),
            session.class_id.clone(),
            session.user_id,
            at
        )
        .map_err(|e| rpc_failed("MarkReminded", e))?
    }

    async fn cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<AuthHandle>, SlotbotError> {
        ractor::call!(self.actor, DbActorMessage::CachedAuth, user_id, chain.clone())
            .map_err(|e| rpc_failed("CachedAuth", e))?
    }

    async fn set_cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
        handle: Option<AuthHandle>,
    ) -> Result<(), SlotbotError> {
        ractor::call!(
            self.actor,
            DbActorMessage::SetCachedAuth,
            user_id,
            chain.clone(),
            handle
        )
        .map_err(|e| rpc_failed("SetCachedAuth", e))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let pool = &state.pool;
        match message {
            DbActorMessage::ChainUsers(chain, user_id, reply) => {
                let _ = reply.send(self.chain_users(pool, chain, user_id).await);
            }
            DbActorMessage::Credentials(user_id, chain, reply) => {
                let res = self
                    .chain_user(pool, user_id, &chain)
                    .await
                    .map(|row| row.map(|row| ChainUser::from(row).credentials));
                let _ = reply.send(res);
            }
            DbActorMessage::AddChainUser(user, reply) => {
                let _ = reply.send(self.add_chain_user(pool, user).await);
            }
            DbActorMessage::RecurringConfigs(user_id, chain, reply) => {
                let _ = reply.send(self.recurring_configs(pool, user_id, &chain).await);
            }
            DbActorMessage::RecurringConfig(id, reply) => {
                let _ = reply.send(self.recurring_config(pool, id).await);
            }
            DbActorMessage::AddRecurringConfig(config, reply) => {
                let _ = reply.send(self.add_recurring_config(pool, config).await);
            }
            DbActorMessage::UpsertSessions(user_id, chain, sessions, reply) => {
                let _ = reply.send(self.upsert_sessions(pool, user_id, &chain, sessions).await);
            }
            DbActorMessage::Sessions(user_id, chain, reply) => {
                let _ = reply.send(self.sessions(pool, user_id, &chain).await);
            }
            DbActorMessage::PendingReminders(from, to, reply) => {
                let _ = reply.send(self.pending_reminders(pool, from, to).await);
            }
            DbActorMessage::MarkReminded(chain, class_id, user_id, at, reply) => {
                let _ = reply.send(self.mark_reminded(pool, &chain, &class_id, user_id, at).await);
            }
            DbActorMessage::CachedAuth(user_id, chain, reply) => {
                let res = match self.chain_user(pool, user_id, &chain).await {
                    Ok(row) => decode_auth_handle(row.and_then(|row| row.auth_handle)),
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::SetCachedAuth(user_id, chain, handle, reply) => {
                let _ = reply.send(self.set_cached_auth(pool, user_id, &chain, handle).await);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn chain_users(
        &self,
        pool: &SqlitePool,
        chain: Option<ChainId>,
        user_id: Option<i64>,
    ) -> Result<Vec<ChainUser>, SlotbotError> {
        let chain = chain.map(|c| c.as_str().to_string());
        let rows = sqlx::query_as::<_, DbChainUser>(
            r#"
        SELECT user_id, chain, username, password, auth_handle, created_at, updated_at
        FROM chain_users
        WHERE (? IS NULL OR chain = ?) AND (? IS NULL OR user_id = ?)
        ORDER BY chain, user_id
        "#,
        )
        .bind(chain.clone())
        .bind(chain)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(ChainUser::from).collect())
    }

    async fn chain_user(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<DbChainUser>, SlotbotError> {
        let row = sqlx::query_as::<_, DbChainUser>(
            r#"
        SELECT user_id, chain, username, password, auth_handle, created_at, updated_at
        FROM chain_users
        WHERE user_id = ? AND chain = ?
        "#,
        )
        .bind(user_id)
        .bind(chain.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn add_chain_user(&self, pool: &SqlitePool, user: ChainUser) -> Result<(), SlotbotError> {
        let now = Utc::now();
        sqlx::query(
            r#"
        INSERT INTO chain_users (user_id, chain, username, password, auth_handle, created_at, updated_at)
        VALUES (?, ?, ?, ?, NULL, ?, ?)
        ON CONFLICT(user_id, chain) DO UPDATE SET
            username = excluded.username,
            password = excluded.password,
            auth_handle = NULL,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(user.user_id)
        .bind(user.chain.as_str())
        .bind(user.credentials.username)
        .bind(user.credentials.password)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn recurring_configs(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Vec<RecurringBookingConfig>, SlotbotError> {
        let rows = sqlx::query_as::<_, DbRecurringBooking>(
            r#"
        SELECT id, user_id, chain, activity_id, weekday, hour, minute, location_id, display_name, created_at
        FROM recurring_bookings
        WHERE user_id = ? AND chain = ?
        ORDER BY id
        "#,
        )
        .bind(user_id)
        .bind(chain.as_str())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(RecurringBookingConfig::try_from).collect()
    }

    async fn recurring_config(
        &self,
        pool: &SqlitePool,
        id: i64,
    ) -> Result<Option<RecurringBookingConfig>, SlotbotError> {
        let row = sqlx::query_as::<_, DbRecurringBooking>(
            r#"
        SELECT id, user_id, chain, activity_id, weekday, hour, minute, location_id, display_name, created_at
        FROM recurring_bookings
        WHERE id = ?
        "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(RecurringBookingConfig::try_from).transpose()
    }

    async fn add_recurring_config(
        &self,
        pool: &SqlitePool,
        config: RecurringBookingConfig,
    ) -> Result<i64, SlotbotError> {
        let id: i64 = sqlx::query_scalar(
            r#"
        INSERT INTO recurring_bookings (
            user_id, chain, activity_id, weekday, hour, minute, location_id, display_name, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
        )
        .bind(config.user_id)
        .bind(config.chain.as_str())
        .bind(config.activity_id.as_str())
        .bind(config.weekday)
        .bind(config.hour)
        .bind(config.minute)
        .bind(i64::from(config.location_id.0))
        .bind(config.display_name)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(id)
    }

    async fn upsert_sessions(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        chain: &ChainId,
        sessions: Vec<Session>,
    ) -> Result<(), SlotbotError> {
        let now = Utc::now();
        let mut tx = pool.begin().await?;

        for session in &sessions {
            let class_data = serde_json::to_string(&session.class)?;
            sqlx::query(
                r#"
            INSERT INTO sessions (chain, class_id, user_id, status, starts_at, class_data, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chain, class_id, user_id) DO UPDATE SET
                status = excluded.status,
                starts_at = excluded.starts_at,
                class_data = excluded.class_data,
                updated_at = excluded.updated_at
            "#,
            )
            .bind(session.chain.as_str())
            .bind(&session.class_id)
            .bind(session.user_id)
            .bind(session.status.as_str())
            .bind(session.class.start.with_timezone(&Utc))
            .bind(class_data)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Rows touched above carry this run's `updated_at`.
        let dropped = sqlx::query(
            r#"
        DELETE FROM sessions
        WHERE user_id = ? AND chain = ? AND status != 'CONFIRMED' AND updated_at != ?
        "#,
        )
        .bind(user_id)
        .bind(chain.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        debug!(
            user_id,
            chain = %chain,
            dropped,
            upserted = sessions.len(),
            "Sessions replaced"
        );
        Ok(())
    }

    async fn sessions(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Vec<Session>, SlotbotError> {
        let rows = sqlx::query_as::<_, DbSession>(
            r#"
        SELECT chain, class_id, user_id, status, starts_at, class_data, updated_at
        FROM sessions
        WHERE user_id = ? AND chain = ?
        ORDER BY starts_at, class_id
        "#,
        )
        .bind(user_id)
        .bind(chain.as_str())
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Session::try_from).collect()
    }

    async fn pending_reminders(
        &self,
        pool: &SqlitePool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SlotbotError> {
        let rows = sqlx::query_as::<_, DbSession>(
            r#"
        SELECT chain, class_id, user_id, status, starts_at, class_data, updated_at
        FROM sessions
        WHERE starts_at >= ? AND starts_at < ? AND reminded_at IS NULL
        ORDER BY starts_at, user_id
        "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(Session::try_from).collect()
    }

    async fn mark_reminded(
        &self,
        pool: &SqlitePool,
        chain: &ChainId,
        class_id: &str,
        user_id: i64,
        at: DateTime<Utc>,
    ) -> Result<(), SlotbotError> {
        sqlx::query(
            r#"
        UPDATE sessions
        SET reminded_at = ?
        WHERE chain = ? AND class_id = ? AND user_id = ?
        "#,
        )
        .bind(at)
        .bind(chain.as_str())
        .bind(class_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn set_cached_auth(
        &self,
        pool: &SqlitePool,
        user_id: i64,
        chain: &ChainId,
        handle: Option<AuthHandle>,
    ) -> Result<(), SlotbotError> {
        let encoded = handle.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            r#"
        UPDATE chain_users
        SET auth_handle = ?, updated_at = ?
        WHERE user_id = ? AND chain = ?
        "#,
        )
        .bind(encoded)
        .bind(Utc::now())
        .bind(user_id)
        .bind(chain.as_str())
        .execute(pool)
        .await?;

        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, SlotbotError> {
    let (actor, _jh) = ractor::Actor::spawn(
        Some("DbActor".to_string()),
        DbActor,
        database_url.to_string(),
    )
    .await
    .map_err(|e| SlotbotError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), SlotbotError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
