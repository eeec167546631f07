use crate::error::SlotbotError;
use crate::types::{
    ActivityId, AuthHandle, ChainId, ChainUser, Credentials, LocationId, RecurringBookingConfig,
    ScheduleClass, Session, SessionStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbChainUser {
    pub user_id: i64,
    pub chain: String,
    pub username: String,
    pub password: String,
    pub auth_handle: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbChainUser> for ChainUser {
    fn from(row: DbChainUser) -> Self {
        ChainUser {
            user_id: row.user_id,
            chain: ChainId::new(row.chain),
            credentials: Credentials {
                username: row.username,
                password: row.password,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbRecurringBooking {
    pub id: i64,
    pub user_id: i64,
    pub chain: String,
    pub activity_id: String,
    pub weekday: i32,
    pub hour: i32,
    pub minute: i32,
    pub location_id: i64,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbRecurringBooking> for RecurringBookingConfig {
    type Error = SlotbotError;

    /// Weekday and time ranges are deliberately not checked here; see
    /// [`RecurringBookingConfig::validate`].
    fn try_from(row: DbRecurringBooking) -> Result<Self, Self::Error> {
        let location_id = u32::try_from(row.location_id).map_err(|_| {
            SlotbotError::Config(format!(
                "recurring booking {} has invalid location id {}",
                row.id, row.location_id
            ))
        })?;
        Ok(RecurringBookingConfig {
            id: row.id,
            user_id: row.user_id,
            chain: ChainId::new(row.chain),
            activity_id: ActivityId(row.activity_id),
            weekday: row.weekday,
            hour: row.hour,
            minute: row.minute,
            location_id: LocationId(location_id),
            display_name: row.display_name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct DbSession {
    pub chain: String,
    pub class_id: String,
    pub user_id: i64,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub class_data: String,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbSession> for Session {
    type Error = SlotbotError;

    fn try_from(row: DbSession) -> Result<Self, Self::Error> {
        let class: ScheduleClass = serde_json::from_str(&row.class_data)?;
        let status = row.status.parse().unwrap_or(SessionStatus::Unknown);
        Ok(Session {
            chain: ChainId::new(row.chain),
            class_id: row.class_id,
            user_id: row.user_id,
            status,
            class,
        })
    }
}

pub(crate) fn decode_auth_handle(raw: Option<String>) -> Result<Option<AuthHandle>, SlotbotError> {
    raw.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(SlotbotError::from)
}
