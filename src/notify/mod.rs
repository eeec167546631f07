//! Notification sink for terminal run outcomes and reminders.
//!
//! Delivery is best-effort: sinks log their own failures and never fail the caller.

mod webhook;

pub use webhook::WebhookNotifier;

use crate::types::{ChainId, ScheduleClass};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Booked,
    BookFailed,
    Cancelled,
    CancelFailed,
    PrecheckFailed,
    Reminder,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub user_id: i64,
    pub chain: ChainId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<ScheduleClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, user_id: i64, chain: ChainId) -> Self {
        Self {
            kind,
            user_id,
            chain,
            class: None,
            error: None,
        }
    }

    pub fn with_class(mut self, class: ScheduleClass) -> Self {
        self.class = Some(class);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Default sink: writes every notification to the log.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, n: Notification) {
        let class_id = n.class.as_ref().map(|c| c.id.as_str()).unwrap_or("-");
        let class_name = n.class.as_ref().map(|c| c.name.as_str()).unwrap_or("-");
        match &n.error {
            Some(error) => warn!(
                kind = ?n.kind,
                user_id = n.user_id,
                chain = %n.chain,
                class_id,
                class_name,
                error = %error,
                "Notification"
            ),
            None => info!(
                kind = ?n.kind,
                user_id = n.user_id,
                chain = %n.chain,
                class_id,
                class_name,
                "Notification"
            ),
        }
    }
}
