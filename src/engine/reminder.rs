use super::Engine;
use crate::error::SlotbotError;
use crate::notify::{Notification, NotificationKind};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

impl Engine {
    /// Sends a reminder for every booked, waitlisted or confirmed session starting within
    /// `engine.reminder_minutes` of `now`. Returns the number of reminders sent.
    ///
    /// Each session is reminded at most once; the mark is stored right after its notification, so
    /// the command may run as often as the cron daemon likes.
    pub async fn remind(&self, now: DateTime<Utc>) -> Result<usize, SlotbotError> {
        let horizon = now + Duration::minutes(self.config.engine.reminder_minutes);
        let sessions = self.store.pending_reminders(now, horizon).await?;

        let mut sent = 0;
        for session in sessions {
            if !session.status.is_upcoming_booking() {
                debug!(class_id = %session.class_id, status = %session.status, "No reminder for status");
                continue;
            }
            let notification = Notification::new(
                NotificationKind::Reminder,
                session.user_id,
                session.chain.clone(),
            )
            .with_class(session.class.clone());
            self.notifier.notify(notification).await;
            self.store.mark_reminded(&session, now).await?;
            sent += 1;
        }

        info!(sent, %horizon, "Reminders sent");
        Ok(sent)
    }
}
