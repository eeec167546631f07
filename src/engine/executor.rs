use super::retry::{RetryError, RetryPolicy};
use crate::error::BookingError;
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::providers::Chain;
use crate::types::{AuthHandle, ScheduleClass};
use std::sync::Arc;
use tracing::info;

/// Books or cancels a resolved class with bounded retries.
///
/// Every remote failure is retried, including ones that cannot succeed on a second try (a
/// full class); those only surface after the last attempt.
pub struct BookingExecutor {
    policy: RetryPolicy,
    notifier: Arc<dyn Notifier>,
}

impl BookingExecutor {
    pub fn new(max_attempts: usize, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            policy: RetryPolicy::new(max_attempts),
            notifier,
        }
    }

    pub async fn book(
        &self,
        chain: &Chain,
        user_id: i64,
        auth: &AuthHandle,
        class: &ScheduleClass,
    ) -> Result<(), BookingError> {
        self.policy
            .run("book", move || async move {
                match chain.provider.book(auth, &class.id).await? {
                    true => Ok(()),
                    false => Err(BookingError::Generic(format!(
                        "provider declined booking of class {}",
                        class.id
                    ))),
                }
            })
            .await?;

        info!(chain = %chain.id, user_id, class_id = %class.id, "Class booked");
        self.notifier
            .notify(
                Notification::new(NotificationKind::Booked, user_id, chain.id.clone())
                    .with_class(class.clone()),
            )
            .await;
        Ok(())
    }

    /// Cancels the user's booking or waitlist entry.
    ///
    /// `class.user_status` must come from an authenticated fetch; without a booking it fails with
    /// [`BookingError::CancellingWithoutBooking`] and the provider is not contacted.
    pub async fn cancel(
        &self,
        chain: &Chain,
        user_id: i64,
        auth: &AuthHandle,
        class: &ScheduleClass,
    ) -> Result<(), BookingError> {
        if self.policy.max_attempts() < 1 {
            return Err(BookingError::no_attempts(self.policy.max_attempts()));
        }
        if !class.has_user_booking() {
            return Err(BookingError::CancellingWithoutBooking);
        }

        self.policy
            .run("cancel", move || async move {
                match chain.provider.cancel(auth, &class.id).await? {
                    true => Ok(()),
                    false => Err(BookingError::Generic(format!(
                        "provider declined cancellation of class {}",
                        class.id
                    ))),
                }
            })
            .await?;

        info!(chain = %chain.id, user_id, class_id = %class.id, "Booking cancelled");
        self.notifier
            .notify(
                Notification::new(NotificationKind::Cancelled, user_id, chain.id.clone())
                    .with_class(class.clone()),
            )
            .await;
        Ok(())
    }
}
