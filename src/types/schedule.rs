use super::{ActivityId, LocationKey, SessionStatus};
use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slots {
    pub capacity: u32,
    pub available: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waitlist: Option<u32>,
}

/// One concrete occurrence of a class as reported by a provider.
///
/// Recomputed on every search; only its snapshot inside a [`super::Session`] is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleClass {
    pub id: String,
    pub activity_id: ActivityId,
    pub name: String,
    pub location: LocationKey,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub booking_opens_at: DateTime<FixedOffset>,
    pub bookable: bool,
    #[serde(default)]
    pub instructors: Vec<String>,
    #[serde(default)]
    pub slots: Slots,
    /// The requesting user's relation to the class, when the schedule was fetched authenticated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_status: Option<SessionStatus>,
}

impl ScheduleClass {
    pub fn local_start<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        self.start.with_timezone(tz)
    }

    /// Absolute distance between the booking opening and `now`.
    pub fn opening_distance(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.booking_opens_at.with_timezone(&Utc) - now).abs()
    }

    pub fn has_user_booking(&self) -> bool {
        matches!(
            self.user_status,
            Some(SessionStatus::Booked | SessionStatus::Waitlist)
        )
    }
}
