use crate::error::BookingError;
use crate::types::{ActivityId, LocationKey, ScheduleClass, SessionStatus, Slots};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use slotbot_schema::IbookingClass;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses an iBooking local timestamp in the chain's timezone.
///
/// Ambiguous wall-clock times (autumn DST fold) resolve to the earlier instant.
pub fn parse_local(raw: &str, tz: &Tz) -> Result<DateTime<FixedOffset>, BookingError> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), LOCAL_FORMAT)
        .map_err(|e| BookingError::MalformedClass(format!("bad timestamp {raw:?}: {e}")))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| BookingError::MalformedClass(format!("nonexistent local time {raw:?}")))
}

pub fn class_from_wire(class: &IbookingClass, tz: &Tz) -> Result<ScheduleClass, BookingError> {
    Ok(ScheduleClass {
        id: class.id.to_string(),
        activity_id: ActivityId::new(class.activity_id),
        name: class.name.clone(),
        location: LocationKey::Numeric(class.studio.id),
        start: parse_local(&class.from, tz)?,
        end: parse_local(&class.to, tz)?,
        booking_opens_at: parse_local(&class.bookable_from, tz)?,
        bookable: class.bookable,
        instructors: class.instructors.iter().map(|i| i.name.clone()).collect(),
        slots: Slots {
            capacity: class.capacity,
            available: class.available,
            waitlist: class.waitlist_count,
        },
        user_status: class
            .user_status
            .as_deref()
            .map(|s| s.parse().unwrap_or(SessionStatus::Unknown)),
    })
}
