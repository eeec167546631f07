use crate::types::{ActivityId, LocationKey, ScheduleClass, SessionStatus, Slots};
use slotbot_schema::{BrpBooking, BrpGroupActivity};

/// Activities without a booking window open "now": their opening is pinned to the class start
/// and they are reported as not bookable.
pub fn activity_to_class(activity: &BrpGroupActivity) -> ScheduleClass {
    let slots = &activity.slots;
    let bookable = activity.bookable_earliest.is_some()
        && !activity.cancelled
        && (slots.left_to_book > 0 || slots.has_waiting_list);

    ScheduleClass {
        id: activity.id.to_string(),
        activity_id: ActivityId::new(activity.group_activity_product.id),
        name: activity.name.clone(),
        location: LocationKey::Numeric(activity.business_unit.id),
        start: activity.duration.start,
        end: activity.duration.end,
        booking_opens_at: activity.bookable_earliest.unwrap_or(activity.duration.start),
        bookable,
        instructors: activity.instructors.iter().map(|i| i.name.clone()).collect(),
        slots: Slots {
            capacity: slots.total,
            available: slots.left_to_book,
            waitlist: slots.has_waiting_list.then_some(slots.in_waiting_list),
        },
        user_status: None,
    }
}

pub fn booking_status(booking: &BrpBooking) -> SessionStatus {
    match booking.kind.as_str() {
        "groupActivityBooking" if booking.checked_in => SessionStatus::Confirmed,
        "groupActivityBooking" => SessionStatus::Booked,
        "waitingListBooking" => SessionStatus::Waitlist,
        _ => SessionStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn activity(extra: serde_json::Value) -> BrpGroupActivity {
        let mut base = json!({
            "id": 5512,
            "name": "Spinning 45",
            "duration": { "start": "2026-10-21T16:00:00Z", "end": "2026-10-21T16:45:00Z" },
            "groupActivityProduct": { "id": 88, "name": "Spinning 45" },
            "businessUnit": { "id": 2, "name": "Midtbyen" },
            "slots": { "total": 30, "leftToBook": 0, "hasWaitingList": true, "inWaitingList": 2 }
        });
        if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(base).expect("sample activity")
    }

    #[test]
    fn full_class_with_waiting_list_is_bookable() {
        let class = activity_to_class(&activity(
            json!({ "bookableEarliest": "2026-10-19T16:00:00Z" }),
        ));
        assert!(class.bookable);
        assert_eq!(class.activity_id, ActivityId::new(88));
        assert_eq!(class.location, LocationKey::Numeric(2));
        assert_eq!(class.slots.waitlist, Some(2));
        assert_eq!(class.booking_opens_at.to_rfc3339(), "2026-10-19T16:00:00+00:00");
    }

    #[test]
    fn missing_window_falls_back_to_start_and_is_not_bookable() {
        let class = activity_to_class(&activity(json!({})));
        assert!(!class.bookable);
        assert_eq!(class.booking_opens_at, class.start);
    }

    #[test]
    fn cancelled_activity_is_not_bookable() {
        let class = activity_to_class(&activity(json!({
            "bookableEarliest": "2026-10-19T16:00:00Z",
            "cancelled": true
        })));
        assert!(!class.bookable);
    }

    #[test]
    fn booking_kinds_map_to_statuses() {
        let booking = |kind: &str, checked_in: bool| BrpBooking {
            id: 1,
            kind: kind.to_string(),
            group_activity: activity(json!({})),
            checked_in,
        };
        assert_eq!(booking_status(&booking("groupActivityBooking", false)), SessionStatus::Booked);
        assert_eq!(booking_status(&booking("groupActivityBooking", true)), SessionStatus::Confirmed);
        assert_eq!(booking_status(&booking("waitingListBooking", false)), SessionStatus::Waitlist);
        assert_eq!(booking_status(&booking("other", false)), SessionStatus::Unknown);
    }
}
