use crate::types::{ActivityId, LocationKey, ScheduleClass, SessionStatus, Slots};
use slotbot_schema::SatsClass;

pub fn sats_class_to_class(class: &SatsClass) -> ScheduleClass {
    ScheduleClass {
        id: class.id.clone(),
        activity_id: ActivityId::new(&class.activity_id),
        name: class.name.clone(),
        location: LocationKey::Opaque(class.club_id.clone()),
        start: class.start_time,
        end: class.end_time,
        booking_opens_at: class.booking_opens_at,
        bookable: class.bookable,
        instructors: class.instructors.clone(),
        slots: Slots {
            capacity: class.capacity,
            available: class.capacity.saturating_sub(class.booked),
            waitlist: class.waitlist,
        },
        user_status: class
            .member_status
            .as_deref()
            .map(|s| s.parse().unwrap_or(SessionStatus::Unknown)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_class_reports_zero_available() {
        let class: SatsClass = serde_json::from_value(serde_json::json!({
            "id": "c-778",
            "activityId": "yoga-flow",
            "name": "Yoga Flow",
            "clubId": "sats-majorstuen",
            "startTime": "2026-10-21T18:00:00+02:00",
            "endTime": "2026-10-21T19:00:00+02:00",
            "bookingOpensAt": "2026-10-19T18:00:00+02:00",
            "bookable": true,
            "capacity": 25,
            "booked": 26,
            "memberStatus": "waitlist"
        }))
        .expect("sample class");

        let converted = sats_class_to_class(&class);
        assert_eq!(converted.slots.available, 0);
        assert_eq!(converted.location, LocationKey::Opaque("sats-majorstuen".to_string()));
        assert_eq!(converted.activity_id, ActivityId::new("yoga-flow"));
        assert_eq!(converted.user_status, Some(SessionStatus::Waitlist));
    }
}
