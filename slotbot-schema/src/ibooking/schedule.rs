use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IbookingSchedule {
    #[serde(default)]
    pub days: Vec<IbookingDay>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IbookingDay {
    pub date: String,
    #[serde(default)]
    pub classes: Vec<IbookingClass>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IbookingClass {
    pub id: i64,
    pub activity_id: i64,
    pub name: String,
    pub studio: IbookingStudio,
    /// Local start, `YYYY-MM-DD HH:MM:SS`.
    pub from: String,
    /// Local end, `YYYY-MM-DD HH:MM:SS`.
    pub to: String,
    /// Local opening of the booking window, `YYYY-MM-DD HH:MM:SS`.
    pub bookable_from: String,
    #[serde(default)]
    pub bookable: bool,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub available: u32,
    #[serde(default)]
    pub waitlist_count: Option<u32>,
    #[serde(default)]
    pub instructors: Vec<IbookingInstructor>,
    /// `booked`, `waitlist` or absent when the caller has no relation to the class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IbookingStudio {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IbookingInstructor {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IbookingBookings {
    #[serde(default)]
    pub bookings: Vec<IbookingBookingEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IbookingBookingEntry {
    #[serde(rename = "class")]
    pub class: IbookingClass,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_schedule_day_with_optional_fields_missing() {
        let raw = r#"{
            "days": [{
                "date": "2026-10-21",
                "classes": [{
                    "id": 991,
                    "activityId": 17,
                    "name": "Yoga",
                    "studio": { "id": 306 },
                    "from": "2026-10-21 18:00:00",
                    "to": "2026-10-21 19:00:00",
                    "bookableFrom": "2026-10-19 18:00:00"
                }]
            }]
        }"#;

        let parsed: IbookingSchedule = serde_json::from_str(raw).expect("parse sample");
        let class = &parsed.days[0].classes[0];

        assert_eq!(class.id, 991);
        assert_eq!(class.studio.id, 306);
        assert!(!class.bookable);
        assert!(class.instructors.is_empty());
        assert!(class.user_status.is_none());
    }

    #[test]
    fn empty_payload_is_an_empty_schedule() {
        let parsed: IbookingSchedule = serde_json::from_str("{}").expect("parse sample");
        assert!(parsed.days.is_empty());
    }
}
