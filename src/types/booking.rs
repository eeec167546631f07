use super::{ChainId, LocationId};
use crate::error::BookingError;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Provider activity identifier, stringified so numeric and slug ids compare the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn new(id: impl ToString) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A standing request to book an activity whenever it recurs.
///
/// `weekday` counts from Monday (`0`) to Sunday (`6`). Ranges are kept as plain integers so that
/// an out-of-range stored value reaches [`RecurringBookingConfig::validate`] and is reported as a
/// malformed search instead of being coerced on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringBookingConfig {
    pub id: i64,
    pub user_id: i64,
    pub chain: ChainId,
    pub activity_id: ActivityId,
    pub weekday: i32,
    pub hour: i32,
    pub minute: i32,
    pub location_id: LocationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl RecurringBookingConfig {
    pub fn validate(&self) -> Result<(), BookingError> {
        if !(0..=6).contains(&self.weekday) {
            return Err(BookingError::MalformedSearch(format!(
                "weekday {} outside 0..=6",
                self.weekday
            )));
        }
        if !(0..=23).contains(&self.hour) {
            return Err(BookingError::MalformedSearch(format!(
                "hour {} outside 0..=23",
                self.hour
            )));
        }
        if !(0..=59).contains(&self.minute) {
            return Err(BookingError::MalformedSearch(format!(
                "minute {} outside 0..=59",
                self.minute
            )));
        }
        Ok(())
    }

    /// Only meaningful after [`validate`](Self::validate) succeeded.
    pub fn chrono_weekday(&self) -> Weekday {
        match self.weekday {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }

    pub fn label(&self) -> String {
        self.display_name
            .clone()
            .unwrap_or_else(|| format!("activity {}", self.activity_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(weekday: i32, hour: i32, minute: i32) -> RecurringBookingConfig {
        RecurringBookingConfig {
            id: 1,
            user_id: 1,
            chain: ChainId::new("sit"),
            activity_id: ActivityId::new(17),
            weekday,
            hour,
            minute,
            location_id: LocationId(1),
            display_name: None,
        }
    }

    #[test]
    fn accepts_boundaries() {
        assert!(config(0, 0, 0).validate().is_ok());
        assert!(config(6, 23, 59).validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fields() {
        for bad in [config(7, 12, 0), config(-1, 12, 0), config(2, 24, 0), config(2, 12, 60)] {
            assert!(matches!(
                bad.validate(),
                Err(BookingError::MalformedSearch(_))
            ));
        }
    }

    #[test]
    fn weekday_zero_is_monday() {
        assert_eq!(config(0, 0, 0).chrono_weekday(), Weekday::Mon);
        assert_eq!(config(2, 0, 0).chrono_weekday(), Weekday::Wed);
        assert_eq!(config(6, 0, 0).chrono_weekday(), Weekday::Sun);
    }
}
