use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike};
use std::fmt;

/// Weekly five-field cron trigger: `M H * * DOW` with `DOW` 0 = Sunday.
///
/// Day-of-month and month stay `*`: cron ORs a restricted day-of-month with the weekday field,
/// so pinning both would fire on extra days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CronSchedule {
    pub minute: u32,
    pub hour: u32,
    pub weekday: u32,
}

impl CronSchedule {
    /// Trigger firing `lead` before `instant`, expressed in `local` wall-clock time.
    ///
    /// Every field, weekday included, comes from the shifted instant, so a lead that crosses
    /// midnight moves the trigger to the previous day.
    pub fn before<Z: TimeZone>(instant: DateTime<FixedOffset>, lead: Duration, local: &Z) -> Self {
        let fire = (instant - lead).with_timezone(local);
        Self {
            minute: fire.minute(),
            hour: fire.hour(),
            weekday: fire.weekday().num_days_from_sunday(),
        }
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} * * {}", self.minute, self.hour, self.weekday)
    }
}

/// Booking trigger: `preparation_minutes` before the booking window opens.
pub fn compile_booking<Z: TimeZone>(
    booking_opens_at: DateTime<FixedOffset>,
    preparation_minutes: i64,
    local: &Z,
) -> CronSchedule {
    CronSchedule::before(booking_opens_at, Duration::minutes(preparation_minutes), local)
}

/// Dry-run trigger: `precheck_hours` before the booking window opens.
pub fn compile_precheck<Z: TimeZone>(
    booking_opens_at: DateTime<FixedOffset>,
    precheck_hours: i64,
    local: &Z,
) -> CronSchedule {
    CronSchedule::before(booking_opens_at, Duration::hours(precheck_hours), local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Tz;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).expect("valid time")
    }

    #[test]
    fn wednesday_evening_minus_seventy_minutes() {
        // 2026-10-21 is a Wednesday.
        let schedule = compile_booking(at("2026-10-21T18:00:00+02:00"), 70, &Tz::Europe__Oslo);
        assert_eq!(
            schedule,
            CronSchedule {
                minute: 50,
                hour: 16,
                weekday: 3
            }
        );
        assert_eq!(schedule.to_string(), "50 16 * * 3");
    }

    #[test]
    fn crossing_midnight_moves_to_the_previous_weekday() {
        // 2026-10-19 is a Monday; one hour earlier is Sunday 23:30.
        let schedule = compile_booking(at("2026-10-19T00:30:00+02:00"), 60, &Tz::Europe__Oslo);
        assert_eq!(schedule.to_string(), "30 23 * * 0");
    }

    #[test]
    fn fields_follow_the_system_zone_not_the_class_zone() {
        let utc_schedule = compile_booking(at("2026-10-21T18:00:00+02:00"), 0, &chrono::Utc);
        assert_eq!(utc_schedule.to_string(), "0 16 * * 3");
    }

    #[test]
    fn precheck_can_land_days_earlier() {
        let schedule = compile_precheck(at("2026-10-21T08:00:00+02:00"), 36, &Tz::Europe__Oslo);
        // Monday 20:00
        assert_eq!(schedule.to_string(), "0 20 * * 1");
    }
}
