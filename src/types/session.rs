use super::{ChainId, ScheduleClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Forecast occurrence of a recurring config, not yet booked.
    Planned,
    Booked,
    Waitlist,
    /// Attendance registered by the provider.
    Confirmed,
    Noshow,
    Unknown,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Planned => "PLANNED",
            SessionStatus::Booked => "BOOKED",
            SessionStatus::Waitlist => "WAITLIST",
            SessionStatus::Confirmed => "CONFIRMED",
            SessionStatus::Noshow => "NOSHOW",
            SessionStatus::Unknown => "UNKNOWN",
        }
    }

    /// Anything reported by the provider rather than forecast locally.
    pub fn is_live(&self) -> bool {
        !matches!(self, SessionStatus::Planned)
    }

    /// Statuses worth a reminder before class start.
    pub fn is_upcoming_booking(&self) -> bool {
        matches!(
            self,
            SessionStatus::Booked | SessionStatus::Waitlist | SessionStatus::Confirmed
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = std::convert::Infallible;

    /// Unrecognised statuses map to `Unknown` rather than failing the whole pull.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "PLANNED" => SessionStatus::Planned,
            "BOOKED" => SessionStatus::Booked,
            "WAITLIST" | "WAITINGLIST" | "WAITING_LIST" => SessionStatus::Waitlist,
            "CONFIRMED" | "ATTENDED" | "CHECKED_IN" => SessionStatus::Confirmed,
            "NOSHOW" | "NO_SHOW" => SessionStatus::Noshow,
            _ => SessionStatus::Unknown,
        })
    }
}

/// A class entry reported by the provider for the authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveBooking {
    pub class: ScheduleClass,
    pub status: SessionStatus,
}

/// Identity is `(chain, class_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub chain: ChainId,
    pub class_id: String,
    pub user_id: i64,
    pub status: SessionStatus,
    pub class: ScheduleClass,
}

impl Session {
    pub fn new(chain: ChainId, user_id: i64, status: SessionStatus, class: ScheduleClass) -> Self {
        Self {
            chain,
            class_id: class.id.clone(),
            user_id,
            status,
            class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_spellings() {
        assert_eq!("booked".parse(), Ok(SessionStatus::Booked));
        assert_eq!("waitingList".parse(), Ok(SessionStatus::Waitlist));
        assert_eq!("attended".parse(), Ok(SessionStatus::Confirmed));
        assert_eq!("no_show".parse(), Ok(SessionStatus::Noshow));
        assert_eq!("something-new".parse(), Ok(SessionStatus::Unknown));
    }

    #[test]
    fn round_trips_canonical_names() {
        for status in [
            SessionStatus::Planned,
            SessionStatus::Booked,
            SessionStatus::Waitlist,
            SessionStatus::Confirmed,
            SessionStatus::Noshow,
            SessionStatus::Unknown,
        ] {
            assert_eq!(status.as_str().parse(), Ok(status));
        }
    }

    #[test]
    fn only_planned_is_not_live() {
        assert!(!SessionStatus::Planned.is_live());
        assert!(SessionStatus::Unknown.is_live());
    }
}
