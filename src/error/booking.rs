use super::IsRetryable;
use thiserror::Error as ThisError;

/// Failure while searching, booking or cancelling a class.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum BookingError {
    #[error("booking failed: {0}")]
    Generic(String),

    #[error("malformed search: {0}")]
    MalformedSearch(String),

    #[error("malformed schedule: {0}")]
    MalformedSchedule(String),

    #[error("class exists but not on the configured weekday")]
    MissingScheduleDay,

    #[error("class exists on the configured weekday but at another time")]
    IncorrectStartTime,

    #[error("class not found in schedule")]
    ClassMissing,

    #[error("malformed class: {0}")]
    MalformedClass(String),

    #[error("booking opens in {minutes} minutes, longer than allowed to wait")]
    TooLongWaitingTime { minutes: i64 },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("cannot cancel a class that is neither booked nor waitlisted")]
    CancellingWithoutBooking,
}

impl BookingError {
    /// Ordering used by the class locator when several mismatches are seen: a class on the right
    /// day at the wrong time is a more specific diagnosis than a class on the wrong day.
    pub(crate) fn search_rank(&self) -> u8 {
        match self {
            BookingError::IncorrectStartTime => 2,
            BookingError::MissingScheduleDay => 1,
            _ => 0,
        }
    }
}

// Remote book/cancel failures are not classified yet; a full class is retried like a timeout.
impl IsRetryable for BookingError {
    fn is_retryable(&self) -> bool {
        true
    }
}

impl From<reqwest::Error> for BookingError {
    fn from(e: reqwest::Error) -> Self {
        BookingError::Generic(e.to_string())
    }
}
