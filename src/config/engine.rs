use crate::error::SlotbotError;
use serde::{Deserialize, Serialize};

/// Booking engine tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Attempts for a credential exchange before giving up.
    /// TOML: `engine.auth_max_attempts`. Default: `3`.
    #[serde(default = "default_auth_max_attempts")]
    pub auth_max_attempts: usize,

    /// Attempts for a remote book/cancel call before giving up.
    /// TOML: `engine.booking_max_attempts`. Default: `5`.
    #[serde(default = "default_booking_max_attempts")]
    pub booking_max_attempts: usize,

    /// Width of one schedule search window in days.
    /// TOML: `engine.search_window_days`. Default: `7`.
    #[serde(default = "default_search_window_days")]
    pub search_window_days: u32,

    /// Number of consecutive windows the class locator may inspect.
    /// TOML: `engine.search_max_windows`. Default: `3`.
    #[serde(default = "default_search_max_windows")]
    pub search_max_windows: u32,

    /// Days of schedule scanned when forecasting PLANNED sessions.
    /// TOML: `engine.forecast_days`. Default: `21`.
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,

    /// Longest a run waits for the booking window to open.
    /// TOML: `engine.max_wait_minutes`. Default: `30`.
    #[serde(default = "default_max_wait_minutes")]
    pub max_wait_minutes: i64,

    /// Concurrent schedule requests per search.
    /// TOML: `engine.fetch_parallelism`. Default: `4`.
    #[serde(default = "default_parallelism")]
    pub fetch_parallelism: usize,

    /// Concurrent users processed by bulk operations (session pull, cron refresh).
    /// TOML: `engine.pull_parallelism`. Default: `4`.
    #[serde(default = "default_parallelism")]
    pub pull_parallelism: usize,

    /// Bulk operation rate limit, per second.
    /// TOML: `engine.pull_rps`. Default: `5`.
    #[serde(default = "default_pull_rps")]
    pub pull_rps: u32,

    /// Horizon for imminent-class reminders.
    /// TOML: `engine.reminder_minutes`. Default: `90`.
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auth_max_attempts: default_auth_max_attempts(),
            booking_max_attempts: default_booking_max_attempts(),
            search_window_days: default_search_window_days(),
            search_max_windows: default_search_max_windows(),
            forecast_days: default_forecast_days(),
            max_wait_minutes: default_max_wait_minutes(),
            fetch_parallelism: default_parallelism(),
            pull_parallelism: default_parallelism(),
            pull_rps: default_pull_rps(),
            reminder_minutes: default_reminder_minutes(),
        }
    }
}

impl EngineConfig {
    pub(super) fn validate(&self) -> Result<(), SlotbotError> {
        let checks = [
            (self.auth_max_attempts >= 1, "engine.auth_max_attempts must be >= 1"),
            (self.booking_max_attempts >= 1, "engine.booking_max_attempts must be >= 1"),
            (self.search_window_days >= 1, "engine.search_window_days must be >= 1"),
            (self.search_max_windows >= 1, "engine.search_max_windows must be >= 1"),
            (self.forecast_days >= 1, "engine.forecast_days must be >= 1"),
            (self.max_wait_minutes >= 0, "engine.max_wait_minutes must be >= 0"),
            (self.fetch_parallelism >= 1, "engine.fetch_parallelism must be >= 1"),
            (self.pull_parallelism >= 1, "engine.pull_parallelism must be >= 1"),
            (self.pull_rps >= 1, "engine.pull_rps must be >= 1"),
        ];
        match checks.iter().find(|(ok, _)| !ok) {
            Some((_, msg)) => Err(SlotbotError::Config(msg.to_string())),
            None => Ok(()),
        }
    }
}

fn default_auth_max_attempts() -> usize {
    3
}

fn default_booking_max_attempts() -> usize {
    5
}

fn default_search_window_days() -> u32 {
    7
}

fn default_search_max_windows() -> u32 {
    3
}

fn default_forecast_days() -> u32 {
    21
}

fn default_max_wait_minutes() -> i64 {
    30
}

fn default_parallelism() -> usize {
    4
}

fn default_pull_rps() -> u32 {
    5
}

fn default_reminder_minutes() -> i64 {
    90
}
