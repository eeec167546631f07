use crate::error::SlotbotError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cron trigger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CronConfig {
    /// Comment prefix identifying managed jobs in the crontab.
    /// TOML: `cron.prefix`. Default: `slotbot`.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Executable written into crontab lines.
    /// TOML: `cron.command`. Default: `slotbot`.
    #[serde(default = "default_command")]
    pub command: String,

    /// Minutes before the booking window opens that the booking run starts.
    /// TOML: `cron.preparation_minutes`. Default: `5`.
    #[serde(default = "default_preparation_minutes")]
    pub preparation_minutes: i64,

    /// Hours before opening for the dry-run precheck. Unset disables prechecks.
    /// TOML: `cron.precheck_hours`. Default: `12`.
    #[serde(default = "default_precheck_hours")]
    pub precheck_hours: Option<i64>,

    /// Write jobs to this file instead of the user crontab (`crontab -l` / `crontab -`).
    /// TOML: `cron.crontab_path`.
    #[serde(default)]
    pub crontab_path: Option<PathBuf>,

    /// Zone the cron daemon evaluates schedules in. Unset means the system local zone.
    /// TOML: `cron.timezone`, e.g. `UTC`.
    #[serde(default)]
    pub timezone: Option<Tz>,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            command: default_command(),
            preparation_minutes: default_preparation_minutes(),
            precheck_hours: default_precheck_hours(),
            crontab_path: None,
            timezone: None,
        }
    }
}

impl CronConfig {
    pub(super) fn validate(&self) -> Result<(), SlotbotError> {
        if self.prefix.trim().is_empty() || self.prefix.contains(char::is_whitespace) {
            return Err(SlotbotError::Config(
                "cron.prefix must be a non-empty word".to_string(),
            ));
        }
        if !(0..24 * 60).contains(&self.preparation_minutes) {
            return Err(SlotbotError::Config(
                "cron.preparation_minutes must be within 0..1440".to_string(),
            ));
        }
        if self.precheck_hours.is_some_and(|h| h <= 0) {
            return Err(SlotbotError::Config(
                "cron.precheck_hours must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_prefix() -> String {
    "slotbot".to_string()
}

fn default_command() -> String {
    "slotbot".to_string()
}

fn default_preparation_minutes() -> i64 {
    5
}

fn default_precheck_hours() -> Option<i64> {
    Some(12)
}
