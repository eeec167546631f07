use super::compiler::{CronSchedule, compile_booking, compile_precheck};
use crate::config::CronConfig;
use crate::types::ChainId;
use chrono::{DateTime, FixedOffset, TimeZone};
use std::fmt;

/// One managed crontab line: `<schedule> <command> # <tag>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronJob {
    pub schedule: CronSchedule,
    pub command: String,
    pub tag: String,
}

impl fmt::Display for CronJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} # {}", self.schedule, self.command, self.tag)
    }
}

/// Tag prefix shared by every job of one user on one chain.
pub fn job_prefix(prefix: &str, user_id: i64, chain: &ChainId) -> String {
    format!("{prefix}:{user_id}:{chain}")
}

/// Booking trigger plus the optional precheck trigger for one recurring booking.
pub fn booking_jobs<Z: TimeZone>(
    cfg: &CronConfig,
    user_id: i64,
    chain: &ChainId,
    booking_id: i64,
    booking_opens_at: DateTime<FixedOffset>,
    local: &Z,
) -> Vec<CronJob> {
    let tag = format!("{}:{booking_id}", job_prefix(&cfg.prefix, user_id, chain));
    let command = format!("{} book {chain} {user_id} {booking_id}", cfg.command);

    let mut jobs = vec![CronJob {
        schedule: compile_booking(booking_opens_at, cfg.preparation_minutes, local),
        command: command.clone(),
        tag: tag.clone(),
    }];
    if let Some(hours) = cfg.precheck_hours {
        jobs.push(CronJob {
            schedule: compile_precheck(booking_opens_at, hours, local),
            command: format!("{command} --check"),
            tag: format!("{tag}:check"),
        });
    }
    jobs
}

/// Whether a crontab line belongs to `prefix` (the tag equals it or extends it with `:`).
pub fn is_managed(line: &str, prefix: &str) -> bool {
    let Some((_, tag)) = line.rsplit_once(" # ") else {
        return false;
    };
    let tag = tag.trim();
    tag == prefix
        || tag
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(':'))
}

/// Drops every line managed under `prefix` and appends `jobs`.
///
/// Unrelated lines keep their order. Applying the same jobs twice yields the same text.
pub fn apply_refresh(existing: &str, prefix: &str, jobs: &[CronJob]) -> String {
    let mut out = String::new();
    for line in existing.lines().filter(|line| !is_managed(line, prefix)) {
        out.push_str(line);
        out.push('\n');
    }
    for job in jobs {
        out.push_str(&job.to_string());
        out.push('\n');
    }
    out
}
