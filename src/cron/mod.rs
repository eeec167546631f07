//! Cron trigger compilation and crontab maintenance.

mod compiler;
mod job;
mod table;

pub use compiler::{CronSchedule, compile_booking, compile_precheck};
pub use job::{CronJob, apply_refresh, booking_jobs, is_managed, job_prefix};
pub use table::{CronTable, FileCrontab, SystemCrontab};
