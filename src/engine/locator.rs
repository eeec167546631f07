use super::fetcher::ScheduleFetcher;
use crate::error::BookingError;
use crate::types::{AuthHandle, LocationKey, RecurringBookingConfig, ScheduleClass};
use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use tracing::{debug, warn};

/// How one class relates to a recurring config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fit {
    Unrelated,
    WrongDay,
    WrongTime,
    Match,
}

/// Resolves a recurring config to its next concrete class occurrence.
pub struct ClassLocator {
    fetcher: ScheduleFetcher,
    window_days: u32,
    max_windows: u32,
}

impl ClassLocator {
    pub fn new(fetcher: ScheduleFetcher, window_days: u32, max_windows: u32) -> Self {
        Self {
            fetcher,
            window_days: window_days.max(1),
            max_windows: max_windows.max(1),
        }
    }

    /// Scans up to `max_windows` rolling windows starting today (chain local date).
    ///
    /// Keeps looking after the first match and only switches to a later candidate whose booking
    /// opening is strictly closer to `now`; the scan stops as soon as a window's candidate is no
    /// closer, or when a later window cannot be fetched. Without any match the most specific mismatch seen is returned: incorrect start
    /// time over missing schedule day over class missing, later mismatches replacing earlier ones
    /// of the same kind.
    pub async fn locate(
        &self,
        auth: Option<&AuthHandle>,
        config: &RecurringBookingConfig,
        now: DateTime<Utc>,
    ) -> Result<ScheduleClass, BookingError> {
        config.validate()?;

        let chain = self.fetcher.chain();
        let location = chain
            .locations
            .key(config.location_id)
            .cloned()
            .ok_or_else(|| {
                BookingError::MalformedSearch(format!(
                    "location {} is not known on chain {}",
                    config.location_id, chain.id
                ))
            })?;
        let today = now.with_timezone(&chain.timezone).date_naive();

        let mut best: Option<ScheduleClass> = None;
        let mut mismatch: Option<BookingError> = None;

        for window in 0..self.max_windows {
            let from = today + Duration::days(i64::from(window * self.window_days));
            let fetched = self
                .fetcher
                .fetch(auth, from, self.window_days, std::slice::from_ref(&location))
                .await;
            let classes = match fetched {
                Ok(classes) => classes,
                Err(e) if best.is_some() => {
                    warn!(window, %from, config_id = config.id, error = %e, "Window fetch failed; keeping earlier candidate");
                    break;
                }
                Err(e) => return Err(e),
            };

            let mut candidate: Option<ScheduleClass> = None;
            for class in classes {
                match fit(config, &location, &class, &chain.timezone) {
                    Fit::Unrelated => {}
                    Fit::WrongDay => note_mismatch(&mut mismatch, BookingError::MissingScheduleDay),
                    Fit::WrongTime => note_mismatch(&mut mismatch, BookingError::IncorrectStartTime),
                    Fit::Match => {
                        let closer = candidate
                            .as_ref()
                            .is_none_or(|c| class.opening_distance(now) < c.opening_distance(now));
                        if closer {
                            candidate = Some(class);
                        }
                    }
                }
            }

            let Some(candidate) = candidate else {
                debug!(window, %from, config_id = config.id, "No matching class in window");
                continue;
            };

            match &best {
                Some(current)
                    if candidate.opening_distance(now) >= current.opening_distance(now) =>
                {
                    debug!(window, config_id = config.id, "Later occurrence is not closer; stopping");
                    break;
                }
                _ => {
                    debug!(
                        window,
                        config_id = config.id,
                        class_id = %candidate.id,
                        opens_at = %candidate.booking_opens_at,
                        "Candidate occurrence"
                    );
                    best = Some(candidate);
                }
            }
        }

        match best {
            Some(class) => Ok(class),
            None => Err(mismatch.unwrap_or(BookingError::ClassMissing)),
        }
    }
}

/// Compares a class against a config in the chain's local time.
pub(crate) fn fit<Z: TimeZone>(
    config: &RecurringBookingConfig,
    location: &LocationKey,
    class: &ScheduleClass,
    tz: &Z,
) -> Fit {
    if class.activity_id != config.activity_id || &class.location != location {
        return Fit::Unrelated;
    }
    let local = class.local_start(tz);
    if local.weekday() != config.chrono_weekday() {
        return Fit::WrongDay;
    }
    let expected = (config.hour as u32, config.minute as u32);
    if (local.hour(), local.minute()) != expected {
        return Fit::WrongTime;
    }
    Fit::Match
}

fn note_mismatch(current: &mut Option<BookingError>, found: BookingError) {
    let replace = current
        .as_ref()
        .is_none_or(|c| found.search_rank() >= c.search_rank());
    if replace {
        *current = Some(found);
    }
}
