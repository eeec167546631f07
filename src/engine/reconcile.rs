use super::fetcher::ScheduleFetcher;
use super::locator::{Fit, fit};
use crate::db::Store;
use crate::error::{BookingError, SlotbotError};
use crate::types::{
    AuthHandle, ChainId, LiveBooking, LocationKey, RecurringBookingConfig, ScheduleClass, Session,
    SessionStatus,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Merges forecast and live state into one session per class id.
///
/// The forecast seeds the view as PLANNED; a live entry for the same class id replaces it. The
/// precedence mirrors observed provider behaviour and is an assumption, not a documented
/// contract. Output is ordered by class start.
pub fn merge(
    chain: &ChainId,
    user_id: i64,
    planned: Vec<ScheduleClass>,
    live: Vec<LiveBooking>,
) -> Vec<Session> {
    let mut by_class: BTreeMap<String, Session> = BTreeMap::new();
    for class in planned {
        let session = Session::new(chain.clone(), user_id, SessionStatus::Planned, class);
        by_class.insert(session.class_id.clone(), session);
    }
    for entry in live {
        let session = Session::new(chain.clone(), user_id, entry.status, entry.class);
        by_class.insert(session.class_id.clone(), session);
    }

    let mut sessions: Vec<Session> = by_class.into_values().collect();
    sessions.sort_by(|a, b| {
        a.class
            .start
            .cmp(&b.class.start)
            .then_with(|| a.class_id.cmp(&b.class_id))
    });
    sessions
}

/// Refreshes the stored session view of one user on one chain.
pub struct SessionReconciler {
    fetcher: ScheduleFetcher,
    store: Arc<dyn Store>,
    forecast_days: u32,
}

impl SessionReconciler {
    pub fn new(fetcher: ScheduleFetcher, store: Arc<dyn Store>, forecast_days: u32) -> Self {
        Self {
            fetcher,
            store,
            forecast_days: forecast_days.max(1),
        }
    }

    /// Future occurrences of the user's recurring configs whose booking has not opened yet.
    ///
    /// Invalid configs and configs pointing at unknown locations are skipped with a warning.
    pub async fn forecast(
        &self,
        auth: Option<&AuthHandle>,
        configs: &[RecurringBookingConfig],
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduleClass>, BookingError> {
        let chain = self.fetcher.chain();
        let targets: Vec<(&RecurringBookingConfig, LocationKey)> = configs
            .iter()
            .filter_map(|config| {
                if let Err(e) = config.validate() {
                    warn!(config_id = config.id, error = %e, "Skipping invalid recurring config");
                    return None;
                }
                match chain.locations.key(config.location_id) {
                    Some(key) => Some((config, key.clone())),
                    None => {
                        warn!(
                            config_id = config.id,
                            location_id = %config.location_id,
                            "Skipping recurring config with unknown location"
                        );
                        None
                    }
                }
            })
            .collect();
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let locations: Vec<LocationKey> = targets
            .iter()
            .map(|(_, key)| key.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let today = now.with_timezone(&chain.timezone).date_naive();
        let schedule = self
            .fetcher
            .fetch(auth, today, self.forecast_days, &locations)
            .await?;

        Ok(schedule
            .into_iter()
            .filter(|class| class.booking_opens_at.with_timezone(&Utc) > now)
            .filter(|class| {
                targets
                    .iter()
                    .any(|(config, key)| fit(config, key, class, &chain.timezone) == Fit::Match)
            })
            .collect())
    }

    /// Forecast, merge with live state and persist.
    ///
    /// Returns `Ok(None)` without touching storage when the provider cannot report live state;
    /// replacing the stored view then would drop real bookings.
    pub async fn pull(
        &self,
        user_id: i64,
        auth: &AuthHandle,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<Session>>, SlotbotError> {
        let chain = self.fetcher.chain();
        let configs = self.store.recurring_configs(user_id, &chain.id).await?;
        let planned = self.forecast(Some(auth), &configs, now).await?;

        let Some(live) = chain.provider.fetch_live_sessions(auth).await? else {
            warn!(chain = %chain.id, user_id, "Live sessions unavailable; stored view kept");
            return Ok(None);
        };

        debug!(
            chain = %chain.id,
            user_id,
            planned = planned.len(),
            live = live.len(),
            "Reconciling sessions"
        );
        let sessions = merge(&chain.id, user_id, planned, live);
        self.store
            .upsert_sessions(user_id, &chain.id, sessions.clone())
            .await?;
        info!(chain = %chain.id, user_id, sessions = sessions.len(), "Sessions pulled");
        Ok(Some(sessions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActivityId, Slots};
    use chrono::{DateTime, FixedOffset};

    fn class(id: &str, start: &str) -> ScheduleClass {
        let start: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(start).expect("valid time");
        ScheduleClass {
            id: id.to_string(),
            activity_id: ActivityId::new(17),
            name: "Yoga".to_string(),
            location: LocationKey::Numeric(306),
            start,
            end: start + chrono::Duration::hours(1),
            booking_opens_at: start - chrono::Duration::hours(48),
            bookable: true,
            instructors: Vec::new(),
            slots: Slots::default(),
            user_status: None,
        }
    }

    #[test]
    fn live_status_replaces_planned_for_the_same_class() {
        let chain = ChainId::new("sit");
        let planned = vec![
            class("a", "2026-10-21T18:00:00+02:00"),
            class("b", "2026-10-28T18:00:00+01:00"),
        ];
        let live = vec![
            LiveBooking {
                class: class("a", "2026-10-21T18:00:00+02:00"),
                status: SessionStatus::Booked,
            },
            LiveBooking {
                class: class("c", "2026-10-20T07:00:00+02:00"),
                status: SessionStatus::Waitlist,
            },
        ];

        let sessions = merge(&chain, 7, planned, live);

        let summary: Vec<(&str, SessionStatus)> = sessions
            .iter()
            .map(|s| (s.class_id.as_str(), s.status))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("c", SessionStatus::Waitlist),
                ("a", SessionStatus::Booked),
                ("b", SessionStatus::Planned),
            ]
        );
        assert!(sessions.iter().all(|s| s.user_id == 7 && s.chain == chain));
    }

    #[test]
    fn duplicate_live_entries_collapse_to_one_session() {
        let chain = ChainId::new("3t");
        let live = vec![
            LiveBooking {
                class: class("x", "2026-10-21T18:00:00+02:00"),
                status: SessionStatus::Waitlist,
            },
            LiveBooking {
                class: class("x", "2026-10-21T18:00:00+02:00"),
                status: SessionStatus::Booked,
            },
        ];

        let sessions = merge(&chain, 1, Vec::new(), live);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].status, SessionStatus::Booked);
    }
}
