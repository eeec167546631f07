use crate::error::BookingError;
use crate::providers::Chain;
use crate::types::{AuthHandle, LocationKey, ScheduleClass};
use chrono::{Duration, NaiveDate};
use futures::{StreamExt, TryStreamExt, stream};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One provider-sized schedule request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleBatch {
    pub from: NaiveDate,
    pub days: u32,
    pub locations: Vec<LocationKey>,
}

/// Splits `[from, from + days)` x `locations` into requests no larger than the provider accepts.
pub fn plan_batches(
    from: NaiveDate,
    days: u32,
    locations: &[LocationKey],
    max_days: u32,
    max_locations: usize,
) -> Vec<ScheduleBatch> {
    let max_days = max_days.max(1);
    let max_locations = max_locations.max(1);

    let mut batches = Vec::new();
    let mut offset = 0;
    while offset < days {
        let span = max_days.min(days - offset);
        let start = from + Duration::days(i64::from(offset));
        for chunk in locations.chunks(max_locations) {
            batches.push(ScheduleBatch {
                from: start,
                days: span,
                locations: chunk.to_vec(),
            });
        }
        offset += span;
    }
    batches
}

/// Retrieves schedule windows for one chain, batching and fanning out as its provider requires.
#[derive(Clone)]
pub struct ScheduleFetcher {
    chain: Arc<Chain>,
    parallelism: usize,
}

impl ScheduleFetcher {
    pub fn new(chain: Arc<Chain>, parallelism: usize) -> Self {
        Self {
            chain,
            parallelism: parallelism.max(1),
        }
    }

    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// Every class in the window, deduplicated by id and ordered by start.
    ///
    /// Any failed batch fails the whole window.
    pub async fn fetch(
        &self,
        auth: Option<&AuthHandle>,
        from: NaiveDate,
        days: u32,
        locations: &[LocationKey],
    ) -> Result<Vec<ScheduleClass>, BookingError> {
        let provider = &self.chain.provider;
        let batches = plan_batches(
            from,
            days,
            locations,
            provider.max_days_per_request(),
            provider.max_locations_per_request(),
        );
        debug!(
            chain = %self.chain.id,
            %from,
            days,
            batches = batches.len(),
            "Fetching schedule window"
        );

        let pages: Vec<Vec<ScheduleClass>> = stream::iter(batches)
            .map(|batch| async move {
                provider
                    .fetch_schedule(auth, batch.from, batch.days, &batch.locations)
                    .await
            })
            .buffer_unordered(self.parallelism)
            .try_collect()
            .await?;

        let mut by_id = BTreeMap::new();
        for class in pages.into_iter().flatten() {
            by_id.insert(class.id.clone(), class);
        }
        let mut classes: Vec<ScheduleClass> = by_id.into_values().collect();
        classes.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(classes)
    }

    /// Finds one class by id by racing `windows` consecutive windows of `window_days` each.
    ///
    /// The first window that contains the class wins; its siblings are cancelled. Fails with
    /// [`BookingError::ClassMissing`] when no window has it, or with the last fetch error when
    /// every window failed.
    pub async fn find_by_id(
        &self,
        auth: Option<&AuthHandle>,
        class_id: &str,
        from: NaiveDate,
        window_days: u32,
        windows: u32,
    ) -> Result<ScheduleClass, BookingError> {
        let locations: Vec<LocationKey> = self.chain.locations.iter().map(|l| l.key.clone()).collect();
        let cancel = CancellationToken::new();
        let mut set = JoinSet::new();

        for window in 0..windows {
            let fetcher = self.clone();
            let auth = auth.cloned();
            let locations = locations.clone();
            let cancel = cancel.clone();
            let class_id = class_id.to_string();
            let start = from + Duration::days(i64::from(window * window_days));
            set.spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => Ok(None),
                    res = fetcher.fetch(auth.as_ref(), start, window_days, &locations) => {
                        res.map(|classes| classes.into_iter().find(|c| c.id == class_id))
                    }
                }
            });
        }

        let mut failures = 0u32;
        let mut last_error = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(Some(class))) => {
                    cancel.cancel();
                    set.abort_all();
                    debug!(chain = %self.chain.id, class_id, "Class found by id");
                    return Ok(class);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    warn!(chain = %self.chain.id, class_id, error = %e, "Window fetch failed");
                    failures += 1;
                    last_error = Some(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    failures += 1;
                    last_error = Some(BookingError::Generic(format!("window task failed: {e}")));
                }
            }
        }

        match last_error {
            Some(e) if failures == windows => Err(e),
            _ => Err(BookingError::ClassMissing),
        }
    }
}
