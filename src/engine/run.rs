use super::Engine;
use crate::error::{BookingError, SlotbotError};
use crate::notify::{Notification, NotificationKind};
use crate::providers::Chain;
use crate::types::{AuthHandle, ChainId, ScheduleClass};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Progress of one triggered run. Every `*Failed` state is terminal and notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Authenticating,
    AuthFailed,
    Searching,
    SearchFailed,
    Booking,
    BookFailed,
    Booked,
    SessionsPulled,
    /// Precheck finished without finding a problem.
    Checked,
    Cancelled,
}

impl RunState {
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            RunState::AuthFailed | RunState::SearchFailed | RunState::BookFailed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Pending => "PENDING",
            RunState::Authenticating => "AUTHENTICATING",
            RunState::AuthFailed => "AUTH_FAILED",
            RunState::Searching => "SEARCHING",
            RunState::SearchFailed => "SEARCH_FAILED",
            RunState::Booking => "BOOKING",
            RunState::BookFailed => "BOOK_FAILED",
            RunState::Booked => "BOOKED",
            RunState::SessionsPulled => "SESSIONS_PULLED",
            RunState::Checked => "CHECKED",
            RunState::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Book,
    /// Authenticate and search only.
    Precheck,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub state: RunState,
    pub class: Option<ScheduleClass>,
    pub error: Option<String>,
}

struct Run<'a> {
    engine: &'a Engine,
    chain: Arc<Chain>,
    user_id: i64,
    failure_kind: NotificationKind,
    state: RunState,
    class: Option<ScheduleClass>,
}

impl<'a> Run<'a> {
    fn advance(&mut self, next: RunState) {
        debug!(chain = %self.chain.id, user_id = self.user_id, from = %self.state, to = %next, "Run state");
        self.state = next;
    }

    async fn fail(mut self, state: RunState, error: impl fmt::Display) -> RunReport {
        self.advance(state);
        warn!(chain = %self.chain.id, user_id = self.user_id, state = %state, error = %error, "Run failed");

        let mut notification =
            Notification::new(self.failure_kind, self.user_id, self.chain.id.clone())
                .with_error(&error);
        if let Some(class) = self.class.clone() {
            notification = notification.with_class(class);
        }
        self.engine.notifier.notify(notification).await;
        self.report(Some(error.to_string()))
    }

    fn report(self, error: Option<String>) -> RunReport {
        RunReport {
            state: self.state,
            class: self.class,
            error,
        }
    }
}

/// Wall-clock time of a run, advanced by the monotonic time spent since it started.
#[derive(Debug, Clone, Copy)]
struct RunClock {
    started_at: DateTime<Utc>,
    started: Instant,
}

impl RunClock {
    fn start(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            started: Instant::now(),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = Duration::from_std(self.started.elapsed()).unwrap_or(Duration::zero());
        self.started_at + elapsed
    }
}

impl Engine {
    /// One booking trigger: authenticate, locate the class, wait for the window, book, then pull
    /// sessions and reschedule the user's triggers.
    ///
    /// Setup problems (unknown chain or booking, missing credentials, storage failures) are
    /// returned as errors; provider-side failures end the run in a `*Failed` state.
    pub async fn run_booking(
        &self,
        chain_id: &ChainId,
        user_id: i64,
        booking_id: i64,
        mode: RunMode,
        now: DateTime<Utc>,
    ) -> Result<RunReport, SlotbotError> {
        let chain = self.chains.get(chain_id)?;
        let config = self
            .store
            .recurring_config(booking_id)
            .await?
            .filter(|c| c.user_id == user_id && &c.chain == chain_id)
            .ok_or(SlotbotError::UnknownBooking(booking_id))?;
        let credentials = self.credentials(chain_id, user_id).await?;
        let clock = RunClock::start(now);

        let mut run = Run {
            engine: self,
            chain: chain.clone(),
            user_id,
            failure_kind: match mode {
                RunMode::Book => NotificationKind::BookFailed,
                RunMode::Precheck => NotificationKind::PrecheckFailed,
            },
            state: RunState::Pending,
            class: None,
        };
        info!(chain = %chain.id, user_id, booking_id, ?mode, "Run started");

        run.advance(RunState::Authenticating);
        let auth = match self.auth.handle(&chain, user_id, &credentials).await {
            Ok(auth) => auth,
            Err(e) => return Ok(run.fail(RunState::AuthFailed, e).await),
        };

        run.advance(RunState::Searching);
        let class = match self.locator(&chain).locate(Some(&auth), &config, now).await {
            Ok(class) => class,
            Err(e) => return Ok(run.fail(RunState::SearchFailed, e).await),
        };
        info!(
            chain = %chain.id,
            user_id,
            class_id = %class.id,
            start = %class.start,
            opens_at = %class.booking_opens_at,
            "Class located"
        );
        run.class = Some(class.clone());

        if mode == RunMode::Precheck {
            run.advance(RunState::Checked);
            return Ok(run.report(None));
        }

        run.advance(RunState::Booking);
        if let Err(e) = self.wait_for_opening(&class, clock.now()).await {
            return Ok(run.fail(RunState::BookFailed, e).await);
        }

        if class.has_user_booking() {
            info!(chain = %chain.id, user_id, class_id = %class.id, "Already booked; skipping");
        } else if let Err(e) = self.executor().book(&chain, user_id, &auth, &class).await {
            return Ok(run.fail(RunState::BookFailed, e).await);
        }
        run.advance(RunState::Booked);

        if self.after_booking(&chain, user_id, &auth, clock.now()).await {
            run.advance(RunState::SessionsPulled);
        }
        Ok(run.report(None))
    }

    /// Sleeps until the class's booking window opens, or fails when that is further away than
    /// `engine.max_wait_minutes`. `now` must be read after authentication and search.
    async fn wait_for_opening(
        &self,
        class: &ScheduleClass,
        now: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let wait = class.booking_opens_at.with_timezone(&Utc) - now;
        if wait <= Duration::zero() {
            return Ok(());
        }
        if wait > Duration::minutes(self.config.engine.max_wait_minutes) {
            let minutes = (wait.num_seconds() + 59) / 60;
            return Err(BookingError::TooLongWaitingTime { minutes });
        }

        info!(class_id = %class.id, wait_secs = wait.num_seconds(), "Waiting for booking to open");
        let sleep = wait
            .to_std()
            .map_err(|e| BookingError::Generic(format!("invalid wait duration: {e}")))?;
        tokio::time::sleep(sleep).await;
        Ok(())
    }

    /// Refreshes the session view and the user's triggers. Failures are logged only; the booking
    /// itself already succeeded. Returns whether sessions were pulled.
    async fn after_booking(
        &self,
        chain: &Arc<Chain>,
        user_id: i64,
        auth: &AuthHandle,
        now: DateTime<Utc>,
    ) -> bool {
        let pulled = match self.reconciler(chain).pull(user_id, auth, now).await {
            Ok(pulled) => pulled.is_some(),
            Err(e) => {
                warn!(chain = %chain.id, user_id, error = %e, "Post-booking session pull failed");
                false
            }
        };
        if let Err(e) = self.refresh_user_cron(chain, user_id, now).await {
            warn!(chain = %chain.id, user_id, error = %e, "Post-booking cron refresh failed");
        }
        pulled
    }

    /// Cancels the user's booking of `class_id`, found by racing schedule windows.
    pub async fn cancel_class(
        &self,
        chain_id: &ChainId,
        user_id: i64,
        class_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RunReport, SlotbotError> {
        let chain = self.chains.get(chain_id)?;
        let credentials = self.credentials(chain_id, user_id).await?;
        let mut run = Run {
            engine: self,
            chain: chain.clone(),
            user_id,
            failure_kind: NotificationKind::CancelFailed,
            state: RunState::Pending,
            class: None,
        };

        run.advance(RunState::Authenticating);
        let auth = match self.auth.handle(&chain, user_id, &credentials).await {
            Ok(auth) => auth,
            Err(e) => return Ok(run.fail(RunState::AuthFailed, e).await),
        };

        run.advance(RunState::Searching);
        let engine = &self.config.engine;
        let today = now.with_timezone(&chain.timezone).date_naive();
        let found = self
            .fetcher(&chain)
            .find_by_id(
                Some(&auth),
                class_id,
                today,
                engine.search_window_days,
                engine.search_max_windows,
            )
            .await;
        let class = match found {
            Ok(class) => class,
            Err(e) => return Ok(run.fail(RunState::SearchFailed, e).await),
        };
        run.class = Some(class.clone());

        run.advance(RunState::Booking);
        if let Err(e) = self.executor().cancel(&chain, user_id, &auth, &class).await {
            return Ok(run.fail(RunState::BookFailed, e).await);
        }
        run.advance(RunState::Cancelled);

        if let Err(e) = self.reconciler(&chain).pull(user_id, &auth, now).await {
            warn!(chain = %chain.id, user_id, error = %e, "Post-cancel session pull failed");
        }
        Ok(run.report(None))
    }
}
