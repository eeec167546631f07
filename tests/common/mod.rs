#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use slotbot::config::Config;
use slotbot::cron::CronTable;
use slotbot::db::Store;
use slotbot::error::{AuthenticationError, BookingError, SlotbotError};
use slotbot::notify::{Notification, NotificationKind, Notifier};
use slotbot::providers::{BookingProvider, Chain, ChainRegistry};
use slotbot::types::{
    ActivityId, AuthHandle, ChainId, ChainUser, Credentials, LiveBooking, Location, LocationId,
    LocationKey, LocationTable, ProviderKind, RecurringBookingConfig, ScheduleClass, Session,
    SessionStatus, Slots,
};
use slotbot::Engine;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const CHAIN: &str = "sit";
pub const USER: i64 = 7;
pub const YOGA: u32 = 17;
pub const GLOSHAUGEN: i64 = 306;
pub const DRAGVOLL: i64 = 307;

pub fn oslo() -> Tz {
    chrono_tz::Europe::Oslo
}

pub fn at(rfc3339: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(rfc3339).expect("valid timestamp")
}

pub fn utc(rfc3339: &str) -> DateTime<Utc> {
    at(rfc3339).with_timezone(&Utc)
}

/// A bookable class at `location` opening 48 hours before start.
pub fn class(id: &str, activity: u32, location: i64, start: &str) -> ScheduleClass {
    let start = at(start);
    ScheduleClass {
        id: id.to_string(),
        activity_id: ActivityId::new(activity),
        name: format!("Class {id}"),
        location: LocationKey::Numeric(location),
        start,
        end: start + Duration::hours(1),
        booking_opens_at: start - Duration::hours(48),
        bookable: true,
        instructors: vec!["Kari".to_string()],
        slots: Slots {
            capacity: 20,
            available: 5,
            waitlist: None,
        },
        user_status: None,
    }
}

/// Wednesday 18:00 yoga at Gløshaugen.
pub fn recurring(id: i64) -> RecurringBookingConfig {
    RecurringBookingConfig {
        id,
        user_id: USER,
        chain: ChainId::new(CHAIN),
        activity_id: ActivityId::new(YOGA),
        weekday: 2,
        hour: 18,
        minute: 0,
        location_id: LocationId(1),
        display_name: Some("Wednesday yoga".to_string()),
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        username: "ola@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

/// Scripted provider. Queued results are consumed in order; an empty queue means success.
pub struct FakeProvider {
    timezone: Tz,
    classes: Mutex<Vec<ScheduleClass>>,
    auth_results: Mutex<VecDeque<Result<AuthHandle, AuthenticationError>>>,
    book_results: Mutex<VecDeque<Result<bool, BookingError>>>,
    cancel_results: Mutex<VecDeque<Result<bool, BookingError>>>,
    failing_windows: Mutex<Vec<NaiveDate>>,
    live: Mutex<Option<Vec<LiveBooking>>>,
    handle_valid: AtomicBool,
    pub auth_calls: AtomicUsize,
    pub validate_calls: AtomicUsize,
    pub schedule_calls: AtomicUsize,
    pub book_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
    pub book_times: Mutex<Vec<tokio::time::Instant>>,
}

impl FakeProvider {
    pub fn new(classes: Vec<ScheduleClass>) -> Self {
        Self {
            timezone: oslo(),
            classes: Mutex::new(classes),
            auth_results: Mutex::new(VecDeque::new()),
            book_results: Mutex::new(VecDeque::new()),
            cancel_results: Mutex::new(VecDeque::new()),
            failing_windows: Mutex::new(Vec::new()),
            live: Mutex::new(Some(Vec::new())),
            handle_valid: AtomicBool::new(true),
            auth_calls: AtomicUsize::new(0),
            validate_calls: AtomicUsize::new(0),
            schedule_calls: AtomicUsize::new(0),
            book_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
            book_times: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_auth(&self, result: Result<AuthHandle, AuthenticationError>) {
        self.auth_results.lock().unwrap().push_back(result);
    }

    pub fn queue_book(&self, result: Result<bool, BookingError>) {
        self.book_results.lock().unwrap().push_back(result);
    }

    pub fn queue_cancel(&self, result: Result<bool, BookingError>) {
        self.cancel_results.lock().unwrap().push_back(result);
    }

    /// Schedule requests starting on `from` fail with a malformed schedule.
    pub fn fail_window(&self, from: NaiveDate) {
        self.failing_windows.lock().unwrap().push(from);
    }

    pub fn set_live(&self, live: Option<Vec<LiveBooking>>) {
        *self.live.lock().unwrap() = live;
    }

    pub fn set_handle_valid(&self, valid: bool) {
        self.handle_valid.store(valid, Ordering::SeqCst);
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BookingProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ibooking
    }

    fn max_days_per_request(&self) -> u32 {
        7
    }

    fn max_locations_per_request(&self) -> usize {
        1
    }

    async fn authenticate(
        &self,
        _credentials: &Credentials,
    ) -> Result<AuthHandle, AuthenticationError> {
        let n = self.auth_calls.fetch_add(1, Ordering::SeqCst);
        self.auth_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(AuthHandle::new(format!("token-{n}")).with_subject("member-1")))
    }

    async fn validate(&self, _auth: &AuthHandle) -> Result<(), AuthenticationError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        if self.handle_valid.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AuthenticationError::TokenInvalid)
        }
    }

    async fn fetch_schedule(
        &self,
        _auth: Option<&AuthHandle>,
        from: NaiveDate,
        days: u32,
        locations: &[LocationKey],
    ) -> Result<Vec<ScheduleClass>, BookingError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_windows.lock().unwrap().contains(&from) {
            return Err(BookingError::MalformedSchedule(format!("window {from} broken")));
        }
        let until = from + Duration::days(i64::from(days));
        Ok(self
            .classes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                let day = c.start.with_timezone(&self.timezone).date_naive();
                day >= from && day < until && locations.contains(&c.location)
            })
            .cloned()
            .collect())
    }

    async fn book(&self, _auth: &AuthHandle, _class_id: &str) -> Result<bool, BookingError> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        self.book_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        self.book_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(true))
    }

    async fn cancel(&self, _auth: &AuthHandle, _class_id: &str) -> Result<bool, BookingError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        self.cancel_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(true))
    }

    async fn fetch_live_sessions(
        &self,
        _auth: &AuthHandle,
    ) -> Result<Option<Vec<LiveBooking>>, BookingError> {
        Ok(self.live.lock().unwrap().clone())
    }
}

pub fn chain(provider: Arc<FakeProvider>) -> Chain {
    Chain {
        id: ChainId::new(CHAIN),
        name: "Sit Trening".to_string(),
        timezone: oslo(),
        locations: LocationTable::new([
            Location::new(1, GLOSHAUGEN, "Gløshaugen"),
            Location::new(2, DRAGVOLL, "Dragvoll"),
        ]),
        provider,
    }
}

#[derive(Default)]
struct StoreState {
    users: Vec<ChainUser>,
    configs: Vec<RecurringBookingConfig>,
    sessions: Vec<Session>,
    reminded: HashSet<(ChainId, String, i64)>,
    auth: Vec<((i64, ChainId), AuthHandle)>,
}

/// Store kept in memory with the same session replacement rules as the SQLite one.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn seed_session(&self, session: Session) {
        self.state.lock().unwrap().sessions.push(session);
    }

    pub fn all_sessions(&self) -> Vec<Session> {
        self.state.lock().unwrap().sessions.clone()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn chain_users(
        &self,
        chain: Option<ChainId>,
        user_id: Option<i64>,
    ) -> Result<Vec<ChainUser>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .filter(|u| chain.as_ref().is_none_or(|c| &u.chain == c))
            .filter(|u| user_id.is_none_or(|id| u.user_id == id))
            .cloned()
            .collect())
    }

    async fn credentials(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<Credentials>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.user_id == user_id && &u.chain == chain)
            .map(|u| u.credentials.clone()))
    }

    async fn add_chain_user(&self, user: ChainUser) -> Result<(), SlotbotError> {
        let mut state = self.state.lock().unwrap();
        state
            .users
            .retain(|u| !(u.user_id == user.user_id && u.chain == user.chain));
        state.users.push(user);
        Ok(())
    }

    async fn recurring_configs(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Vec<RecurringBookingConfig>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .configs
            .iter()
            .filter(|c| c.user_id == user_id && &c.chain == chain)
            .cloned()
            .collect())
    }

    async fn recurring_config(
        &self,
        id: i64,
    ) -> Result<Option<RecurringBookingConfig>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .configs
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn add_recurring_config(
        &self,
        mut config: RecurringBookingConfig,
    ) -> Result<i64, SlotbotError> {
        let mut state = self.state.lock().unwrap();
        config.id = state.configs.len() as i64 + 1;
        let id = config.id;
        state.configs.push(config);
        Ok(id)
    }

    async fn upsert_sessions(
        &self,
        user_id: i64,
        chain: &ChainId,
        sessions: Vec<Session>,
    ) -> Result<(), SlotbotError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.retain(|s| {
            !(s.user_id == user_id && &s.chain == chain && s.status != SessionStatus::Confirmed)
        });
        for session in sessions {
            state
                .sessions
                .retain(|s| !(s.user_id == user_id && &s.chain == chain && s.class_id == session.class_id));
            state.sessions.push(session);
        }
        let StoreState { sessions, reminded, .. } = &mut *state;
        reminded.retain(|(c, class_id, u)| {
            sessions
                .iter()
                .any(|s| &s.chain == c && &s.class_id == class_id && s.user_id == *u)
        });
        Ok(())
    }

    async fn sessions(&self, user_id: i64, chain: &ChainId) -> Result<Vec<Session>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && &s.chain == chain)
            .cloned()
            .collect())
    }

    async fn pending_reminders(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Session>, SlotbotError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .iter()
            .filter(|s| {
                let start = s.class.start.with_timezone(&Utc);
                start >= from
                    && start < to
                    && !state
                        .reminded
                        .contains(&(s.chain.clone(), s.class_id.clone(), s.user_id))
            })
            .cloned()
            .collect())
    }

    async fn mark_reminded(&self, session: &Session, _at: DateTime<Utc>) -> Result<(), SlotbotError> {
        self.state.lock().unwrap().reminded.insert((
            session.chain.clone(),
            session.class_id.clone(),
            session.user_id,
        ));
        Ok(())
    }

    async fn cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
    ) -> Result<Option<AuthHandle>, SlotbotError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .auth
            .iter()
            .find(|((u, c), _)| *u == user_id && c == chain)
            .map(|(_, h)| h.clone()))
    }

    async fn set_cached_auth(
        &self,
        user_id: i64,
        chain: &ChainId,
        handle: Option<AuthHandle>,
    ) -> Result<(), SlotbotError> {
        let mut state = self.state.lock().unwrap();
        state
            .auth
            .retain(|((u, c), _)| !(*u == user_id && c == chain));
        if let Some(handle) = handle {
            state.auth.push(((user_id, chain.clone()), handle));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(|n| n.kind).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct MemoryCrontab {
    pub content: Mutex<String>,
}

#[async_trait]
impl CronTable for MemoryCrontab {
    async fn load(&self) -> Result<String, SlotbotError> {
        Ok(self.content.lock().unwrap().clone())
    }

    async fn save(&self, content: &str) -> Result<(), SlotbotError> {
        *self.content.lock().unwrap() = content.to_string();
        Ok(())
    }
}

/// Everything an engine test needs to poke at.
pub struct Harness {
    pub provider: Arc<FakeProvider>,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub crontab: Arc<MemoryCrontab>,
    pub engine: Engine,
}

/// Defaults with the cron zone pinned to Oslo.
pub fn config() -> Config {
    let mut cfg = Config::default();
    cfg.cron.timezone = Some(oslo());
    cfg
}

pub async fn harness(classes: Vec<ScheduleClass>, cfg: Config) -> Harness {
    let provider = Arc::new(FakeProvider::new(classes));
    let store = Arc::new(InMemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let crontab = Arc::new(MemoryCrontab::default());

    store
        .add_chain_user(ChainUser {
            user_id: USER,
            chain: ChainId::new(CHAIN),
            credentials: credentials(),
        })
        .await
        .expect("seed user");
    store
        .add_recurring_config(recurring(0))
        .await
        .expect("seed config");

    let engine = Engine::new(
        Arc::new(cfg),
        ChainRegistry::new([chain(provider.clone())]),
        store.clone(),
        notifier.clone(),
        crontab.clone(),
    );

    Harness {
        provider,
        store,
        notifier,
        crontab,
        engine,
    }
}
