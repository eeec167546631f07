//! iBooking-style provider (Sit).
//!
//! Login is form-encoded and yields a bare token that is passed as a query/form field on every
//! later call. Studios are numbered; times are naive local strings.

mod convert;
mod errors;

use crate::config::ProviderResolvedConfig;
use crate::error::{AuthenticationError, BookingError};
use crate::providers::policy::{booking_error, classify_auth_error, validation_error};
use crate::providers::upstream_retry::send_with_retry;
use crate::providers::BookingProvider;
use crate::types::{
    AuthHandle, Credentials, LiveBooking, LocationKey, ProviderKind, ScheduleClass, SessionStatus,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use reqwest::StatusCode;
use slotbot_schema::{IbookingAck, IbookingBookings, IbookingLoginResponse, IbookingSchedule};
use tracing::{debug, warn};
use url::Url;

pub use convert::{class_from_wire, parse_local};

const PROVIDER: &str = "iBooking";

pub struct IbookingProvider {
    client: reqwest::Client,
    cfg: ProviderResolvedConfig,
    timezone: Tz,
}

impl IbookingProvider {
    pub fn new(cfg: ProviderResolvedConfig, client: reqwest::Client, timezone: Tz) -> Self {
        Self {
            client,
            cfg,
            timezone,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BookingError> {
        self.cfg
            .base_url
            .join(path)
            .map_err(|e| BookingError::Generic(format!("invalid endpoint {path}: {e}")))
    }

    async fn post_action(
        &self,
        path: &str,
        auth: &AuthHandle,
        class_id: &str,
    ) -> Result<bool, BookingError> {
        let url = self.endpoint(path)?;
        let form = [("token", auth.token.as_str()), ("classId", class_id)];
        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.post(url.clone()).form(&form)
        })
        .await?;

        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }
        let ack: IbookingAck = resp
            .json()
            .await
            .map_err(|e| BookingError::Generic(format!("unreadable acknowledgement: {e}")))?;
        if let Some(error) = ack.error.as_deref().filter(|_| !ack.success) {
            debug!(class_id, error, "[iBooking] Action rejected");
        }
        Ok(ack.success)
    }
}

#[async_trait]
impl BookingProvider for IbookingProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ibooking
    }

    fn max_days_per_request(&self) -> u32 {
        self.cfg.max_days_per_request
    }

    fn max_locations_per_request(&self) -> usize {
        self.cfg.max_locations_per_request
    }

    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthHandle, AuthenticationError> {
        let url = self
            .cfg
            .base_url
            .join("auth/login")
            .map_err(|e| AuthenticationError::Generic(e.to_string()))?;
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.post(url.clone()).form(&form)
        })
        .await?;

        if !resp.status().is_success() {
            return Err(classify_auth_error::<IbookingLoginResponse>(resp).await);
        }

        let body: IbookingLoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthenticationError::TokenExtractionFailed(e.to_string()))?;

        match body.token() {
            Some(token) => Ok(AuthHandle::new(token)),
            None if body.is_blocked() => Err(AuthenticationError::TemporarilyBlocked(
                body.error.clone().unwrap_or_default(),
            )),
            None if body.error.is_some() => Err(AuthenticationError::InvalidCredentials),
            None => Err(AuthenticationError::TokenExtractionFailed(
                "login response carried no token".to_string(),
            )),
        }
    }

    async fn validate(&self, auth: &AuthHandle) -> Result<(), AuthenticationError> {
        let url = self
            .cfg
            .base_url
            .join("auth/validate")
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))?;

        let resp = self
            .client
            .get(url)
            .query(&[("token", auth.token.as_str())])
            .send()
            .await
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(());
        }
        Err(validation_error(resp.status()))
    }

    async fn fetch_schedule(
        &self,
        auth: Option<&AuthHandle>,
        from: NaiveDate,
        days: u32,
        locations: &[LocationKey],
    ) -> Result<Vec<ScheduleClass>, BookingError> {
        let url = self.endpoint("schedule")?;
        let studios = locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut query = vec![
            ("studios", studios),
            ("from", from.format("%Y-%m-%d").to_string()),
            ("days", days.to_string()),
        ];
        if let Some(auth) = auth {
            query.push(("token", auth.token.clone()));
        }

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.get(url.clone()).query(&query)
        })
        .await?;

        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }

        let schedule: IbookingSchedule = resp
            .json()
            .await
            .map_err(|e| BookingError::MalformedSchedule(e.to_string()))?;

        let mut classes = Vec::new();
        for day in &schedule.days {
            for class in &day.classes {
                match class_from_wire(class, &self.timezone) {
                    Ok(class) => classes.push(class),
                    Err(e) => {
                        warn!(class_id = class.id, date = %day.date, error = %e, "[iBooking] Skipping unparseable class");
                    }
                }
            }
        }
        Ok(classes)
    }

    async fn book(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        self.post_action("schedule/book", auth, class_id).await
    }

    async fn cancel(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        self.post_action("schedule/cancel", auth, class_id).await
    }

    async fn fetch_live_sessions(
        &self,
        auth: &AuthHandle,
    ) -> Result<Option<Vec<LiveBooking>>, BookingError> {
        let url = self.endpoint("user/bookings")?;
        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client
                .get(url.clone())
                .query(&[("token", auth.token.as_str())])
        })
        .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }

        let bookings: IbookingBookings = resp
            .json()
            .await
            .map_err(|e| BookingError::MalformedSchedule(e.to_string()))?;

        let live = bookings
            .bookings
            .iter()
            .filter_map(|entry| match class_from_wire(&entry.class, &self.timezone) {
                Ok(class) => Some(LiveBooking {
                    class,
                    status: entry.status.parse().unwrap_or(SessionStatus::Unknown),
                }),
                Err(e) => {
                    warn!(class_id = entry.class.id, error = %e, "[iBooking] Skipping unparseable booking");
                    None
                }
            })
            .collect();
        Ok(Some(live))
    }
}
