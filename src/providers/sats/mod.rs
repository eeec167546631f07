//! SATS member API provider.

mod convert;
mod errors;

use crate::config::ProviderResolvedConfig;
use crate::error::{AuthenticationError, BookingError};
use crate::providers::BookingProvider;
use crate::providers::policy::{booking_error, classify_auth_error, validation_error};
use crate::providers::upstream_retry::send_with_retry;
use crate::types::{
    AuthHandle, Credentials, LiveBooking, LocationKey, ProviderKind, ScheduleClass, SessionStatus,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use slotbot_schema::{
    SatsBookingRequest, SatsBookings, SatsClasses, SatsLoginRequest, SatsLoginResponse,
};
use tracing::warn;
use url::Url;

pub use convert::sats_class_to_class;
pub use errors::SatsErrorBody;

const PROVIDER: &str = "SATS";

pub struct SatsProvider {
    client: reqwest::Client,
    cfg: ProviderResolvedConfig,
}

impl SatsProvider {
    pub fn new(cfg: ProviderResolvedConfig, client: reqwest::Client) -> Self {
        Self { client, cfg }
    }

    fn endpoint(&self, path: &str) -> Result<Url, BookingError> {
        self.cfg
            .base_url
            .join(path)
            .map_err(|e| BookingError::Generic(format!("invalid endpoint {path}: {e}")))
    }
}

#[async_trait]
impl BookingProvider for SatsProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sats
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
        let body = SatsLoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.post(url.clone()).json(&body)
        })
        .await?;

        if !resp.status().is_success() {
            return Err(classify_auth_error::<SatsErrorBody>(resp).await);
        }

        let login: SatsLoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthenticationError::TokenExtractionFailed(e.to_string()))?;
        let token = login.token().ok_or_else(|| {
            AuthenticationError::TokenExtractionFailed("login response carried no token".to_string())
        })?;

        let mut handle = AuthHandle::new(token);
        if let Some(member) = login.member_id.as_deref() {
            handle = handle.with_subject(member);
        }
        if let Some(expiry) = login.expires_at {
            handle = handle.with_expiry(expiry);
        }
        Ok(handle)
    }

    async fn validate(&self, auth: &AuthHandle) -> Result<(), AuthenticationError> {
        if auth.is_expired(chrono::Utc::now()) {
            return Err(AuthenticationError::TokenInvalid);
        }
        let url = self
            .cfg
            .base_url
            .join("auth/validate")
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&auth.token)
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
        let url = self.endpoint("classes")?;
        let clubs = locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let query = [
            ("clubs", clubs),
            ("from", from.format("%Y-%m-%d").to_string()),
            ("days", days.to_string()),
        ];

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            let req = self.client.get(url.clone()).query(&query);
            match auth {
                Some(auth) => req.bearer_auth(&auth.token),
                None => req,
            }
        })
        .await?;

        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }
        let classes: SatsClasses = resp
            .json()
            .await
            .map_err(|e| BookingError::MalformedSchedule(e.to_string()))?;
        Ok(classes.classes.iter().map(sats_class_to_class).collect())
    }

    async fn book(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        let url = self.endpoint("bookings")?;
        let body = SatsBookingRequest { class_id };
        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client
                .post(url.clone())
                .bearer_auth(&auth.token)
                .json(&body)
        })
        .await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::CONFLICT => Ok(false),
            _ => Err(booking_error(resp).await),
        }
    }

    async fn cancel(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        let url = self.endpoint(&format!("bookings/{class_id}"))?;
        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.delete(url.clone()).bearer_auth(&auth.token)
        })
        .await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(booking_error(resp).await),
        }
    }

    async fn fetch_live_sessions(
        &self,
        auth: &AuthHandle,
    ) -> Result<Option<Vec<LiveBooking>>, BookingError> {
        let url = self.endpoint("bookings")?;
        let sent = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.get(url.clone()).bearer_auth(&auth.token)
        })
        .await;

        // 503 means live state is unknown, not empty.
        let resp = match sent {
            Ok(resp) => resp,
            Err(e) if e.status() == Some(StatusCode::SERVICE_UNAVAILABLE) => {
                warn!("[SATS] Bookings backend unavailable");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }
        let bookings: SatsBookings = resp
            .json()
            .await
            .map_err(|e| BookingError::MalformedSchedule(e.to_string()))?;

        Ok(Some(
            bookings
                .bookings
                .iter()
                .map(|b| LiveBooking {
                    class: sats_class_to_class(&b.class),
                    status: b.status.parse().unwrap_or(SessionStatus::Unknown),
                })
                .collect(),
        ))
    }
}
