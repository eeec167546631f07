//! BRP Systems "brponline" provider (3T, FSC).
//!
//! Bearer-token protocol; bookings live under the customer id that `auth/validate` reports, so
//! [`AuthHandle::subject`] carries it. One business unit per schedule request.

mod convert;
mod errors;

use crate::config::ProviderResolvedConfig;
use crate::error::{AuthenticationError, BookingError};
use crate::providers::BookingProvider;
use crate::providers::policy::{booking_error, classify_auth_error, validation_error};
use crate::providers::upstream_retry::send_with_retry;
use crate::types::{
    AuthHandle, Credentials, LiveBooking, LocationKey, ProviderKind, ScheduleClass,
};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::StatusCode;
use slotbot_schema::{
    BrpBooking, BrpBookingRequest, BrpErrorBody, BrpGroupActivity, BrpLoginRequest,
    BrpLoginResponse, BrpValidateResponse,
};
use std::collections::HashMap;
use tracing::debug;
use url::Url;

pub use convert::{activity_to_class, booking_status};

const PROVIDER: &str = "BRP";

pub struct BrpProvider {
    client: reqwest::Client,
    cfg: ProviderResolvedConfig,
    timezone: Tz,
}

impl BrpProvider {
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

    fn customer_id<'a>(&self, auth: &'a AuthHandle) -> Result<&'a str, BookingError> {
        auth.subject
            .as_deref()
            .ok_or_else(|| BookingError::Generic("BRP session has no customer id".to_string()))
    }

    async fn validate_token(&self, token: &str) -> Result<BrpValidateResponse, AuthenticationError> {
        let url = self
            .cfg
            .base_url
            .join("auth/validate")
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))?;

        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(validation_error(resp.status()));
        }
        resp.json()
            .await
            .map_err(|e| AuthenticationError::TokenValidationFailed(e.to_string()))
    }

    async fn bookings(&self, auth: &AuthHandle) -> Result<Option<Vec<BrpBooking>>, BookingError> {
        let customer = self.customer_id(auth)?;
        let url = self.endpoint(&format!("customers/{customer}/bookings/groupactivities"))?;
        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.get(url.clone()).bearer_auth(&auth.token)
        })
        .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(booking_error(resp).await);
        }
        resp.json()
            .await
            .map(Some)
            .map_err(|e| BookingError::MalformedSchedule(e.to_string()))
    }
}

#[async_trait]
impl BookingProvider for BrpProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Brp
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
        let body = BrpLoginRequest {
            username: &credentials.username,
            password: &credentials.password,
        };

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client.post(url.clone()).json(&body)
        })
        .await?;

        if !resp.status().is_success() {
            return Err(classify_auth_error::<BrpErrorBody>(resp).await);
        }

        let login: BrpLoginResponse = resp
            .json()
            .await
            .map_err(|e| AuthenticationError::TokenExtractionFailed(e.to_string()))?;
        let token = login.access_token().ok_or_else(|| {
            AuthenticationError::TokenExtractionFailed("login response carried no access token".to_string())
        })?;

        // The customer id is only available from the validation endpoint.
        let validated = self.validate_token(token).await?;

        let mut handle = AuthHandle::new(token).with_subject(validated.customer_id.to_string());
        let expiry = validated.expires_at.or_else(|| {
            login
                .expires_in
                .map(|secs| handle.obtained_at + Duration::seconds(secs))
        });
        if let Some(expiry) = expiry {
            handle = handle.with_expiry(expiry);
        }
        debug!(customer_id = validated.customer_id, "[BRP] Authenticated");
        Ok(handle)
    }

    async fn validate(&self, auth: &AuthHandle) -> Result<(), AuthenticationError> {
        let validated = self.validate_token(&auth.token).await?;
        if auth.subject.as_deref() != Some(validated.customer_id.to_string().as_str()) {
            return Err(AuthenticationError::TokenInvalid);
        }
        Ok(())
    }

    async fn fetch_schedule(
        &self,
        auth: Option<&AuthHandle>,
        from: NaiveDate,
        days: u32,
        locations: &[LocationKey],
    ) -> Result<Vec<ScheduleClass>, BookingError> {
        let start = self
            .timezone
            .from_local_datetime(&from.and_time(chrono::NaiveTime::MIN))
            .earliest()
            .ok_or_else(|| BookingError::MalformedSearch(format!("no local midnight on {from}")))?
            .with_timezone(&Utc);
        let end = start + Duration::days(i64::from(days));
        let period = [
            ("period.start", start.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
            ("period.end", end.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()),
        ];

        let statuses: HashMap<i64, BrpBooking> = match auth {
            Some(auth) => self
                .bookings(auth)
                .await?
                .unwrap_or_default()
                .into_iter()
                .map(|b| (b.group_activity.id, b))
                .collect(),
            None => HashMap::new(),
        };

        let mut classes = Vec::new();
        for location in locations {
            let url = self.endpoint(&format!("businessunits/{location}/groupactivities"))?;
            let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
                let req = self.client.get(url.clone()).query(&period);
                match auth {
                    Some(auth) => req.bearer_auth(&auth.token),
                    None => req,
                }
            })
            .await?;

            if !resp.status().is_success() {
                return Err(booking_error(resp).await);
            }
            let activities: Vec<BrpGroupActivity> = resp
                .json()
                .await
                .map_err(|e| BookingError::MalformedSchedule(e.to_string()))?;

            classes.extend(activities.iter().map(|activity| {
                let mut class = activity_to_class(activity);
                class.user_status = statuses.get(&activity.id).map(booking_status);
                class
            }));
        }
        Ok(classes)
    }

    async fn book(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        let customer = self.customer_id(auth)?;
        let group_activity = class_id
            .parse::<i64>()
            .map_err(|_| BookingError::MalformedClass(format!("non-numeric class id {class_id:?}")))?;
        let url = self.endpoint(&format!("customers/{customer}/bookings/groupactivities"))?;
        let body = BrpBookingRequest {
            group_activity,
            allow_waiting_list: true,
        };

        let resp = send_with_retry(PROVIDER, self.cfg.retry_max_times, || {
            self.client
                .post(url.clone())
                .bearer_auth(&auth.token)
                .json(&body)
        })
        .await?;

        match resp.status() {
            s if s.is_success() => Ok(true),
            // Full without waiting list, already booked, or outside the booking window.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = resp.json::<BrpErrorBody>().await.unwrap_or_default();
                debug!(class_id, error_code = ?body.error_code, "[BRP] Booking rejected");
                Ok(false)
            }
            _ => Err(booking_error(resp).await),
        }
    }

    async fn cancel(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError> {
        let customer = self.customer_id(auth)?;
        let booking = self
            .bookings(auth)
            .await?
            .unwrap_or_default()
            .into_iter()
            .find(|b| b.group_activity.id.to_string() == class_id);
        let Some(booking) = booking else {
            debug!(class_id, "[BRP] No booking to cancel");
            return Ok(false);
        };

        let url = self.endpoint(&format!(
            "customers/{customer}/bookings/groupactivities/{}",
            booking.id
        ))?;
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
        let Some(bookings) = self.bookings(auth).await? else {
            return Ok(None);
        };
        Ok(Some(
            bookings
                .iter()
                .map(|b| LiveBooking {
                    class: activity_to_class(&b.group_activity),
                    status: booking_status(b),
                })
                .collect(),
        ))
    }
}
