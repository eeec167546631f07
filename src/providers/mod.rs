//! Remote booking protocols.
//!
//! Each remote system implements [`BookingProvider`]. A chain is a data record in the
//! [`ChainRegistry`] that points at one provider instance; the engine only ever talks to the
//! trait.

pub mod brp;
pub mod chains;
pub mod ibooking;
pub mod sats;

mod http;
pub(crate) mod policy;
mod registry;
mod upstream_retry;

pub use http::build_client;
pub use policy::{MapAuthError, UPSTREAM_BODY_PREVIEW_CHARS};
pub use registry::{Chain, ChainRegistry};

use crate::error::{AuthenticationError, BookingError};
use crate::types::{AuthHandle, Credentials, LiveBooking, LocationKey, ProviderKind, ScheduleClass};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

/// Capability interface of one remote booking system.
#[async_trait]
pub trait BookingProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Longest day range a single schedule request may cover.
    fn max_days_per_request(&self) -> u32;

    /// Most locations a single schedule request may name.
    fn max_locations_per_request(&self) -> usize;

    /// Exchange credentials for a provider session.
    async fn authenticate(&self, credentials: &Credentials)
    -> Result<AuthHandle, AuthenticationError>;

    /// Check that a previously obtained handle is still accepted.
    ///
    /// The default only honours the expiry hint; providers with a cheap validation endpoint
    /// override this.
    async fn validate(&self, auth: &AuthHandle) -> Result<(), AuthenticationError> {
        if auth.is_expired(Utc::now()) {
            return Err(AuthenticationError::TokenInvalid);
        }
        Ok(())
    }

    /// Classes starting within `[from, from + days)` at the given locations.
    ///
    /// `days` and `locations.len()` never exceed the provider limits; batching is the caller's
    /// job. When `auth` is given the provider fills in the user's status per class.
    async fn fetch_schedule(
        &self,
        auth: Option<&AuthHandle>,
        from: NaiveDate,
        days: u32,
        locations: &[LocationKey],
    ) -> Result<Vec<ScheduleClass>, BookingError>;

    async fn book(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError>;

    async fn cancel(&self, auth: &AuthHandle, class_id: &str) -> Result<bool, BookingError>;

    /// Current bookings, waitlist entries and attendances of the authenticated user.
    ///
    /// `Ok(None)` means the provider could not report live state right now; callers must not
    /// treat that as "no bookings".
    async fn fetch_live_sessions(
        &self,
        auth: &AuthHandle,
    ) -> Result<Option<Vec<LiveBooking>>, BookingError>;
}
