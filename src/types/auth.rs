use super::ChainId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Username and secret for one user on one chain.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A user's membership on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainUser {
    pub user_id: i64,
    pub chain: ChainId,
    pub credentials: Credentials,
}

/// Opaque provider session obtained from a credential exchange.
///
/// Lifetime is provider-defined; `expires_at` is only a hint and a handle must still be
/// validated before reuse.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHandle {
    pub token: String,

    /// Provider-side account id (BRP customer id, SATS member id) when the protocol needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    pub obtained_at: DateTime<Utc>,
}

impl AuthHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            subject: None,
            expires_at: None,
            obtained_at: Utc::now(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// True when within 5 minutes of the advertised expiry (inclusive). Handles without an
    /// expiry hint are never considered expired here.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expiry| now + Duration::minutes(5) >= expiry)
    }
}

impl fmt::Debug for AuthHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHandle")
            .field("token", &"<redacted>")
            .field("subject", &self.subject)
            .field("expires_at", &self.expires_at)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}
