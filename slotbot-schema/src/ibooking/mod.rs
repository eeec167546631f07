//! iBooking-style schedule protocol (used by Sit).
//!
//! Timestamps are naive local strings (`YYYY-MM-DD HH:MM:SS`) in the operator's timezone;
//! localization happens in the provider, not here.

mod schedule;

pub use schedule::{
    IbookingBookingEntry, IbookingBookings, IbookingClass, IbookingDay, IbookingInstructor,
    IbookingSchedule, IbookingStudio,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Response of the form-encoded login endpoint.
///
/// A rejected login still answers `200 OK` with `token` missing and `error` set, so both fields
/// are optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IbookingLoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl IbookingLoginResponse {
    /// Token with surrounding whitespace removed; empty tokens count as missing.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// The upstream signals a locked account with an error text rather than a status code.
    pub fn is_blocked(&self) -> bool {
        self.error
            .as_deref()
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| e.contains("blocked") || e.contains("too many"))
    }
}

/// Generic `{ "success": bool }` acknowledgement used by book/cancel.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct IbookingAck {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
