//! BRP Systems "brponline" protocol (used by 3T and FSC).
//!
//! All timestamps are RFC 3339 with an explicit offset.

mod activity;

pub use activity::{
    BrpBooking, BrpBusinessUnit, BrpDuration, BrpGroupActivity, BrpInstructor, BrpProduct,
    BrpSlots,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct BrpLoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrpLoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl BrpLoginResponse {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Body of `GET auth/validate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpValidateResponse {
    pub customer_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpBookingRequest {
    pub group_activity: i64,
    pub allow_waiting_list: bool,
}

/// Error payload, e.g. `{"errorCode":"CUSTOMER_BLOCKED","message":"..."}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BrpErrorBody {
    pub fn is_blocked(&self) -> bool {
        self.error_code
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case("CUSTOMER_BLOCKED"))
    }
}
