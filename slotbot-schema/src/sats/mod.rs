//! SATS member API.
//!
//! Club and activity identifiers are opaque strings.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct SatsLoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatsLoginResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_id: Option<String>,
}

impl SatsLoginResponse {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SatsClasses {
    #[serde(default)]
    pub classes: Vec<SatsClass>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatsClass {
    pub id: String,
    pub activity_id: String,
    pub name: String,
    pub club_id: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub booking_opens_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub bookable: bool,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub booked: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waitlist: Option<u32>,
    #[serde(default)]
    pub instructors: Vec<String>,
    /// `booked`, `waitlist` or absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SatsBookings {
    #[serde(default)]
    pub bookings: Vec<SatsBooking>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SatsBooking {
    #[serde(rename = "class")]
    pub class: SatsClass,
    /// `booked`, `waitlist`, `attended` or `noshow`.
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SatsBookingRequest<'a> {
    pub class_id: &'a str,
}
