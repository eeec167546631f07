use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpGroupActivity {
    pub id: i64,
    pub name: String,
    pub duration: BrpDuration,
    pub group_activity_product: BrpProduct,
    pub business_unit: BrpBusinessUnit,
    #[serde(default)]
    pub instructors: Vec<BrpInstructor>,
    pub slots: BrpSlots,
    /// Absent for drop-in classes; those never open for booking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookable_earliest: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookable_latest: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub cancelled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrpDuration {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrpProduct {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrpBusinessUnit {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrpInstructor {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpSlots {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub total_bookable: u32,
    #[serde(default)]
    pub left_to_book: u32,
    #[serde(default)]
    pub has_waiting_list: bool,
    #[serde(default)]
    pub in_waiting_list: u32,
}

/// One entry of `customers/{id}/bookings/groupactivities`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrpBooking {
    pub id: i64,
    /// `groupActivityBooking` or `waitingListBooking`.
    #[serde(rename = "type")]
    pub kind: String,
    pub group_activity: BrpGroupActivity,
    #[serde(default)]
    pub checked_in: bool,
}
