//! Community center model, its maintenance log and request history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pre-insert shape for a community center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterDraft {
    pub name: String,
    pub address: String,
    pub neighborhood_unit_id: i64,
}

/// Stored community center row. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCenter {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub neighborhood_unit_id: i64,
}

/// One maintenance log entry. Unique per (center, service, date); the log
/// disappears with its center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: i64,
    pub center_id: i64,
    pub service_name: String,
    pub serviced_on: NaiveDate,
    pub detail: Option<String>,
}

/// One organization-to-center request. The date belongs to the key, so the
/// history accumulates one row per pair per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterRequest {
    pub organization_id: i64,
    pub center_id: i64,
    pub requested_on: NaiveDate,
}
