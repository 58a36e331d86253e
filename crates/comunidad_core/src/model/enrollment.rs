//! Association records: benefit assignments, memberships and attendance.

use serde::{Deserialize, Serialize};

/// Benefit assigned to a person. Composite key (person, benefit); the
/// assignment date records when it was granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonBenefit {
    pub person_id: i64,
    pub benefit_id: i64,
    pub assigned_on: chrono::NaiveDate,
}

/// Person-to-organization membership. Composite key, no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub person_id: i64,
    pub organization_id: i64,
}

/// The three attendance histories share one row shape; the kind selects the
/// target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceKind {
    Workshop,
    Activity,
    Trip,
}

/// One attendance row: a person was counted at a target event. At most one
/// logical attendance exists per (person, target) regardless of timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub person_id: i64,
    pub target_id: i64,
    /// Epoch milliseconds at which the attendance was first recorded.
    pub attended_at: i64,
}
