//! Scheduled program models: activities and trips.
//!
//! # Invariants
//! - `end_date`/`return_date`, when present, must not precede the
//!   start/departure date. Same-day events are allowed.
//! - Logical identity is composite: (name, start date, neighborhood unit).

use crate::model::validate::{validate_date_range, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pre-insert shape for a neighborhood activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub name: String,
    pub neighborhood_unit_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl ActivityDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range("start_date", self.start_date, "end_date", self.end_date)
    }
}

/// Stored activity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub neighborhood_unit_id: i64,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
}

impl Activity {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range("start_date", self.start_date, "end_date", self.end_date)
    }
}

/// Pre-insert shape for a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDraft {
    pub name: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub neighborhood_unit_id: i64,
}

impl TripDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range(
            "departure_date",
            self.departure_date,
            "return_date",
            self.return_date,
        )
    }
}

/// Stored trip row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub name: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub neighborhood_unit_id: i64,
}

impl Trip {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_date_range(
            "departure_date",
            self.departure_date,
            "return_date",
            self.return_date,
        )
    }
}
