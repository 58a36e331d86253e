//! Elderly person domain model.
//!
//! # Responsibility
//! - Define the registered-person record and its pre-insert draft shape.
//! - Own the person-level format checks (national id, email).
//!
//! # Invariants
//! - `national_id` is the natural key: unique across the registry, shaped as
//!   7-8 digits, a dash and a check digit (0-9 or K).
//! - `email`, when present, must look like `local@domain.tld`.
//! - Gender, nationality and neighborhood unit are catalog references.

use crate::model::validate::{validate_email, validate_national_id, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pre-insert shape for registering a person. Storage assigns the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDraft {
    pub national_id: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub gender_id: i64,
    pub nationality_id: i64,
    pub birth_date: NaiveDate,
    pub address: String,
    pub email: Option<String>,
    pub neighborhood_unit_id: i64,
}

impl PersonDraft {
    /// Checks every format-constrained attribute. Nothing is written when
    /// this fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_national_id(&self.national_id)?;
        validate_email("email", self.email.as_deref())?;
        Ok(())
    }
}

/// Stored person row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElderlyPerson {
    pub id: i64,
    pub national_id: String,
    pub given_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub second_last_name: Option<String>,
    pub gender_id: i64,
    pub nationality_id: i64,
    pub birth_date: NaiveDate,
    pub address: String,
    pub email: Option<String>,
    pub neighborhood_unit_id: i64,
}

impl ElderlyPerson {
    /// Same checks as the draft; updates revalidate the full row.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_national_id(&self.national_id)?;
        validate_email("email", self.email.as_deref())?;
        Ok(())
    }
}
