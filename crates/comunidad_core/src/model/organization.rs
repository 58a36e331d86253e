//! Community organization domain model.

use crate::model::validate::{validate_email, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pre-insert shape for registering an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationDraft {
    pub name: String,
    pub address: String,
    pub neighborhood_unit_id: i64,
    pub founding_date: NaiveDate,
    pub legal_status: String,
    pub email: Option<String>,
}

impl OrganizationDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", self.email.as_deref())
    }
}

/// Stored organization row. `name` is unique across the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub neighborhood_unit_id: i64,
    pub founding_date: NaiveDate,
    pub legal_status: String,
    pub email: Option<String>,
}

impl Organization {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email("email", self.email.as_deref())
    }
}
