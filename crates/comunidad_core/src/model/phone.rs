//! Phone number satellite shared by persons and organizations.

use crate::model::validate::{validate_phone_number, ValidationError};
use serde::{Deserialize, Serialize};

/// Default phone type used when callers do not name one.
///
/// The type stays an open string on purpose: the schema constrains it only
/// through per-owner uniqueness.
pub const DEFAULT_PHONE_TYPE: &str = "principal";

/// One phone row. An owner holds at most one row per type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    /// Serialized as `type` to match the stored column name.
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
}

impl PhoneNumber {
    /// Creates a phone row with the default `principal` type.
    pub fn principal(number: impl Into<String>) -> Self {
        Self {
            kind: DEFAULT_PHONE_TYPE.to_string(),
            number: number.into(),
        }
    }

    /// Creates a phone row with an explicit type.
    pub fn with_kind(kind: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            number: number.into(),
        }
    }

    /// Checks the number shape. The type is not constrained.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_phone_number(&self.number)
    }
}
