//! Shared format and temporal validators.
//!
//! # Responsibility
//! - Validate string-shaped attributes against their fixed patterns before
//!   any SQL mutation.
//! - Validate optional end dates against their start dates.
//!
//! # Invariants
//! - A validation failure blocks the whole mutation; values are never
//!   truncated or normalized into shape.
//! - Absent optional values (None or empty email) always pass.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static NATIONAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{7,8}-[0-9Kk]$").expect("valid national id regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+][0-9 -]{6,20}$").expect("valid phone regex"));

pub const NATIONAL_ID_PATTERN: &str = "7-8 digits, a dash, then a check digit 0-9 or K";
pub const EMAIL_PATTERN: &str = "local@domain.tld with a 2+ letter top-level label";
pub const PHONE_PATTERN: &str = "digit or + followed by 6-20 digits, spaces or dashes";

/// Validation failure raised before any row is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A string attribute does not match its declared pattern.
    InvalidFormat {
        field: &'static str,
        expected: &'static str,
    },
    /// An optional end/return date precedes its start/departure date.
    InvalidDateRange {
        start_field: &'static str,
        end_field: &'static str,
    },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidFormat { field, expected } => {
                write!(f, "invalid {field}: expected {expected}")
            }
            Self::InvalidDateRange {
                start_field,
                end_field,
            } => write!(f, "{end_field} precedes {start_field}"),
        }
    }
}

impl Error for ValidationError {}

/// Validates a national identity number (`1234567-9`, check digit may be K).
pub fn validate_national_id(value: &str) -> Result<(), ValidationError> {
    if NATIONAL_ID_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "national_id",
            expected: NATIONAL_ID_PATTERN,
        })
    }
}

/// Validates an optional email attribute. `None` and `""` are both valid.
pub fn validate_email(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        None => Ok(()),
        Some(text) if text.is_empty() => Ok(()),
        Some(text) if EMAIL_RE.is_match(text) => Ok(()),
        Some(_) => Err(ValidationError::InvalidFormat {
            field,
            expected: EMAIL_PATTERN,
        }),
    }
}

/// Validates a phone number satellite value.
pub fn validate_phone_number(value: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "phone_number",
            expected: PHONE_PATTERN,
        })
    }
}

/// Validates an optional end date against its start. Same-day ranges pass.
pub fn validate_date_range(
    start_field: &'static str,
    start: NaiveDate,
    end_field: &'static str,
    end: Option<NaiveDate>,
) -> Result<(), ValidationError> {
    match end {
        Some(end) if end < start => Err(ValidationError::InvalidDateRange {
            start_field,
            end_field,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn national_id_accepts_seven_and_eight_digit_bodies() {
        assert!(validate_national_id("1234567-9").is_ok());
        assert!(validate_national_id("12345678-K").is_ok());
        assert!(validate_national_id("12345678-k").is_ok());
    }

    #[test]
    fn national_id_rejects_short_body_and_bad_check_digit() {
        assert!(validate_national_id("123456-9").is_err());
        assert!(validate_national_id("123456789-1").is_err());
        assert!(validate_national_id("1234567-X").is_err());
        assert!(validate_national_id("1234567").is_err());
    }

    #[test]
    fn email_requires_dotted_domain_but_allows_absence() {
        assert!(validate_email("email", Some("a@b.cl")).is_ok());
        assert!(validate_email("email", None).is_ok());
        assert!(validate_email("email", Some("")).is_ok());
        assert!(validate_email("email", Some("a@b")).is_err());
        assert!(validate_email("email", Some("a@b.c")).is_err());
    }

    #[test]
    fn phone_accepts_plus_prefix_and_separators() {
        assert!(validate_phone_number("+56 9 1234-5678").is_ok());
        assert!(validate_phone_number("221234567").is_ok());
        assert!(validate_phone_number("12345").is_err());
        assert!(validate_phone_number("phone-number").is_err());
    }

    #[test]
    fn date_range_allows_equal_endpoints() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert!(validate_date_range("start_date", start, "end_date", Some(start)).is_ok());
        assert!(validate_date_range("start_date", start, "end_date", None).is_ok());

        let earlier = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let err = validate_date_range("start_date", start, "end_date", Some(earlier)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDateRange { .. }));
    }
}
