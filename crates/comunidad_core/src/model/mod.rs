//! Domain records for the community-services registry.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep draft (pre-insert) and stored (keyed) shapes explicit.
//!
//! # Invariants
//! - Stored rows are identified by SQLite surrogate keys (`i64`).
//! - Draft shapes validate their formats before any repository write.
//!
//! # See also
//! - docs/architecture/data-model.md

pub mod catalog;
pub mod center;
pub mod enrollment;
pub mod event;
pub mod organization;
pub mod person;
pub mod phone;
pub mod validate;
