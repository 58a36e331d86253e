//! Core persistence layer for the municipal community-services registry.
//! This crate is the single source of truth for the relational model and its
//! integrity rules.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{Benefit, Gender, MacroSector, Nationality, NeighborhoodUnit, Workshop};
pub use model::center::{CenterDraft, CenterRequest, CommunityCenter, MaintenanceRecord};
pub use model::enrollment::{AttendanceKind, AttendanceRecord, Membership, PersonBenefit};
pub use model::event::{Activity, ActivityDraft, Trip, TripDraft};
pub use model::organization::{Organization, OrganizationDraft};
pub use model::person::{ElderlyPerson, PersonDraft};
pub use model::phone::{PhoneNumber, DEFAULT_PHONE_TYPE};
pub use model::validate::ValidationError;
pub use repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
pub use repo::center_repo::{CenterRepository, SqliteCenterRepository};
pub use repo::enrollment_repo::{EnrollmentRepository, SqliteEnrollmentRepository};
pub use repo::event_repo::{
    ActivityListQuery, EventRepository, SqliteEventRepository, TripListQuery,
};
pub use repo::organization_repo::{
    OrganizationListQuery, OrganizationRepository, SqliteOrganizationRepository,
};
pub use repo::person_repo::{
    MacroSectorCount, PersonListQuery, PersonRepository, SqlitePersonRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::program_service::{ProgramService, ProgramServiceError};
pub use service::registry_service::{PersonsListResult, RegistryService, RegistryServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
