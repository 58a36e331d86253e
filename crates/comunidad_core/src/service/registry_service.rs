//! Registration use-case service.
//!
//! # Responsibility
//! - Provide person registration APIs over the repository contract.
//! - Register a person together with their phone rows in one transaction.
//! - Expose the territorial aggregation used by dashboard callers.
//!
//! # Invariants
//! - Mutations return the stored row via read-back, never an echo of the
//!   caller's payload.
//! - Service APIs never bypass repository validation contracts.

use crate::model::person::{ElderlyPerson, PersonDraft};
use crate::model::phone::PhoneNumber;
use crate::repo::person_repo::{MacroSectorCount, PersonListQuery, PersonRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::normalize_list_limit;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for registration use-cases.
#[derive(Debug)]
pub enum RegistryServiceError {
    /// Target person does not exist.
    PersonNotFound(i64),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for RegistryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent registry state: {details}")
            }
        }
    }
}

impl Error for RegistryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for RegistryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "elderly_persons",
                id,
            } => Self::PersonNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonsListResult {
    /// Items sorted by `last_name, given_name, id ASC`.
    pub items: Vec<ElderlyPerson>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Registration service facade over the person repository.
pub struct RegistryService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> RegistryService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a person with zero or more phone rows, atomically.
    pub fn register_person(
        &mut self,
        draft: &PersonDraft,
        phones: &[PhoneNumber],
    ) -> Result<ElderlyPerson, RegistryServiceError> {
        let person_id = self.repo.create_person_with_phones(draft, phones)?;
        self.repo
            .get_person(person_id)?
            .ok_or(RegistryServiceError::InconsistentState(
                "registered person not found in read-back",
            ))
    }

    /// Replaces a stored person row fully and returns the stored state.
    pub fn update_person(
        &self,
        person: &ElderlyPerson,
    ) -> Result<ElderlyPerson, RegistryServiceError> {
        self.repo.update_person(person)?;
        self.repo
            .get_person(person.id)?
            .ok_or(RegistryServiceError::InconsistentState(
                "updated person not found in read-back",
            ))
    }

    /// Gets one person by id.
    pub fn get_person(&self, id: i64) -> RepoResult<Option<ElderlyPerson>> {
        self.repo.get_person(id)
    }

    /// Lists persons using filters and normalized pagination.
    pub fn list_persons(
        &self,
        mut query: PersonListQuery,
    ) -> Result<PersonsListResult, RegistryServiceError> {
        let applied_limit = normalize_list_limit(query.limit);
        query.limit = Some(applied_limit);
        let items = self.repo.list_persons(&query)?;
        Ok(PersonsListResult {
            items,
            applied_limit,
        })
    }

    /// Removes a person and, through the schema cascades, every dependent
    /// phone, assignment, membership and attendance row.
    pub fn remove_person(&self, id: i64) -> Result<(), RegistryServiceError> {
        self.repo.delete_person(id)?;
        Ok(())
    }

    /// Adds one phone row to a registered person.
    pub fn add_phone(
        &self,
        person_id: i64,
        phone: &PhoneNumber,
    ) -> Result<(), RegistryServiceError> {
        self.repo.add_phone(person_id, phone)?;
        Ok(())
    }

    /// Lists a person's phone rows ordered by type.
    pub fn list_phones(&self, person_id: i64) -> RepoResult<Vec<PhoneNumber>> {
        self.repo.list_phones(person_id)
    }

    /// Removes one phone row by type.
    pub fn remove_phone(&self, person_id: i64, kind: &str) -> Result<(), RegistryServiceError> {
        self.repo.remove_phone(person_id, kind)?;
        Ok(())
    }

    /// Person counts per macro sector, resolved through the territorial join.
    pub fn persons_per_macro_sector(&self) -> RepoResult<Vec<MacroSectorCount>> {
        self.repo.count_by_macro_sector()
    }
}
