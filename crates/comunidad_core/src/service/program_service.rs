//! Program use-case service: activities, trips and attendance.
//!
//! # Responsibility
//! - Schedule activities and trips through the repository contract.
//! - Record attendance rows for all three program kinds.
//!
//! # Invariants
//! - Scheduling returns the stored row via read-back.
//! - Temporal ordering failures surface before anything is written.

use crate::model::enrollment::{AttendanceKind, AttendanceRecord};
use crate::model::event::{Activity, ActivityDraft, Trip, TripDraft};
use crate::repo::enrollment_repo::EnrollmentRepository;
use crate::repo::event_repo::{ActivityListQuery, EventRepository, TripListQuery};
use crate::repo::{RepoError, RepoResult};
use crate::service::normalize_list_limit;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for program use-cases.
#[derive(Debug)]
pub enum ProgramServiceError {
    /// Target activity does not exist.
    ActivityNotFound(i64),
    /// Target trip does not exist.
    TripNotFound(i64),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ProgramServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ActivityNotFound(id) => write!(f, "activity not found: {id}"),
            Self::TripNotFound(id) => write!(f, "trip not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent program state: {details}")
            }
        }
    }
}

impl Error for ProgramServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProgramServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "activities",
                id,
            } => Self::ActivityNotFound(id),
            RepoError::NotFound { entity: "trips", id } => Self::TripNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Program service facade over the event and enrollment repositories.
pub struct ProgramService<E: EventRepository, N: EnrollmentRepository> {
    events: E,
    enrollment: N,
}

impl<E: EventRepository, N: EnrollmentRepository> ProgramService<E, N> {
    /// Creates a service using the provided repository implementations.
    pub fn new(events: E, enrollment: N) -> Self {
        Self { events, enrollment }
    }

    /// Schedules one activity and returns the stored row.
    pub fn schedule_activity(
        &self,
        draft: &ActivityDraft,
    ) -> Result<Activity, ProgramServiceError> {
        let id = self.events.create_activity(draft)?;
        self.events
            .get_activity(id)?
            .ok_or(ProgramServiceError::InconsistentState(
                "scheduled activity not found in read-back",
            ))
    }

    /// Replaces a stored activity row fully.
    pub fn update_activity(&self, activity: &Activity) -> Result<Activity, ProgramServiceError> {
        self.events.update_activity(activity)?;
        self.events
            .get_activity(activity.id)?
            .ok_or(ProgramServiceError::InconsistentState(
                "updated activity not found in read-back",
            ))
    }

    /// Lists activities with normalized pagination, newest first.
    pub fn list_activities(
        &self,
        mut query: ActivityListQuery,
    ) -> Result<Vec<Activity>, ProgramServiceError> {
        query.limit = Some(normalize_list_limit(query.limit));
        Ok(self.events.list_activities(&query)?)
    }

    /// Cancels an activity; its attendance history cascades away.
    pub fn cancel_activity(&self, id: i64) -> Result<(), ProgramServiceError> {
        self.events.delete_activity(id)?;
        Ok(())
    }

    /// Schedules one trip and returns the stored row.
    pub fn schedule_trip(&self, draft: &TripDraft) -> Result<Trip, ProgramServiceError> {
        let id = self.events.create_trip(draft)?;
        self.events
            .get_trip(id)?
            .ok_or(ProgramServiceError::InconsistentState(
                "scheduled trip not found in read-back",
            ))
    }

    /// Replaces a stored trip row fully.
    pub fn update_trip(&self, trip: &Trip) -> Result<Trip, ProgramServiceError> {
        self.events.update_trip(trip)?;
        self.events
            .get_trip(trip.id)?
            .ok_or(ProgramServiceError::InconsistentState(
                "updated trip not found in read-back",
            ))
    }

    /// Lists trips with normalized pagination, newest first.
    pub fn list_trips(&self, mut query: TripListQuery) -> Result<Vec<Trip>, ProgramServiceError> {
        query.limit = Some(normalize_list_limit(query.limit));
        Ok(self.events.list_trips(&query)?)
    }

    /// Cancels a trip; its attendance history cascades away.
    pub fn cancel_trip(&self, id: i64) -> Result<(), ProgramServiceError> {
        self.events.delete_trip(id)?;
        Ok(())
    }

    /// Records one attendance, stamped with the current time.
    pub fn record_attendance(
        &self,
        kind: AttendanceKind,
        person_id: i64,
        target_id: i64,
    ) -> Result<AttendanceRecord, ProgramServiceError> {
        Ok(self
            .enrollment
            .record_attendance(kind, person_id, target_id, None)?)
    }

    /// Lists a person's attendance history for one program kind.
    pub fn attendance_for_person(
        &self,
        kind: AttendanceKind,
        person_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        self.enrollment.attendance_for_person(kind, person_id)
    }

    /// Lists who attended one target event.
    pub fn attendance_for_target(
        &self,
        kind: AttendanceKind,
        target_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        self.enrollment.attendance_for_target(kind, target_id)
    }
}
