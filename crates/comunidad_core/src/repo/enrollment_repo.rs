//! Enrollment repository: benefit assignments, memberships and attendance.
//!
//! # Responsibility
//! - Provide persistence APIs for the person-owned association tables.
//! - Keep the three attendance histories behind one API surface keyed by
//!   `AttendanceKind`.
//!
//! # Invariants
//! - One logical attendance exists per (person, target); re-recording fails
//!   with a duplicate-key error instead of bumping the timestamp.
//! - Assignments and memberships cascade away with the person; benefit
//!   catalog rows are never deleted from here.

use crate::model::enrollment::{AttendanceKind, AttendanceRecord, Membership, PersonBenefit};
use crate::repo::{ensure_connection_ready, map_write_error, RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const BENEFIT_KEY_SCOPE: &str = "person_benefits(person_id, benefit_id)";
const MEMBERSHIP_KEY_SCOPE: &str = "person_organizations(person_id, organization_id)";

/// Repository interface for benefit, membership and attendance links.
pub trait EnrollmentRepository {
    /// Assigns a benefit. `None` dates default to the current local date.
    fn assign_benefit(
        &self,
        person_id: i64,
        benefit_id: i64,
        assigned_on: Option<NaiveDate>,
    ) -> RepoResult<PersonBenefit>;
    fn revoke_benefit(&self, person_id: i64, benefit_id: i64) -> RepoResult<()>;
    fn benefits_for_person(&self, person_id: i64) -> RepoResult<Vec<PersonBenefit>>;
    fn persons_with_benefit(&self, benefit_id: i64) -> RepoResult<Vec<PersonBenefit>>;

    fn join_organization(&self, person_id: i64, organization_id: i64) -> RepoResult<Membership>;
    fn leave_organization(&self, person_id: i64, organization_id: i64) -> RepoResult<()>;
    fn memberships_for_person(&self, person_id: i64) -> RepoResult<Vec<Membership>>;
    fn members_of_organization(&self, organization_id: i64) -> RepoResult<Vec<Membership>>;

    /// Records one attendance. `None` timestamps default to the current time.
    fn record_attendance(
        &self,
        kind: AttendanceKind,
        person_id: i64,
        target_id: i64,
        attended_at: Option<i64>,
    ) -> RepoResult<AttendanceRecord>;
    fn remove_attendance(
        &self,
        kind: AttendanceKind,
        person_id: i64,
        target_id: i64,
    ) -> RepoResult<()>;
    fn attendance_for_person(
        &self,
        kind: AttendanceKind,
        person_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>>;
    fn attendance_for_target(
        &self,
        kind: AttendanceKind,
        target_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>>;
}

/// SQLite-backed enrollment repository.
pub struct SqliteEnrollmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEnrollmentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                "person_benefits",
                "person_organizations",
                "workshop_attendance",
                "activity_attendance",
                "trip_attendance",
            ],
        )?;
        Ok(Self { conn })
    }
}

impl EnrollmentRepository for SqliteEnrollmentRepository<'_> {
    fn assign_benefit(
        &self,
        person_id: i64,
        benefit_id: i64,
        assigned_on: Option<NaiveDate>,
    ) -> RepoResult<PersonBenefit> {
        let assigned_on = assigned_on.unwrap_or_else(|| chrono::Local::now().date_naive());

        self.conn
            .execute(
                "INSERT INTO person_benefits (person_id, benefit_id, assigned_on)
                 VALUES (?1, ?2, ?3);",
                params![person_id, benefit_id, assigned_on],
            )
            .map_err(|err| map_write_error(err, BENEFIT_KEY_SCOPE, "person_benefits"))?;

        Ok(PersonBenefit {
            person_id,
            benefit_id,
            assigned_on,
        })
    }

    fn revoke_benefit(&self, person_id: i64, benefit_id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM person_benefits WHERE person_id = ?1 AND benefit_id = ?2;",
            params![person_id, benefit_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person_benefits",
                id: person_id,
            });
        }

        Ok(())
    }

    fn benefits_for_person(&self, person_id: i64) -> RepoResult<Vec<PersonBenefit>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, benefit_id, assigned_on
             FROM person_benefits
             WHERE person_id = ?1
             ORDER BY assigned_on, benefit_id;",
        )?;
        let mut rows = stmt.query([person_id])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_benefit_row(row)?);
        }
        Ok(assignments)
    }

    fn persons_with_benefit(&self, benefit_id: i64) -> RepoResult<Vec<PersonBenefit>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, benefit_id, assigned_on
             FROM person_benefits
             WHERE benefit_id = ?1
             ORDER BY assigned_on, person_id;",
        )?;
        let mut rows = stmt.query([benefit_id])?;
        let mut assignments = Vec::new();
        while let Some(row) = rows.next()? {
            assignments.push(parse_benefit_row(row)?);
        }
        Ok(assignments)
    }

    fn join_organization(&self, person_id: i64, organization_id: i64) -> RepoResult<Membership> {
        self.conn
            .execute(
                "INSERT INTO person_organizations (person_id, organization_id)
                 VALUES (?1, ?2);",
                params![person_id, organization_id],
            )
            .map_err(|err| map_write_error(err, MEMBERSHIP_KEY_SCOPE, "person_organizations"))?;

        Ok(Membership {
            person_id,
            organization_id,
        })
    }

    fn leave_organization(&self, person_id: i64, organization_id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM person_organizations
             WHERE person_id = ?1 AND organization_id = ?2;",
            params![person_id, organization_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person_organizations",
                id: person_id,
            });
        }

        Ok(())
    }

    fn memberships_for_person(&self, person_id: i64) -> RepoResult<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, organization_id
             FROM person_organizations
             WHERE person_id = ?1
             ORDER BY organization_id;",
        )?;
        let mut rows = stmt.query([person_id])?;
        let mut memberships = Vec::new();
        while let Some(row) = rows.next()? {
            memberships.push(parse_membership_row(row)?);
        }
        Ok(memberships)
    }

    fn members_of_organization(&self, organization_id: i64) -> RepoResult<Vec<Membership>> {
        let mut stmt = self.conn.prepare(
            "SELECT person_id, organization_id
             FROM person_organizations
             WHERE organization_id = ?1
             ORDER BY person_id;",
        )?;
        let mut rows = stmt.query([organization_id])?;
        let mut memberships = Vec::new();
        while let Some(row) = rows.next()? {
            memberships.push(parse_membership_row(row)?);
        }
        Ok(memberships)
    }

    fn record_attendance(
        &self,
        kind: AttendanceKind,
        person_id: i64,
        target_id: i64,
        attended_at: Option<i64>,
    ) -> RepoResult<AttendanceRecord> {
        let attended_at = attended_at.unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
        let table = attendance_table(kind);
        let target_column = attendance_target_column(kind);

        self.conn
            .execute(
                &format!(
                    "INSERT INTO {table} (person_id, {target_column}, attended_at)
                     VALUES (?1, ?2, ?3);"
                ),
                params![person_id, target_id, attended_at],
            )
            .map_err(|err| map_write_error(err, attendance_scope(kind), table))?;

        Ok(AttendanceRecord {
            person_id,
            target_id,
            attended_at,
        })
    }

    fn remove_attendance(
        &self,
        kind: AttendanceKind,
        person_id: i64,
        target_id: i64,
    ) -> RepoResult<()> {
        let table = attendance_table(kind);
        let target_column = attendance_target_column(kind);

        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE person_id = ?1 AND {target_column} = ?2;"),
            params![person_id, target_id],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: table,
                id: person_id,
            });
        }

        Ok(())
    }

    fn attendance_for_person(
        &self,
        kind: AttendanceKind,
        person_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let table = attendance_table(kind);
        let target_column = attendance_target_column(kind);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT person_id, {target_column} AS target_id, attended_at
             FROM {table}
             WHERE person_id = ?1
             ORDER BY attended_at, target_id;"
        ))?;
        let mut rows = stmt.query([person_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }

    fn attendance_for_target(
        &self,
        kind: AttendanceKind,
        target_id: i64,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let table = attendance_table(kind);
        let target_column = attendance_target_column(kind);

        let mut stmt = self.conn.prepare(&format!(
            "SELECT person_id, {target_column} AS target_id, attended_at
             FROM {table}
             WHERE {target_column} = ?1
             ORDER BY attended_at, person_id;"
        ))?;
        let mut rows = stmt.query([target_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }
        Ok(records)
    }
}

fn attendance_table(kind: AttendanceKind) -> &'static str {
    match kind {
        AttendanceKind::Workshop => "workshop_attendance",
        AttendanceKind::Activity => "activity_attendance",
        AttendanceKind::Trip => "trip_attendance",
    }
}

fn attendance_target_column(kind: AttendanceKind) -> &'static str {
    match kind {
        AttendanceKind::Workshop => "workshop_id",
        AttendanceKind::Activity => "activity_id",
        AttendanceKind::Trip => "trip_id",
    }
}

fn attendance_scope(kind: AttendanceKind) -> &'static str {
    match kind {
        AttendanceKind::Workshop => "workshop_attendance(person_id, workshop_id)",
        AttendanceKind::Activity => "activity_attendance(person_id, activity_id)",
        AttendanceKind::Trip => "trip_attendance(person_id, trip_id)",
    }
}

fn parse_benefit_row(row: &Row<'_>) -> RepoResult<PersonBenefit> {
    Ok(PersonBenefit {
        person_id: row.get("person_id")?,
        benefit_id: row.get("benefit_id")?,
        assigned_on: row.get("assigned_on")?,
    })
}

fn parse_membership_row(row: &Row<'_>) -> RepoResult<Membership> {
    Ok(Membership {
        person_id: row.get("person_id")?,
        organization_id: row.get("organization_id")?,
    })
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    Ok(AttendanceRecord {
        person_id: row.get("person_id")?,
        target_id: row.get("target_id")?,
        attended_at: row.get("attended_at")?,
    })
}
