//! Community-center repository: center CRUD, maintenance log, request history.
//!
//! # Responsibility
//! - Provide CRUD over `community_centers`.
//! - Own the append-only structures attached to a center: the maintenance log
//!   and the organization-to-center request history.
//!
//! # Invariants
//! - The request date is part of the request key; a pair may file again on a
//!   later date but never twice on one date.
//! - Deleting a center takes its maintenance log and request history with it.

use crate::model::center::{CenterDraft, CenterRequest, CommunityCenter, MaintenanceRecord};
use crate::repo::{
    ensure_connection_ready, map_delete_error, map_write_error, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const MAINTENANCE_KEY_SCOPE: &str = "maintenance_records(center_id, service_name, serviced_on)";
const REQUEST_KEY_SCOPE: &str = "center_requests(organization_id, center_id, requested_on)";

/// Repository interface for community centers and their histories.
pub trait CenterRepository {
    fn create_center(&self, draft: &CenterDraft) -> RepoResult<i64>;
    fn update_center(&self, center: &CommunityCenter) -> RepoResult<()>;
    fn get_center(&self, id: i64) -> RepoResult<Option<CommunityCenter>>;
    fn list_centers(&self) -> RepoResult<Vec<CommunityCenter>>;
    fn delete_center(&self, id: i64) -> RepoResult<()>;

    fn log_maintenance(
        &self,
        center_id: i64,
        service_name: &str,
        serviced_on: NaiveDate,
        detail: Option<&str>,
    ) -> RepoResult<i64>;
    fn maintenance_for_center(&self, center_id: i64) -> RepoResult<Vec<MaintenanceRecord>>;

    /// Files one request row. `None` dates default to the current local date.
    fn file_center_request(
        &self,
        organization_id: i64,
        center_id: i64,
        requested_on: Option<NaiveDate>,
    ) -> RepoResult<CenterRequest>;
    fn requests_for_pair(
        &self,
        organization_id: i64,
        center_id: i64,
    ) -> RepoResult<Vec<CenterRequest>>;
    fn requests_for_center(&self, center_id: i64) -> RepoResult<Vec<CenterRequest>>;
}

/// SQLite-backed center repository.
pub struct SqliteCenterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCenterRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &["community_centers", "maintenance_records", "center_requests"],
        )?;
        Ok(Self { conn })
    }
}

impl CenterRepository for SqliteCenterRepository<'_> {
    fn create_center(&self, draft: &CenterDraft) -> RepoResult<i64> {
        self.conn
            .execute(
                "INSERT INTO community_centers (name, address, neighborhood_unit_id)
                 VALUES (?1, ?2, ?3);",
                params![draft.name, draft.address, draft.neighborhood_unit_id],
            )
            .map_err(|err| map_write_error(err, "community_centers.name", "community_centers"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_center(&self, center: &CommunityCenter) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE community_centers
                 SET name = ?2, address = ?3, neighborhood_unit_id = ?4
                 WHERE id = ?1;",
                params![
                    center.id,
                    center.name,
                    center.address,
                    center.neighborhood_unit_id,
                ],
            )
            .map_err(|err| map_write_error(err, "community_centers.name", "community_centers"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "community_centers",
                id: center.id,
            });
        }

        Ok(())
    }

    fn get_center(&self, id: i64) -> RepoResult<Option<CommunityCenter>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, neighborhood_unit_id
             FROM community_centers WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_center_row(row)?));
        }
        Ok(None)
    }

    fn list_centers(&self) -> RepoResult<Vec<CommunityCenter>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, address, neighborhood_unit_id
             FROM community_centers ORDER BY name;",
        )?;
        let mut rows = stmt.query([])?;
        let mut centers = Vec::new();
        while let Some(row) = rows.next()? {
            centers.push(parse_center_row(row)?);
        }
        Ok(centers)
    }

    fn delete_center(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM community_centers WHERE id = ?1;", [id])
            .map_err(|err| map_delete_error(err, "community_centers", id))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "community_centers",
                id,
            });
        }

        Ok(())
    }

    fn log_maintenance(
        &self,
        center_id: i64,
        service_name: &str,
        serviced_on: NaiveDate,
        detail: Option<&str>,
    ) -> RepoResult<i64> {
        self.conn
            .execute(
                "INSERT INTO maintenance_records (center_id, service_name, serviced_on, detail)
                 VALUES (?1, ?2, ?3, ?4);",
                params![center_id, service_name, serviced_on, detail],
            )
            .map_err(|err| map_write_error(err, MAINTENANCE_KEY_SCOPE, "maintenance_records"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn maintenance_for_center(&self, center_id: i64) -> RepoResult<Vec<MaintenanceRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, center_id, service_name, serviced_on, detail
             FROM maintenance_records
             WHERE center_id = ?1
             ORDER BY serviced_on DESC, service_name;",
        )?;
        let mut rows = stmt.query([center_id])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(MaintenanceRecord {
                id: row.get("id")?,
                center_id: row.get("center_id")?,
                service_name: row.get("service_name")?,
                serviced_on: row.get("serviced_on")?,
                detail: row.get("detail")?,
            });
        }
        Ok(records)
    }

    fn file_center_request(
        &self,
        organization_id: i64,
        center_id: i64,
        requested_on: Option<NaiveDate>,
    ) -> RepoResult<CenterRequest> {
        let requested_on = requested_on.unwrap_or_else(|| chrono::Local::now().date_naive());

        self.conn
            .execute(
                "INSERT INTO center_requests (organization_id, center_id, requested_on)
                 VALUES (?1, ?2, ?3);",
                params![organization_id, center_id, requested_on],
            )
            .map_err(|err| map_write_error(err, REQUEST_KEY_SCOPE, "center_requests"))?;

        Ok(CenterRequest {
            organization_id,
            center_id,
            requested_on,
        })
    }

    fn requests_for_pair(
        &self,
        organization_id: i64,
        center_id: i64,
    ) -> RepoResult<Vec<CenterRequest>> {
        let mut stmt = self.conn.prepare(
            "SELECT organization_id, center_id, requested_on
             FROM center_requests
             WHERE organization_id = ?1 AND center_id = ?2
             ORDER BY requested_on ASC;",
        )?;
        let mut rows = stmt.query(params![organization_id, center_id])?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_request_row(row)?);
        }
        Ok(requests)
    }

    fn requests_for_center(&self, center_id: i64) -> RepoResult<Vec<CenterRequest>> {
        let mut stmt = self.conn.prepare(
            "SELECT organization_id, center_id, requested_on
             FROM center_requests
             WHERE center_id = ?1
             ORDER BY requested_on ASC, organization_id;",
        )?;
        let mut rows = stmt.query([center_id])?;
        let mut requests = Vec::new();
        while let Some(row) = rows.next()? {
            requests.push(parse_request_row(row)?);
        }
        Ok(requests)
    }
}

fn parse_center_row(row: &Row<'_>) -> RepoResult<CommunityCenter> {
    Ok(CommunityCenter {
        id: row.get("id")?,
        name: row.get("name")?,
        address: row.get("address")?,
        neighborhood_unit_id: row.get("neighborhood_unit_id")?,
    })
}

fn parse_request_row(row: &Row<'_>) -> RepoResult<CenterRequest> {
    Ok(CenterRequest {
        organization_id: row.get("organization_id")?,
        center_id: row.get("center_id")?,
        requested_on: row.get("requested_on")?,
    })
}
