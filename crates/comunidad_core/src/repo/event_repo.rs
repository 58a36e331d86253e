//! Activity and trip repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over scheduled programs (`activities`, `trips`).
//! - Serve the date-window queries backing the program listings.
//!
//! # Invariants
//! - Logical identity is composite: (name, start date, neighborhood unit).
//! - Temporal ordering is checked in the model before any SQL mutation; the
//!   schema carries a matching CHECK as a backstop for other writers.
//! - Listings come back newest-first, the presentation layer's order.

use crate::model::event::{Activity, ActivityDraft, Trip, TripDraft};
use crate::repo::{
    ensure_connection_ready, map_delete_error, map_write_error, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ACTIVITY_SELECT_SQL: &str = "SELECT
    id,
    name,
    neighborhood_unit_id,
    start_date,
    end_date,
    description
FROM activities";

const TRIP_SELECT_SQL: &str = "SELECT
    id,
    name,
    destination,
    departure_date,
    return_date,
    neighborhood_unit_id
FROM trips";

const ACTIVITY_KEY_SCOPE: &str = "activities(name, start_date, neighborhood_unit_id)";
const TRIP_KEY_SCOPE: &str = "trips(name, departure_date, neighborhood_unit_id)";

/// Query options for listing activities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityListQuery {
    /// Substring match on the activity name.
    pub name: Option<String>,
    pub neighborhood_unit_id: Option<i64>,
    /// Start-date window, both ends inclusive.
    pub starts_from: Option<NaiveDate>,
    pub starts_until: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Query options for listing trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripListQuery {
    pub neighborhood_unit_id: Option<i64>,
    /// Departure-date window, both ends inclusive.
    pub departs_from: Option<NaiveDate>,
    pub departs_until: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for scheduled programs.
pub trait EventRepository {
    fn create_activity(&self, draft: &ActivityDraft) -> RepoResult<i64>;
    fn update_activity(&self, activity: &Activity) -> RepoResult<()>;
    fn get_activity(&self, id: i64) -> RepoResult<Option<Activity>>;
    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>>;
    fn delete_activity(&self, id: i64) -> RepoResult<()>;

    fn create_trip(&self, draft: &TripDraft) -> RepoResult<i64>;
    fn update_trip(&self, trip: &Trip) -> RepoResult<()>;
    fn get_trip(&self, id: i64) -> RepoResult<Option<Trip>>;
    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>>;
    fn delete_trip(&self, id: i64) -> RepoResult<()>;
}

/// SQLite-backed program repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["activities", "trips"])?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_activity(&self, draft: &ActivityDraft) -> RepoResult<i64> {
        draft.validate()?;

        self.conn
            .execute(
                "INSERT INTO activities (
                    name,
                    neighborhood_unit_id,
                    start_date,
                    end_date,
                    description
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    draft.name,
                    draft.neighborhood_unit_id,
                    draft.start_date,
                    draft.end_date,
                    draft.description,
                ],
            )
            .map_err(|err| map_write_error(err, ACTIVITY_KEY_SCOPE, "activities"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_activity(&self, activity: &Activity) -> RepoResult<()> {
        activity.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE activities
                 SET
                    name = ?2,
                    neighborhood_unit_id = ?3,
                    start_date = ?4,
                    end_date = ?5,
                    description = ?6
                 WHERE id = ?1;",
                params![
                    activity.id,
                    activity.name,
                    activity.neighborhood_unit_id,
                    activity.start_date,
                    activity.end_date,
                    activity.description,
                ],
            )
            .map_err(|err| map_write_error(err, ACTIVITY_KEY_SCOPE, "activities"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "activities",
                id: activity.id,
            });
        }

        Ok(())
    }

    fn get_activity(&self, id: i64) -> RepoResult<Option<Activity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_activity_row(row)?));
        }
        Ok(None)
    }

    fn list_activities(&self, query: &ActivityListQuery) -> RepoResult<Vec<Activity>> {
        let mut sql = format!("{ACTIVITY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name LIKE '%' || ? || '%'");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(unit_id) = query.neighborhood_unit_id {
            sql.push_str(" AND neighborhood_unit_id = ?");
            bind_values.push(Value::Integer(unit_id));
        }
        if let Some(from) = query.starts_from {
            sql.push_str(" AND start_date >= ?");
            bind_values.push(Value::Text(from.to_string()));
        }
        if let Some(until) = query.starts_until {
            sql.push_str(" AND start_date <= ?");
            bind_values.push(Value::Text(until.to_string()));
        }

        sql.push_str(" ORDER BY start_date DESC, id ASC");
        push_paging(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut activities = Vec::new();
        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }
        Ok(activities)
    }

    fn delete_activity(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM activities WHERE id = ?1;", [id])
            .map_err(|err| map_delete_error(err, "activities", id))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "activities",
                id,
            });
        }

        Ok(())
    }

    fn create_trip(&self, draft: &TripDraft) -> RepoResult<i64> {
        draft.validate()?;

        self.conn
            .execute(
                "INSERT INTO trips (
                    name,
                    destination,
                    departure_date,
                    return_date,
                    neighborhood_unit_id
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    draft.name,
                    draft.destination,
                    draft.departure_date,
                    draft.return_date,
                    draft.neighborhood_unit_id,
                ],
            )
            .map_err(|err| map_write_error(err, TRIP_KEY_SCOPE, "trips"))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_trip(&self, trip: &Trip) -> RepoResult<()> {
        trip.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE trips
                 SET
                    name = ?2,
                    destination = ?3,
                    departure_date = ?4,
                    return_date = ?5,
                    neighborhood_unit_id = ?6
                 WHERE id = ?1;",
                params![
                    trip.id,
                    trip.name,
                    trip.destination,
                    trip.departure_date,
                    trip.return_date,
                    trip.neighborhood_unit_id,
                ],
            )
            .map_err(|err| map_write_error(err, TRIP_KEY_SCOPE, "trips"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "trips",
                id: trip.id,
            });
        }

        Ok(())
    }

    fn get_trip(&self, id: i64) -> RepoResult<Option<Trip>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TRIP_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_trip_row(row)?));
        }
        Ok(None)
    }

    fn list_trips(&self, query: &TripListQuery) -> RepoResult<Vec<Trip>> {
        let mut sql = format!("{TRIP_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(unit_id) = query.neighborhood_unit_id {
            sql.push_str(" AND neighborhood_unit_id = ?");
            bind_values.push(Value::Integer(unit_id));
        }
        if let Some(from) = query.departs_from {
            sql.push_str(" AND departure_date >= ?");
            bind_values.push(Value::Text(from.to_string()));
        }
        if let Some(until) = query.departs_until {
            sql.push_str(" AND departure_date <= ?");
            bind_values.push(Value::Text(until.to_string()));
        }

        sql.push_str(" ORDER BY departure_date DESC, id ASC");
        push_paging(&mut sql, &mut bind_values, query.limit, query.offset);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut trips = Vec::new();
        while let Some(row) = rows.next()? {
            trips.push(parse_trip_row(row)?);
        }
        Ok(trips)
    }

    fn delete_trip(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM trips WHERE id = ?1;", [id])
            .map_err(|err| map_delete_error(err, "trips", id))?;

        if changed == 0 {
            return Err(RepoError::NotFound { entity: "trips", id });
        }

        Ok(())
    }
}

fn push_paging(sql: &mut String, bind_values: &mut Vec<Value>, limit: Option<u32>, offset: u32) {
    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        name: row.get("name")?,
        neighborhood_unit_id: row.get("neighborhood_unit_id")?,
        start_date: row.get("start_date")?,
        end_date: row.get("end_date")?,
        description: row.get("description")?,
    })
}

fn parse_trip_row(row: &Row<'_>) -> RepoResult<Trip> {
    Ok(Trip {
        id: row.get("id")?,
        name: row.get("name")?,
        destination: row.get("destination")?,
        departure_date: row.get("departure_date")?,
        return_date: row.get("return_date")?,
        neighborhood_unit_id: row.get("neighborhood_unit_id")?,
    })
}
