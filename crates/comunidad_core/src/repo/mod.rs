//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per registry area.
//! - Isolate SQLite query details from service/business orchestration.
//! - Translate storage-level constraint failures into semantic errors.
//!
//! # Invariants
//! - Repository writes validate model formats before any SQL mutation.
//! - Uniqueness and referential rules are enforced by the schema itself;
//!   repositories never pre-check-then-write around them.
//! - Foreign-key failures map by direction: writes surface
//!   `DanglingReference`, deletes surface `ReferentialBlock`.
//!
//! # See also
//! - docs/architecture/data-model.md

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::validate::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod catalog_repo;
pub mod center_repo;
pub mod enrollment_repo;
pub mod event_repo;
pub mod organization_repo;
pub mod person_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Semantic error surfaced by every repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// A format or temporal-ordering check failed before the write.
    Validation(ValidationError),
    /// Referenced row does not exist.
    NotFound { entity: &'static str, id: i64 },
    /// Candidate row collides with an existing row on the named scope.
    DuplicateKey { scope: &'static str },
    /// A write referenced a parent row that does not exist.
    DanglingReference { entity: &'static str },
    /// Delete refused: the row is still referenced and not cascade-eligible.
    ReferentialBlock { entity: &'static str, id: i64 },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} row not found: {id}"),
            Self::DuplicateKey { scope } => write!(f, "duplicate key for scope {scope}"),
            Self::DanglingReference { entity } => {
                write!(f, "{entity} write references a missing parent row")
            }
            Self::ReferentialBlock { entity, id } => write!(
                f,
                "{entity} row {id} is still referenced and cannot be deleted"
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

enum ConstraintKind {
    Unique,
    ForeignKey,
}

fn constraint_kind(err: &rusqlite::Error) -> Option<ConstraintKind> {
    if let rusqlite::Error::SqliteFailure(ffi_err, _) = err {
        match ffi_err.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Some(ConstraintKind::Unique),
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
            _ => None,
        }
    } else {
        None
    }
}

/// Maps an insert/update failure. Unique collisions name the logical scope;
/// foreign-key failures mean the payload referenced a missing parent.
pub(crate) fn map_write_error(
    err: rusqlite::Error,
    scope: &'static str,
    entity: &'static str,
) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::Unique) => RepoError::DuplicateKey { scope },
        Some(ConstraintKind::ForeignKey) => RepoError::DanglingReference { entity },
        None => RepoError::Db(DbError::Sqlite(err)),
    }
}

/// Maps a delete failure. A foreign-key failure here means a RESTRICT
/// reference still exists, so the row is not cascade-eligible.
pub(crate) fn map_delete_error(err: rusqlite::Error, entity: &'static str, id: i64) -> RepoError {
    match constraint_kind(&err) {
        Some(ConstraintKind::ForeignKey) => RepoError::ReferentialBlock { entity, id },
        _ => RepoError::Db(DbError::Sqlite(err)),
    }
}

/// Verifies that the connection is migrated and carries the tables a
/// repository depends on. Called once at repository construction.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }

    Ok(())
}

pub(crate) fn ensure_table_columns(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    for column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
