//! Community-organization repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over `organizations` and their phone satellite.
//!
//! # Invariants
//! - Organization name is unique across the registry.
//! - Deleting an organization takes phones, memberships and request history
//!   with it; the schema cascades make the cleanup all-or-nothing.

use crate::model::organization::{Organization, OrganizationDraft};
use crate::model::phone::PhoneNumber;
use crate::repo::{
    ensure_connection_ready, map_delete_error, map_write_error, RepoError, RepoResult,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const ORGANIZATION_SELECT_SQL: &str = "SELECT
    id,
    name,
    address,
    neighborhood_unit_id,
    founding_date,
    legal_status,
    email
FROM organizations";

const ORGANIZATION_KEY_SCOPE: &str = "organizations.name";
const PHONE_KEY_SCOPE: &str = "organization_phones(organization_id, type)";

/// Query options for listing organizations. All filters are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationListQuery {
    /// Substring match on the organization name.
    pub name: Option<String>,
    pub neighborhood_unit_id: Option<i64>,
    pub macro_sector_id: Option<i64>,
    /// Founding-date window, both ends inclusive.
    pub founded_from: Option<NaiveDate>,
    pub founded_until: Option<NaiveDate>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for organization CRUD and phone operations.
pub trait OrganizationRepository {
    fn create_organization(&self, draft: &OrganizationDraft) -> RepoResult<i64>;
    /// Creates an organization and its phone rows in one transaction.
    fn create_organization_with_phones(
        &mut self,
        draft: &OrganizationDraft,
        phones: &[PhoneNumber],
    ) -> RepoResult<i64>;
    fn update_organization(&self, organization: &Organization) -> RepoResult<()>;
    fn get_organization(&self, id: i64) -> RepoResult<Option<Organization>>;
    fn list_organizations(&self, query: &OrganizationListQuery) -> RepoResult<Vec<Organization>>;
    fn delete_organization(&self, id: i64) -> RepoResult<()>;

    fn add_phone(&self, organization_id: i64, phone: &PhoneNumber) -> RepoResult<()>;
    fn list_phones(&self, organization_id: i64) -> RepoResult<Vec<PhoneNumber>>;
    fn remove_phone(&self, organization_id: i64, kind: &str) -> RepoResult<()>;
}

/// SQLite-backed organization repository.
pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["organizations", "organization_phones"])?;
        Ok(Self { conn })
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(&self, draft: &OrganizationDraft) -> RepoResult<i64> {
        draft.validate()?;
        insert_organization(self.conn, draft)
    }

    fn create_organization_with_phones(
        &mut self,
        draft: &OrganizationDraft,
        phones: &[PhoneNumber],
    ) -> RepoResult<i64> {
        draft.validate()?;
        for phone in phones {
            phone.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let organization_id = insert_organization(&tx, draft)?;
        for phone in phones {
            insert_phone(&tx, organization_id, phone)?;
        }
        tx.commit()?;
        Ok(organization_id)
    }

    fn update_organization(&self, organization: &Organization) -> RepoResult<()> {
        organization.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE organizations
                 SET
                    name = ?2,
                    address = ?3,
                    neighborhood_unit_id = ?4,
                    founding_date = ?5,
                    legal_status = ?6,
                    email = ?7
                 WHERE id = ?1;",
                params![
                    organization.id,
                    organization.name,
                    organization.address,
                    organization.neighborhood_unit_id,
                    organization.founding_date,
                    organization.legal_status,
                    organization.email,
                ],
            )
            .map_err(|err| map_write_error(err, ORGANIZATION_KEY_SCOPE, "organizations"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "organizations",
                id: organization.id,
            });
        }

        Ok(())
    }

    fn get_organization(&self, id: i64) -> RepoResult<Option<Organization>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ORGANIZATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_organization_row(row)?));
        }
        Ok(None)
    }

    fn list_organizations(&self, query: &OrganizationListQuery) -> RepoResult<Vec<Organization>> {
        let mut sql = format!("{ORGANIZATION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(name) = query.name.as_ref() {
            sql.push_str(" AND name LIKE '%' || ? || '%'");
            bind_values.push(Value::Text(name.clone()));
        }
        if let Some(unit_id) = query.neighborhood_unit_id {
            sql.push_str(" AND neighborhood_unit_id = ?");
            bind_values.push(Value::Integer(unit_id));
        }
        if let Some(macro_sector_id) = query.macro_sector_id {
            sql.push_str(
                " AND neighborhood_unit_id IN (
                    SELECT id FROM neighborhood_units WHERE macro_sector_id = ?
                )",
            );
            bind_values.push(Value::Integer(macro_sector_id));
        }
        if let Some(from) = query.founded_from {
            sql.push_str(" AND founding_date >= ?");
            bind_values.push(Value::Text(from.to_string()));
        }
        if let Some(until) = query.founded_until {
            sql.push_str(" AND founding_date <= ?");
            bind_values.push(Value::Text(until.to_string()));
        }

        sql.push_str(" ORDER BY name, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut organizations = Vec::new();
        while let Some(row) = rows.next()? {
            organizations.push(parse_organization_row(row)?);
        }
        Ok(organizations)
    }

    fn delete_organization(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM organizations WHERE id = ?1;", [id])
            .map_err(|err| map_delete_error(err, "organizations", id))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "organizations",
                id,
            });
        }

        Ok(())
    }

    fn add_phone(&self, organization_id: i64, phone: &PhoneNumber) -> RepoResult<()> {
        phone.validate()?;
        insert_phone(self.conn, organization_id, phone)
    }

    fn list_phones(&self, organization_id: i64) -> RepoResult<Vec<PhoneNumber>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, number FROM organization_phones
             WHERE organization_id = ?1 ORDER BY type;",
        )?;
        let mut rows = stmt.query([organization_id])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(PhoneNumber {
                kind: row.get("type")?,
                number: row.get("number")?,
            });
        }
        Ok(phones)
    }

    fn remove_phone(&self, organization_id: i64, kind: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM organization_phones WHERE organization_id = ?1 AND type = ?2;",
            params![organization_id, kind],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "organization_phones",
                id: organization_id,
            });
        }

        Ok(())
    }
}

fn insert_organization(conn: &Connection, draft: &OrganizationDraft) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO organizations (
            name,
            address,
            neighborhood_unit_id,
            founding_date,
            legal_status,
            email
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            draft.name,
            draft.address,
            draft.neighborhood_unit_id,
            draft.founding_date,
            draft.legal_status,
            draft.email,
        ],
    )
    .map_err(|err| map_write_error(err, ORGANIZATION_KEY_SCOPE, "organizations"))?;
    Ok(conn.last_insert_rowid())
}

fn insert_phone(conn: &Connection, organization_id: i64, phone: &PhoneNumber) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO organization_phones (organization_id, type, number) VALUES (?1, ?2, ?3);",
        params![organization_id, phone.kind, phone.number],
    )
    .map_err(|err| map_write_error(err, PHONE_KEY_SCOPE, "organization_phones"))?;
    Ok(())
}

fn parse_organization_row(row: &Row<'_>) -> RepoResult<Organization> {
    Ok(Organization {
        id: row.get("id")?,
        name: row.get("name")?,
        address: row.get("address")?,
        neighborhood_unit_id: row.get("neighborhood_unit_id")?,
        founding_date: row.get("founding_date")?,
        legal_status: row.get("legal_status")?,
        email: row.get("email")?,
    })
}
