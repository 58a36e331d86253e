//! Elderly-person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over `elderly_persons` and its phone satellite.
//! - Keep SQL details inside the core persistence boundary.
//! - Serve the territorial aggregation used by dashboards.
//!
//! # Invariants
//! - Write paths validate model formats before SQL mutations.
//! - Deleting a person takes phones, benefit assignments, memberships and all
//!   attendance rows with it in one statement; the schema cascades make the
//!   cleanup all-or-nothing.
//! - Registration with phones runs in a single immediate transaction.

use crate::model::person::{ElderlyPerson, PersonDraft};
use crate::model::phone::PhoneNumber;
use crate::repo::{
    ensure_connection_ready, ensure_table_columns, map_delete_error, map_write_error, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    national_id,
    given_name,
    middle_name,
    last_name,
    second_last_name,
    gender_id,
    nationality_id,
    birth_date,
    address,
    email,
    neighborhood_unit_id
FROM elderly_persons";

const PERSON_KEY_SCOPE: &str = "elderly_persons.national_id";
const PHONE_KEY_SCOPE: &str = "person_phones(person_id, type)";

/// Query options for listing persons. All filters are conjunctive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonListQuery {
    /// Substring match on the given name.
    pub given_name: Option<String>,
    /// Substring match on the first last name.
    pub last_name: Option<String>,
    /// Exact match on the national identity number.
    pub national_id: Option<String>,
    pub gender_id: Option<i64>,
    pub nationality_id: Option<i64>,
    pub neighborhood_unit_id: Option<i64>,
    /// Resolved through the neighborhood-unit join; persons store no sector.
    pub macro_sector_id: Option<i64>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Person count per macro sector, derived through the territorial join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSectorCount {
    pub macro_sector: String,
    pub persons: i64,
}

/// Repository interface for person CRUD and phone satellite operations.
pub trait PersonRepository {
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<i64>;
    /// Creates a person and their phone rows in one transaction.
    fn create_person_with_phones(
        &mut self,
        draft: &PersonDraft,
        phones: &[PhoneNumber],
    ) -> RepoResult<i64>;
    fn update_person(&self, person: &ElderlyPerson) -> RepoResult<()>;
    fn get_person(&self, id: i64) -> RepoResult<Option<ElderlyPerson>>;
    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<ElderlyPerson>>;
    fn delete_person(&self, id: i64) -> RepoResult<()>;

    fn add_phone(&self, person_id: i64, phone: &PhoneNumber) -> RepoResult<()>;
    fn list_phones(&self, person_id: i64) -> RepoResult<Vec<PhoneNumber>>;
    fn remove_phone(&self, person_id: i64, kind: &str) -> RepoResult<()>;

    fn count_by_macro_sector(&self) -> RepoResult<Vec<MacroSectorCount>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["elderly_persons", "person_phones"])?;
        ensure_table_columns(
            conn,
            "elderly_persons",
            &["national_id", "email", "neighborhood_unit_id"],
        )?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, draft: &PersonDraft) -> RepoResult<i64> {
        draft.validate()?;
        insert_person(self.conn, draft)
    }

    fn create_person_with_phones(
        &mut self,
        draft: &PersonDraft,
        phones: &[PhoneNumber],
    ) -> RepoResult<i64> {
        draft.validate()?;
        for phone in phones {
            phone.validate()?;
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let person_id = insert_person(&tx, draft)?;
        for phone in phones {
            insert_phone(&tx, person_id, phone)?;
        }
        tx.commit()?;
        Ok(person_id)
    }

    fn update_person(&self, person: &ElderlyPerson) -> RepoResult<()> {
        person.validate()?;

        let changed = self
            .conn
            .execute(
                "UPDATE elderly_persons
                 SET
                    national_id = ?2,
                    given_name = ?3,
                    middle_name = ?4,
                    last_name = ?5,
                    second_last_name = ?6,
                    gender_id = ?7,
                    nationality_id = ?8,
                    birth_date = ?9,
                    address = ?10,
                    email = ?11,
                    neighborhood_unit_id = ?12
                 WHERE id = ?1;",
                params![
                    person.id,
                    person.national_id,
                    person.given_name,
                    person.middle_name,
                    person.last_name,
                    person.second_last_name,
                    person.gender_id,
                    person.nationality_id,
                    person.birth_date,
                    person.address,
                    person.email,
                    person.neighborhood_unit_id,
                ],
            )
            .map_err(|err| map_write_error(err, PERSON_KEY_SCOPE, "elderly_persons"))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "elderly_persons",
                id: person.id,
            });
        }

        Ok(())
    }

    fn get_person(&self, id: i64) -> RepoResult<Option<ElderlyPerson>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<ElderlyPerson>> {
        let mut sql = format!("{PERSON_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(given_name) = query.given_name.as_ref() {
            sql.push_str(" AND given_name LIKE '%' || ? || '%'");
            bind_values.push(Value::Text(given_name.clone()));
        }
        if let Some(last_name) = query.last_name.as_ref() {
            sql.push_str(" AND last_name LIKE '%' || ? || '%'");
            bind_values.push(Value::Text(last_name.clone()));
        }
        if let Some(national_id) = query.national_id.as_ref() {
            sql.push_str(" AND national_id = ?");
            bind_values.push(Value::Text(national_id.clone()));
        }
        if let Some(gender_id) = query.gender_id {
            sql.push_str(" AND gender_id = ?");
            bind_values.push(Value::Integer(gender_id));
        }
        if let Some(nationality_id) = query.nationality_id {
            sql.push_str(" AND nationality_id = ?");
            bind_values.push(Value::Integer(nationality_id));
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

        sql.push_str(" ORDER BY last_name, given_name, id ASC");

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
        let mut persons = Vec::new();
        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }
        Ok(persons)
    }

    fn delete_person(&self, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM elderly_persons WHERE id = ?1;", [id])
            .map_err(|err| map_delete_error(err, "elderly_persons", id))?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "elderly_persons",
                id,
            });
        }

        Ok(())
    }

    fn add_phone(&self, person_id: i64, phone: &PhoneNumber) -> RepoResult<()> {
        phone.validate()?;
        insert_phone(self.conn, person_id, phone)
    }

    fn list_phones(&self, person_id: i64) -> RepoResult<Vec<PhoneNumber>> {
        let mut stmt = self.conn.prepare(
            "SELECT type, number FROM person_phones WHERE person_id = ?1 ORDER BY type;",
        )?;
        let mut rows = stmt.query([person_id])?;
        let mut phones = Vec::new();
        while let Some(row) = rows.next()? {
            phones.push(PhoneNumber {
                kind: row.get("type")?,
                number: row.get("number")?,
            });
        }
        Ok(phones)
    }

    fn remove_phone(&self, person_id: i64, kind: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM person_phones WHERE person_id = ?1 AND type = ?2;",
            params![person_id, kind],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "person_phones",
                id: person_id,
            });
        }

        Ok(())
    }

    fn count_by_macro_sector(&self) -> RepoResult<Vec<MacroSectorCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT ms.name, COUNT(p.id) AS persons
             FROM macro_sectors ms
             LEFT JOIN neighborhood_units nu ON nu.macro_sector_id = ms.id
             LEFT JOIN elderly_persons p ON p.neighborhood_unit_id = nu.id
             GROUP BY ms.id, ms.name
             ORDER BY ms.name;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();
        while let Some(row) = rows.next()? {
            counts.push(MacroSectorCount {
                macro_sector: row.get("name")?,
                persons: row.get("persons")?,
            });
        }
        Ok(counts)
    }
}

fn insert_person(conn: &Connection, draft: &PersonDraft) -> RepoResult<i64> {
    conn.execute(
        "INSERT INTO elderly_persons (
            national_id,
            given_name,
            middle_name,
            last_name,
            second_last_name,
            gender_id,
            nationality_id,
            birth_date,
            address,
            email,
            neighborhood_unit_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
        params![
            draft.national_id,
            draft.given_name,
            draft.middle_name,
            draft.last_name,
            draft.second_last_name,
            draft.gender_id,
            draft.nationality_id,
            draft.birth_date,
            draft.address,
            draft.email,
            draft.neighborhood_unit_id,
        ],
    )
    .map_err(|err| map_write_error(err, PERSON_KEY_SCOPE, "elderly_persons"))?;
    Ok(conn.last_insert_rowid())
}

fn insert_phone(conn: &Connection, person_id: i64, phone: &PhoneNumber) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO person_phones (person_id, type, number) VALUES (?1, ?2, ?3);",
        params![person_id, phone.kind, phone.number],
    )
    .map_err(|err| map_write_error(err, PHONE_KEY_SCOPE, "person_phones"))?;
    Ok(())
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<ElderlyPerson> {
    Ok(ElderlyPerson {
        id: row.get("id")?,
        national_id: row.get("national_id")?,
        given_name: row.get("given_name")?,
        middle_name: row.get("middle_name")?,
        last_name: row.get("last_name")?,
        second_last_name: row.get("second_last_name")?,
        gender_id: row.get("gender_id")?,
        nationality_id: row.get("nationality_id")?,
        birth_date: row.get("birth_date")?,
        address: row.get("address")?,
        email: row.get("email")?,
        neighborhood_unit_id: row.get("neighborhood_unit_id")?,
    })
}
