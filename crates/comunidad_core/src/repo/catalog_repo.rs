//! Catalog repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD over the lookup tables (macro sectors, neighborhood units,
//!   genders, nationalities, workshops, benefits).
//! - Resolve a neighborhood unit to its macro sector without any stored copy.
//!
//! # Invariants
//! - Catalog deletes are refused while dependents exist; the one exception is
//!   workshops, whose attendance history follows them out.
//! - `resolve_macro_sector` is the only macro-sector access path for
//!   geographically-scoped entities; nothing denormalizes the sector id.

use crate::model::catalog::{
    Benefit, Gender, MacroSector, Nationality, NeighborhoodUnit, Workshop,
};
use crate::repo::{
    ensure_connection_ready, map_delete_error, map_write_error, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension};

const CATALOG_TABLES: &[&str] = &[
    "macro_sectors",
    "neighborhood_units",
    "genders",
    "nationalities",
    "workshops",
    "benefits",
];

/// Repository interface for catalog maintenance and territorial resolution.
pub trait CatalogRepository {
    fn create_macro_sector(&self, name: &str) -> RepoResult<MacroSector>;
    fn rename_macro_sector(&self, id: i64, name: &str) -> RepoResult<()>;
    fn list_macro_sectors(&self) -> RepoResult<Vec<MacroSector>>;
    fn delete_macro_sector(&self, id: i64) -> RepoResult<()>;

    fn create_neighborhood_unit(
        &self,
        name: &str,
        macro_sector_id: i64,
    ) -> RepoResult<NeighborhoodUnit>;
    fn rename_neighborhood_unit(&self, id: i64, name: &str) -> RepoResult<()>;
    fn list_neighborhood_units(&self) -> RepoResult<Vec<NeighborhoodUnit>>;
    fn delete_neighborhood_unit(&self, id: i64) -> RepoResult<()>;
    /// Resolves the macro sector a unit belongs to, through the join.
    fn resolve_macro_sector(&self, unit_id: i64) -> RepoResult<MacroSector>;

    fn create_gender(&self, label: &str) -> RepoResult<Gender>;
    fn list_genders(&self) -> RepoResult<Vec<Gender>>;
    fn delete_gender(&self, id: i64) -> RepoResult<()>;

    fn create_nationality(&self, label: &str) -> RepoResult<Nationality>;
    fn list_nationalities(&self) -> RepoResult<Vec<Nationality>>;
    fn delete_nationality(&self, id: i64) -> RepoResult<()>;

    fn create_workshop(&self, name: &str) -> RepoResult<Workshop>;
    fn list_workshops(&self) -> RepoResult<Vec<Workshop>>;
    fn delete_workshop(&self, id: i64) -> RepoResult<()>;

    fn create_benefit(&self, code: &str, description: &str) -> RepoResult<Benefit>;
    fn list_benefits(&self) -> RepoResult<Vec<Benefit>>;
    fn delete_benefit(&self, id: i64) -> RepoResult<()>;
}

/// SQLite-backed catalog repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, CATALOG_TABLES)?;
        Ok(Self { conn })
    }

    fn insert_labeled(
        &self,
        table: &'static str,
        column: &'static str,
        scope: &'static str,
        value: &str,
    ) -> RepoResult<i64> {
        self.conn
            .execute(
                &format!("INSERT INTO {table} ({column}) VALUES (?1);"),
                [value],
            )
            .map_err(|err| map_write_error(err, scope, table))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn rename_labeled(
        &self,
        table: &'static str,
        column: &'static str,
        scope: &'static str,
        id: i64,
        value: &str,
    ) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(
                &format!("UPDATE {table} SET {column} = ?2 WHERE id = ?1;"),
                params![id, value],
            )
            .map_err(|err| map_write_error(err, scope, table))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: table, id });
        }
        Ok(())
    }

    fn delete_by_id(&self, table: &'static str, id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])
            .map_err(|err| map_delete_error(err, table, id))?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: table, id });
        }
        Ok(())
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_macro_sector(&self, name: &str) -> RepoResult<MacroSector> {
        let id = self.insert_labeled("macro_sectors", "name", "macro_sectors.name", name)?;
        Ok(MacroSector {
            id,
            name: name.to_string(),
        })
    }

    fn rename_macro_sector(&self, id: i64, name: &str) -> RepoResult<()> {
        self.rename_labeled("macro_sectors", "name", "macro_sectors.name", id, name)
    }

    fn list_macro_sectors(&self) -> RepoResult<Vec<MacroSector>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM macro_sectors ORDER BY name;")?;
        let mut rows = stmt.query([])?;
        let mut sectors = Vec::new();
        while let Some(row) = rows.next()? {
            sectors.push(MacroSector {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(sectors)
    }

    fn delete_macro_sector(&self, id: i64) -> RepoResult<()> {
        self.delete_by_id("macro_sectors", id)
    }

    fn create_neighborhood_unit(
        &self,
        name: &str,
        macro_sector_id: i64,
    ) -> RepoResult<NeighborhoodUnit> {
        self.conn
            .execute(
                "INSERT INTO neighborhood_units (name, macro_sector_id) VALUES (?1, ?2);",
                params![name, macro_sector_id],
            )
            .map_err(|err| {
                map_write_error(err, "neighborhood_units.name", "neighborhood_units")
            })?;
        Ok(NeighborhoodUnit {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            macro_sector_id,
        })
    }

    fn rename_neighborhood_unit(&self, id: i64, name: &str) -> RepoResult<()> {
        self.rename_labeled(
            "neighborhood_units",
            "name",
            "neighborhood_units.name",
            id,
            name,
        )
    }

    fn list_neighborhood_units(&self) -> RepoResult<Vec<NeighborhoodUnit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, macro_sector_id FROM neighborhood_units ORDER BY name;",
        )?;
        let mut rows = stmt.query([])?;
        let mut units = Vec::new();
        while let Some(row) = rows.next()? {
            units.push(NeighborhoodUnit {
                id: row.get("id")?,
                name: row.get("name")?,
                macro_sector_id: row.get("macro_sector_id")?,
            });
        }
        Ok(units)
    }

    fn delete_neighborhood_unit(&self, id: i64) -> RepoResult<()> {
        self.delete_by_id("neighborhood_units", id)
    }

    fn resolve_macro_sector(&self, unit_id: i64) -> RepoResult<MacroSector> {
        let resolved = self
            .conn
            .query_row(
                "SELECT ms.id, ms.name
                 FROM neighborhood_units nu
                 INNER JOIN macro_sectors ms ON ms.id = nu.macro_sector_id
                 WHERE nu.id = ?1;",
                [unit_id],
                |row| {
                    Ok(MacroSector {
                        id: row.get("id")?,
                        name: row.get("name")?,
                    })
                },
            )
            .optional()?;

        resolved.ok_or(RepoError::NotFound {
            entity: "neighborhood_units",
            id: unit_id,
        })
    }

    fn create_gender(&self, label: &str) -> RepoResult<Gender> {
        let id = self.insert_labeled("genders", "label", "genders.label", label)?;
        Ok(Gender {
            id,
            label: label.to_string(),
        })
    }

    fn list_genders(&self) -> RepoResult<Vec<Gender>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label FROM genders ORDER BY label;")?;
        let mut rows = stmt.query([])?;
        let mut genders = Vec::new();
        while let Some(row) = rows.next()? {
            genders.push(Gender {
                id: row.get("id")?,
                label: row.get("label")?,
            });
        }
        Ok(genders)
    }

    fn delete_gender(&self, id: i64) -> RepoResult<()> {
        self.delete_by_id("genders", id)
    }

    fn create_nationality(&self, label: &str) -> RepoResult<Nationality> {
        let id = self.insert_labeled("nationalities", "label", "nationalities.label", label)?;
        Ok(Nationality {
            id,
            label: label.to_string(),
        })
    }

    fn list_nationalities(&self) -> RepoResult<Vec<Nationality>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, label FROM nationalities ORDER BY label;")?;
        let mut rows = stmt.query([])?;
        let mut nationalities = Vec::new();
        while let Some(row) = rows.next()? {
            nationalities.push(Nationality {
                id: row.get("id")?,
                label: row.get("label")?,
            });
        }
        Ok(nationalities)
    }

    fn delete_nationality(&self, id: i64) -> RepoResult<()> {
        self.delete_by_id("nationalities", id)
    }

    fn create_workshop(&self, name: &str) -> RepoResult<Workshop> {
        let id = self.insert_labeled("workshops", "name", "workshops.name", name)?;
        Ok(Workshop {
            id,
            name: name.to_string(),
        })
    }

    fn list_workshops(&self) -> RepoResult<Vec<Workshop>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM workshops ORDER BY name;")?;
        let mut rows = stmt.query([])?;
        let mut workshops = Vec::new();
        while let Some(row) = rows.next()? {
            workshops.push(Workshop {
                id: row.get("id")?,
                name: row.get("name")?,
            });
        }
        Ok(workshops)
    }

    fn delete_workshop(&self, id: i64) -> RepoResult<()> {
        // Attendance rows cascade; other references would block.
        self.delete_by_id("workshops", id)
    }

    fn create_benefit(&self, code: &str, description: &str) -> RepoResult<Benefit> {
        self.conn
            .execute(
                "INSERT INTO benefits (code, description) VALUES (?1, ?2);",
                params![code, description],
            )
            .map_err(|err| map_write_error(err, "benefits.code", "benefits"))?;
        Ok(Benefit {
            id: self.conn.last_insert_rowid(),
            code: code.to_string(),
            description: description.to_string(),
        })
    }

    fn list_benefits(&self) -> RepoResult<Vec<Benefit>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, code, description FROM benefits ORDER BY code;")?;
        let mut rows = stmt.query([])?;
        let mut benefits = Vec::new();
        while let Some(row) = rows.next()? {
            benefits.push(Benefit {
                id: row.get("id")?,
                code: row.get("code")?,
                description: row.get("description")?,
            });
        }
        Ok(benefits)
    }

    fn delete_benefit(&self, id: i64) -> RepoResult<()> {
        self.delete_by_id("benefits", id)
    }
}
