//! Catalog records: lookup data referenced by foreign key from the registry.

use serde::{Deserialize, Serialize};

/// Territorial macro sector. Top of the territorial hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroSector {
    pub id: i64,
    pub name: String,
}

/// Neighborhood unit. Belongs to exactly one macro sector; every
/// geographically-scoped entity references one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborhoodUnit {
    pub id: i64,
    pub name: String,
    pub macro_sector_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gender {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nationality {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workshop {
    pub id: i64,
    pub name: String,
}

/// Municipal benefit catalog entry, keyed by its administrative code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: i64,
    pub code: String,
    pub description: String,
}
