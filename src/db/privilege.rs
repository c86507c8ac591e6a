//! Privilege and object-type enumerations, and the `UserPrivilege` model
//! (spec §3).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// The database privileges the gateway understands. Any other privilege the
/// engine might report (e.g. TRUNCATE, REFERENCES) is never surfaced or
/// checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Privilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl Privilege {
    pub const ALL: [Privilege; 4] = [
        Privilege::Select,
        Privilege::Insert,
        Privilege::Update,
        Privilege::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Privilege::Select => "SELECT",
            Privilege::Insert => "INSERT",
            Privilege::Update => "UPDATE",
            Privilege::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Privilege {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Privilege {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Privilege::Select),
            "INSERT" => Ok(Privilege::Insert),
            "UPDATE" => Ok(Privilege::Update),
            "DELETE" => Ok(Privilege::Delete),
            _ => Err(()),
        }
    }
}

/// Kinds of database object the gateway reasons about. Views are an input
/// alias for tables (see [`ObjectKind::canonical`]); the gateway never
/// treats a view differently from a table once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectKind {
    Table,
    View,
    Column,
    PrimaryKey,
    ForeignKey,
    Index,
}

impl ObjectKind {
    /// Views and tables share ACL/schema treatment; every other kind maps
    /// to itself.
    pub fn canonical(self) -> ObjectKind {
        match self {
            ObjectKind::View => ObjectKind::Table,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "TABLE",
            ObjectKind::View => "VIEW",
            ObjectKind::Column => "COLUMN",
            ObjectKind::PrimaryKey => "PRIMARY_KEY",
            ObjectKind::ForeignKey => "FOREIGN_KEY",
            ObjectKind::Index => "INDEX",
        }
    }
}

impl std::str::FromStr for ObjectKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TABLE" => Ok(ObjectKind::Table),
            "VIEW" => Ok(ObjectKind::View),
            "COLUMN" => Ok(ObjectKind::Column),
            "PRIMARY_KEY" => Ok(ObjectKind::PrimaryKey),
            "FOREIGN_KEY" => Ok(ObjectKind::ForeignKey),
            "INDEX" => Ok(ObjectKind::Index),
            _ => Err(()),
        }
    }
}

/// `Privilege -> { TABLE: {qualified table names}, COLUMN: {qualified
/// column names} }`, normalized per spec §3: a table-level grant makes any
/// column-level grant of the same privilege on that table redundant, and
/// such entries are dropped on ingestion.
#[derive(Debug, Clone, Default)]
pub struct UserPrivilege {
    tables: HashMap<Privilege, HashSet<String>>,
    columns: HashMap<Privilege, HashSet<String>>,
}

impl UserPrivilege {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a raw `(privilege, object_kind, qualified_name)` triple,
    /// applying shadowing as it goes: a column grant is dropped if the
    /// owning table already holds the same privilege (whether that table
    /// grant arrived earlier or later).
    pub fn grant(&mut self, privilege: Privilege, kind: ObjectKind, qualified_name: &str) {
        match kind.canonical() {
            ObjectKind::Table => {
                self.tables.entry(privilege).or_default().insert(qualified_name.to_string());
                // Any previously ingested column grants under the same table are now redundant.
                if let Some(cols) = self.columns.get_mut(&privilege) {
                    let prefix = format!("{qualified_name}.");
                    cols.retain(|c| !c.starts_with(&prefix));
                }
            }
            ObjectKind::Column => {
                let table = match qualified_name.rsplit_once('.') {
                    Some((table, _col)) => table,
                    None => return,
                };
                if self
                    .tables
                    .get(&privilege)
                    .map(|t| t.contains(table))
                    .unwrap_or(false)
                {
                    return;
                }
                self.columns
                    .entry(privilege)
                    .or_default()
                    .insert(qualified_name.to_string());
            }
            _ => {}
        }
    }

    pub fn has_table(&self, privilege: Privilege, table: &str) -> bool {
        self.tables
            .get(&privilege)
            .map(|t| t.contains(table))
            .unwrap_or(false)
    }

    pub fn has_column(&self, privilege: Privilege, qualified_column: &str) -> bool {
        self.columns
            .get(&privilege)
            .map(|c| c.contains(qualified_column))
            .unwrap_or(false)
    }

    /// Privileges held on `table`, either at table granularity or via any
    /// column of that table.
    pub fn privileges_on_table(&self, table: &str) -> Vec<Privilege> {
        Privilege::ALL
            .into_iter()
            .filter(|p| {
                self.has_table(*p, table)
                    || self
                        .columns
                        .get(p)
                        .map(|cols| cols.iter().any(|c| c.starts_with(&format!("{table}."))))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// True if every privilege is held on the whole table (used by the
    /// projector's "Access: True, Permissions: all" annotation).
    pub fn has_full_table_access(&self, table: &str) -> bool {
        Privilege::ALL.iter().all(|p| self.has_table(*p, table))
    }

    /// The set of privileges this user holds anywhere (used by the tool
    /// surface builder to decide which execution tools to expose).
    pub fn privileges_held(&self) -> HashSet<Privilege> {
        let mut held: HashSet<Privilege> = self.tables.keys().copied().collect();
        held.extend(self.columns.keys().copied());
        held
    }

    pub fn columns_with_privilege(&self, privilege: Privilege) -> impl Iterator<Item = &str> {
        self.columns
            .get(&privilege)
            .into_iter()
            .flat_map(|c| c.iter().map(|s| s.as_str()))
    }

    pub fn tables_with_privilege(&self, privilege: Privilege) -> impl Iterator<Item = &str> {
        self.tables
            .get(&privilege)
            .into_iter()
            .flat_map(|t| t.iter().map(|s| s.as_str()))
    }
}
