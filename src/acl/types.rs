//! ACL data model (spec §4.2).
//!
//! An object ACL only ever concerns tables: `VIEW` entries are merged into
//! `TABLE` at parse time (spec §4.2, "VIEW/TABLE unification"), so the
//! runtime model only needs one object type. A table entry is either a bare
//! name (list form, "whole object") or a name mapped to an explicit column
//! list (dict form, column-granular).

use std::collections::BTreeMap;

/// Content of the `TABLE` entry in a parsed object ACL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AclContent {
    #[default]
    Empty,
    /// `{"TABLE": ["t1", "t2"]}` — whole-table grants/denials.
    List(Vec<String>),
    /// `{"TABLE": {"t1": {"COLUMN": ["a","b"]}, "t2": {}}}` — per-table
    /// column lists; an empty column list means "table named, no column
    /// restriction beyond that".
    Columns(BTreeMap<String, Vec<String>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectAcl {
    pub tables: AclContent,
}

impl ObjectAcl {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.tables, AclContent::Empty)
    }

    pub fn contains_table(&self, table: &str) -> bool {
        match &self.tables {
            AclContent::Empty => false,
            AclContent::List(v) => v.iter().any(|t| t == table),
            AclContent::Columns(m) => m.contains_key(table),
        }
    }

    /// `Some(cols)` when this ACL restricts `table` to a specific column
    /// list; `None` when the table is present with no column restriction,
    /// or not present in dict form at all.
    pub fn columns_for_table(&self, table: &str) -> Option<&[String]> {
        match &self.tables {
            AclContent::Columns(m) => m.get(table).filter(|c| !c.is_empty()).map(|c| c.as_slice()),
            _ => None,
        }
    }

    pub fn table_names(&self) -> Vec<&str> {
        match &self.tables {
            AclContent::Empty => Vec::new(),
            AclContent::List(v) => v.iter().map(|s| s.as_str()).collect(),
            AclContent::Columns(m) => m.keys().map(|s| s.as_str()).collect(),
        }
    }
}

/// A tool ACL is simply the set of operation names (`SELECT`, `INSERT`, ...)
/// the list names; whitelist/blacklist precedence is applied by the caller.
pub type ToolAcl = Vec<String>;
