//! Schema description types returned by the adapter's introspection calls
//! (spec §3, `TableSchema`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub nullable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub local_column: String,
    pub remote_table: String,
    pub remote_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
    pub indexes: Vec<IndexInfo>,
}

/// `{TABLE: name -> TableSchema}` with views already unified into tables
/// (spec §4.1, `get_database_schema`).
pub type DatabaseSchema = BTreeMap<String, TableSchema>;

/// `{TABLE: [...], VIEW: [...]}` as returned by `get_top_level_objects`.
#[derive(Debug, Clone, Default)]
pub struct TopLevelObjects {
    pub tables: Vec<String>,
    pub views: Vec<String>,
}

/// Total column count across the schema, counted by iterating `TABLE ->
/// columns` exactly once. Spec §9 calls out that a naive recursive descent
/// can double-count nested `COLUMN` lists; this walks the typed
/// `DatabaseSchema` directly so there is nothing to recurse into.
pub fn count_columns(schema: &DatabaseSchema) -> usize {
    schema.values().map(|t| t.columns.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, n_cols: usize) -> TableSchema {
        TableSchema {
            name: name.to_string(),
            columns: (0..n_cols)
                .map(|i| ColumnInfo {
                    name: format!("c{i}"),
                    type_name: "text".to_string(),
                    nullable: true,
                })
                .collect(),
            primary_key: vec![],
            foreign_keys: vec![],
            indexes: vec![],
        }
    }

    #[test]
    fn counts_columns_once_per_table() {
        let mut schema = DatabaseSchema::new();
        schema.insert("a".into(), table("a", 3));
        schema.insert("b".into(), table("b", 5));
        assert_eq!(count_columns(&schema), 8);
    }
}
