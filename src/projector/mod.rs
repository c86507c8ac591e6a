//! Schema and context projection (spec §4.5, C5).
//!
//! Renders the adapter's raw schema/privilege data into the text a tool
//! response returns, applying ACL filtering and privilege annotations.
//! Grounded on `original_source/.../tools/context_tools/schema.py`.

use std::collections::{BTreeMap, BTreeSet};

use crate::acl::{columns_allowed, table_allowed, ObjectAcl};
use crate::core::errors::{DbError, ToolError};
use crate::db::privilege::{Privilege, UserPrivilege};
use crate::db::schema::{DatabaseSchema, TableSchema, TopLevelObjects};

pub struct Projector<'a> {
    pub user_privilege: &'a UserPrivilege,
    pub white_object_acl: &'a ObjectAcl,
    pub black_object_acl: &'a ObjectAcl,
    pub disable_privilege_annotation: bool,
}

/// `{table -> operations}`, derived once from `UserPrivilege` the way
/// `tools/utils.py::reformat_privilege` reshapes the operation-centric
/// privilege map into an object-centric one for display.
fn table_privileges(user_privilege: &UserPrivilege) -> BTreeMap<String, Vec<Privilege>> {
    let mut map: BTreeMap<String, Vec<Privilege>> = BTreeMap::new();
    for privilege in Privilege::ALL {
        for table in user_privilege.tables_with_privilege(privilege) {
            map.entry(strip_public_prefix(table).to_string()).or_default().push(privilege);
        }
    }
    map
}

fn column_privileges(user_privilege: &UserPrivilege) -> BTreeMap<String, Vec<Privilege>> {
    let mut map: BTreeMap<String, Vec<Privilege>> = BTreeMap::new();
    for privilege in Privilege::ALL {
        for column in user_privilege.columns_with_privilege(privilege) {
            map.entry(strip_public_prefix(column).to_string()).or_default().push(privilege);
        }
    }
    map
}

fn strip_public_prefix(name: &str) -> &str {
    name.strip_prefix("public.").unwrap_or(name)
}

fn privilege_list(privs: &[Privilege]) -> String {
    if privs.len() == Privilege::ALL.len() {
        "all".to_string()
    } else {
        privs.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
    }
}

impl<'a> Projector<'a> {
    pub fn new(user_privilege: &'a UserPrivilege, white_object_acl: &'a ObjectAcl, black_object_acl: &'a ObjectAcl, disable_privilege_annotation: bool) -> Self {
        Self {
            user_privilege,
            white_object_acl,
            black_object_acl,
            disable_privilege_annotation,
        }
    }

    fn table_allowed(&self, table: &str) -> bool {
        table_allowed(self.white_object_acl, self.black_object_acl, table)
    }

    fn filter_columns(&self, table: &str, columns: Vec<crate::db::schema::ColumnInfo>) -> Vec<crate::db::schema::ColumnInfo> {
        if columns.is_empty() {
            return columns;
        }
        columns
            .into_iter()
            .filter(|c| columns_allowed(self.white_object_acl, self.black_object_acl, table, std::slice::from_ref(&c.name)))
            .collect()
    }

    /// Render the full schema as DDL, one `CREATE TABLE` block per
    /// accessible table, joined by blank lines. Returns the "no objects"
    /// message verbatim when ACL filtering leaves nothing.
    pub fn render_full_schema(&self, schema: DatabaseSchema) -> String {
        let accessible: Vec<(String, TableSchema)> = schema
            .into_iter()
            .filter(|(name, _)| self.table_allowed(name))
            .collect();

        if accessible.is_empty() {
            return "No objects can be accessed with current ACL".to_string();
        }

        let table_privs = table_privileges(self.user_privilege);
        let col_privs = column_privileges(self.user_privilege);

        accessible
            .into_iter()
            .map(|(name, table)| self.render_table(&name, table, &table_privs, &col_privs))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render `{Name, Access, Permissions?}` entries for top-level objects.
    pub fn render_top_level(&self, objects: TopLevelObjects) -> String {
        let tables: Vec<String> = objects.tables.into_iter().filter(|t| self.table_allowed(t)).collect();
        let views: Vec<String> = objects.views.into_iter().filter(|v| self.table_allowed(v)).collect();

        if tables.is_empty() && views.is_empty() {
            return "No objects can be accessed with current ACL".to_string();
        }

        let table_privs = table_privileges(self.user_privilege);
        let col_privs = column_privileges(self.user_privilege);
        let ref_tables: BTreeSet<&str> = col_privs.keys().map(|c| c.split('.').next().unwrap_or(c)).collect();

        let mut payload = serde_json::Map::new();
        payload.insert("TABLE".to_string(), self.annotate_names(&tables, &table_privs, &ref_tables));
        payload.insert("VIEW".to_string(), self.annotate_names(&views, &table_privs, &ref_tables));

        serde_json::Value::Object(payload).to_string()
    }

    fn annotate_names(&self, names: &[String], table_privs: &BTreeMap<String, Vec<Privilege>>, ref_tables: &BTreeSet<&str>) -> serde_json::Value {
        if self.disable_privilege_annotation {
            return serde_json::Value::Array(names.iter().map(|n| serde_json::Value::String(n.clone())).collect());
        }

        let entries = names
            .iter()
            .map(|name| {
                let mut entry = serde_json::Map::new();
                entry.insert("Name".to_string(), serde_json::Value::String(name.clone()));
                if let Some(privs) = table_privs.get(name) {
                    entry.insert("Access".to_string(), serde_json::Value::Bool(true));
                    entry.insert("Permissions".to_string(), serde_json::Value::String(privilege_list(privs)));
                } else if ref_tables.contains(name.as_str()) {
                    entry.insert("Access".to_string(), serde_json::Value::String("Partial columns".to_string()));
                } else {
                    entry.insert("Access".to_string(), serde_json::Value::Bool(false));
                }
                serde_json::Value::Object(entry)
            })
            .collect();
        serde_json::Value::Array(entries)
    }

    /// `get_object(type, name)` (spec §4.5): returns `Err(NotFound)` if the
    /// object doesn't exist, `Err(AclDenied message)` rendered by the
    /// caller as plain text if ACL-blocked, otherwise the rendered DDL.
    pub fn render_object(&self, object_type: &str, name: &str, table: Option<TableSchema>) -> Result<String, ToolError> {
        if object_type.to_ascii_uppercase() != "TABLE" && object_type.to_ascii_uppercase() != "VIEW" {
            return Err(ToolError::Other(format!(
                "query details for '{object_type}' object is not supported; supported types: TABLE, VIEW"
            )));
        }

        if !self.table_allowed(name) {
            return Ok(format!("{object_type} {name} cannot be accessed with current ACL"));
        }

        let table = table.ok_or_else(|| {
            ToolError::Db(DbError::NotFound {
                kind: "TABLE",
                name: name.to_string(),
            })
        })?;

        let table_privs = table_privileges(self.user_privilege);
        let col_privs = column_privileges(self.user_privilege);
        Ok(self.render_table(name, table, &table_privs, &col_privs))
    }

    fn render_table(
        &self,
        name: &str,
        mut table: TableSchema,
        table_privs: &BTreeMap<String, Vec<Privilege>>,
        col_privs: &BTreeMap<String, Vec<Privilege>>,
    ) -> String {
        table.columns = self.filter_columns(name, table.columns);

        let mut lines = Vec::new();

        if !self.disable_privilege_annotation {
            if let Some(privs) = table_privs.get(name) {
                lines.push(format!("-- Access: True, Permissions: {}", privilege_list(privs)));
            } else if col_privs.keys().any(|c| c.split('.').next() == Some(name)) {
                lines.push("-- Access: Partial columns".to_string());
            } else {
                lines.push("-- Access: False".to_string());
            }
        }

        lines.push(format!("CREATE TABLE {name} ("));
        let mut column_lines = Vec::new();
        for col in &table.columns {
            let mut def = format!("{} {}", col.name, col.type_name);
            if !col.nullable {
                def.push_str(" NOT NULL");
            }
            if !self.disable_privilege_annotation {
                let qualified = format!("{name}.{}", col.name);
                if let Some(privs) = col_privs.get(&qualified) {
                    def.push_str(&format!(" -- Permissions: {}", privilege_list(privs)));
                }
            }
            column_lines.push(format!("    {def}"));
        }
        lines.extend(column_lines);

        if !table.primary_key.is_empty() {
            lines.push(format!("    PRIMARY KEY ({})", table.primary_key.join(", ")));
        }
        for fk in &table.foreign_keys {
            lines.push(format!(
                "    FOREIGN KEY ({}) REFERENCES {}({})",
                fk.local_column, fk.remote_table, fk.remote_column
            ));
        }
        lines.push(");".to_string());

        for idx in &table.indexes {
            let unique = if idx.unique { "UNIQUE " } else { "" };
            lines.push(format!("CREATE {unique}INDEX {} ON {name}({});", idx.name, idx.columns.join(", ")));
        }

        lines.join("\n")
    }
}
