//! The pre-execution gate (spec §4.4, C4).
//!
//! Every tool invocation that carries a SQL statement passes through
//! [`Gate::check`] before the adapter ever sees it. Checks run in a fixed
//! order — operation match, then privilege, then ACL — because each is
//! strictly cheaper to evaluate and more often the rejection reason than
//! the one after it, matching
//! `original_source/.../tools/execution_tools.py::execute_sql_by_action`.

use crate::acl::{columns_allowed, table_allowed, ObjectAcl};
use crate::core::errors::GateError;
use crate::db::privilege::{Privilege, UserPrivilege};
use crate::sql::{classify, SqlOperation, StatementClassification};

pub struct Gate<'a> {
    pub user_privilege: &'a UserPrivilege,
    pub white_object_acl: &'a ObjectAcl,
    pub black_object_acl: &'a ObjectAcl,
}

impl<'a> Gate<'a> {
    pub fn new(user_privilege: &'a UserPrivilege, white_object_acl: &'a ObjectAcl, black_object_acl: &'a ObjectAcl) -> Self {
        Self {
            user_privilege,
            white_object_acl,
            black_object_acl,
        }
    }

    /// Parse and gate `sql` for invocation through a tool advertising
    /// `expected_operation` (`None` for the generic `execute` tool, which
    /// allows any operation).
    pub fn check(&self, sql: &str, expected_operation: Option<SqlOperation>) -> Result<StatementClassification, GateError> {
        let classification = classify(sql)?;

        if let Some(expected) = expected_operation {
            if classification.operation != expected {
                return Err(GateError::OperationMismatch);
            }
        }

        self.check_privilege(&classification)?;
        self.check_acl(&classification)?;

        Ok(classification)
    }

    fn check_privilege(&self, classification: &StatementClassification) -> Result<(), GateError> {
        for (privilege, tables) in &classification.table_requirements {
            let columns = classification.column_requirements.get(privilege).cloned().unwrap_or_default();
            let by_table = classification.columns_by_table(&columns)?;

            for table in tables {
                if self.user_privilege.has_table(*privilege, table) {
                    continue;
                }
                let required_cols = by_table.get(table).cloned().unwrap_or_default();
                if required_cols.is_empty() {
                    return Err(GateError::Privilege);
                }
                for col in &required_cols {
                    let qualified = format!("{table}.{col}");
                    if !self.user_privilege.has_column(*privilege, &qualified) {
                        return Err(GateError::Privilege);
                    }
                }
            }
        }

        // Columns belonging to tables that carry no table-level requirement
        // for this privilege still need to be checked individually.
        for (privilege, columns) in &classification.column_requirements {
            let by_table = classification.columns_by_table(columns)?;
            for (table, cols) in by_table {
                if classification
                    .table_requirements
                    .get(privilege)
                    .map(|t| t.contains(&table))
                    .unwrap_or(false)
                {
                    continue;
                }
                if self.user_privilege.has_table(*privilege, &table) {
                    continue;
                }
                for col in cols {
                    let qualified = format!("{table}.{col}");
                    if !self.user_privilege.has_column(*privilege, &qualified) {
                        return Err(GateError::Privilege);
                    }
                }
            }
        }

        Ok(())
    }

    fn check_acl(&self, classification: &StatementClassification) -> Result<(), GateError> {
        for table in &classification.tables {
            if !table_allowed(self.white_object_acl, self.black_object_acl, table) {
                return Err(GateError::AclDenied);
            }
        }

        let mut all_columns = std::collections::BTreeSet::new();
        for cols in classification.column_requirements.values() {
            all_columns.extend(cols.iter().cloned());
        }
        let by_table = classification
            .columns_by_table(&all_columns)
            .map_err(|_| GateError::AclDenied)?;

        for (table, cols) in by_table {
            if !columns_allowed(self.white_object_acl, self.black_object_acl, &table, &cols) {
                return Err(GateError::AclDenied);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::privilege::ObjectKind;

    fn privilege_with_table(table: &str, privs: &[Privilege]) -> UserPrivilege {
        let mut p = UserPrivilege::new();
        for priv_ in privs {
            p.grant(*priv_, ObjectKind::Table, table);
        }
        p
    }

    #[test]
    fn rejects_operation_mismatch() {
        let privilege = privilege_with_table("users", &[Privilege::Select]);
        let white = ObjectAcl::empty();
        let black = ObjectAcl::empty();
        let gate = Gate::new(&privilege, &white, &black);
        let err = gate.check("SELECT id FROM users", Some(SqlOperation::Insert)).unwrap_err();
        assert!(matches!(err, GateError::OperationMismatch));
    }

    #[test]
    fn rejects_missing_privilege() {
        let privilege = UserPrivilege::new();
        let white = ObjectAcl::empty();
        let black = ObjectAcl::empty();
        let gate = Gate::new(&privilege, &white, &black);
        let err = gate.check("SELECT id FROM users", Some(SqlOperation::Select)).unwrap_err();
        assert!(matches!(err, GateError::Privilege));
    }

    #[test]
    fn allows_column_level_grant() {
        let mut privilege = UserPrivilege::new();
        privilege.grant(Privilege::Select, ObjectKind::Column, "users.id");
        let white = ObjectAcl::empty();
        let black = ObjectAcl::empty();
        let gate = Gate::new(&privilege, &white, &black);
        assert!(gate.check("SELECT id FROM users", Some(SqlOperation::Select)).is_ok());
    }

    #[test]
    fn rejects_acl_denied_table() {
        use crate::acl::AclParser;
        let privilege = privilege_with_table("secrets", &[Privilege::Select]);
        let white = ObjectAcl::empty();
        let black = AclParser::parse_object_acl(r#"{"TABLE": ["secrets"]}"#).unwrap();
        let gate = Gate::new(&privilege, &white, &black);
        let err = gate.check("SELECT id FROM secrets", Some(SqlOperation::Select)).unwrap_err();
        assert!(matches!(err, GateError::AclDenied));
    }

    #[test]
    fn passes_all_checks() {
        let privilege = privilege_with_table("users", &[Privilege::Select]);
        let white = ObjectAcl::empty();
        let black = ObjectAcl::empty();
        let gate = Gate::new(&privilege, &white, &black);
        assert!(gate.check("SELECT id FROM users", Some(SqlOperation::Select)).is_ok());
    }
}
