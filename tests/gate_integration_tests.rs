//! Integration tests for the pre-execution gate (operation match, privilege,
//! ACL, in that order) against realistic multi-table statements.

mod common;

use db_gateway::acl::{AclParser, ObjectAcl};
use db_gateway::core::errors::GateError;
use db_gateway::db::privilege::{ObjectKind, Privilege, UserPrivilege};
use db_gateway::gate::Gate;
use db_gateway::sql::SqlOperation;

fn privilege_with(entries: &[(Privilege, ObjectKind, &str)]) -> UserPrivilege {
    let mut p = UserPrivilege::new();
    for (priv_, kind, name) in entries {
        p.grant(*priv_, *kind, name);
    }
    p
}

#[test]
fn select_join_requires_privilege_on_every_referenced_table() {
    let privilege = privilege_with(&[(Privilege::Select, ObjectKind::Table, "orders")]);
    let white = ObjectAcl::empty();
    let black = ObjectAcl::empty();
    let gate = Gate::new(&privilege, &white, &black);

    let err = gate
        .check(
            "SELECT orders.id, customers.name FROM orders JOIN customers ON orders.customer_id = customers.id",
            Some(SqlOperation::Select),
        )
        .unwrap_err();
    assert!(matches!(err, GateError::Privilege));

    let privilege = privilege_with(&[
        (Privilege::Select, ObjectKind::Table, "orders"),
        (Privilege::Select, ObjectKind::Table, "customers"),
    ]);
    let gate = Gate::new(&privilege, &white, &black);
    assert!(gate
        .check(
            "SELECT orders.id, customers.name FROM orders JOIN customers ON orders.customer_id = customers.id",
            Some(SqlOperation::Select),
        )
        .is_ok());
}

#[test]
fn insert_needs_insert_on_target_and_select_on_subquery_source() {
    let privilege = privilege_with(&[(Privilege::Insert, ObjectKind::Table, "archive")]);
    let white = ObjectAcl::empty();
    let black = ObjectAcl::empty();
    let gate = Gate::new(&privilege, &white, &black);

    let err = gate
        .check("INSERT INTO archive SELECT * FROM live_orders", Some(SqlOperation::Insert))
        .unwrap_err();
    assert!(matches!(err, GateError::Privilege));

    let privilege = privilege_with(&[
        (Privilege::Insert, ObjectKind::Table, "archive"),
        (Privilege::Select, ObjectKind::Table, "live_orders"),
    ]);
    let gate = Gate::new(&privilege, &white, &black);
    assert!(gate
        .check("INSERT INTO archive SELECT * FROM live_orders", Some(SqlOperation::Insert))
        .is_ok());
}

#[test]
fn update_needs_update_on_assigned_columns_and_select_on_where_columns() {
    let privilege = privilege_with(&[(Privilege::Update, ObjectKind::Column, "accounts.balance")]);
    let white = ObjectAcl::empty();
    let black = ObjectAcl::empty();
    let gate = Gate::new(&privilege, &white, &black);

    let err = gate
        .check("UPDATE accounts SET balance = 0 WHERE status = 'closed'", Some(SqlOperation::Update))
        .unwrap_err();
    assert!(matches!(err, GateError::Privilege));

    let privilege = privilege_with(&[
        (Privilege::Update, ObjectKind::Column, "accounts.balance"),
        (Privilege::Select, ObjectKind::Column, "accounts.status"),
    ]);
    let gate = Gate::new(&privilege, &white, &black);
    assert!(gate
        .check("UPDATE accounts SET balance = 0 WHERE status = 'closed'", Some(SqlOperation::Update))
        .is_ok());
}

#[test]
fn delete_is_blocked_by_acl_even_with_full_privilege() {
    let privilege = privilege_with(&[(Privilege::Delete, ObjectKind::Table, "audit_log")]);
    let white = ObjectAcl::empty();
    let black = AclParser::parse_object_acl(r#"{"TABLE": ["audit_log"]}"#).unwrap();
    let gate = Gate::new(&privilege, &white, &black);

    let err = gate.check("DELETE FROM audit_log WHERE id = 1", Some(SqlOperation::Delete)).unwrap_err();
    assert!(matches!(err, GateError::AclDenied));
}

#[test]
fn nonempty_whitelist_overrides_blacklist_on_same_table() {
    let privilege = privilege_with(&[(Privilege::Select, ObjectKind::Table, "secrets")]);
    let white = AclParser::parse_object_acl(r#"{"TABLE": ["secrets"]}"#).unwrap();
    let black = AclParser::parse_object_acl(r#"{"TABLE": ["secrets"]}"#).unwrap();
    let gate = Gate::new(&privilege, &white, &black);

    assert!(gate.check("SELECT id FROM secrets", Some(SqlOperation::Select)).is_ok());
}

#[test]
fn dict_form_blacklist_denies_only_the_named_column() {
    let privilege = privilege_with(&[
        (Privilege::Select, ObjectKind::Table, "users"),
    ]);
    let white = ObjectAcl::empty();
    let black = AclParser::parse_object_acl(r#"{"TABLE": {"users": {"COLUMN": ["ssn"]}}}"#).unwrap();
    let gate = Gate::new(&privilege, &white, &black);

    assert!(gate.check("SELECT id, name FROM users", Some(SqlOperation::Select)).is_ok());
    let err = gate.check("SELECT id, ssn FROM users", Some(SqlOperation::Select)).unwrap_err();
    assert!(matches!(err, GateError::AclDenied));
}

#[test]
fn ambiguous_unqualified_column_across_joined_tables_fails_closed() {
    let privilege = privilege_with(&[
        (Privilege::Select, ObjectKind::Table, "orders"),
        (Privilege::Select, ObjectKind::Table, "customers"),
    ]);
    let white = ObjectAcl::empty();
    let black = ObjectAcl::empty();
    let gate = Gate::new(&privilege, &white, &black);

    let err = gate
        .check("SELECT id FROM orders JOIN customers ON orders.customer_id = customers.id", Some(SqlOperation::Select))
        .unwrap_err();
    assert!(matches!(err, GateError::Parse(_)));
}

#[test]
fn generic_tool_accepts_any_operation() {
    let privilege = privilege_with(&[(Privilege::Delete, ObjectKind::Table, "sessions")]);
    let white = ObjectAcl::empty();
    let black = ObjectAcl::empty();
    let gate = Gate::new(&privilege, &white, &black);

    assert!(gate.check("DELETE FROM sessions WHERE id = 1", None).is_ok());
}
