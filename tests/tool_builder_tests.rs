//! Exercises `build_tool_surface`'s two adaptive decisions: single vs
//! two-step schema disclosure, and which execution tools get registered
//! under privilege and tool-ACL constraints.

mod common;

use std::sync::Arc;

use common::{column, table, MockAdapter};
use db_gateway::core::{GatewayContext, GatewayFlags};
use db_gateway::db::privilege::{ObjectKind, Privilege};
use db_gateway::db::{DatabaseSchema, UserPrivilege};
use db_gateway::tools::build_tool_surface;

fn small_schema() -> DatabaseSchema {
    let mut schema = DatabaseSchema::new();
    schema.insert(
        "users".to_string(),
        table(
            "users",
            vec![column("id", "integer", false), column("name", "text", true)],
        ),
    );
    schema
}

fn wide_schema(threshold: usize) -> DatabaseSchema {
    let mut schema = DatabaseSchema::new();
    let columns = (0..threshold + 1).map(|i| column(&format!("c{i}"), "text", true)).collect();
    schema.insert("wide".to_string(), table("wide", columns));
    schema
}

fn context(adapter: Arc<MockAdapter>, flags: GatewayFlags) -> Arc<GatewayContext> {
    let user_privilege = adapter.user_privilege.lock().unwrap().clone();
    Arc::new(GatewayContext::new(
        adapter,
        user_privilege,
        Default::default(),
        Default::default(),
        Vec::new(),
        Vec::new(),
        flags,
        None,
    ))
}

#[tokio::test]
async fn registers_single_schema_tool_under_threshold() {
    let adapter = Arc::new(MockAdapter::new(small_schema(), UserPrivilege::new()));
    let registry = build_tool_surface(context(adapter, GatewayFlags::default())).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"get_schema"));
    assert!(!names.contains(&"get_object"));
}

#[tokio::test]
async fn registers_two_step_tools_over_threshold() {
    let flags = GatewayFlags { adaptive_schema_threshold: 10, ..GatewayFlags::default() };
    let adapter = Arc::new(MockAdapter::new(wide_schema(10), UserPrivilege::new()));
    let registry = build_tool_surface(context(adapter, flags)).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"get_schema"));
    assert!(names.contains(&"get_object"));
}

#[tokio::test]
async fn fine_grained_tools_reflect_held_privileges() {
    let mut privilege = UserPrivilege::new();
    privilege.grant(Privilege::Select, ObjectKind::Table, "users");
    privilege.grant(Privilege::Insert, ObjectKind::Table, "users");

    let adapter = Arc::new(MockAdapter::new(small_schema(), privilege));
    let registry = build_tool_surface(context(adapter, GatewayFlags::default())).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"select"));
    assert!(names.contains(&"insert"));
    assert!(!names.contains(&"update"));
    assert!(!names.contains(&"delete"));
}

#[tokio::test]
async fn disable_fine_grained_tools_yields_single_execute_tool() {
    let mut privilege = UserPrivilege::new();
    privilege.grant(Privilege::Select, ObjectKind::Table, "users");

    let flags = GatewayFlags { disable_fine_grained_tools: true, ..GatewayFlags::default() };
    let adapter = Arc::new(MockAdapter::new(small_schema(), privilege));
    let registry = build_tool_surface(context(adapter, flags)).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"execute"));
    assert!(!names.contains(&"select"));
}

#[tokio::test]
async fn white_tool_acl_restricts_to_named_operations_even_with_privilege() {
    let mut privilege = UserPrivilege::new();
    privilege.grant(Privilege::Select, ObjectKind::Table, "users");
    privilege.grant(Privilege::Insert, ObjectKind::Table, "users");

    let adapter = Arc::new(MockAdapter::new(small_schema(), privilege.clone()));
    let context = Arc::new(GatewayContext::new(
        adapter,
        privilege,
        Default::default(),
        Default::default(),
        vec!["SELECT".to_string()],
        Vec::new(),
        GatewayFlags::default(),
        None,
    ));
    let registry = build_tool_surface(context).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"select"));
    assert!(!names.contains(&"insert"));
}

#[tokio::test]
async fn black_tool_acl_applies_only_when_whitelist_empty() {
    let mut privilege = UserPrivilege::new();
    privilege.grant(Privilege::Select, ObjectKind::Table, "users");
    privilege.grant(Privilege::Insert, ObjectKind::Table, "users");

    let adapter = Arc::new(MockAdapter::new(small_schema(), privilege.clone()));
    let context = Arc::new(GatewayContext::new(
        adapter,
        privilege,
        Default::default(),
        Default::default(),
        Vec::new(),
        vec!["INSERT".to_string()],
        GatewayFlags::default(),
        None,
    ));
    let registry = build_tool_surface(context).await.unwrap();

    let names: Vec<&str> = registry.names().collect();
    assert!(names.contains(&"select"));
    assert!(!names.contains(&"insert"));
}
