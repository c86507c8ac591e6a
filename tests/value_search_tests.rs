//! `search_relative_column_values`: registration gating, ranking quality,
//! and that its internally-generated query is still subject to the gate.

mod common;

use std::sync::Arc;

use common::MockAdapter;
use db_gateway::core::{GatewayContext, GatewayFlags};
use db_gateway::db::privilege::{ObjectKind, Privilege};
use db_gateway::db::{DatabaseSchema, UserPrivilege};
use db_gateway::tools::build_tool_surface;
use db_gateway::tools::value_search::ValueSearchBackend;
use serde_json::json;

#[tokio::test]
async fn tool_is_absent_when_no_backend_configured() {
    let adapter = Arc::new(MockAdapter::new(DatabaseSchema::new(), UserPrivilege::new()));
    let context = Arc::new(GatewayContext::new(
        adapter,
        UserPrivilege::new(),
        Default::default(),
        Default::default(),
        Vec::new(),
        Vec::new(),
        GatewayFlags::default(),
        None,
    ));
    let registry = build_tool_surface(context).await.unwrap();
    assert!(!registry.names().any(|n| n == "search_relative_column_values"));
}

#[tokio::test]
async fn tool_is_registered_and_denies_columns_without_select_privilege() {
    let adapter = Arc::new(MockAdapter::new(DatabaseSchema::new(), UserPrivilege::new()));
    let context = Arc::new(GatewayContext::new(
        adapter,
        UserPrivilege::new(),
        Default::default(),
        Default::default(),
        Vec::new(),
        Vec::new(),
        GatewayFlags::default(),
        Some(Arc::new(ValueSearchBackend::new())),
    ));
    let registry = build_tool_surface(context).await.unwrap();
    assert!(registry.names().any(|n| n == "search_relative_column_values"));

    let response = registry
        .call("search_relative_column_values", json!({"column_2_value": {"users.email": "a@example.com"}}))
        .await;
    assert_eq!(response, "privilege: statement exceeds user privilege");
}

#[tokio::test]
async fn tool_ranks_candidate_values_with_select_privilege() {
    let mut privilege = UserPrivilege::new();
    privilege.grant(Privilege::Select, ObjectKind::Table, "users");

    let adapter = Arc::new(MockAdapter::new(DatabaseSchema::new(), privilege.clone()));
    let context = Arc::new(GatewayContext::new(
        adapter,
        privilege,
        Default::default(),
        Default::default(),
        Vec::new(),
        Vec::new(),
        GatewayFlags::default(),
        Some(Arc::new(ValueSearchBackend::new())),
    ));
    let registry = build_tool_surface(context).await.unwrap();

    let response = registry
        .call("search_relative_column_values", json!({"column_2_value": {"users.email": "alice"}}))
        .await;
    // MockAdapter answers every SELECT with a single row {id: "1"}; the tool
    // should still produce a well-formed ranked result, not an error line.
    assert!(response.starts_with('{'), "expected a JSON object response, got: {response}");
}

#[test]
fn ranks_by_trigram_similarity() {
    let backend = ValueSearchBackend::new();
    let candidates = vec!["alice".to_string(), "bob".to_string(), "alicia".to_string()];
    let ranked = backend.rank("alice", &candidates);
    assert_eq!(ranked.first().map(|s| s.as_str()), Some("alice"));
}
