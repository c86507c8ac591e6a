//! Tool surface builder (spec §4.6, C6).
//!
//! Assembles the registry once at startup from the connected user's
//! privileges, the configured ACLs, and the discovered schema size.
//! Grounded on
//! `original_source/.../tools/execution_tools.py::build_sql_exec_tools`
//! and `tools/context_tools/schema.py::build_context_retrieval_tool`.

use std::sync::Arc;

use crate::core::context::GatewayContext;
use crate::core::errors::DbError;
use crate::db::schema::count_columns;
use crate::sql::SqlOperation;
use crate::tools::context_tools::{GetFullSchemaTool, GetObjectTool, GetTopLevelSchemaTool};
use crate::tools::execution::ExecutionTool;
use crate::tools::transaction::{BeginTool, CommitTool, RollbackTool};
use crate::tools::value_search::SearchRelativeColumnValuesTool;
use crate::tools::ToolRegistry;

pub async fn build_tool_surface(context: Arc<GatewayContext>) -> Result<ToolRegistry, DbError> {
    let mut registry = ToolRegistry::new();

    build_context_tools(&context, &mut registry).await?;
    build_execution_tools(&context, &mut registry);

    if !context.flags.disable_transaction_tools {
        registry.register(Arc::new(BeginTool(context.clone())));
        registry.register(Arc::new(CommitTool(context.clone())));
        registry.register(Arc::new(RollbackTool(context.clone())));
    }

    if context.value_search.is_some() {
        registry.register(Arc::new(SearchRelativeColumnValuesTool(context.clone())));
    }

    Ok(registry)
}

async fn build_context_tools(context: &Arc<GatewayContext>, registry: &mut ToolRegistry) -> Result<(), DbError> {
    let schema = context.adapter.get_database_schema().await?;
    let total_columns = count_columns(&schema);

    if total_columns <= context.flags.adaptive_schema_threshold {
        registry.register(Arc::new(GetFullSchemaTool(context.clone())));
    } else {
        registry.register(Arc::new(GetTopLevelSchemaTool(context.clone())));
        registry.register(Arc::new(GetObjectTool(context.clone())));
    }

    Ok(())
}

fn build_execution_tools(context: &Arc<GatewayContext>, registry: &mut ToolRegistry) {
    if context.flags.disable_fine_grained_tools {
        registry.register(Arc::new(ExecutionTool::generic(context.clone())));
        return;
    }

    let held = context.user_privilege.privileges_held();
    let operations = [SqlOperation::Select, SqlOperation::Insert, SqlOperation::Update, SqlOperation::Delete];

    let mut allowed: Vec<SqlOperation> = operations.into_iter().filter(|op| held.contains(&op.as_privilege())).collect();

    if !context.white_tool_acl.is_empty() {
        allowed.retain(|op| context.white_tool_acl.iter().any(|t| t == op.as_str()));
    } else if !context.black_tool_acl.is_empty() {
        allowed.retain(|op| !context.black_tool_acl.iter().any(|t| t == op.as_str()));
    }

    for op in allowed {
        registry.register(Arc::new(ExecutionTool::fine_grained(op, context.clone())));
    }
}
