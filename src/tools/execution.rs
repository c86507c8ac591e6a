//! SQL execution tools (spec §4.6, item 2), grounded on
//! `original_source/.../tools/execution_tools.py`.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::context::GatewayContext;
use crate::core::errors::ToolError;
use crate::db::adapter::QueryOutcome;
use crate::gate::Gate;
use crate::sql::SqlOperation;
use crate::tools::Tool;

use std::sync::Arc;

/// One instance per operation in fine-grained mode (`select`, `insert`,
/// `update`, `delete`); `operation: None` is the single generic `execute`
/// tool, which accepts any operation and still runs the full gate.
pub struct ExecutionTool {
    name: String,
    description: String,
    operation: Option<SqlOperation>,
    context: Arc<GatewayContext>,
}

impl ExecutionTool {
    pub fn fine_grained(operation: SqlOperation, context: Arc<GatewayContext>) -> Self {
        let op_name = operation.as_str();
        Self {
            name: op_name.to_ascii_lowercase(),
            description: format!("Execute a `{op_name}` SQL statement\n    - sql (str): The {op_name} SQL. Other operations are not allowed"),
            operation: Some(operation),
            context,
        }
    }

    pub fn generic(context: Arc<GatewayContext>) -> Self {
        Self {
            name: "execute".to_string(),
            description: "Execute any SQL statement\n    - sql (str): The SQL statement to run. \
                Exactly one statement per call; transactions must be run via begin/commit/rollback."
                .to_string(),
            operation: None,
            context,
        }
    }

    async fn run(&self, params: Value) -> Result<String, ToolError> {
        let sql = params
            .get("sql")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Other("missing required parameter 'sql'".to_string()))?;

        let gate = Gate::new(&self.context.user_privilege, &self.context.white_object_acl, &self.context.black_object_acl);
        gate.check(sql, self.operation)?;

        let outcome = self.context.adapter.execute_query(sql).await?;
        Ok(match outcome {
            QueryOutcome::Rows(rows) => {
                let rendered = rows.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ");
                format!("[{rendered}]")
            }
            QueryOutcome::RowsAffected(n) => format!("{n} rows affected."),
        })
    }
}

#[async_trait]
impl Tool for ExecutionTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, params: Value) -> String {
        match self.run(params).await {
            Ok(s) => s,
            Err(e) => e.to_response_line(),
        }
    }
}
