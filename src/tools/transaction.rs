//! Explicit transaction tools (spec §4.6, item 4), grounded on
//! `original_source/.../tools/transaction_tools.py`. Registered only when
//! `GatewayFlags::disable_transaction_tools` is false.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::context::GatewayContext;
use crate::core::errors::ToolError;
use crate::tools::Tool;

const DEFAULT_RESPONSE: &str = "Done";

pub struct BeginTool(pub Arc<GatewayContext>);
pub struct CommitTool(pub Arc<GatewayContext>);
pub struct RollbackTool(pub Arc<GatewayContext>);

#[async_trait]
impl Tool for BeginTool {
    fn name(&self) -> &str {
        "begin"
    }

    fn description(&self) -> &str {
        "Begin a transaction"
    }

    async fn call(&self, _params: Value) -> String {
        match self.0.adapter.begin().await {
            Ok(()) => DEFAULT_RESPONSE.to_string(),
            Err(e) => ToolError::Db(e).to_response_line(),
        }
    }
}

#[async_trait]
impl Tool for CommitTool {
    fn name(&self) -> &str {
        "commit"
    }

    fn description(&self) -> &str {
        "Commit current transaction"
    }

    async fn call(&self, _params: Value) -> String {
        match self.0.adapter.commit().await {
            Ok(()) => DEFAULT_RESPONSE.to_string(),
            Err(e) => ToolError::Db(e).to_response_line(),
        }
    }
}

#[async_trait]
impl Tool for RollbackTool {
    fn name(&self) -> &str {
        "rollback"
    }

    fn description(&self) -> &str {
        "Rollback current transaction"
    }

    async fn call(&self, _params: Value) -> String {
        match self.0.adapter.rollback().await {
            Ok(()) => DEFAULT_RESPONSE.to_string(),
            Err(e) => ToolError::Db(e).to_response_line(),
        }
    }
}
