//! Schema/context tools (spec §4.5/§4.6 item 3), grounded on
//! `original_source/.../tools/context_tools/schema.py`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::context::GatewayContext;
use crate::core::errors::{DbError, ToolError};
use crate::projector::Projector;
use crate::tools::Tool;

fn projector(context: &GatewayContext) -> Projector<'_> {
    Projector::new(
        &context.user_privilege,
        &context.white_object_acl,
        &context.black_object_acl,
        context.flags.disable_privilege_annotation,
    )
}

/// Registered when the schema fits under the adaptive threshold: returns
/// the whole accessible schema as DDL in one call.
pub struct GetFullSchemaTool(pub Arc<GatewayContext>);

#[async_trait]
impl Tool for GetFullSchemaTool {
    fn name(&self) -> &str {
        "get_schema"
    }

    fn description(&self) -> &str {
        "Retrieve the database schemas"
    }

    async fn call(&self, _params: Value) -> String {
        match self.0.adapter.get_database_schema().await {
            Ok(schema) => projector(&self.0).render_full_schema(schema),
            Err(e) => ToolError::Db(e).to_response_line(),
        }
    }
}

/// Registered (alongside [`GetObjectTool`]) when the schema exceeds the
/// adaptive threshold: returns only top-level object names and access
/// annotations.
pub struct GetTopLevelSchemaTool(pub Arc<GatewayContext>);

#[async_trait]
impl Tool for GetTopLevelSchemaTool {
    fn name(&self) -> &str {
        "get_schema"
    }

    fn description(&self) -> &str {
        "Retrieve the database schemas"
    }

    async fn call(&self, _params: Value) -> String {
        match self.0.adapter.get_top_level_objects().await {
            Ok(objects) => projector(&self.0).render_top_level(objects),
            Err(e) => ToolError::Db(e).to_response_line(),
        }
    }
}

pub struct GetObjectTool(pub Arc<GatewayContext>);

#[async_trait]
impl Tool for GetObjectTool {
    fn name(&self) -> &str {
        "get_object"
    }

    fn description(&self) -> &str {
        "Retrieve the details of a given object\n    \
         - object_type (str): The type of the queried object, e.g., \"TABLE\"\n    \
         - object_name (str): The name of the queried object"
    }

    async fn call(&self, params: Value) -> String {
        match self.run(params).await {
            Ok(s) => s,
            Err(e) => e.to_response_line(),
        }
    }
}

impl GetObjectTool {
    async fn run(&self, params: Value) -> Result<String, ToolError> {
        let object_type = params
            .get("object_type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Other("missing required parameter 'object_type'".to_string()))?;
        let object_name = params
            .get("object_name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ToolError::Other("missing required parameter 'object_name'".to_string()))?;

        let table = match self.0.adapter.get_table_details(object_name).await {
            Ok(t) => Some(t),
            Err(DbError::NotFound { .. }) => None,
            Err(e) => return Err(ToolError::Db(e)),
        };

        projector(&self.0).render_object(object_type, object_name, table)
    }
}
