//! Tool trait and registry (spec §4.6, C6's output contract).
//!
//! A minimal rendering of the transport contract spec §6 describes: named
//! tools, JSON parameters, text responses. Modeled on the teacher's own
//! `Tool`/`ToolRegistry` pair, repurposed so `call` never returns an error
//! — every failure is rendered to the category-tagged text line the
//! session protocol expects (`ToolError::to_response_line`).

pub mod builder;
pub mod context_tools;
pub mod execution;
pub mod transaction;
pub mod value_search;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

pub use builder::build_tool_surface;

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, params: Value) -> String;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools.values().map(|t| (t.name().to_string(), t.description().to_string())).collect()
    }

    pub async fn call(&self, name: &str, params: Value) -> String {
        match self.tools.get(name) {
            Some(tool) => tool.call(params).await,
            None => format!("not_found: tool '{name}' is not registered"),
        }
    }
}
