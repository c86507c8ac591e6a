//! Stdio transport loop.
//!
//! The spec places wire framing out of scope and relies only on "a tool
//! registry with named tools, typed parameters, and text responses"; this
//! is the minimal contract that satisfies that: one JSON request per line
//! in (`{"tool": "...", "params": {...}}`), one JSON response per line out
//! (`{"result": "..."}`). Grounded on the teacher's own line-oriented
//! stdio loop shape in `main.rs`, adapted to this server's request shape.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::tools::ToolRegistry;

#[derive(Debug, Deserialize)]
struct ToolRequest {
    tool: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct ToolResponse {
    result: String,
}

pub async fn run_stdio(registry: Arc<ToolRegistry>) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = dispatch(&registry, &line).await;
        let encoded = serde_json::to_string(&response).unwrap_or_else(|e| format!(r#"{{"result":"error: {e}"}}"#));

        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn dispatch(registry: &ToolRegistry, line: &str) -> ToolResponse {
    match serde_json::from_str::<ToolRequest>(line) {
        Ok(request) => ToolResponse {
            result: registry.call(&request.tool, request.params).await,
        },
        Err(e) => ToolResponse {
            result: format!("parse: invalid request: {e}"),
        },
    }
}
