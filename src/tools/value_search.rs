//! `search_relative_column_values` (spec §4.6 item 5, SPEC_FULL §B),
//! grounded on `original_source/.../tools/context_tools/column_value.py`.
//!
//! The original delegates ranking to `sentence_transformers`; that model is
//! explicitly out of scope here. [`ValueSearchBackend`] instead ranks
//! candidate values by cosine similarity over character-trigram frequency
//! vectors — a small, dependency-free stand-in for semantic similarity that
//! still rewards shared substrings over exact-match noise. The tool is only
//! registered when a backend is configured (spec's silent-fallback rule);
//! there is presently one backend, selected unconditionally once enabled.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::context::GatewayContext;
use crate::core::errors::ToolError;
use crate::db::adapter::QueryOutcome;
use crate::gate::Gate;
use crate::sql::SqlOperation;
use crate::tools::Tool;

const MAX_DISTINCT_VALUES: usize = 50;
const TOP_K: usize = 5;

pub struct ValueSearchBackend {
    max_distinct_values: usize,
    top_k: usize,
}

impl Default for ValueSearchBackend {
    fn default() -> Self {
        Self {
            max_distinct_values: MAX_DISTINCT_VALUES,
            top_k: TOP_K,
        }
    }
}

impl ValueSearchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn trigram_vector(text: &str) -> HashMap<String, f64> {
        let normalized: Vec<char> = format!("  {}  ", text.to_lowercase()).chars().collect();
        let mut counts: HashMap<String, f64> = HashMap::new();
        if normalized.len() < 3 {
            counts.insert(normalized.iter().collect(), 1.0);
            return counts;
        }
        for window in normalized.windows(3) {
            let key: String = window.iter().collect();
            *counts.entry(key).or_insert(0.0) += 1.0;
        }
        counts
    }

    fn cosine_similarity(a: &HashMap<String, f64>, b: &HashMap<String, f64>) -> f64 {
        let mut dot = 0.0;
        for (k, va) in a {
            if let Some(vb) = b.get(k) {
                dot += va * vb;
            }
        }
        let norm_a = a.values().map(|v| v * v).sum::<f64>().sqrt();
        let norm_b = b.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }

    /// Rank `candidates` by similarity to `target`, most similar first,
    /// truncated to the top-k.
    pub fn rank(&self, target: &str, candidates: &[String]) -> Vec<String> {
        let target_vec = Self::trigram_vector(target);
        let mut scored: Vec<(f64, &String)> = candidates
            .iter()
            .map(|c| (Self::cosine_similarity(&target_vec, &Self::trigram_vector(c)), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().take(self.top_k).map(|(_, v)| v.clone()).collect()
    }

    pub fn max_distinct_values(&self) -> usize {
        self.max_distinct_values
    }
}

pub struct SearchRelativeColumnValuesTool(pub Arc<GatewayContext>);

#[async_trait]
impl Tool for SearchRelativeColumnValuesTool {
    fn name(&self) -> &str {
        "search_relative_column_values"
    }

    fn description(&self) -> &str {
        "For each specified 'table.column', find the most similar candidate values to the given target value.\n    \
         - column_2_value (object): keys are 'table.column', values are the target value to match against."
    }

    async fn call(&self, params: Value) -> String {
        match self.run(params).await {
            Ok(s) => s,
            Err(e) => e.to_response_line(),
        }
    }
}

impl SearchRelativeColumnValuesTool {
    async fn run(&self, params: Value) -> Result<String, ToolError> {
        let backend = self
            .0
            .value_search
            .as_ref()
            .ok_or_else(|| ToolError::Other("value search is not configured".to_string()))?;

        let map = params
            .get("column_2_value")
            .and_then(|v| v.as_object())
            .ok_or_else(|| ToolError::Other("missing required parameter 'column_2_value'".to_string()))?;

        if map.is_empty() {
            return Err(ToolError::Other("no column-value map provided".to_string()));
        }

        let mut result = serde_json::Map::new();

        for (full_column, target_value) in map {
            let Some((table, column)) = full_column.split_once('.') else {
                result.insert(full_column.clone(), Value::String("invalid column format, expected 'table.column'".to_string()));
                continue;
            };

            let target = target_value.as_str().map(|s| s.to_string()).unwrap_or_else(|| target_value.to_string());

            let query = format!("SELECT DISTINCT {column} FROM {table} LIMIT {}", backend.max_distinct_values());
            let gate = Gate::new(&self.0.user_privilege, &self.0.white_object_acl, &self.0.black_object_acl);
            gate.check(&query, Some(SqlOperation::Select))?;

            let outcome = self.0.adapter.execute_query(&query).await?;
            let values: Vec<String> = match outcome {
                QueryOutcome::Rows(rows) => rows
                    .into_iter()
                    .filter_map(|r| r.columns.first().map(|(_, v)| v.clone()))
                    .collect(),
                QueryOutcome::RowsAffected(_) => Vec::new(),
            };

            let ranked = backend.rank(&target, &values);
            result.insert(column.to_string(), Value::Array(ranked.into_iter().map(Value::String).collect()));
        }

        Ok(Value::Object(result).to_string())
    }
}
