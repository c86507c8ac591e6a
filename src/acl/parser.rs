//! ACL parsing (spec §4.2), grounded on
//! `original_source/.../acl_parser.py::ACLParser.parse`.
//!
//! Both ACL kinds accept either the literal ACL content or a path to a file
//! containing it — if the input names an existing file, its contents are
//! read and parsed instead of the input string itself.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::acl::types::{AclContent, ObjectAcl, ToolAcl};
use crate::core::errors::AclError;
use crate::db::privilege::Privilege;

pub struct AclParser;

impl AclParser {
    /// Comma-separated operation list, optionally wrapped in `[...]`, with
    /// unrecognized tokens silently discarded. Empty input yields an empty
    /// list (no tool-ACL restriction).
    pub fn parse_tool_acl(input: &str) -> Result<ToolAcl, AclError> {
        let content = Self::resolve_source(input)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }

        let trimmed = content.trim();
        let inner = if trimmed.starts_with('[') && trimmed.ends_with(']') {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };

        let valid: Vec<String> = inner
            .split(',')
            .map(|item| item.trim().trim_matches('"').to_string())
            .filter(|item| !item.is_empty())
            .filter(|item| Privilege::ALL.iter().any(|p| p.as_str() == item))
            .collect();

        Ok(valid)
    }

    /// JSON object ACL, in list form (`{"TABLE": ["t1"]}`) or dict form
    /// (`{"TABLE": {"t1": {"COLUMN": ["a"]}}}`). `VIEW` entries are merged
    /// into `TABLE` since both share the same downstream treatment.
    pub fn parse_object_acl(input: &str) -> Result<ObjectAcl, AclError> {
        let content = Self::resolve_source(input)?;
        if content.is_empty() {
            return Ok(ObjectAcl::empty());
        }

        let value: Value = serde_json::from_str(&content)?;
        let obj = value
            .as_object()
            .ok_or_else(|| AclError::Malformed("object ACL must be a JSON object".to_string()))?;

        let mut table_entry: Option<AclContent> = None;

        for (obj_type, content) in obj.iter() {
            let upper = obj_type.to_ascii_uppercase();
            if upper != "TABLE" && upper != "VIEW" {
                return Err(AclError::UnsupportedObjectType(obj_type.clone()));
            }

            let parsed = parse_object_content(content)?;
            table_entry = Some(match table_entry {
                None => parsed,
                Some(existing) => merge_content(existing, parsed),
            });
        }

        Ok(ObjectAcl {
            tables: table_entry.unwrap_or(AclContent::Empty),
        })
    }

    fn resolve_source(input: &str) -> Result<String, AclError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(String::new());
        }

        let path = Path::new(trimmed);
        if path.is_file() {
            let data = std::fs::read_to_string(path).map_err(|e| AclError::Io {
                path: trimmed.to_string(),
                source: e,
            })?;
            return Ok(data.trim().to_string());
        }

        Ok(trimmed.to_string())
    }
}

fn parse_object_content(value: &Value) -> Result<AclContent, AclError> {
    match value {
        Value::Array(items) => {
            let names = items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(|s| s.to_string())
                        .ok_or_else(|| AclError::Malformed("object list entries must be strings".to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AclContent::List(names))
        }
        Value::Object(map) => {
            let mut tables = BTreeMap::new();
            for (name, details) in map.iter() {
                let details_obj = details
                    .as_object()
                    .ok_or_else(|| AclError::Malformed(format!("details for table '{name}' must be an object")))?;

                let columns = match details_obj.get("COLUMN") {
                    Some(Value::Array(cols)) => cols
                        .iter()
                        .map(|c| {
                            c.as_str()
                                .map(|s| s.to_string())
                                .ok_or_else(|| AclError::Malformed(format!("column list for '{name}' must contain strings")))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    Some(_) => {
                        return Err(AclError::Malformed(format!("'COLUMN' for '{name}' must be a list")));
                    }
                    None => Vec::new(),
                };

                tables.insert(name.clone(), columns);
            }
            Ok(AclContent::Columns(tables))
        }
        _ => Err(AclError::Malformed("object ACL entry must be a list or object".to_string())),
    }
}

fn merge_content(a: AclContent, b: AclContent) -> AclContent {
    match (a, b) {
        (AclContent::List(mut av), AclContent::List(bv)) => {
            av.extend(bv);
            AclContent::List(av)
        }
        (AclContent::Columns(mut am), AclContent::Columns(bm)) => {
            am.extend(bm);
            AclContent::Columns(am)
        }
        (_, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bracketed_tool_acl() {
        let acl = AclParser::parse_tool_acl(r#"["SELECT", "INSERT"]"#).unwrap();
        assert_eq!(acl, vec!["SELECT".to_string(), "INSERT".to_string()]);
    }

    #[test]
    fn discards_unrecognized_tool_tokens() {
        let acl = AclParser::parse_tool_acl("SELECT, TRUNCATE, DELETE").unwrap();
        assert_eq!(acl, vec!["SELECT".to_string(), "DELETE".to_string()]);
    }

    #[test]
    fn empty_tool_acl_means_no_restriction() {
        assert!(AclParser::parse_tool_acl("").unwrap().is_empty());
    }

    #[test]
    fn parses_list_form_object_acl() {
        let acl = AclParser::parse_object_acl(r#"{"TABLE": ["users", "orders"]}"#).unwrap();
        assert!(acl.contains_table("users"));
        assert!(acl.contains_table("orders"));
        assert!(!acl.contains_table("secrets"));
    }

    #[test]
    fn parses_dict_form_object_acl_with_columns() {
        let acl = AclParser::parse_object_acl(r#"{"TABLE": {"users": {"COLUMN": ["id", "name"]}}}"#).unwrap();
        assert!(acl.contains_table("users"));
        assert_eq!(acl.columns_for_table("users"), Some(&["id".to_string(), "name".to_string()][..]));
    }

    #[test]
    fn merges_view_into_table() {
        let acl = AclParser::parse_object_acl(r#"{"TABLE": ["users"], "VIEW": ["active_users"]}"#).unwrap();
        assert!(acl.contains_table("users"));
        assert!(acl.contains_table("active_users"));
    }

    #[test]
    fn rejects_unsupported_object_type() {
        let err = AclParser::parse_object_acl(r#"{"SCHEMA": ["x"]}"#).unwrap_err();
        assert!(matches!(err, AclError::UnsupportedObjectType(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = AclParser::parse_object_acl("{not json").unwrap_err();
        assert!(matches!(err, AclError::InvalidJson(_)));
    }
}
