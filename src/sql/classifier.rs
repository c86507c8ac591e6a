//! Statement classification (spec §4.3, C3).
//!
//! Parses one SQL statement with `sqlparser` and derives the permissions it
//! requires, grounded on
//! `original_source/.../tools/sql_checker.py::SQLChecker._determine_permissions`.
//! Per-operation rules:
//!   - SELECT: every table and column touched needs SELECT.
//!   - INSERT: target table/columns need INSERT; anything else referenced
//!     (subqueries) needs SELECT.
//!   - UPDATE: target table and assigned columns need UPDATE; WHERE-clause
//!     columns and any other referenced table need SELECT.
//!   - DELETE: target table needs DELETE; WHERE-clause columns and any
//!     other referenced table need SELECT.

use std::collections::{BTreeMap, BTreeSet};

use sqlparser::ast::{
    Expr, FromTable, Join, Query, Select, SelectItem, SetExpr, Statement, TableFactor, TableWithJoins,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use crate::core::errors::GateError;
use crate::db::privilege::Privilege;

/// SQL operation kinds the gateway reasons about. Anything else
/// (`CREATE`, `DROP`, `ALTER`, ...) is rejected before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
}

impl SqlOperation {
    pub fn as_privilege(self) -> Privilege {
        match self {
            SqlOperation::Select => Privilege::Select,
            SqlOperation::Insert => Privilege::Insert,
            SqlOperation::Update => Privilege::Update,
            SqlOperation::Delete => Privilege::Delete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlOperation::Select => "SELECT",
            SqlOperation::Insert => "INSERT",
            SqlOperation::Update => "UPDATE",
            SqlOperation::Delete => "DELETE",
        }
    }
}

/// A table or unqualified-column reference gathered while walking the AST.
#[derive(Debug, Default)]
struct Reference {
    /// Table name -> alias, for every table named in `FROM`/`JOIN`.
    tables: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    /// Raw column references: `(Some(qualifier), name)` or `(None, name)`.
    columns: Vec<(Option<String>, String)>,
}

/// The outcome of classifying one statement: its operation, the tables and
/// columns it touches, and the per-privilege requirement grouped by object.
#[derive(Debug, Clone)]
pub struct StatementClassification {
    pub operation: SqlOperation,
    pub tables: BTreeSet<String>,
    /// `privilege -> { table -> [unqualified or "table.column" names] }`
    pub table_requirements: BTreeMap<Privilege, BTreeSet<String>>,
    pub column_requirements: BTreeMap<Privilege, BTreeSet<String>>,
}

impl StatementClassification {
    /// Attribute every referenced column to the table it belongs to. When
    /// exactly one table is in scope, unqualified columns are attributed to
    /// it (spec's single-table rule); otherwise an unqualified column
    /// cannot be resolved and is dropped from the per-table map — the gate
    /// must treat that as a failure, not as "no requirement" (fail closed).
    pub fn columns_by_table(&self, columns: &BTreeSet<String>) -> Result<BTreeMap<String, Vec<String>>, GateError> {
        let mut by_table: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for col in columns {
            if let Some((table, column)) = col.rsplit_once('.') {
                by_table.entry(table.to_string()).or_default().push(column.to_string());
            } else if self.tables.len() == 1 {
                let table = self.tables.iter().next().unwrap().clone();
                by_table.entry(table).or_default().push(col.clone());
            } else {
                return Err(GateError::Parse(format!(
                    "cannot attribute unqualified column '{col}' with {} tables in scope",
                    self.tables.len()
                )));
            }
        }
        Ok(by_table)
    }
}

pub fn classify(sql: &str) -> Result<StatementClassification, GateError> {
    let dialect = GenericDialect {};
    let mut statements = Parser::parse_sql(&dialect, sql).map_err(|e| GateError::Parse(e.to_string()))?;

    if statements.len() != 1 {
        return Err(GateError::Parse("exactly one statement is required per call".to_string()));
    }
    let statement = statements.remove(0);

    match statement {
        Statement::Query(query) => classify_select(&query),
        Statement::Insert(insert) => classify_insert(&insert),
        Statement::Update { table, assignments, from, selection, .. } => {
            classify_update(&table, &assignments, from.as_ref(), selection.as_ref())
        }
        Statement::Delete(delete) => classify_delete(&delete),
        other => Err(GateError::Parse(format!("unsupported statement type: {other}"))),
    }
}

fn classify_select(query: &Query) -> Result<StatementClassification, GateError> {
    let mut refs = Reference::default();
    walk_set_expr(&query.body, &mut refs);

    let tables = refs.tables.clone();
    let mut table_requirements = BTreeMap::new();
    let mut column_requirements = BTreeMap::new();

    table_requirements.insert(Privilege::Select, tables.clone());
    let cols = resolve_columns(&refs);
    column_requirements.insert(Privilege::Select, cols);

    Ok(StatementClassification {
        operation: SqlOperation::Select,
        tables,
        table_requirements,
        column_requirements,
    })
}

fn classify_insert(insert: &sqlparser::ast::Insert) -> Result<StatementClassification, GateError> {
    let target = insert.table_name.to_string();
    let target_columns: BTreeSet<String> = insert.columns.iter().map(|c| c.value.clone()).collect();

    let mut tables = BTreeSet::new();
    tables.insert(target.clone());

    let mut refs = Reference::default();
    if let Some(source) = &insert.source {
        walk_set_expr(&source.body, &mut refs);
    }
    tables.extend(refs.tables.iter().cloned());

    let mut table_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    table_requirements.entry(Privilege::Insert).or_default().insert(target.clone());
    for t in refs.tables.iter().filter(|t| **t != target) {
        table_requirements.entry(Privilege::Select).or_default().insert(t.clone());
    }

    let mut column_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    for c in &target_columns {
        column_requirements.entry(Privilege::Insert).or_default().insert(c.clone());
    }
    for c in resolve_columns(&refs) {
        if !target_columns.contains(&c) {
            column_requirements.entry(Privilege::Select).or_default().insert(c);
        }
    }

    Ok(StatementClassification {
        operation: SqlOperation::Insert,
        tables,
        table_requirements,
        column_requirements,
    })
}

fn classify_update(
    table: &TableWithJoins,
    assignments: &[sqlparser::ast::Assignment],
    from: Option<&TableWithJoins>,
    selection: Option<&Expr>,
) -> Result<StatementClassification, GateError> {
    let target = table_factor_name(&table.relation).ok_or_else(|| GateError::Parse("UPDATE target table not found".to_string()))?;

    let mut tables = BTreeSet::new();
    tables.insert(target.clone());

    let mut other_refs = Reference::default();
    if let Some(extra) = from {
        walk_table_with_joins(extra, &mut other_refs);
    }
    tables.extend(other_refs.tables.iter().cloned());

    // `Assignment` implements `Display` as `col = expr`; parsing that text
    // is more resilient to upstream field renames than destructuring it.
    let modified_columns: BTreeSet<String> = assignments
        .iter()
        .filter_map(|a| a.to_string().split('=').next().map(|s| s.trim().to_string()))
        .collect();

    let mut condition_refs = Reference::default();
    if let Some(expr) = selection {
        collect_columns_from_expr(expr, &mut condition_refs.columns);
    }

    let mut table_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    table_requirements.entry(Privilege::Update).or_default().insert(target.clone());
    for t in other_refs.tables.iter() {
        table_requirements.entry(Privilege::Select).or_default().insert(t.clone());
    }

    let mut column_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    for c in &modified_columns {
        column_requirements.entry(Privilege::Update).or_default().insert(c.clone());
    }
    for c in resolve_columns(&condition_refs) {
        column_requirements.entry(Privilege::Select).or_default().insert(c);
    }

    Ok(StatementClassification {
        operation: SqlOperation::Update,
        tables,
        table_requirements,
        column_requirements,
    })
}

fn classify_delete(delete: &sqlparser::ast::Delete) -> Result<StatementClassification, GateError> {
    let from_tables = match &delete.from {
        FromTable::WithFromKeyword(t) | FromTable::WithoutKeyword(t) => t,
    };
    let target = from_tables
        .first()
        .and_then(|t| table_factor_name(&t.relation))
        .ok_or_else(|| GateError::Parse("DELETE target table not found".to_string()))?;

    let mut tables = BTreeSet::new();
    tables.insert(target.clone());

    let mut other_refs = Reference::default();
    for t in from_tables.iter().skip(1) {
        walk_table_with_joins(t, &mut other_refs);
    }
    if let Some(using) = &delete.using {
        for t in using {
            walk_table_with_joins(t, &mut other_refs);
        }
    }
    tables.extend(other_refs.tables.iter().cloned());

    let mut condition_refs = Reference::default();
    if let Some(expr) = &delete.selection {
        collect_columns_from_expr(expr, &mut condition_refs.columns);
    }

    let mut table_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    table_requirements.entry(Privilege::Delete).or_default().insert(target.clone());
    for t in other_refs.tables.iter() {
        table_requirements.entry(Privilege::Select).or_default().insert(t.clone());
    }

    let mut column_requirements: BTreeMap<Privilege, BTreeSet<String>> = BTreeMap::new();
    for c in resolve_columns(&condition_refs) {
        column_requirements.entry(Privilege::Select).or_default().insert(c);
    }

    Ok(StatementClassification {
        operation: SqlOperation::Delete,
        tables,
        table_requirements,
        column_requirements,
    })
}

fn walk_set_expr(set_expr: &SetExpr, refs: &mut Reference) {
    match set_expr {
        SetExpr::Select(select) => walk_select(select, refs),
        SetExpr::Query(query) => walk_set_expr(&query.body, refs),
        SetExpr::SetOperation { left, right, .. } => {
            walk_set_expr(left, refs);
            walk_set_expr(right, refs);
        }
        _ => {}
    }
}

fn walk_select(select: &Select, refs: &mut Reference) {
    for twj in &select.from {
        walk_table_with_joins(twj, refs);
    }
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(e) | SelectItem::ExprWithAlias { expr: e, .. } => {
                collect_columns_from_expr(e, &mut refs.columns);
            }
            _ => {}
        }
    }
    if let Some(expr) = &select.selection {
        collect_columns_from_expr(expr, &mut refs.columns);
    }
}

fn walk_table_with_joins(twj: &TableWithJoins, refs: &mut Reference) {
    register_table_factor(&twj.relation, refs);
    for join in &twj.joins {
        let Join { relation, .. } = join;
        register_table_factor(relation, refs);
    }
}

fn register_table_factor(tf: &TableFactor, refs: &mut Reference) {
    if let TableFactor::Table { name, alias, .. } = tf {
        let table_name = name.to_string();
        if let Some(alias) = alias {
            refs.aliases.insert(alias.name.value.clone(), table_name.clone());
        }
        refs.tables.insert(table_name);
    }
}

fn table_factor_name(tf: &TableFactor) -> Option<String> {
    match tf {
        TableFactor::Table { name, .. } => Some(name.to_string()),
        _ => None,
    }
}

fn collect_columns_from_expr(expr: &Expr, out: &mut Vec<(Option<String>, String)>) {
    match expr {
        Expr::Identifier(ident) => out.push((None, ident.value.clone())),
        Expr::CompoundIdentifier(parts) if parts.len() >= 2 => {
            let column = parts.last().unwrap().value.clone();
            let qualifier = parts[parts.len() - 2].value.clone();
            out.push((Some(qualifier), column));
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_columns_from_expr(left, out);
            collect_columns_from_expr(right, out);
        }
        Expr::UnaryOp { expr, .. } | Expr::Nested(expr) | Expr::IsNull(expr) | Expr::IsNotNull(expr) | Expr::Cast { expr, .. } => {
            collect_columns_from_expr(expr, out);
        }
        Expr::Between { expr, low, high, .. } => {
            collect_columns_from_expr(expr, out);
            collect_columns_from_expr(low, out);
            collect_columns_from_expr(high, out);
        }
        Expr::InList { expr, list, .. } => {
            collect_columns_from_expr(expr, out);
            for item in list {
                collect_columns_from_expr(item, out);
            }
        }
        Expr::Function(func) => {
            if let sqlparser::ast::FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let sqlparser::ast::FunctionArgExpr::Expr(e) = arg_expr(arg) {
                        collect_columns_from_expr(e, out);
                    }
                }
            }
        }
        Expr::Case { operand, conditions, results, else_result, .. } => {
            if let Some(e) = operand {
                collect_columns_from_expr(e, out);
            }
            for e in conditions {
                collect_columns_from_expr(e, out);
            }
            for e in results {
                collect_columns_from_expr(e, out);
            }
            if let Some(e) = else_result {
                collect_columns_from_expr(e, out);
            }
        }
        Expr::Subquery(query) | Expr::Exists { subquery: query, .. } => {
            let mut inner = Reference::default();
            walk_set_expr(&query.body, &mut inner);
            out.extend(inner.columns);
        }
        _ => {}
    }
}

fn arg_expr(arg: &sqlparser::ast::FunctionArg) -> &sqlparser::ast::FunctionArgExpr {
    match arg {
        sqlparser::ast::FunctionArg::Named { arg, .. } => arg,
        sqlparser::ast::FunctionArg::Unnamed(arg) => arg,
    }
}

/// Render `(qualifier, column)` references into `"table.column"` (resolving
/// aliases) or bare `"column"` when unqualified.
fn resolve_columns(refs: &Reference) -> BTreeSet<String> {
    refs.columns
        .iter()
        .map(|(qualifier, column)| match qualifier {
            Some(q) => {
                let table = refs.aliases.get(q).cloned().unwrap_or_else(|| q.clone());
                format!("{table}.{column}")
            }
            None => column.clone(),
        })
        .collect()
}
