//! Whitelist/blacklist precedence (spec §4.2): a non-empty whitelist for an
//! object type wins outright; the blacklist only applies when the
//! whitelist is empty. Grounded on
//! `original_source/.../tools/sql_checker.py::check_object_acl` and
//! `tools/context_tools/schema.py::filter_single`/`filter_columns`.

use crate::acl::types::{AclContent, ObjectAcl};

/// Whether `table` may be accessed at all, ignoring columns.
pub fn table_allowed(white: &ObjectAcl, black: &ObjectAcl, table: &str) -> bool {
    if !white.is_empty() {
        return white.contains_table(table);
    }
    if !black.is_empty() {
        return match &black.tables {
            AclContent::List(names) => !names.iter().any(|t| t == table),
            // Dict-form blacklists are column-granular only; they never
            // deny a whole table.
            AclContent::Columns(_) | AclContent::Empty => true,
        };
    }
    true
}

/// Whether every column in `columns` may be accessed on `table`, assuming
/// the table itself is already known to be allowed.
pub fn columns_allowed(white: &ObjectAcl, black: &ObjectAcl, table: &str, columns: &[String]) -> bool {
    if !white.is_empty() {
        if let Some(allowed) = white.columns_for_table(table) {
            return columns.iter().all(|c| allowed.iter().any(|a| a.eq_ignore_ascii_case(c)));
        }
        return true;
    }
    if !black.is_empty() {
        if let Some(blocked) = black.columns_for_table(table) {
            return !columns.iter().any(|c| blocked.iter().any(|b| b.eq_ignore_ascii_case(c)));
        }
        return true;
    }
    true
}
