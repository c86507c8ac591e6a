//! ACL model and parsing (spec §4.2, C2).

pub mod evaluate;
pub mod parser;
pub mod types;

pub use evaluate::{columns_allowed, table_allowed};
pub use parser::AclParser;
pub use types::{AclContent, ObjectAcl, ToolAcl};
