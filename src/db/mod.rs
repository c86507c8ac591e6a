//! Database adapter contract, configuration, schema types, and the
//! concrete Postgres implementation (spec §3/§4.1, C1).

pub mod adapter;
pub mod config;
pub mod postgres;
pub mod privilege;
pub mod registry;
pub mod schema;

pub use adapter::{DatabaseAdapter, QueryOutcome, Row};
pub use config::{DbConfig, DbKind};
pub use privilege::{ObjectKind, Privilege, UserPrivilege};
pub use registry::build_adapter;
pub use schema::{ColumnInfo, DatabaseSchema, ForeignKeyInfo, IndexInfo, TableSchema, TopLevelObjects};
