//! Adapter registry (spec §4.1, "Adapter registry").
//!
//! The source decorates each concrete adapter class with its `db_type` key;
//! Rust has no import-time side effects to hang that on, so the registry is
//! a plain match over [`DbKind`] instead of a runtime `HashMap`. The shape
//! — select once at startup, forbid dynamic swap — is the same.

use std::sync::Arc;

use crate::db::adapter::DatabaseAdapter;
use crate::db::config::{DbConfig, DbKind};
use crate::db::postgres::PostgresAdapter;

pub fn build_adapter(config: DbConfig) -> Arc<dyn DatabaseAdapter> {
    match config.kind {
        DbKind::Postgres => Arc::new(PostgresAdapter::new(config)),
    }
}
