//! The database adapter contract (spec §4.1, C1).
//!
//! A language-neutral rendering of the source's duck-typed adapter
//! hierarchy (spec §9): one capability trait, one registry keyed by engine
//! name, selected once at startup. `begin`/`commit`/`rollback` govern the
//! single explicit transaction a session may hold; every other statement
//! runs inside a transient "implicit session" whose disposition
//! (`rollback` vs `commit`) is decided by `DbConfig::readonly`.

use async_trait::async_trait;

use crate::core::errors::DbError;
use crate::db::privilege::UserPrivilege;
use crate::db::schema::{DatabaseSchema, TableSchema, TopLevelObjects};

/// The result of executing one statement: either an ordered sequence of
/// rows (row-producing query) or the affected-row count (DML).
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    RowsAffected(u64),
}

/// A single result row, represented as ordered `(column_name, text)` pairs.
/// The gateway never interprets row contents beyond formatting them back to
/// the caller, so a textual representation is sufficient and engine-agnostic.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub columns: Vec<(String, String)>,
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .columns
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({rendered})")
    }
}

#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Establish a pool and verify it with a trivial round-trip.
    async fn connect(&self) -> Result<(), DbError>;

    /// Release any current session (rollback if readonly, commit
    /// otherwise), then dispose of the pool.
    async fn close(&self) -> Result<(), DbError>;

    /// Execute exactly one statement. Outside an explicit transaction this
    /// opens a transient implicit session and resolves it per
    /// `DbConfig::readonly` before returning.
    async fn execute_query(&self, sql: &str) -> Result<QueryOutcome, DbError>;

    /// Release any pending implicit session, open a new one, and begin an
    /// explicit transaction. A second `begin` first releases the first
    /// (rollback-on-readonly, commit-otherwise) rather than nesting.
    async fn begin(&self) -> Result<(), DbError>;

    /// Commit the active explicit transaction. Fails if none is active.
    async fn commit(&self) -> Result<(), DbError>;

    /// Roll back the active explicit transaction. Fails if none is active.
    async fn rollback(&self) -> Result<(), DbError>;

    /// The connected identity's effective privileges, normalized per spec §3.
    async fn get_user_privileges(&self) -> Result<UserPrivilege, DbError>;

    async fn get_top_level_objects(&self) -> Result<TopLevelObjects, DbError>;

    /// Fails with `DbError::NotFound` if the object does not exist.
    async fn get_table_details(&self, name: &str) -> Result<TableSchema, DbError>;

    /// Full schema with views unified into tables.
    async fn get_database_schema(&self) -> Result<DatabaseSchema, DbError>;
}
