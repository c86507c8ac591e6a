//! Shared test fixtures: an in-memory `DatabaseAdapter` standing in for a
//! live Postgres connection, since integration tests run with no database
//! available. Tracks its own explicit-transaction state the same way
//! `PostgresAdapter` does, so tests exercising `begin`/`commit`/`rollback`
//! through the tool layer see realistic behavior.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use db_gateway::core::errors::DbError;
use db_gateway::db::{DatabaseAdapter, DatabaseSchema, QueryOutcome, Row, TableSchema, TopLevelObjects, UserPrivilege};

/// Records how many times each lifecycle method was invoked, and what
/// statements were sent to `execute_query`, so tests can assert on gateway
/// behavior without a real SQL engine underneath.
#[derive(Default)]
pub struct MockAdapter {
    pub schema: Mutex<DatabaseSchema>,
    pub user_privilege: Mutex<UserPrivilege>,
    /// Mirrors `DbConfig::readonly` in `PostgresAdapter`: governs whether an
    /// *implicit* session's statements persist. Explicit transactions are
    /// unaffected by this, matching `commit`/`rollback` in
    /// `src/db/postgres.rs`, which never consult it.
    pub readonly: bool,
    has_explicit_tx: AtomicBool,
    pub begin_count: AtomicU64,
    pub commit_count: AtomicU64,
    pub rollback_count: AtomicU64,
    pub executed: Mutex<Vec<String>>,
    /// Statements run inside the current explicit transaction, held until
    /// `commit` moves them into `committed` or `rollback` discards them.
    pending_tx: Mutex<Vec<String>>,
    /// Statements that actually persisted: implicit-session writes issued
    /// while `readonly` is false, or explicit-transaction writes once
    /// `commit` has been called. Used to distinguish "ran" from "kept".
    pub committed: Mutex<Vec<String>>,
}

impl MockAdapter {
    pub fn new(schema: DatabaseSchema, user_privilege: UserPrivilege) -> Self {
        Self {
            schema: Mutex::new(schema),
            user_privilege: Mutex::new(user_privilege),
            ..Default::default()
        }
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

#[async_trait]
impl DatabaseAdapter for MockAdapter {
    async fn connect(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), DbError> {
        Ok(())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryOutcome, DbError> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.has_explicit_tx.load(Ordering::SeqCst) {
            self.pending_tx.lock().unwrap().push(sql.to_string());
        } else if !self.readonly {
            self.committed.lock().unwrap().push(sql.to_string());
        }
        if sql.trim_start().to_ascii_uppercase().starts_with("SELECT") {
            Ok(QueryOutcome::Rows(vec![Row {
                columns: vec![("id".to_string(), "1".to_string())],
            }]))
        } else {
            Ok(QueryOutcome::RowsAffected(1))
        }
    }

    async fn begin(&self) -> Result<(), DbError> {
        self.has_explicit_tx.store(true, Ordering::SeqCst);
        self.begin_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        if !self.has_explicit_tx.swap(false, Ordering::SeqCst) {
            return Err(DbError::NoActiveTransaction("commit"));
        }
        self.commit_count.fetch_add(1, Ordering::SeqCst);
        let mut pending = self.pending_tx.lock().unwrap();
        self.committed.lock().unwrap().extend(pending.drain(..));
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        if !self.has_explicit_tx.swap(false, Ordering::SeqCst) {
            return Err(DbError::NoActiveTransaction("rollback"));
        }
        self.rollback_count.fetch_add(1, Ordering::SeqCst);
        self.pending_tx.lock().unwrap().clear();
        Ok(())
    }

    async fn get_user_privileges(&self) -> Result<UserPrivilege, DbError> {
        Ok(self.user_privilege.lock().unwrap().clone())
    }

    async fn get_top_level_objects(&self) -> Result<TopLevelObjects, DbError> {
        let schema = self.schema.lock().unwrap();
        Ok(TopLevelObjects {
            tables: schema.keys().cloned().collect(),
            views: Vec::new(),
        })
    }

    async fn get_table_details(&self, name: &str) -> Result<TableSchema, DbError> {
        self.schema
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::NotFound { kind: "table", name: name.to_string() })
    }

    async fn get_database_schema(&self) -> Result<DatabaseSchema, DbError> {
        Ok(self.schema.lock().unwrap().clone())
    }
}

pub fn column(name: &str, type_name: &str, nullable: bool) -> db_gateway::db::ColumnInfo {
    db_gateway::db::ColumnInfo {
        name: name.to_string(),
        type_name: type_name.to_string(),
        nullable,
    }
}

pub fn table(name: &str, columns: Vec<db_gateway::db::ColumnInfo>) -> TableSchema {
    TableSchema {
        name: name.to_string(),
        columns,
        primary_key: Vec::new(),
        foreign_keys: Vec::new(),
        indexes: Vec::new(),
    }
}
