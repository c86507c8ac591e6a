//! PostgreSQL adapter (spec §4.1).
//!
//! Session semantics: `execute_query` outside an explicit transaction opens
//! a transient connection, runs the statement, and resolves it
//! (`rollback` if `readonly`, `commit` otherwise) before returning — the
//! "implicit session" of spec §4.1/§5. `begin` promotes the session to an
//! explicit transaction that only `commit`/`rollback` (or a subsequent
//! `begin`, which first releases the current one) can end.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Row as SqlxRow, TypeInfo};
use tokio::sync::RwLock;

use crate::core::errors::DbError;
use crate::db::adapter::{DatabaseAdapter, QueryOutcome, Row};
use crate::db::config::DbConfig;
use crate::db::privilege::{ObjectKind, Privilege, UserPrivilege};
use crate::db::schema::{ColumnInfo, DatabaseSchema, ForeignKeyInfo, IndexInfo, TableSchema, TopLevelObjects};

pub struct PostgresAdapter {
    config: DbConfig,
    pool: RwLock<Option<sqlx::PgPool>>,
    tx: tokio::sync::Mutex<Option<sqlx::Transaction<'static, sqlx::Postgres>>>,
}

impl PostgresAdapter {
    pub fn new(config: DbConfig) -> Self {
        Self {
            config,
            pool: RwLock::new(None),
            tx: tokio::sync::Mutex::new(None),
        }
    }

    async fn pool(&self) -> Result<sqlx::PgPool, DbError> {
        self.pool
            .read()
            .await
            .clone()
            .ok_or_else(|| DbError::Connection("adapter is not connected".to_string()))
    }

    /// Resolve (rollback if readonly, commit otherwise) and drop an
    /// implicit-session transaction.
    async fn release_implicit(&self, mut tx: sqlx::Transaction<'static, sqlx::Postgres>) -> Result<(), DbError> {
        if self.config.readonly {
            tx.rollback().await?;
        } else {
            tx.commit().await?;
        }
        Ok(())
    }

    fn row_from_pg(pg_row: &PgRow) -> Row {
        let mut columns = Vec::with_capacity(pg_row.len());
        for (i, col) in pg_row.columns().iter().enumerate() {
            let value = decode_as_text(pg_row, i, col.type_info().name());
            columns.push((col.name().to_string(), value));
        }
        Row { columns }
    }
}

/// Best-effort stringification of a column value, cascading through the
/// common scalar types rather than depending on an exact Postgres type-name
/// match (which the wire protocol can spell in more than one way).
fn decode_as_text(row: &PgRow, idx: usize, type_name: &str) -> String {
    if let Ok(Some(v)) = row.try_get::<Option<String>, _>(idx) {
        return v;
    }
    if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<Option<i32>, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(idx) {
        return v.to_string();
    }
    if let Ok(Some(v)) = row.try_get::<Option<chrono::NaiveDate>, _>(idx) {
        return v.to_string();
    }
    if let Ok(None) = row.try_get::<Option<String>, _>(idx) {
        return "NULL".to_string();
    }
    format!("<unsupported:{type_name}>")
}

fn is_row_producing(sql: &str) -> bool {
    let trimmed = sql.trim_start();
    let upper: String = trimmed.chars().take(16).collect::<String>().to_ascii_uppercase();
    upper.starts_with("SELECT") || upper.starts_with("WITH") || upper.starts_with("SHOW") || upper.starts_with("EXPLAIN")
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    async fn connect(&self) -> Result<(), DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&self.config.connection_url())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        *self.pool.write().await = Some(pool);
        tracing::info!(host = %self.config.host, database = %self.config.database, "connected to database");
        Ok(())
    }

    async fn close(&self) -> Result<(), DbError> {
        if let Some(tx) = self.tx.lock().await.take() {
            self.release_implicit(tx).await?;
        }
        if let Some(pool) = self.pool.write().await.take() {
            pool.close().await;
        }
        Ok(())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryOutcome, DbError> {
        let mut guard = self.tx.lock().await;

        if let Some(tx) = guard.as_mut() {
            return run_statement(&mut **tx, sql).await;
        }

        drop(guard);

        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        let result = run_statement(&mut *tx, sql).await;

        match result {
            Ok(outcome) => {
                self.release_implicit(tx).await?;
                Ok(outcome)
            }
            Err(e) => {
                let _ = tx.rollback().await;
                Err(e)
            }
        }
    }

    async fn begin(&self) -> Result<(), DbError> {
        let mut guard = self.tx.lock().await;
        if let Some(previous) = guard.take() {
            self.release_implicit(previous).await?;
        }
        let pool = self.pool().await?;
        let tx = pool.begin().await?;
        *guard = Some(tx);
        Ok(())
    }

    async fn commit(&self) -> Result<(), DbError> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or(DbError::NoActiveTransaction("commit"))?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DbError> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or(DbError::NoActiveTransaction("rollback"))?;
        tx.rollback().await?;
        Ok(())
    }

    async fn get_user_privileges(&self) -> Result<UserPrivilege, DbError> {
        let pool = self.pool().await?;

        let current_user: String = sqlx::query_scalar("SELECT current_user")
            .fetch_one(&pool)
            .await?;

        #[derive(sqlx::FromRow)]
        struct PrivRow {
            object_type: String,
            privilege_type: String,
            table_with_schema: String,
            column_name: Option<String>,
        }

        let rows: Vec<PrivRow> = sqlx::query_as(
            r#"
            SELECT
                object_type,
                privilege_type,
                table_schema || '.' || table_name AS table_with_schema,
                column_name
            FROM (
                SELECT 'TABLE'::text AS object_type, privilege_type, table_schema, table_name, NULL::text AS column_name
                FROM information_schema.role_table_grants
                WHERE grantee = $1
                UNION ALL
                SELECT 'COLUMN'::text AS object_type, privilege_type, table_schema, table_name, column_name
                FROM information_schema.column_privileges
                WHERE grantee = $1
            ) all_perms
            "#,
        )
        .bind(&current_user)
        .fetch_all(&pool)
        .await?;

        let mut privilege = UserPrivilege::new();
        // Table-level grants first so column shadowing (spec §3) applies
        // regardless of the order Postgres happens to return rows in.
        for row in rows.iter().filter(|r| r.object_type == "TABLE") {
            if let Ok(p) = row.privilege_type.parse::<Privilege>() {
                privilege.grant(p, ObjectKind::Table, &row.table_with_schema);
            }
        }
        for row in rows.iter().filter(|r| r.object_type == "COLUMN") {
            if let (Ok(p), Some(col)) = (row.privilege_type.parse::<Privilege>(), &row.column_name) {
                let qualified = format!("{}.{}", row.table_with_schema, col);
                privilege.grant(p, ObjectKind::Column, &qualified);
            }
        }

        Ok(privilege)
    }

    async fn get_top_level_objects(&self) -> Result<TopLevelObjects, DbError> {
        let pool = self.pool().await?;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public' AND table_type = 'BASE TABLE'",
        )
        .fetch_all(&pool)
        .await?;

        let views: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.views WHERE table_schema = 'public'",
        )
        .fetch_all(&pool)
        .await?;

        Ok(TopLevelObjects {
            tables: tables.into_iter().map(|(n,)| n).collect(),
            views: views.into_iter().map(|(n,)| n).collect(),
        })
    }

    async fn get_table_details(&self, name: &str) -> Result<TableSchema, DbError> {
        let pool = self.pool().await?;
        table_schema_for(&pool, name).await
    }

    async fn get_database_schema(&self) -> Result<DatabaseSchema, DbError> {
        let pool = self.pool().await?;
        let objects = self.get_top_level_objects().await?;

        let mut schema = DatabaseSchema::new();
        for name in objects.tables.into_iter().chain(objects.views.into_iter()) {
            let table = table_schema_for(&pool, &name).await?;
            schema.insert(name, table);
        }
        Ok(schema)
    }
}

async fn table_schema_for(pool: &sqlx::PgPool, name: &str) -> Result<TableSchema, DbError> {
    let exists: Option<(String,)> = sqlx::query_as(
        "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public' AND table_name = $1
         UNION
         SELECT table_name FROM information_schema.views WHERE table_schema = 'public' AND table_name = $1",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if exists.is_none() {
        return Err(DbError::NotFound {
            kind: "TABLE",
            name: name.to_string(),
        });
    }

    #[derive(sqlx::FromRow)]
    struct ColRow {
        column_name: String,
        data_type: String,
        is_nullable: String,
    }

    let cols: Vec<ColRow> = sqlx::query_as(
        "SELECT column_name, data_type, is_nullable FROM information_schema.columns
         WHERE table_schema = 'public' AND table_name = $1 ORDER BY ordinal_position",
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    let columns = cols
        .into_iter()
        .map(|c| ColumnInfo {
            name: c.column_name,
            type_name: c.data_type,
            nullable: c.is_nullable == "YES",
        })
        .collect();

    let primary_key: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT kcu.column_name
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
        WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public' AND tc.table_name = $1
        ORDER BY kcu.ordinal_position
        "#,
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    #[derive(sqlx::FromRow)]
    struct FkRow {
        local_column: String,
        remote_table: String,
        remote_column: String,
    }

    let foreign_keys: Vec<FkRow> = sqlx::query_as(
        r#"
        SELECT
            kcu.column_name AS local_column,
            ccu.table_name AS remote_table,
            ccu.column_name AS remote_column
        FROM information_schema.table_constraints tc
        JOIN information_schema.key_column_usage kcu
          ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
        JOIN information_schema.constraint_column_usage ccu
          ON tc.constraint_name = ccu.constraint_name AND tc.table_schema = ccu.table_schema
        WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public' AND tc.table_name = $1
        "#,
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    #[derive(sqlx::FromRow)]
    struct IdxRow {
        indexname: String,
        column_name: String,
        is_unique: bool,
    }

    let idx_rows: Vec<IdxRow> = sqlx::query_as(
        r#"
        SELECT i.relname AS indexname, a.attname AS column_name, ix.indisunique AS is_unique
        FROM pg_class t
        JOIN pg_index ix ON t.oid = ix.indrelid
        JOIN pg_class i ON i.oid = ix.indexrelid
        JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
        WHERE t.relname = $1
        "#,
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    let mut indexes_by_name: BTreeMap<String, IndexInfo> = BTreeMap::new();
    for row in idx_rows {
        let entry = indexes_by_name.entry(row.indexname.clone()).or_insert_with(|| IndexInfo {
            name: row.indexname.clone(),
            columns: Vec::new(),
            unique: row.is_unique,
        });
        entry.columns.push(row.column_name);
    }

    Ok(TableSchema {
        name: name.to_string(),
        columns,
        primary_key: primary_key.into_iter().map(|(c,)| c).collect(),
        foreign_keys: foreign_keys
            .into_iter()
            .map(|fk| ForeignKeyInfo {
                local_column: fk.local_column,
                remote_table: fk.remote_table,
                remote_column: fk.remote_column,
            })
            .collect(),
        indexes: indexes_by_name.into_values().collect(),
    })
}

async fn run_statement<'c, E>(executor: E, sql: &str) -> Result<QueryOutcome, DbError>
where
    E: sqlx::Executor<'c, Database = sqlx::Postgres>,
{
    if is_row_producing(sql) {
        let rows = sqlx::query(sql).fetch_all(executor).await?;
        Ok(QueryOutcome::Rows(rows.iter().map(PostgresAdapter::row_from_pg).collect()))
    } else {
        let result = sqlx::query(sql).execute(executor).await?;
        Ok(QueryOutcome::RowsAffected(result.rows_affected()))
    }
}
