//! Domain error types
//!
//! One enum per concern, matching the taxonomy the gateway is specified
//! against: configuration, ACL parsing, database access, and statement
//! gating each fail in their own recognizable way so a caller can decide
//! whether to retry.

use thiserror::Error;

/// Errors raised while building or validating a `DBConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required connection field: {0}")]
    MissingField(&'static str),

    #[error("invalid DSN: {0}")]
    InvalidDsn(String),

    #[error("unsupported database type: {0}")]
    UnsupportedDbType(String),
}

/// Errors raised while parsing a tool ACL or object ACL.
#[derive(Debug, Error)]
pub enum AclError {
    #[error("failed to read ACL file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in object ACL: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("unsupported object type: {0}")]
    UnsupportedObjectType(String),

    #[error("{0}")]
    Malformed(String),
}

/// Errors raised by the database adapter (C1).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("failed to connect to database: {0}")]
    Connection(String),

    #[error("database engine error: {0}")]
    Engine(String),

    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("no active transaction to {0}")]
    NoActiveTransaction(&'static str),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Engine(err.to_string())
    }
}

/// Errors raised while classifying a statement or gating its execution (C3/C4).
#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to parse SQL statement: {0}")]
    Parse(String),

    #[error("statement requires privileges the current user does not hold")]
    Privilege,

    #[error("statement violates the configured access control list")]
    AclDenied,

    #[error("tool invoked with an operation that does not match the SQL statement")]
    OperationMismatch,
}

/// Error surfaced to the caller of a tool invocation.
///
/// This is the union of everything a tool handler can fail with once the
/// server has started; it is never allowed to terminate the process (see
/// `ConfigError`/connection failure/`AclError` at startup, which do).
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("{0}")]
    Other(String),
}

impl ToolError {
    /// Render as the single-line, category-tagged text the transport sends
    /// back to the caller (spec §6, "Error response format").
    pub fn to_response_line(&self) -> String {
        match self {
            ToolError::Gate(GateError::Parse(msg)) => format!("parse: {msg}"),
            ToolError::Gate(GateError::Privilege) => {
                "privilege: statement exceeds user privilege".to_string()
            }
            ToolError::Gate(GateError::AclDenied) => {
                "ACL: statement violates configured access control list".to_string()
            }
            ToolError::Gate(GateError::OperationMismatch) => {
                "tool/operation mismatch: statement does not match the invoked tool's operation"
                    .to_string()
            }
            ToolError::Db(DbError::NotFound { kind, name }) => {
                format!("not_found: {kind} '{name}' not found")
            }
            ToolError::Db(DbError::NoActiveTransaction(op)) => {
                format!("transaction: no active transaction to {op}")
            }
            ToolError::Db(DbError::Connection(msg)) => format!("engine: {msg}"),
            ToolError::Db(DbError::Engine(msg)) => format!("engine: {msg}"),
            ToolError::Other(msg) => format!("error: {msg}"),
        }
    }
}
