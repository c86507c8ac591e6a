//! CLI surface and optional file-based configuration layer (spec §6,
//! SPEC_FULL §A). CLI flags take precedence over a TOML config file's
//! values; a TOML file is entirely optional.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::core::errors::ConfigError;

#[derive(Parser, Debug)]
#[command(name = "db-gateway")]
#[command(author, version, about = "Database mediation gateway exposing a constrained, ACL-checked tool surface", long_about = None)]
pub struct Cli {
    /// Optional TOML config file; CLI flags override values it sets.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Transport to serve on. Only stdio is implemented; other values are
    /// accepted for compatibility but rejected at startup.
    #[arg(long, default_value = "stdio")]
    pub transport: String,

    /// DSN for database connection. Overrides the discrete connection
    /// flags (--usr/--pwd/--host/--port/--db/--type) when present.
    #[arg(long)]
    pub dsn: Option<String>,

    #[arg(long = "usr")]
    pub user: Option<String>,
    #[arg(long = "pwd")]
    pub password: Option<String>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<String>,
    #[arg(long = "db")]
    pub database: Option<String>,
    #[arg(long = "type", default_value = "postgresql")]
    pub db_type: String,

    /// Always commit implicit sessions instead of rolling them back.
    #[arg(long, default_value_t = false)]
    pub persist: bool,

    /// Disable privilege annotations in schema/object output.
    #[arg(long, default_value_t = false)]
    pub disable_tool_priv: bool,

    /// Disable fine-grained execution tools; expose only `execute`.
    #[arg(long, default_value_t = false)]
    pub disable_fine_gran_tool: bool,

    /// Disable transaction management tools.
    #[arg(long, default_value_t = false)]
    pub disable_trans: bool,

    /// Adaptive schema disclosure threshold (total column count).
    #[arg(long, default_value_t = 200)]
    pub n: usize,

    /// Whitelist of accessible database objects (JSON, or a path to a file
    /// containing it).
    #[arg(long)]
    pub wo: Option<String>,
    /// Blacklist of forbidden database objects.
    #[arg(long)]
    pub bo: Option<String>,
    /// Whitelist of permitted tool operations (comma-separated).
    #[arg(long)]
    pub wt: Option<String>,
    /// Blacklist of forbidden tool operations (comma-separated).
    #[arg(long)]
    pub bt: Option<String>,

    /// Path to a semantic model used by value-search. When absent,
    /// `search_relative_column_values` is not registered.
    #[arg(long)]
    pub mp: Option<String>,
}

impl Cli {
    /// Load the optional TOML file (if `--config` names one) and apply it
    /// under whatever the CLI flags already specified, then validate that
    /// either a DSN or every discrete connection field is present.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        if let Some(path) = self.config.clone() {
            let file_config = FileConfig::load(&path)?;
            self.apply_file_config(file_config);
        }

        if self.dsn.is_none() {
            for (name, value) in [
                ("usr", &self.user),
                ("pwd", &self.password),
                ("host", &self.host),
                ("port", &self.port),
                ("db", &self.database),
            ] {
                if value.is_none() {
                    return Err(ConfigError::MissingField(name));
                }
            }
        }

        Ok(self)
    }

    fn apply_file_config(&mut self, file: FileConfig) {
        if let Some(db) = file.database {
            self.dsn = self.dsn.clone().or(db.dsn);
            self.user = self.user.clone().or(db.user);
            self.password = self.password.clone().or(db.password);
            self.host = self.host.clone().or(db.host);
            self.port = self.port.clone().or(db.port);
            self.database = self.database.clone().or(db.name);
            if let Some(db_type) = db.db_type {
                self.db_type = db_type;
            }
        }
        if let Some(security) = file.security {
            self.wo = self.wo.clone().or(security.whitelist_objects);
            self.bo = self.bo.clone().or(security.blacklist_objects);
            self.wt = self.wt.clone().or(security.whitelist_tools);
            self.bt = self.bt.clone().or(security.blacklist_tools);
        }
        if let Some(server) = file.server {
            if let Some(n) = server.adaptive_schema_threshold {
                self.n = n;
            }
            if let Some(p) = server.persist {
                self.persist = p;
            }
        }
    }
}

/// Shape of the optional TOML config file, mirroring the teacher's nested,
/// per-section `Default`-backed layout.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub database: Option<FileDatabaseConfig>,
    pub security: Option<FileSecurityConfig>,
    pub server: Option<FileServerConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileDatabaseConfig {
    pub dsn: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub db_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSecurityConfig {
    pub whitelist_objects: Option<String>,
    pub blacklist_objects: Option<String>,
    pub whitelist_tools: Option<String>,
    pub blacklist_tools: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileServerConfig {
    pub adaptive_schema_threshold: Option<usize>,
    pub persist: Option<bool>,
}

impl FileConfig {
    fn load(path: &PathBuf) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::InvalidDsn(format!("failed to read config file '{}': {e}", path.display())))?;
        toml::from_str(&text).map_err(|e| ConfigError::InvalidDsn(format!("invalid config file '{}': {e}", path.display())))
    }
}
