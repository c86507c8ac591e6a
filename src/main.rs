use std::sync::Arc;

use clap::Parser;
use db_gateway::acl::AclParser;
use db_gateway::config::Cli;
use db_gateway::core::{GatewayContext, GatewayFlags};
use db_gateway::db::{build_adapter, DbConfig, DbKind};
use db_gateway::tools::{build_tool_surface, value_search::ValueSearchBackend};
use db_gateway::transport;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = match Cli::parse().resolve() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("config: {e}");
            std::process::exit(1);
        }
    };

    init_logging(cli.verbose);

    if cli.transport != "stdio" {
        tracing::error!(transport = %cli.transport, "unsupported transport");
        std::process::exit(1);
    }

    let db_config = match build_db_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "invalid database configuration");
            std::process::exit(1);
        }
    };

    let adapter = build_adapter(db_config);

    if let Err(e) = adapter.connect().await {
        tracing::error!(error = %e, "could not connect to database");
        std::process::exit(1);
    }
    tracing::info!("connected to database");

    let user_privilege = match adapter.get_user_privileges().await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "could not retrieve user privileges");
            std::process::exit(1);
        }
    };

    let (white_object_acl, black_object_acl, white_tool_acl, black_tool_acl) = match parse_acls(&cli) {
        Ok(acls) => acls,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse ACL configuration");
            std::process::exit(1);
        }
    };

    let flags = GatewayFlags {
        persist: cli.persist,
        disable_privilege_annotation: cli.disable_tool_priv,
        disable_fine_grained_tools: cli.disable_fine_gran_tool,
        disable_transaction_tools: cli.disable_trans,
        adaptive_schema_threshold: cli.n,
    };

    // The original loads a sentence-transformers model from `--mp` and falls
    // back to silently disabling the tool when loading fails; this adapter
    // has no model file to load, so the backend is enabled whenever `--mp`
    // names anything at all.
    let value_search: Option<Arc<ValueSearchBackend>> = cli.mp.as_ref().map(|_| Arc::new(ValueSearchBackend::new()));

    let context = Arc::new(GatewayContext::new(
        adapter,
        user_privilege,
        white_object_acl,
        black_object_acl,
        white_tool_acl,
        black_tool_acl,
        flags,
        value_search,
    ));

    let registry = match build_tool_surface(context.clone()).await {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!(error = %e, "could not build tool surface");
            std::process::exit(1);
        }
    };
    tracing::info!(tools = ?registry.names().collect::<Vec<_>>(), "tool surface ready");

    let shutdown_context = context.clone();
    ctrlc::set_handler(move || {
        let context = shutdown_context.clone();
        tokio::spawn(async move {
            if let Err(e) = context.adapter.close().await {
                tracing::error!(error = %e, "error during database cleanup");
            }
            std::process::exit(0);
        });
    })
    .expect("failed to register signal handler");

    if let Err(e) = transport::run_stdio(registry).await {
        tracing::error!(error = %e, "transport loop terminated with an error");
        std::process::exit(1);
    }

    let _ = context.adapter.close().await;
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "db_gateway=debug,info" } else { "db_gateway=info,warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_db_config(cli: &Cli) -> Result<DbConfig, db_gateway::core::ConfigError> {
    let readonly = !cli.persist;

    if let Some(dsn) = &cli.dsn {
        return DbConfig::from_dsn(dsn, readonly);
    }

    let kind: DbKind = cli.db_type.parse()?;
    DbConfig::build(
        kind,
        cli.host.clone().unwrap_or_default(),
        cli.port.clone().unwrap_or_default(),
        cli.user.clone().unwrap_or_default(),
        cli.password.clone().unwrap_or_default(),
        cli.database.clone().unwrap_or_default(),
        readonly,
    )
}

type AclBundle = (
    db_gateway::acl::ObjectAcl,
    db_gateway::acl::ObjectAcl,
    db_gateway::acl::ToolAcl,
    db_gateway::acl::ToolAcl,
);

fn parse_acls(cli: &Cli) -> Result<AclBundle, db_gateway::core::AclError> {
    let white_object_acl = AclParser::parse_object_acl(cli.wo.as_deref().unwrap_or(""))?;
    let black_object_acl = AclParser::parse_object_acl(cli.bo.as_deref().unwrap_or(""))?;
    let white_tool_acl = AclParser::parse_tool_acl(cli.wt.as_deref().unwrap_or(""))?;
    let black_tool_acl = AclParser::parse_tool_acl(cli.bt.as_deref().unwrap_or(""))?;
    Ok((white_object_acl, black_object_acl, white_tool_acl, black_tool_acl))
}
