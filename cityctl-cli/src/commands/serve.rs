//! HTTP server command for the cities API
//!
//! Connects to the database, makes sure the table exists, then serves until
//! Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use cityctl_server::db::{create_pool, ensure_schema, DbConfig, PgCityStore};
use cityctl_server::http::{run_server, ServerConfig};

use crate::config::DbArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "CITYCTL_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let db_config = DbConfig::from(args.db);

    // No retry: an unreachable database stops startup here
    let pool = create_pool(&db_config)
        .await
        .with_context(|| format!("Failed to connect to database {}", db_config.describe()))?;

    // Lenient: a schema failure is logged and requests fail individually
    ensure_schema(&pool).await;

    let config = ServerConfig {
        bind_addr: args.bind,
        cors_permissive: args.cors_permissive,
    };

    tracing::info!("Starting cityctl server on {}", args.bind);
    run_server(Arc::new(PgCityStore::new(pool)), config)
        .await
        .context("Server error")?;

    Ok(())
}
