//! Connection settings shared by every command that talks to the database
//!
//! Each flag falls back to the matching environment variable, so a `.env`
//! file (loaded at startup) or the usual libpq variables are enough.

use clap::Args;
use cityctl_server::db::{ConnectTarget, DbConfig, DEFAULT_MAX_CONNECTIONS};

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// Full connection URL (overrides the individual --pg-* settings)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Database host
    #[arg(long, env = "PGHOST")]
    pub pg_host: Option<String>,

    /// Database port
    #[arg(long, env = "PGPORT")]
    pub pg_port: Option<u16>,

    /// Database name
    #[arg(long, env = "PGDATABASE")]
    pub pg_database: Option<String>,

    /// Database user
    #[arg(long, env = "PGUSER")]
    pub pg_user: Option<String>,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub pg_password: Option<String>,

    /// Connection pool size (1 = a single shared connection)
    #[arg(long, env = "CITYCTL_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

impl From<DbArgs> for DbConfig {
    fn from(args: DbArgs) -> Self {
        let config = match args.database_url {
            Some(url) => DbConfig::from_url(url),
            None => DbConfig {
                target: ConnectTarget::Parts {
                    host: args.pg_host,
                    port: args.pg_port,
                    database: args.pg_database,
                    user: args.pg_user,
                    password: args.pg_password,
                },
                max_connections: DEFAULT_MAX_CONNECTIONS,
            },
        };

        config.with_max_connections(args.max_connections)
    }
}
