//! Connection configuration
//!
//! Loaded from the standard libpq environment variables:
//! - `PGHOST`, `PGPORT`, `PGDATABASE`, `PGUSER`, `PGPASSWORD`
//! - `CITYCTL_MAX_CONNECTIONS`: pool size (default: 5)

use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

/// Default maximum connections for the pool.
/// Set to 1 for a single shared connection.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Where the connection parameters come from
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    /// Individual parameters; unset ones fall back to libpq defaults
    Parts {
        host: Option<String>,
        port: Option<u16>,
        database: Option<String>,
        user: Option<String>,
        password: Option<String>,
    },
    /// Full `postgres://` URL
    Url(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub target: ConnectTarget,
    pub max_connections: u32,
}

impl DbConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        Self {
            target: ConnectTarget::Parts {
                host: var("PGHOST"),
                port: var("PGPORT").and_then(|p| p.parse().ok()),
                database: var("PGDATABASE"),
                user: var("PGUSER"),
                password: var("PGPASSWORD"),
            },
            max_connections: var("CITYCTL_MAX_CONNECTIONS")
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
        }
    }

    /// Create config from a connection URL
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            target: ConnectTarget::Url(url.into()),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    /// Build sqlx connect options.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL target cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, sqlx::Error> {
        match &self.target {
            ConnectTarget::Url(url) => PgConnectOptions::from_str(url),
            ConnectTarget::Parts {
                host,
                port,
                database,
                user,
                password,
            } => {
                // PgConnectOptions::new() already reads PG* from the environment;
                // explicit parts win over it.
                let mut options = PgConnectOptions::new();
                if let Some(host) = host {
                    options = options.host(host);
                }
                if let Some(port) = port {
                    options = options.port(*port);
                }
                if let Some(database) = database {
                    options = options.database(database);
                }
                if let Some(user) = user {
                    options = options.username(user);
                }
                if let Some(password) = password {
                    options = options.password(password);
                }
                Ok(options)
            }
        }
    }

    /// Database name for log lines (never includes credentials).
    pub fn describe(&self) -> String {
        match self.connect_options() {
            Ok(options) => format!(
                "'{}' on {}:{} as '{}'",
                options.get_database().unwrap_or("<default>"),
                options.get_host(),
                options.get_port(),
                options.get_username()
            ),
            Err(_) => "<invalid url>".to_string(),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
