//! Strict schema creation

use anyhow::{Context, Result};
use clap::Parser;

use cityctl_server::db::{create_pool, create_schema, schema::TABLE_NAME, DbConfig};

use crate::config::DbArgs;

/// Arguments for the schema command
#[derive(Parser, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub db: DbArgs,
}

/// Create the table and spatial index, failing on any error
pub async fn run_schema(args: SchemaArgs) -> Result<()> {
    let db_config = DbConfig::from(args.db);

    let pool = create_pool(&db_config)
        .await
        .with_context(|| format!("Failed to connect to database {}", db_config.describe()))?;

    create_schema(&pool)
        .await
        .with_context(|| format!("Failed to create table {TABLE_NAME}"))?;

    println!("Table {TABLE_NAME} and its spatial index are ready");
    Ok(())
}
