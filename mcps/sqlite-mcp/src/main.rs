//! SQLite MCP Server
//!
//! Serves one SQLite database over stdio.
//!
//! Usage:
//!   sqlite-mcp --db-path ./db/app.db
//!   sqlite-mcp --config ~/.binks/sqlite.toml --read-only

use std::path::PathBuf;

use clap::Parser;
use rmcp::{transport::io::stdio, ServiceExt};
use sqlite_mcp::{SqliteConfig, SqliteMcpServer};

#[derive(Parser)]
#[command(name = "sqlite-mcp")]
#[command(about = "MCP server exposing a SQLite database through generic table operations")]
struct Cli {
    /// Config file (default: ~/.binks/sqlite.toml when present)
    #[arg(long, env = "SQLITE_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, env = "SQLITE_MCP_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Open the database read-only and refuse writes
    #[arg(long)]
    read_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SqliteConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    if cli.read_only {
        config.database.read_only = true;
    }

    mcp_common::init_tracing("sqlite_mcp", &config.logging.level)?;

    tracing::info!("Starting SQLite MCP server");

    let server = SqliteMcpServer::new(&config)?;
    let service = server.serve(stdio()).await?;

    tracing::info!(
        "SQLite MCP server running on {}",
        config.database.path.display()
    );

    tokio::select! {
        result = service.waiting() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
        }
    }

    tracing::info!("SQLite MCP server stopped");

    Ok(())
}
