//! Custos demo server
//!
//! Serves the demo shop API with declarative access control.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use custos_api::{CustosConfig, Server};

/// Custos - declarative access control demo server
#[derive(Parser, Debug)]
#[command(name = "custos")]
#[command(about = "Demo shop API guarded by declarative access rules", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "CUSTOS_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides the file and CUSTOS_BIND)
    #[arg(short, long)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Serve the API (default)
    Serve,
    /// Validate the access rules and print them
    Rules,
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,custos=debug".into()),
        )
        .init();

    let args = Args::parse();

    let config = CustosConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?
        .with_bind_override(args.bind);
    config.validate()?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = Server::new(config).await?;
            server.run().await?;
        }
        Command::Rules => {
            let server = Server::new(config).await?;
            let mut operations: Vec<_> = server.enforcement().registry().iter().collect();
            operations.sort_by(|a, b| a.id().cmp(b.id()));
            for op in operations {
                let rule = op.rule();
                let level = if rule.is_skipped() {
                    "SKIP".to_string()
                } else {
                    rule.level().to_string()
                };
                match rule.protected_type() {
                    Some(ty) => println!(
                        "{:<40} {level:<16} {ty} via '{}'",
                        op.id(),
                        rule.entity_id_param_name()
                    ),
                    None => println!("{:<40} {level}", op.id()),
                }
            }
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
