//! kbchat CLI
//!
//! Ask questions against a managed knowledge base.

use anyhow::Result;
use clap::Parser;
use kbchat_core::error::exit_codes;
use kbchat_core::{Config, KbChatError};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        let code = e
            .downcast_ref::<KbChatError>()
            .map(KbChatError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, &config, cli.format).await,
        Commands::Chat(args) => commands::chat::run(args, &config, cli.format).await,
        Commands::Status => commands::status::run(&config, cli.format).await,
        Commands::Sync => commands::sync::run(&config, cli.format).await,
        Commands::Health => commands::health::run(&config, cli.format).await,
        Commands::Ls => commands::ls::run(&config, cli.format).await,
        Commands::Upload(args) => commands::upload::run(args, &config, cli.format).await,
        Commands::Config(args) => commands::config::run(args, &config, cli.format).await,
        Commands::Mcp => kbchat_mcp::start_server(&config).await,
    }
}
