//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use kbchat_core::{KbChatError, QueryType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kbchat")]
#[command(
    author,
    version,
    about = "Ask questions against a managed knowledge base"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a single question
    Ask(AskArgs),

    /// Interactive conversation on stdin
    Chat(ChatArgs),

    /// Show knowledge base status
    Status,

    /// Start an ingestion job for the configured data source
    Sync,

    /// Check that the knowledge base is reachable
    Health,

    /// List uploaded documents
    Ls,

    /// Upload documents (directories are walked)
    Upload(UploadArgs),

    /// Show effective configuration
    Config(ConfigArgs),

    /// Start MCP server
    Mcp,
}

#[derive(Args)]
pub struct AskArgs {
    /// Question text
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Continue an existing session
    #[arg(long)]
    pub session: Option<String>,

    /// Query type (general, technical, summary, comparison)
    #[arg(long = "type", value_parser = parse_query_type)]
    pub query_type: Option<QueryType>,

    /// Send the question as-is, without classification or enhancement
    #[arg(long)]
    pub no_advanced_prompts: bool,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Continue an existing session
    #[arg(long)]
    pub session: Option<String>,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Files or directories
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Validate and exit non-zero on problems
    #[arg(long)]
    pub validate: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Cli,
    Json,
    Md,
}

fn parse_query_type(value: &str) -> Result<QueryType, String> {
    value.parse().map_err(|e: KbChatError| e.to_string())
}
