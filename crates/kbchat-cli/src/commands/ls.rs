//! List command

use crate::app::OutputFormat;
use anyhow::Result;
use kbchat_core::{Config, KnowledgeBaseService};

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let service = KnowledgeBaseService::from_config(config)?;
    let docs = service.list_documents().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&docs)?);
        }
        OutputFormat::Md => {
            println!("| Document | Size |");
            println!("|---|---|");
            for doc in docs {
                println!("| `{}` | {} |", doc.name, doc.size);
            }
        }
        OutputFormat::Cli => {
            for doc in docs {
                println!("{:>10}  {}", doc.size, doc.name);
            }
        }
    }
    Ok(())
}
