//! Status command

use crate::app::OutputFormat;
use anyhow::Result;
use kbchat_core::{Config, KnowledgeBaseService};

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let service = KnowledgeBaseService::from_config(config)?;
    let status = service.get_status().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        OutputFormat::Md => {
            println!("# {}\n", status.name);
            println!("- **ID**: `{}`", status.knowledge_base_id);
            println!("- **Status**: {}", status.status);
            println!("- **Data sources**: {}", status.data_sources);
            println!("- **Documents**: {}", status.documents);
            if let Some(ref storage) = status.storage_type {
                println!("- **Storage**: {}", storage);
            }
        }
        OutputFormat::Cli => {
            println!("Knowledge base:  {} ({})", status.name, status.knowledge_base_id);
            println!("Status:          {}", status.status);
            if let Some(ref description) = status.description {
                println!("Description:     {}", description);
            }
            println!("Data sources:    {}", status.data_sources);
            println!("Documents:       {}", status.documents);
            println!(
                "Storage:         {}",
                status.storage_type.as_deref().unwrap_or("-")
            );
            println!(
                "Created:         {}",
                status.created_at.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}
