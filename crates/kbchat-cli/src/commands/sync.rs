//! Sync command

use crate::app::OutputFormat;
use anyhow::Result;
use kbchat_core::{Config, KnowledgeBaseService};

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let service = KnowledgeBaseService::from_config(config)?;
    let job = service.trigger_sync().await?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
        _ => {
            println!("Started ingestion job {} ({})", job.ingestion_job_id, job.status);
        }
    }
    Ok(())
}
