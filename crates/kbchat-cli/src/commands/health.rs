//! Health command

use crate::app::OutputFormat;
use anyhow::Result;
use kbchat_core::{Config, KnowledgeBaseService};

pub async fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let service = KnowledgeBaseService::from_config(config)?;
    let healthy = service.health_check().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::json!({ "healthy": healthy }));
        }
        _ => {
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
        }
    }

    if !healthy {
        anyhow::bail!("Knowledge base is not reachable");
    }
    Ok(())
}
