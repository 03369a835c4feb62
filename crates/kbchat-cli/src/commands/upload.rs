//! Upload command

use crate::app::{OutputFormat, UploadArgs};
use crate::progress::ProgressReporter;
use anyhow::Result;
use kbchat_core::admin::collect_uploadable;
use kbchat_core::{Config, KnowledgeBaseService};

pub async fn run(args: UploadArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let service = KnowledgeBaseService::from_config(config)?;

    let mut files = Vec::new();
    for path in &args.paths {
        files.extend(collect_uploadable(path)?);
    }
    if files.is_empty() {
        anyhow::bail!(
            "No uploadable files found (allowed: {})",
            kbchat_core::ALLOWED_EXTENSIONS.join(", ")
        );
    }
    tracing::debug!("Uploading {} files", files.len());

    let mut progress = ProgressReporter::new(files.len());
    let mut uploaded = Vec::new();
    for file in &files {
        let name = file.display().to_string();
        progress.start(&name);
        match service.upload_document(file).await {
            Ok(doc) => {
                progress.succeed();
                uploaded.push(doc);
            }
            Err(e) => progress.fail(&name, &e),
        }
    }
    progress.finish();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&uploaded)?);
        }
        _ => {
            for doc in &uploaded {
                println!("{} ({} bytes)", doc.key, doc.size);
            }
        }
    }

    if progress.failed() > 0 {
        anyhow::bail!("{} of {} uploads failed", progress.failed(), files.len());
    }
    Ok(())
}
