//! Output formatters

pub mod json;
pub mod markdown;
pub mod terminal;

use crate::app::OutputFormat;
use kbchat_core::QueryResult;

/// Format a query answer
pub fn format_answer(result: &QueryResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_answer(result),
        OutputFormat::Md => markdown::format_answer(result),
        OutputFormat::Cli => terminal::format_answer(result),
    }
}

/// Display name for a source: its document key, else the full URI
fn source_name(source: &kbchat_core::Source) -> &str {
    if !source.document_key.is_empty() {
        &source.document_key
    } else if !source.location_uri.is_empty() {
        &source.location_uri
    } else {
        "(unknown location)"
    }
}
