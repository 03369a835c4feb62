//! Ask command

use super::prepare_question;
use crate::app::{AskArgs, OutputFormat};
use crate::output::format_answer;
use anyhow::Result;
use kbchat_core::{Config, QueryEngine, QueryRequest};

pub async fn run(args: AskArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let question = prepare_question(&args.question.join(" "))?;

    let engine = QueryEngine::from_config(config)?;

    let mut request = QueryRequest::new(question).with_advanced_prompts(!args.no_advanced_prompts);
    if let Some(session) = args.session {
        request = request.with_session(session);
    }
    if let Some(query_type) = args.query_type {
        request = request.with_query_type(query_type);
    }

    let result = engine.query(request).await?;
    tracing::debug!(
        "Answered in {}ms with {} sources",
        result.response_time_ms,
        result.sources.len()
    );
    print!("{}", format_answer(&result, format));
    Ok(())
}
