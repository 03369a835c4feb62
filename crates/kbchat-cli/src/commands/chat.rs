//! Interactive chat command

use super::prepare_question;
use crate::app::{ChatArgs, OutputFormat};
use crate::output::format_answer;
use anyhow::Result;
use kbchat_core::query::recent_history;
use kbchat_core::{Config, ConversationExchange, QueryEngine, QueryRequest};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(args: ChatArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let engine = QueryEngine::from_config(config)?;
    let mut session = args.session;
    let mut history: Vec<ConversationExchange> = Vec::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Ask a question (type 'exit' to quit).");

    loop {
        eprint!("> ");
        std::io::stderr().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        let question = match prepare_question(line) {
            Ok(q) => q,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };

        let mut request = QueryRequest::new(question.clone())
            .with_history(recent_history(&history).to_vec());
        if let Some(ref id) = session {
            request = request.with_session(id.clone());
        }

        match engine.query(request).await {
            Ok(result) => {
                print!("{}", format_answer(&result, format));
                std::io::stdout().flush().ok();
                session = Some(result.session_id.clone());
                history.push(ConversationExchange::new(question, result.answer));
                let keep = recent_history(&history).len();
                history.drain(..history.len() - keep);
            }
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    if let Some(id) = session {
        eprintln!("Session: {}", id);
    }
    Ok(())
}
