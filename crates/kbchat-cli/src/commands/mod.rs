//! CLI command handlers

pub mod ask;
pub mod chat;
pub mod config;
pub mod health;
pub mod ls;
pub mod status;
pub mod sync;
pub mod upload;

use kbchat_core::query::validation::{sanitize_input, validate_question, MAX_QUESTION_CHARS};
use kbchat_core::Result;

/// Validate raw user input and return the cleaned question
pub(crate) fn prepare_question(raw: &str) -> Result<String> {
    validate_question(raw)?;
    Ok(sanitize_input(raw, MAX_QUESTION_CHARS))
}
