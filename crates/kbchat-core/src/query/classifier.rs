//! Keyword-based question classification

use crate::error::KbChatError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const TECHNICAL_KEYWORDS: &[&str] = &[
    "how",
    "implement",
    "configure",
    "setup",
    "technical",
    "specification",
];
const SUMMARY_KEYWORDS: &[&str] = &["summarize", "summary", "overview", "brief"];
const COMPARISON_KEYWORDS: &[&str] = &["compare", "difference", "versus", "vs", "better"];

/// Question category used to pick a prompt style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    General,
    Technical,
    Summary,
    Comparison,
}

impl QueryType {
    pub const ALL: [QueryType; 4] = [
        QueryType::General,
        QueryType::Technical,
        QueryType::Summary,
        QueryType::Comparison,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::General => "general",
            QueryType::Technical => "technical",
            QueryType::Summary => "summary",
            QueryType::Comparison => "comparison",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = KbChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "general" => Ok(QueryType::General),
            "technical" => Ok(QueryType::Technical),
            "summary" => Ok(QueryType::Summary),
            "comparison" => Ok(QueryType::Comparison),
            other => Err(KbChatError::Validation(format!(
                "Unknown query type: {} (expected general, technical, summary or comparison)",
                other
            ))),
        }
    }
}

/// Classify a question. First match wins: technical, summary, comparison.
pub fn classify(question: &str) -> QueryType {
    let lower = question.to_lowercase();
    let matches = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    let query_type = if matches(TECHNICAL_KEYWORDS) {
        QueryType::Technical
    } else if matches(SUMMARY_KEYWORDS) {
        QueryType::Summary
    } else if matches(COMPARISON_KEYWORDS) {
        QueryType::Comparison
    } else {
        QueryType::General
    };

    tracing::debug!("Detected query type: {}", query_type);
    query_type
}
