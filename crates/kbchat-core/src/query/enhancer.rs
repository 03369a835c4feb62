//! Conversation-aware question enhancement

use serde::{Deserialize, Serialize};

/// Exchanges folded into the enhanced question
pub const ENHANCEMENT_WINDOW: usize = 3;

/// Exchanges a caller should pass as history
pub const HISTORY_WINDOW: usize = 5;

/// Characters of each previous answer kept in the enhanced question
pub const ANSWER_PREVIEW_CHARS: usize = 200;

const HEADER: &str = "Context from previous conversation:";

/// A previous question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationExchange {
    pub question: String,
    pub answer: String,
}

impl ConversationExchange {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Fold the last few exchanges into the question.
///
/// Empty history returns the question unchanged.
pub fn enhance(question: &str, history: &[ConversationExchange]) -> String {
    if history.is_empty() {
        tracing::debug!("No conversation history, returning original question");
        return question.to_string();
    }

    let start = history.len().saturating_sub(ENHANCEMENT_WINDOW);
    let mut lines = Vec::with_capacity(2 * ENHANCEMENT_WINDOW + 1);
    lines.push(HEADER.to_string());
    for exchange in &history[start..] {
        let preview: String = exchange.answer.chars().take(ANSWER_PREVIEW_CHARS).collect();
        lines.push(format!("Previous question: {}", exchange.question));
        lines.push(format!("Previous answer: {}...", preview));
    }

    tracing::debug!(
        "Query enhanced with {} previous exchanges",
        history.len() - start
    );
    format!("{}\n\nCurrent question: {}", lines.join("\n"), question)
}

/// The last exchanges a caller should supply as history
pub fn recent_history(history: &[ConversationExchange]) -> &[ConversationExchange] {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    &history[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn exchanges(n: usize) -> Vec<ConversationExchange> {
        (0..n)
            .map(|i| ConversationExchange::new(format!("q{}", i), format!("a{}", i)))
            .collect()
    }

    #[test]
    fn test_empty_history_is_identity() {
        assert_eq!(enhance("What is X?", &[]), "What is X?");
    }

    #[test]
    fn test_format() {
        let history = vec![ConversationExchange::new("What is Rust?", "A language.")];
        let enhanced = enhance("Who made it?", &history);
        assert_eq!(
            enhanced,
            "Context from previous conversation:\n\
             Previous question: What is Rust?\n\
             Previous answer: A language....\n\n\
             Current question: Who made it?"
        );
    }

    #[test]
    fn test_keeps_last_three() {
        let enhanced = enhance("now", &exchanges(6));
        assert!(!enhanced.contains("q2"));
        assert!(enhanced.contains("q3"));
        assert!(enhanced.contains("q5"));
        assert_eq!(enhanced.matches("Previous question:").count(), 3);
    }

    #[test]
    fn test_truncates_answers_by_chars() {
        let long = "é".repeat(500);
        let history = vec![ConversationExchange::new("q", long)];
        let enhanced = enhance("now", &history);
        let expected = format!("Previous answer: {}...", "é".repeat(200));
        assert!(enhanced.contains(&expected));
        assert!(!enhanced.contains(&"é".repeat(201)));
    }

    #[test]
    fn test_recent_history_window() {
        let history = exchanges(8);
        let recent = recent_history(&history);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].question, "q3");
        assert_eq!(recent_history(&history[..2]).len(), 2);
    }

    proptest! {
        #[test]
        fn prop_ends_with_question(question in "[^\u{0}]{1,60}", n in 1usize..10) {
            let enhanced = enhance(&question, &exchanges(n));
            let suffix = format!("Current question: {}", question);
            prop_assert!(enhanced.ends_with(&suffix));
            prop_assert!(enhanced.matches("Previous question:").count() <= 3);
        }
    }
}
