//! Caller-side input checks

use crate::error::{KbChatError, Result};
use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_QUESTION_CHARS: usize = 3;
pub const MAX_QUESTION_CHARS: usize = 5000;

lazy_static! {
    static ref SESSION_ID_RE: Regex = Regex::new(r"^[0-9A-Za-z._:-]+$").unwrap();
    static ref SUSPICIOUS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)<script").unwrap(),
        Regex::new(r"(?i)javascript:").unwrap(),
        Regex::new(r"(?i)on\w+\s*=").unwrap(),
    ];
}

/// Strip NUL bytes, cap length in characters, trim
pub fn sanitize_input(text: &str, max_chars: usize) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '\0')
        .take(max_chars)
        .collect();
    cleaned.trim().to_string()
}

/// Check a user question before it reaches the engine
pub fn validate_question(question: &str) -> Result<()> {
    let question = question.trim();
    if question.is_empty() {
        return Err(KbChatError::Validation(
            "Question cannot be empty".to_string(),
        ));
    }

    let len = question.chars().count();
    if len > MAX_QUESTION_CHARS {
        return Err(KbChatError::Validation(format!(
            "Question is too long (max {} characters)",
            MAX_QUESTION_CHARS
        )));
    }
    if len < MIN_QUESTION_CHARS {
        return Err(KbChatError::Validation(format!(
            "Question is too short (min {} characters)",
            MIN_QUESTION_CHARS
        )));
    }

    if SUSPICIOUS_PATTERNS.iter().any(|re| re.is_match(question)) {
        return Err(KbChatError::Validation(
            "Question contains invalid content".to_string(),
        ));
    }

    Ok(())
}

/// Provider session tokens match `[0-9A-Za-z._:-]+`
pub fn is_valid_session_id(session_id: &str) -> bool {
    SESSION_ID_RE.is_match(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_input("  hi\0 there  ", 100), "hi there");
        assert_eq!(sanitize_input("abcdef", 3), "abc");
        assert_eq!(sanitize_input("", 10), "");
    }

    #[test]
    fn test_validate_question() {
        assert!(validate_question("What is X?").is_ok());
        assert!(validate_question("   ").is_err());
        assert!(validate_question("hi").is_err());
        assert!(validate_question(&"a".repeat(5001)).is_err());
        assert!(validate_question(&"a".repeat(5000)).is_ok());
    }

    #[test]
    fn test_rejects_markup() {
        assert!(validate_question("<SCRIPT>alert(1)</script>").is_err());
        assert!(validate_question("click javascript:void(0)").is_err());
        assert!(validate_question("<img onerror = x>").is_err());
    }

    #[test]
    fn test_session_id_pattern() {
        assert!(is_valid_session_id("a1b2-c3d4_e5.f6:g7"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("has space"));
        assert!(!is_valid_session_id("semi;colon"));
    }
}
