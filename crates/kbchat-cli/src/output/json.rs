//! JSON output formatter

use kbchat_core::QueryResult;

pub fn format_answer(result: &QueryResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string()) + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_parseable() {
        let text = format_answer(&crate::output::tests::sample());
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["session_id"], "abcdef123456");
        assert_eq!(value["sources"][0]["score"], 0.87);
        assert!(value.get("enhanced_question").is_none());
    }
}
