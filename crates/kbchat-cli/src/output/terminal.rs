//! Terminal output formatter

use super::source_name;
use kbchat_core::QueryResult;

const SNIPPET_LINES: usize = 2;

pub fn format_answer(result: &QueryResult) -> String {
    let mut output = String::new();
    output.push_str(result.answer.trim_end());
    output.push('\n');

    if !result.sources.is_empty() {
        output.push_str("\nSources:\n");
        for (i, source) in result.sources.iter().enumerate() {
            let score_pct = (source.score * 100.0).round() as u32;
            output.push_str(&format!(
                "  [{}] {:>3}% {}\n",
                i + 1,
                score_pct,
                source_name(source)
            ));
            for line in source.content.lines().take(SNIPPET_LINES) {
                output.push_str(&format!("        {}\n", line));
            }
        }
    }

    output.push_str(&format!(
        "\nsession {} | {} | {}ms\n",
        result.session_id, result.query_type, result.response_time_ms
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_lists_scored_sources() {
        let text = format_answer(&crate::output::tests::sample());
        assert!(text.starts_with("X is a thing.\n"));
        assert!(text.contains("[1]  87% x.pdf"));
        assert!(text.contains("session abcdef123456"));
    }
}
