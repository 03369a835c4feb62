//! Markdown output formatter

use super::source_name;
use kbchat_core::QueryResult;

pub fn format_answer(result: &QueryResult) -> String {
    let mut output = String::from("# Answer\n\n");
    output.push_str(&result.answer);
    output.push_str("\n\n");

    if !result.sources.is_empty() {
        output.push_str("## Sources\n\n");
        for (i, source) in result.sources.iter().enumerate() {
            output.push_str(&format!(
                "{}. `{}` (Score: {:.2})\n",
                i + 1,
                source_name(source),
                source.score
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "*Session `{}` · {} · {}ms*\n",
        result.session_id, result.query_type, result.response_time_ms
    ));
    output
}
