//! Prompt templates sent with every retrieve-and-generate request
//!
//! Placeholders (`$search_results$`, `$query$`, ...) are filled in by the
//! provider, not by us.

/// Organizes retrieved passages into context before generation
pub const ORCHESTRATION_TEMPLATE: &str = r#"Review the following retrieved documents and prepare a comprehensive context to help answer the user's question. Organize the information logically and include all relevant details.

Retrieved Documents:
$search_results$

User Question:
$query$

Conversation History:
$conversation_history$

Output Format Instructions:
$output_format_instructions$

Organized Context:"#;

/// Produces the final grounded answer
pub const GENERATION_TEMPLATE: &str = r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context:
$search_results$

Question: $query$

Answer:"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_carry_provider_placeholders() {
        for placeholder in ["$search_results$", "$query$", "$conversation_history$"] {
            assert!(ORCHESTRATION_TEMPLATE.contains(placeholder));
        }
        assert!(GENERATION_TEMPLATE.contains("$search_results$"));
        assert!(GENERATION_TEMPLATE.contains("$query$"));
    }
}
