//! MCP tool definitions and handlers

use crate::protocol::*;
use anyhow::Result;
use kbchat_core::query::recent_history;
use kbchat_core::query::validation::{sanitize_input, validate_question, MAX_QUESTION_CHARS};
use kbchat_core::{ConversationExchange, KnowledgeBaseService, QueryEngine, QueryRequest, QueryType};
use serde_json::Value;

pub fn ask_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "ask".to_string(),
        description: "Answer a question from the knowledge base, with cited sources".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "Question text (3-5000 characters)"
                },
                "sessionId": {
                    "type": "string",
                    "description": "Session returned by a previous call, to continue the conversation"
                },
                "history": {
                    "type": "array",
                    "description": "Previous exchanges, most recent last (only the last 5 are used)",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question": { "type": "string" },
                            "answer": { "type": "string" }
                        },
                        "required": ["question", "answer"]
                    }
                },
                "queryType": {
                    "type": "string",
                    "enum": ["general", "technical", "summary", "comparison"],
                    "description": "Force a query type instead of classifying the question"
                },
                "useAdvancedPrompts": {
                    "type": "boolean",
                    "description": "Classify and enhance the question with history (default: true)",
                    "default": true
                }
            },
            "required": ["question"]
        }),
    }
}

pub fn kb_status_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "kb_status".to_string(),
        description: "Show knowledge base status, data sources and document count".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn list_documents_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "list_documents".to_string(),
        description: "List documents uploaded to the knowledge base".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn sync_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "sync".to_string(),
        description: "Start an ingestion job so new documents become searchable".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub fn health_tool_definition() -> ToolDefinition {
    ToolDefinition {
        name: "health".to_string(),
        description: "Check that the knowledge base is reachable".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {}
        }),
    }
}

pub async fn handle_ask(engine: &QueryEngine, args: Value) -> Result<ToolResult> {
    let raw = args
        .get("question")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing required parameter: question"))?;
    validate_question(raw)?;
    let question = sanitize_input(raw, MAX_QUESTION_CHARS);

    let history: Vec<ConversationExchange> = match args.get("history") {
        Some(Value::Null) | None => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| anyhow::anyhow!("Invalid history: {}", e))?,
    };

    let use_advanced_prompts = args
        .get("useAdvancedPrompts")
        .and_then(|v| v.as_bool())
        .unwrap_or(true);

    let mut request = QueryRequest::new(question)
        .with_history(recent_history(&history).to_vec())
        .with_advanced_prompts(use_advanced_prompts);

    if let Some(session) = args.get("sessionId").and_then(|v| v.as_str()) {
        request = request.with_session(session);
    }
    if let Some(query_type) = args.get("queryType").and_then(|v| v.as_str()) {
        request = request.with_query_type(query_type.parse::<QueryType>()?);
    }

    let result = engine.query(request).await?;

    let mut text = result.answer.clone();
    if !result.sources.is_empty() {
        text.push_str("\n\nSources:");
        for (i, source) in result.sources.iter().enumerate() {
            text.push_str(&format!(
                "\n{}. {} (score {:.2})",
                i + 1,
                source.location_uri,
                source.score
            ));
        }
    }
    text.push_str(&format!("\n\nSession: {}", result.session_id));

    Ok(ToolResult::text(text, Some(serde_json::to_value(&result)?)))
}

pub async fn handle_kb_status(service: &KnowledgeBaseService) -> Result<ToolResult> {
    let status = service.get_status().await?;

    let summary = format!(
        "Knowledge base: {} ({})\n\
         Status: {}\n\
         Data sources: {}\n\
         Documents: {}\n\
         Storage: {}",
        status.name,
        status.knowledge_base_id,
        status.status,
        status.data_sources,
        status.documents,
        status.storage_type.as_deref().unwrap_or("unknown"),
    );

    Ok(ToolResult::text(summary, Some(serde_json::to_value(&status)?)))
}

pub async fn handle_list_documents(service: &KnowledgeBaseService) -> Result<ToolResult> {
    let docs = service.list_documents().await?;

    let summary = if docs.is_empty() {
        "No documents uploaded".to_string()
    } else {
        let lines: Vec<String> = docs
            .iter()
            .map(|d| format!("{} ({} bytes)", d.name, d.size))
            .collect();
        format!("{} documents:\n{}", docs.len(), lines.join("\n"))
    };

    Ok(ToolResult::text(
        summary,
        Some(serde_json::json!({ "documents": docs })),
    ))
}

pub async fn handle_sync(service: &KnowledgeBaseService) -> Result<ToolResult> {
    let job = service.trigger_sync().await?;
    Ok(ToolResult::text(
        format!("Started ingestion job {} ({})", job.ingestion_job_id, job.status),
        Some(serde_json::to_value(&job)?),
    ))
}

pub async fn handle_health(service: &KnowledgeBaseService) -> Result<ToolResult> {
    let healthy = service.health_check().await;
    Ok(ToolResult::text(
        if healthy { "healthy" } else { "unhealthy" },
        Some(serde_json::json!({ "healthy": healthy })),
    ))
}
