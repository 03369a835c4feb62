//! Query orchestration
//!
//! Runs one question through validation, enhancement, classification, model
//! resolution and the provider call, retrying rejected model identifiers in
//! sequence.

use super::classifier::{classify, QueryType};
use super::enhancer::{enhance, ConversationExchange};
use super::model_id::{ModelResolver, ResolutionState};
use super::request::{short_id, RequestBuilder};
use super::response::{normalize, QueryResult};
use super::validation::is_valid_session_id;
use crate::config::{Config, EngineConfig};
use crate::error::{KbChatError, Result};
use crate::provider::{BedrockClient, ErrorKind, ProviderError, RetrieveAndGenerate};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Code reported when the provider assigns no session
pub const MISSING_SESSION_ID: &str = "MissingSessionId";

const LOG_PREVIEW_CHARS: usize = 100;

/// A question plus the conversational context it is asked in
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    pub session_id: Option<String>,
    /// Most recent last
    pub history: Vec<ConversationExchange>,
    pub query_type: Option<QueryType>,
    pub use_advanced_prompts: bool,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: None,
            history: Vec::new(),
            query_type: None,
            use_advanced_prompts: true,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationExchange>) -> Self {
        self.history = history;
        self
    }

    pub fn with_query_type(mut self, query_type: QueryType) -> Self {
        self.query_type = Some(query_type);
        self
    }

    pub fn with_advanced_prompts(mut self, enabled: bool) -> Self {
        self.use_advanced_prompts = enabled;
        self
    }
}

/// Answers questions against one knowledge base
pub struct QueryEngine {
    config: EngineConfig,
    resolver: ModelResolver,
    provider: Arc<dyn RetrieveAndGenerate>,
}

impl QueryEngine {
    pub fn new(config: EngineConfig, provider: Arc<dyn RetrieveAndGenerate>) -> Self {
        let resolver = ModelResolver::from_config(&config);
        Self {
            config,
            resolver,
            provider,
        }
    }

    /// Engine backed by the HTTP provider client
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = BedrockClient::from_config(config)?;
        Ok(Self::new(config.engine_config(), Arc::new(client)))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer a question. All-or-nothing: either a complete result or an error.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryResult> {
        let start = Instant::now();

        let knowledge_base_id = self.check_config()?;

        let question = request.question.trim();
        if question.is_empty() {
            return Err(KbChatError::Validation(
                "Question cannot be empty".to_string(),
            ));
        }

        let session_id = match request.session_id.as_deref().map(str::trim) {
            Some(id) if is_valid_session_id(id) => Some(id.to_string()),
            Some(_) => {
                tracing::warn!("Ignoring malformed session id; starting a new session");
                None
            }
            None => None,
        };

        tracing::info!(
            "Processing query: {}",
            preview(question, LOG_PREVIEW_CHARS)
        );

        let enhanced = if request.use_advanced_prompts && !request.history.is_empty() {
            let text = enhance(question, &request.history);
            if text.trim().is_empty() {
                question.to_string()
            } else {
                text
            }
        } else {
            question.to_string()
        };

        let query_type = match request.query_type {
            Some(explicit) => explicit,
            None if request.use_advanced_prompts => classify(question),
            None => QueryType::General,
        };

        let mut plan = self.resolver.plan();
        let mut current = plan.start();
        let builder = RequestBuilder::new(
            knowledge_base_id,
            self.config.temperature,
            self.config.max_tokens,
        );
        let mut provider_request = builder.build(&current, &enhanced, session_id.as_deref());
        provider_request.validate()?;
        tracing::debug!("Request: {}", provider_request.redacted_json());

        let mut first_error: Option<ProviderError> = None;
        let response = loop {
            match self
                .provider
                .invoke_retrieve_and_generate(&provider_request)
                .await
            {
                Ok(response) => {
                    plan.record_success();
                    break response;
                }
                Err(err) => {
                    let kind = err.kind();
                    let retrying = first_error.is_some();

                    // Auth failures are never retried; other non-model
                    // failures only end the call on the first attempt.
                    if kind == ErrorKind::Auth || (!retrying && kind != ErrorKind::ValidationModel) {
                        tracing::error!(
                            "Query failed after {}ms: {}",
                            start.elapsed().as_millis(),
                            err
                        );
                        return Err(err.into_error());
                    }

                    tracing::warn!("Model identifier {} rejected: {}", current, err);
                    let original = first_error.get_or_insert(err).clone();

                    match plan.record_failure() {
                        Some(next) => {
                            tracing::info!("Retrying with alternative model identifier {}", next);
                            provider_request.set_model(&next);
                            current = next;
                        }
                        None => {
                            let elapsed_ms = start.elapsed().as_millis() as u64;
                            let attempted: Vec<String> =
                                plan.attempted().iter().map(|m| m.to_string()).collect();
                            tracing::error!(
                                "All {} model identifiers rejected after {}ms",
                                attempted.len(),
                                elapsed_ms
                            );
                            return Err(KbChatError::ProviderModel {
                                code: original.code,
                                message: original.message,
                                attempted,
                                elapsed_ms,
                            });
                        }
                    }
                }
            }
        };

        let mut result = normalize(
            response,
            session_id.as_deref(),
            query_type,
            &enhanced,
            question,
        );

        if result.session_id.is_empty() {
            tracing::error!("Provider returned no session id");
            return Err(ProviderError::new(
                MISSING_SESSION_ID,
                "Provider did not assign a session id",
            )
            .into_error());
        }

        let model_used = match plan.state() {
            ResolutionState::Succeeded(model) => model.clone(),
            _ => current,
        };
        let attempts = plan.attempted().len();

        result.response_time_ms = start.elapsed().as_millis() as u64;
        result.metadata = build_metadata(
            model_used.as_str(),
            self.resolver.configured(),
            knowledge_base_id,
            result.sources.len(),
            attempts,
        );

        tracing::info!(
            "Query completed in {}ms with {} sources (session {})",
            result.response_time_ms,
            result.sources.len(),
            short_id(&result.session_id)
        );

        Ok(result)
    }

    fn check_config(&self) -> Result<&str> {
        let knowledge_base_id = self
            .config
            .knowledge_base_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                KbChatError::Config(
                    "Knowledge base ID is not configured (set KNOWLEDGE_BASE_ID)".to_string(),
                )
            })?;

        if self.config.model_id.trim().is_empty() {
            return Err(KbChatError::Config(
                "Model ID is not configured (set MODEL_ID)".to_string(),
            ));
        }

        Ok(knowledge_base_id)
    }
}

fn build_metadata(
    model: &str,
    configured_model: &str,
    knowledge_base_id: &str,
    sources_count: usize,
    attempts: usize,
) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("model".to_string(), json!(model));
    metadata.insert("configured_model".to_string(), json!(configured_model));
    metadata.insert("kb_id".to_string(), json!(knowledge_base_id));
    metadata.insert("sources_count".to_string(), json!(sources_count));
    metadata.insert("attempts".to_string(), json!(attempts));
    metadata.insert(
        "timestamp".to_string(),
        json!(chrono::Utc::now().to_rfc3339()),
    );
    metadata.insert("alternative_used".to_string(), json!(attempts > 1));
    metadata
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
