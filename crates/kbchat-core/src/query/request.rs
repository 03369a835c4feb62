//! Retrieve-and-generate request building

use super::model_id::ModelIdentifier;
use super::prompts::{GENERATION_TEMPLATE, ORCHESTRATION_TEMPLATE};
use crate::error::{KbChatError, Result};
use serde::{Deserialize, Serialize};

/// Passages retrieved per query
pub const NUMBER_OF_RESULTS: u32 = 5;

const KNOWLEDGE_BASE_TYPE: &str = "KNOWLEDGE_BASE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub text: String,
}

/// Wire body of a retrieve-and-generate call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateRequest {
    pub input: RequestInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieve_and_generate_configuration: Option<RetrieveAndGenerateConfiguration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveAndGenerateConfiguration {
    #[serde(rename = "type")]
    pub config_type: String,
    pub knowledge_base_configuration: KnowledgeBaseConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseConfiguration {
    pub knowledge_base_id: String,
    pub model_arn: String,
    pub retrieval_configuration: RetrievalConfiguration,
    pub orchestration_configuration: OrchestrationConfiguration,
    pub generation_configuration: GenerationConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfiguration {
    pub vector_search_configuration: VectorSearchConfiguration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchConfiguration {
    pub number_of_results: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub text_prompt_template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationConfiguration {
    pub prompt_template: PromptTemplate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfiguration {
    pub prompt_template: PromptTemplate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inference_config: Option<InferenceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceConfig {
    pub text_inference_config: TextInferenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextInferenceConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Assembles requests against one knowledge base
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    knowledge_base_id: String,
    temperature: f32,
    max_tokens: u32,
}

impl RequestBuilder {
    pub fn new(knowledge_base_id: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            knowledge_base_id: knowledge_base_id.into().trim().to_string(),
            temperature,
            max_tokens,
        }
    }

    /// Build a request. The configuration block is always present, including
    /// when an existing session is continued.
    pub fn build(
        &self,
        model: &ModelIdentifier,
        question: &str,
        session_id: Option<&str>,
    ) -> RetrieveAndGenerateRequest {
        let configuration = RetrieveAndGenerateConfiguration {
            config_type: KNOWLEDGE_BASE_TYPE.to_string(),
            knowledge_base_configuration: KnowledgeBaseConfiguration {
                knowledge_base_id: self.knowledge_base_id.clone(),
                model_arn: model.as_str().trim().to_string(),
                retrieval_configuration: RetrievalConfiguration {
                    vector_search_configuration: VectorSearchConfiguration {
                        number_of_results: NUMBER_OF_RESULTS,
                    },
                },
                orchestration_configuration: OrchestrationConfiguration {
                    prompt_template: PromptTemplate {
                        text_prompt_template: ORCHESTRATION_TEMPLATE.to_string(),
                    },
                },
                generation_configuration: GenerationConfiguration {
                    prompt_template: PromptTemplate {
                        text_prompt_template: GENERATION_TEMPLATE.to_string(),
                    },
                    inference_config: Some(InferenceConfig {
                        text_inference_config: TextInferenceConfig {
                            temperature: self.temperature,
                            max_tokens: self.max_tokens,
                        },
                    }),
                },
            },
        };

        match session_id {
            Some(id) => tracing::debug!("Continuing session {}", short_id(id)),
            None => tracing::debug!("Starting new session with model {}", model),
        }

        RetrieveAndGenerateRequest {
            input: RequestInput {
                text: question.to_string(),
            },
            retrieve_and_generate_configuration: Some(configuration),
            session_id: session_id.map(str::to_string),
        }
    }
}

impl RetrieveAndGenerateRequest {
    /// Check the request is complete before dispatch.
    ///
    /// A failure here is a programming error and is never repaired.
    pub fn validate(&self) -> Result<()> {
        if self.input.text.trim().is_empty() {
            return Err(KbChatError::Precondition(
                "missing input text".to_string(),
            ));
        }

        let config = self
            .retrieve_and_generate_configuration
            .as_ref()
            .ok_or_else(|| {
                KbChatError::Precondition(
                    "missing retrieveAndGenerateConfiguration".to_string(),
                )
            })?;

        let kb = &config.knowledge_base_configuration;
        if config.config_type != KNOWLEDGE_BASE_TYPE {
            return Err(KbChatError::Precondition(format!(
                "unexpected configuration type {}",
                config.config_type
            )));
        }
        if kb.knowledge_base_id.trim().is_empty() {
            return Err(KbChatError::Precondition(
                "missing knowledgeBaseId".to_string(),
            ));
        }
        if kb.model_arn.trim().is_empty() {
            return Err(KbChatError::Precondition("missing modelArn".to_string()));
        }
        if kb
            .retrieval_configuration
            .vector_search_configuration
            .number_of_results
            == 0
        {
            return Err(KbChatError::Precondition(
                "numberOfResults must be positive".to_string(),
            ));
        }
        if kb
            .orchestration_configuration
            .prompt_template
            .text_prompt_template
            .is_empty()
            || kb
                .generation_configuration
                .prompt_template
                .text_prompt_template
                .is_empty()
        {
            return Err(KbChatError::Precondition(
                "missing prompt template".to_string(),
            ));
        }
        Ok(())
    }

    /// Swap the model in place before the next attempt
    pub fn set_model(&mut self, model: &ModelIdentifier) {
        if let Some(config) = self.retrieve_and_generate_configuration.as_mut() {
            config.knowledge_base_configuration.model_arn = model.as_str().to_string();
        }
    }

    pub fn model_arn(&self) -> Option<&str> {
        self.retrieve_and_generate_configuration
            .as_ref()
            .map(|c| c.knowledge_base_configuration.model_arn.as_str())
    }

    /// JSON for debug logs with the question text hidden
    pub fn redacted_json(&self) -> String {
        let mut redacted = self.clone();
        redacted.input.text = format!("[text length: {}]", self.input.text.chars().count());
        serde_json::to_string_pretty(&redacted).unwrap_or_default()
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
