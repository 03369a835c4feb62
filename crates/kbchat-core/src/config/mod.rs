//! Configuration management

use crate::error::{KbChatError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

lazy_static! {
    static ref REGION_RE: Regex = Regex::new(r"^[a-z0-9-]+$").unwrap();
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Knowledge base and generation settings
    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    /// Provider endpoints and credentials
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Known-good sibling models tried when a model family is rejected
    #[serde(default = "default_model_alternatives")]
    pub model_alternatives: Vec<ModelAlternative>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            knowledge_base: KnowledgeBaseConfig::default(),
            provider: ProviderConfig::default(),
            model_alternatives: default_model_alternatives(),
        }
    }
}

/// Knowledge base and generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default)]
    pub knowledge_base_id: Option<String>,

    /// Data source used for ingestion jobs
    #[serde(default)]
    pub data_source_id: Option<String>,

    /// Raw model id or fully-qualified model resource name
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Bucket holding the raw documents behind the knowledge base
    #[serde(default)]
    pub s3_bucket: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            knowledge_base_id: None,
            data_source_id: None,
            model_id: default_model_id(),
            s3_bucket: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

/// Provider endpoints and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Retrieve-and-generate runtime endpoint (derived from region if unset)
    #[serde(default)]
    pub runtime_endpoint: Option<String>,

    /// Knowledge-base control plane endpoint (derived from region if unset)
    #[serde(default)]
    pub agent_endpoint: Option<String>,

    /// Object store endpoint (derived from region if unset)
    #[serde(default)]
    pub s3_endpoint: Option<String>,

    /// Bearer API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            runtime_endpoint: None,
            agent_endpoint: None,
            s3_endpoint: None,
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ProviderConfig {
    pub fn runtime_url(&self, region: &str) -> String {
        self.runtime_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-agent-runtime.{}.amazonaws.com", region))
    }

    pub fn agent_url(&self, region: &str) -> String {
        self.agent_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-agent.{}.amazonaws.com", region))
    }

    pub fn s3_url(&self, region: &str) -> String {
        self.s3_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", region))
    }
}

/// A model family with a known-good sibling identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAlternative {
    /// Substring identifying the family in a configured model id
    pub family: String,

    /// Sibling model id to try when the configured one is rejected
    pub model_id: String,
}

/// Immutable settings handed to the query engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub region: String,
    pub knowledge_base_id: Option<String>,
    pub model_id: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model_alternatives: Vec<ModelAlternative>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_model_id() -> String {
    "openai.gpt-oss-120b-1:0".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_timeout() -> u64 {
    60
}

fn default_model_alternatives() -> Vec<ModelAlternative> {
    vec![ModelAlternative {
        family: "claude-3-5-sonnet".to_string(),
        model_id: "anthropic.claude-3-5-sonnet-20240620-v1:0".to_string(),
    }]
}

impl Config {
    /// Load config from the default path, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&Self::default_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config file, falling back to defaults when it does not exist
    pub fn load_file(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            tracing::debug!("Loaded configuration from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path (`KBCHAT_CONFIG` wins)
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("KBCHAT_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kb = &mut self.knowledge_base;
        if let Some(v) = lookup("AWS_REGION") {
            kb.region = v;
        }
        if let Some(v) = lookup("KNOWLEDGE_BASE_ID") {
            kb.knowledge_base_id = Some(v);
        }
        if let Some(v) = lookup("DATA_SOURCE_ID") {
            kb.data_source_id = Some(v);
        }
        if let Some(v) = lookup("MODEL_ID") {
            kb.model_id = v;
        }
        if let Some(v) = lookup("S3_BUCKET_NAME") {
            kb.s3_bucket = Some(v);
        }
        if let Some(v) = lookup("MAX_TOKENS") {
            kb.max_tokens = v
                .trim()
                .parse()
                .map_err(|_| KbChatError::Config(format!("MAX_TOKENS is not a number: {}", v)))?;
        }
        if let Some(v) = lookup("TEMPERATURE") {
            kb.temperature = v
                .trim()
                .parse()
                .map_err(|_| KbChatError::Config(format!("TEMPERATURE is not a number: {}", v)))?;
        }

        let provider = &mut self.provider;
        if let Some(v) = lookup("AWS_BEARER_TOKEN_BEDROCK") {
            provider.api_key = Some(v);
        }
        if let Some(v) = lookup("KBCHAT_RUNTIME_ENDPOINT") {
            provider.runtime_endpoint = Some(v);
        }
        if let Some(v) = lookup("KBCHAT_AGENT_ENDPOINT") {
            provider.agent_endpoint = Some(v);
        }
        if let Some(v) = lookup("KBCHAT_S3_ENDPOINT") {
            provider.s3_endpoint = Some(v);
        }
        if let Some(v) = lookup("KBCHAT_TIMEOUT_SECS") {
            provider.timeout_secs = v.trim().parse().map_err(|_| {
                KbChatError::Config(format!("KBCHAT_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }
        Ok(())
    }

    /// Validate static settings
    pub fn validate(&self) -> Result<()> {
        let kb = &self.knowledge_base;
        if !REGION_RE.is_match(&kb.region) {
            return Err(KbChatError::Config(format!(
                "Invalid AWS region format: {}",
                kb.region
            )));
        }
        if !(1..=100_000).contains(&kb.max_tokens) {
            return Err(KbChatError::Config(format!(
                "MAX_TOKENS must be between 1 and 100000, got: {}",
                kb.max_tokens
            )));
        }
        if !(0.0..=2.0).contains(&kb.temperature) {
            return Err(KbChatError::Config(format!(
                "TEMPERATURE must be between 0 and 2, got: {}",
                kb.temperature
            )));
        }
        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Settings the query engine needs
    pub fn engine_config(&self) -> EngineConfig {
        let kb = &self.knowledge_base;
        EngineConfig {
            region: kb.region.clone(),
            knowledge_base_id: kb.knowledge_base_id.clone(),
            model_id: kb.model_id.clone(),
            temperature: kb.temperature,
            max_tokens: kb.max_tokens,
            model_alternatives: self.model_alternatives.clone(),
        }
    }

    /// Copy safe for display: API key replaced
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.provider.api_key.is_some() {
            copy.provider.api_key = Some("********".to_string());
        }
        copy
    }
}
