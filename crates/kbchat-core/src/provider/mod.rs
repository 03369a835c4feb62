//! Provider collaborators
//!
//! The engine and the admin service talk to the provider only through the
//! traits below, so tests substitute in-memory fakes.

mod bedrock;
mod errors;
mod object_store;

pub use bedrock::BedrockClient;
pub use errors::{classify_error, ErrorKind, ProviderError, TRANSPORT_ERROR, VALIDATION_EXCEPTION};
pub use object_store::ObjectStoreClient;

use crate::query::{RetrieveAndGenerateRequest, RetrieveAndGenerateResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of a provider call
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Retrieve-and-generate capability
#[async_trait]
pub trait RetrieveAndGenerate: Send + Sync {
    async fn invoke_retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> ProviderResult<RetrieveAndGenerateResponse>;
}

/// Knowledge-base control plane
#[async_trait]
pub trait KnowledgeBaseAdmin: Send + Sync {
    async fn get_knowledge_base(&self, knowledge_base_id: &str)
        -> ProviderResult<KnowledgeBaseDescription>;

    async fn list_data_sources(&self, knowledge_base_id: &str)
        -> ProviderResult<Vec<DataSourceSummary>>;

    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
    ) -> ProviderResult<IngestionJob>;
}

/// Storage for the raw documents behind a knowledge base
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ProviderResult<()>;

    /// All objects under `prefix`, following continuation tokens
    async fn list_objects(&self, bucket: &str, prefix: &str) -> ProviderResult<Vec<ObjectSummary>>;
}

/// Knowledge base as described by the control plane
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBaseDescription {
    #[serde(default)]
    pub knowledge_base_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub storage_configuration: Option<StorageConfiguration>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl KnowledgeBaseDescription {
    pub fn storage_type(&self) -> Option<&str> {
        self.storage_configuration
            .as_ref()
            .map(|s| s.storage_type.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfiguration {
    #[serde(default, rename = "type")]
    pub storage_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceSummary {
    #[serde(default)]
    pub data_source_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// An ingestion job started for a data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionJob {
    #[serde(default)]
    pub ingestion_job_id: String,
    #[serde(default)]
    pub knowledge_base_id: String,
    #[serde(default)]
    pub data_source_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub started_at: Option<String>,
}

/// One stored object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}
