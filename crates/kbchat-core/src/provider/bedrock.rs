//! HTTP client for the knowledge-base runtime and control plane

use super::{
    DataSourceSummary, IngestionJob, KnowledgeBaseAdmin, KnowledgeBaseDescription, ProviderError,
    ProviderResult, RetrieveAndGenerate,
};
use crate::config::Config;
use crate::error::{KbChatError, Result};
use crate::query::{RetrieveAndGenerateRequest, RetrieveAndGenerateResponse};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";
const MAX_DATA_SOURCES: u32 = 100;

/// Bedrock runtime and agent client
pub struct BedrockClient {
    http_client: reqwest::Client,
    runtime_url: String,
    agent_url: String,
    api_key: Option<String>,
}

impl BedrockClient {
    pub fn new(
        runtime_url: impl Into<String>,
        agent_url: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(KbChatError::Http)?;

        Ok(Self {
            http_client,
            runtime_url: runtime_url.into().trim_end_matches('/').to_string(),
            agent_url: agent_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let region = &config.knowledge_base.region;
        Self::new(
            config.provider.runtime_url(region),
            config.provider.agent_url(region),
            config.provider.api_key.clone(),
            config.provider.timeout_secs,
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref api_key) => req.header("Authorization", format!("Bearer {}", api_key)),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ProviderResult<T> {
        let start = Instant::now();
        let response = self.authorize(req).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_type = response
                .headers()
                .get(ERROR_TYPE_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response.text().await.unwrap_or_default();
            let err = ProviderError::from_http(status.as_u16(), error_type.as_deref(), &body);
            tracing::debug!(
                "Provider call failed after {}ms: {}",
                start.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        let parsed = response.json::<T>().await?;
        tracing::debug!("Provider call completed in {}ms", start.elapsed().as_millis());
        Ok(parsed)
    }
}

#[async_trait]
impl RetrieveAndGenerate for BedrockClient {
    async fn invoke_retrieve_and_generate(
        &self,
        request: &RetrieveAndGenerateRequest,
    ) -> ProviderResult<RetrieveAndGenerateResponse> {
        let url = format!("{}/retrieveAndGenerate", self.runtime_url);
        self.send(self.http_client.post(&url).json(request)).await
    }
}

#[async_trait]
impl KnowledgeBaseAdmin for BedrockClient {
    async fn get_knowledge_base(
        &self,
        knowledge_base_id: &str,
    ) -> ProviderResult<KnowledgeBaseDescription> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct GetKnowledgeBaseResponse {
            knowledge_base: KnowledgeBaseDescription,
        }

        let url = format!("{}/knowledgebases/{}", self.agent_url, knowledge_base_id);
        let response: GetKnowledgeBaseResponse = self.send(self.http_client.get(&url)).await?;
        Ok(response.knowledge_base)
    }

    async fn list_data_sources(
        &self,
        knowledge_base_id: &str,
    ) -> ProviderResult<Vec<DataSourceSummary>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct ListDataSourcesResponse {
            #[serde(default)]
            data_source_summaries: Vec<DataSourceSummary>,
        }

        let url = format!(
            "{}/knowledgebases/{}/datasources/",
            self.agent_url, knowledge_base_id
        );
        let body = serde_json::json!({ "maxResults": MAX_DATA_SOURCES });
        let response: ListDataSourcesResponse =
            self.send(self.http_client.post(&url).json(&body)).await?;
        Ok(response.data_source_summaries)
    }

    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
    ) -> ProviderResult<IngestionJob> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct StartIngestionJobResponse {
            ingestion_job: IngestionJob,
        }

        let url = format!(
            "{}/knowledgebases/{}/datasources/{}/ingestionjobs/",
            self.agent_url, knowledge_base_id, data_source_id
        );
        let response: StartIngestionJobResponse = self
            .send(self.http_client.put(&url).json(&serde_json::json!({})))
            .await?;
        Ok(response.ingestion_job)
    }
}
