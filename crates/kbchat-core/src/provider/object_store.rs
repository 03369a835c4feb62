//! S3-compatible object store client

use super::{DocumentStore, ObjectSummary, ProviderError, ProviderResult};
use crate::config::Config;
use crate::error::{KbChatError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;

lazy_static! {
    static ref CONTENTS_RE: Regex = Regex::new(r"(?s)<Contents>(.*?)</Contents>").unwrap();
    static ref KEY_RE: Regex = Regex::new(r"<Key>(.*?)</Key>").unwrap();
    static ref SIZE_RE: Regex = Regex::new(r"<Size>(\d+)</Size>").unwrap();
    static ref TRUNCATED_RE: Regex = Regex::new(r"<IsTruncated>\s*true\s*</IsTruncated>").unwrap();
    static ref TOKEN_RE: Regex =
        Regex::new(r"<NextContinuationToken>(.*?)</NextContinuationToken>").unwrap();
    static ref ERROR_CODE_RE: Regex = Regex::new(r"<Code>(.*?)</Code>").unwrap();
    static ref ERROR_MESSAGE_RE: Regex = Regex::new(r"(?s)<Message>(.*?)</Message>").unwrap();
}

/// Path-style S3 REST client
pub struct ObjectStoreClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

/// One page of a ListObjectsV2 response
#[derive(Debug, Default, PartialEq)]
struct ListPage {
    objects: Vec<ObjectSummary>,
    next_token: Option<String>,
}

impl ObjectStoreClient {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(KbChatError::Http)?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.provider.s3_url(&config.knowledge_base.region),
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

    async fn error_from(response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        parse_error(status, &body)
    }
}

fn parse_error(status: u16, body: &str) -> ProviderError {
    match ERROR_CODE_RE.captures(body) {
        Some(code) => {
            let message = ERROR_MESSAGE_RE
                .captures(body)
                .map(|m| unescape(&m[1]))
                .unwrap_or_default();
            ProviderError {
                code: code[1].to_string(),
                message,
                status: Some(status),
            }
        }
        None => ProviderError::from_http(status, None, body),
    }
}

fn parse_list_page(body: &str) -> ListPage {
    let objects = CONTENTS_RE
        .captures_iter(body)
        .filter_map(|entry| {
            let entry = &entry[1];
            let key = unescape(&KEY_RE.captures(entry)?[1]);
            let size = SIZE_RE
                .captures(entry)
                .and_then(|s| s[1].parse().ok())
                .unwrap_or(0);
            Some(ObjectSummary { key, size })
        })
        .collect();

    let next_token = if TRUNCATED_RE.is_match(body) {
        TOKEN_RE.captures(body).map(|t| unescape(&t[1]))
    } else {
        None
    };

    ListPage { objects, next_token }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl DocumentStore for ObjectStoreClient {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> ProviderResult<()> {
        let url = format!("{}/{}/{}", self.endpoint, bucket, key);
        let size = body.len();
        let response = self
            .authorize(self.http_client.put(&url).body(body))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        tracing::debug!("Stored {} ({} bytes) in {}", key, size, bucket);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> ProviderResult<Vec<ObjectSummary>> {
        let url = format!("{}/{}", self.endpoint, bucket);
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![("list-type", "2".to_string()), ("prefix", prefix.to_string())];
            if let Some(ref t) = token {
                query.push(("continuation-token", t.clone()));
            }

            let response = self
                .authorize(self.http_client.get(&url).query(&query))
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(Self::error_from(response).await);
            }

            let body = response.text().await?;
            let page = parse_list_page(&body);
            objects.extend(page.objects);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!("Listed {} objects under {}/{}", objects.len(), bucket, prefix);
        Ok(objects)
    }
}
