//! Knowledge-base administration
//!
//! Thin forwarders to the control plane and document store. Failures keep the
//! same error taxonomy as queries.

use crate::config::Config;
use crate::error::{KbChatError, Result};
use crate::provider::{BedrockClient, DocumentStore, KnowledgeBaseAdmin, ObjectStoreClient};
use crate::DOCUMENTS_PREFIX;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

pub use crate::provider::IngestionJob;

/// File extensions accepted for upload
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "md", "html", "csv"];

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

const MAX_FILENAME_CHARS: usize = 255;

/// A stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub key: String,
    pub size: u64,
}

/// Document listed from the store, prefix stripped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub size: u64,
}

/// Knowledge base status summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbStatus {
    pub knowledge_base_id: String,
    pub status: String,
    pub name: String,
    pub description: Option<String>,
    pub data_sources: usize,
    pub documents: usize,
    pub storage_type: Option<String>,
    pub created_at: Option<String>,
}

/// Upload, sync and status operations for one knowledge base
pub struct KnowledgeBaseService {
    knowledge_base_id: Option<String>,
    data_source_id: Option<String>,
    bucket: Option<String>,
    admin: Arc<dyn KnowledgeBaseAdmin>,
    store: Arc<dyn DocumentStore>,
}

impl KnowledgeBaseService {
    pub fn new(
        config: &Config,
        admin: Arc<dyn KnowledgeBaseAdmin>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        let non_blank = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            knowledge_base_id: non_blank(&config.knowledge_base.knowledge_base_id),
            data_source_id: non_blank(&config.knowledge_base.data_source_id),
            bucket: non_blank(&config.knowledge_base.s3_bucket),
            admin,
            store,
        }
    }

    /// Service backed by the HTTP clients
    pub fn from_config(config: &Config) -> Result<Self> {
        let admin = Arc::new(BedrockClient::from_config(config)?);
        let store = Arc::new(ObjectStoreClient::from_config(config)?);
        Ok(Self::new(config, admin, store))
    }

    fn knowledge_base_id(&self) -> Result<&str> {
        self.knowledge_base_id.as_deref().ok_or_else(|| {
            KbChatError::Config(
                "Knowledge base ID is not configured (set KNOWLEDGE_BASE_ID)".to_string(),
            )
        })
    }

    fn bucket(&self) -> Result<&str> {
        self.bucket.as_deref().ok_or_else(|| {
            KbChatError::Config("S3 bucket is not configured (set S3_BUCKET_NAME)".to_string())
        })
    }

    /// Upload one file under the documents prefix
    pub async fn upload_document(&self, path: &Path) -> Result<UploadedDocument> {
        let bucket = self.bucket()?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                KbChatError::Validation(format!("Not a file path: {}", path.display()))
            })?;
        if filename.chars().count() > MAX_FILENAME_CHARS {
            return Err(KbChatError::Validation(format!(
                "Filename too long (max {} characters)",
                MAX_FILENAME_CHARS
            )));
        }
        let extension = allowed_extension(path).ok_or_else(|| {
            KbChatError::Validation(format!(
                "File type not allowed: {} (allowed: {})",
                filename,
                ALLOWED_EXTENSIONS.join(", ")
            ))
        })?;

        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > MAX_UPLOAD_BYTES {
            return Err(KbChatError::Validation(format!(
                "File too large: {} bytes (max {} bytes)",
                metadata.len(),
                MAX_UPLOAD_BYTES
            )));
        }

        let body = tokio::fs::read(path).await?;
        let size = body.len() as u64;
        let key = document_key(&filename, &extension, chrono::Utc::now().timestamp());

        self.store
            .put_object(bucket, &key, body)
            .await
            .map_err(|e| e.into_error())?;

        tracing::info!("Uploaded {} as {} ({} bytes)", filename, key, size);
        Ok(UploadedDocument { key, size })
    }

    /// Start an ingestion job for the configured data source
    pub async fn trigger_sync(&self) -> Result<IngestionJob> {
        let knowledge_base_id = self.knowledge_base_id()?;
        let data_source_id = self.data_source_id.as_deref().ok_or_else(|| {
            KbChatError::Config("Data source ID is not configured (set DATA_SOURCE_ID)".to_string())
        })?;

        let job = self
            .admin
            .start_ingestion_job(knowledge_base_id, data_source_id)
            .await
            .map_err(|e| e.into_error())?;

        tracing::info!("Started ingestion job {} ({})", job.ingestion_job_id, job.status);
        Ok(job)
    }

    /// Knowledge base description with data-source and document counts.
    ///
    /// Counts degrade to 0 when they cannot be fetched.
    pub async fn get_status(&self) -> Result<KbStatus> {
        let knowledge_base_id = self.knowledge_base_id()?;
        let kb = self
            .admin
            .get_knowledge_base(knowledge_base_id)
            .await
            .map_err(|e| e.into_error())?;

        let data_sources = match self.admin.list_data_sources(knowledge_base_id).await {
            Ok(sources) => sources.len(),
            Err(e) => {
                tracing::warn!("Could not list data sources: {}", e);
                0
            }
        };

        let documents = match self.bucket.as_deref() {
            Some(bucket) => match self.store.list_objects(bucket, DOCUMENTS_PREFIX).await {
                Ok(objects) => objects.len(),
                Err(e) => {
                    tracing::warn!("Could not list documents: {}", e);
                    0
                }
            },
            None => 0,
        };

        let storage_type = kb.storage_type().map(str::to_string);
        Ok(KbStatus {
            knowledge_base_id: if kb.knowledge_base_id.is_empty() {
                knowledge_base_id.to_string()
            } else {
                kb.knowledge_base_id
            },
            status: kb.status,
            name: kb.name,
            description: kb.description,
            data_sources,
            documents,
            storage_type,
            created_at: kb.created_at,
        })
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>> {
        let bucket = self.bucket()?;
        let objects = self
            .store
            .list_objects(bucket, DOCUMENTS_PREFIX)
            .await
            .map_err(|e| e.into_error())?;

        Ok(objects
            .into_iter()
            .filter_map(|o| {
                let name = o.key.strip_prefix(DOCUMENTS_PREFIX)?.to_string();
                (!name.is_empty()).then_some(DocumentInfo { name, size: o.size })
            })
            .collect())
    }

    /// True when the knowledge base can be described. Never fails.
    pub async fn health_check(&self) -> bool {
        let Ok(knowledge_base_id) = self.knowledge_base_id() else {
            tracing::warn!("Health check skipped: knowledge base ID not configured");
            return false;
        };
        match self.admin.get_knowledge_base(knowledge_base_id).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                false
            }
        }
    }
}

fn allowed_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Replace anything outside `[A-Za-z0-9._-]` and strip leading dots
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = replaced.trim_start_matches('.');
    if trimmed.is_empty() {
        "document".to_string()
    } else {
        trimmed.to_string()
    }
}

fn document_key(filename: &str, extension: &str, timestamp: i64) -> String {
    let sanitized = sanitize_filename(filename);
    let suffix = format!(".{}", extension);
    let stem = sanitized
        .strip_suffix(&suffix)
        .or_else(|| {
            sanitized
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or(&sanitized);
    format!("{}{}_{}.{}", DOCUMENTS_PREFIX, stem, timestamp, extension)
}

/// Uploadable files under `root` (or `root` itself when it is a file)
pub fn collect_uploadable(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if allowed_extension(entry.path()).is_some() {
            files.push(entry.into_path());
        } else {
            tracing::debug!("Skipping {}", entry.path().display());
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{
        DataSourceSummary, KnowledgeBaseDescription, ObjectSummary, ProviderError, ProviderResult,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeAdmin {
        fail_data_sources: bool,
        unreachable: bool,
    }

    #[async_trait]
    impl KnowledgeBaseAdmin for FakeAdmin {
        async fn get_knowledge_base(&self, id: &str) -> ProviderResult<KnowledgeBaseDescription> {
            if self.unreachable {
                return Err(ProviderError::new("ResourceNotFoundException", "no such kb"));
            }
            Ok(KnowledgeBaseDescription {
                knowledge_base_id: id.to_string(),
                name: "docs".to_string(),
                status: "ACTIVE".to_string(),
                ..Default::default()
            })
        }

        async fn list_data_sources(&self, _id: &str) -> ProviderResult<Vec<DataSourceSummary>> {
            if self.fail_data_sources {
                return Err(ProviderError::new("ThrottlingException", "slow down"));
            }
            Ok(vec![DataSourceSummary::default(), DataSourceSummary::default()])
        }

        async fn start_ingestion_job(&self, kb: &str, ds: &str) -> ProviderResult<IngestionJob> {
            Ok(IngestionJob {
                ingestion_job_id: "JOB1".to_string(),
                knowledge_base_id: kb.to_string(),
                data_source_id: ds.to_string(),
                status: "STARTING".to_string(),
                started_at: None,
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<Vec<ObjectSummary>>,
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn put_object(&self, _bucket: &str, key: &str, body: Vec<u8>) -> ProviderResult<()> {
            self.objects.lock().unwrap().push(ObjectSummary {
                key: key.to_string(),
                size: body.len() as u64,
            });
            Ok(())
        }

        async fn list_objects(&self, _bucket: &str, prefix: &str) -> ProviderResult<Vec<ObjectSummary>> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.key.starts_with(prefix))
                .cloned()
                .collect())
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.knowledge_base.knowledge_base_id = Some("KB123".to_string());
        config.knowledge_base.data_source_id = Some("DS1".to_string());
        config.knowledge_base.s3_bucket = Some("docs".to_string());
        config
    }

    fn service(admin: FakeAdmin) -> (KnowledgeBaseService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (
            KnowledgeBaseService::new(&config(), Arc::new(admin), store.clone()),
            store,
        )
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("report 2024.pdf"), "report_2024.pdf");
        assert_eq!(sanitize_filename("../etc/passwd.txt"), "_etc_passwd.txt");
        assert_eq!(sanitize_filename("..."), "document");
    }

    #[test]
    fn test_document_key() {
        assert_eq!(
            document_key("Guide.PDF", "pdf", 1700000000),
            "documents/Guide_1700000000.pdf"
        );
        assert_eq!(
            document_key("notes.md", "md", 5),
            "documents/notes_5.md"
        );
    }

    #[tokio::test]
    async fn test_upload_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guide.md");
        std::fs::write(&path, "# Guide").unwrap();

        let (service, store) = service(FakeAdmin::default());
        let uploaded = service.upload_document(&path).await.unwrap();

        assert!(uploaded.key.starts_with("documents/guide_"));
        assert!(uploaded.key.ends_with(".md"));
        assert_eq!(uploaded.size, 7);
        assert_eq!(store.objects.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tool.exe");
        std::fs::write(&path, "MZ").unwrap();

        let (service, store) = service(FakeAdmin::default());
        let err = service.upload_document(&path).await.unwrap_err();
        assert!(matches!(err, KbChatError::Validation(_)));
        assert!(store.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_requires_data_source() {
        let mut config = config();
        config.knowledge_base.data_source_id = None;
        let service = KnowledgeBaseService::new(
            &config,
            Arc::new(FakeAdmin::default()),
            Arc::new(MemoryStore::default()),
        );
        assert!(matches!(
            service.trigger_sync().await,
            Err(KbChatError::Config(_))
        ));

        let (service, _) = service_default();
        let job = service.trigger_sync().await.unwrap();
        assert_eq!(job.ingestion_job_id, "JOB1");
        assert_eq!(job.data_source_id, "DS1");
    }

    fn service_default() -> (KnowledgeBaseService, Arc<MemoryStore>) {
        service(FakeAdmin::default())
    }

    #[tokio::test]
    async fn test_status_counts_degrade() {
        let (service, store) = service(FakeAdmin {
            fail_data_sources: true,
            ..Default::default()
        });
        store
            .put_object("docs", "documents/a_1.txt", b"a".to_vec())
            .await
            .unwrap();

        let status = service.get_status().await.unwrap();
        assert_eq!(status.status, "ACTIVE");
        assert_eq!(status.data_sources, 0);
        assert_eq!(status.documents, 1);
    }

    #[tokio::test]
    async fn test_list_documents_strips_prefix() {
        let (service, store) = service_default();
        store
            .put_object("docs", "documents/a_1.txt", b"abc".to_vec())
            .await
            .unwrap();
        store
            .put_object("docs", "other/b.txt", b"b".to_vec())
            .await
            .unwrap();

        let docs = service.list_documents().await.unwrap();
        assert_eq!(
            docs,
            vec![DocumentInfo {
                name: "a_1.txt".to_string(),
                size: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_health_check() {
        let (healthy, _) = service_default();
        assert!(healthy.health_check().await);

        let (unhealthy, _) = service(FakeAdmin {
            unreachable: true,
            ..Default::default()
        });
        assert!(!unhealthy.health_check().await);
    }

    #[test]
    fn test_collect_uploadable_skips_hidden_and_unknown() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("b.exe"), "b").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git").join("c.txt"), "c").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("d.PDF"), "d").unwrap();

        let files = collect_uploadable(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.md", "d.PDF"]);
    }
}
