//! kbchat Core Library
//!
//! Query orchestration for knowledge-base question answering.
//!
//! # Features
//! - Keyword query classification and conversation-aware question enhancement
//! - Model identifier resolution with bounded, deduplicated fallback candidates
//! - Retrieve-and-generate request building with a fixed prompt pair
//! - Normalization of provider responses and errors into a stable taxonomy
//! - Knowledge-base administration pass-throughs (upload, sync, status)

pub mod admin;
pub mod config;
pub mod error;
pub mod provider;
pub mod query;

pub use admin::{
    DocumentInfo, IngestionJob, KbStatus, KnowledgeBaseService, UploadedDocument,
    ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES,
};
pub use config::{Config, EngineConfig, KnowledgeBaseConfig, ModelAlternative, ProviderConfig};
pub use error::{Error, KbChatError, Result};
pub use provider::{
    classify_error, BedrockClient, DocumentStore, ErrorKind, KnowledgeBaseAdmin,
    ObjectStoreClient, ProviderError, RetrieveAndGenerate,
};
pub use query::{
    classify, enhance, ConversationExchange, ModelIdentifier, ModelResolver, QueryEngine,
    QueryRequest, QueryResult, QueryType, Source,
};

/// Object key prefix under which uploaded documents are stored
pub const DOCUMENTS_PREFIX: &str = "documents/";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "kbchat";
