//! Error types for kbchat

use thiserror::Error;

/// Result type alias using KbChatError
pub type Result<T> = std::result::Result<T, KbChatError>;

/// Error type alias for convenience
pub type Error = KbChatError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
    pub const AUTH_ERROR: i32 = 4;
}

/// Remediation hint attached to every provider authentication failure
pub const AUTH_REMEDIATION_HINT: &str = "Please configure AWS credentials using one of the following methods:\n  \
1. AWS credentials file: ~/.aws/credentials\n  \
2. Environment variables: AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY\n  \
3. IAM role (if running on EC2/ECS/Lambda)\n  \
4. AWS SSO: aws sso login\n  \
5. AWS CLI: aws configure";

/// Main error type for kbchat
#[derive(Debug, Error)]
pub enum KbChatError {
    /// Missing or invalid static configuration, raised before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential or signature failure reported by the provider
    #[error("Authentication error ({code}): {message}\n{hint}", hint = AUTH_REMEDIATION_HINT)]
    ProviderAuth { code: String, message: String },

    /// Model identifier rejected and every alternative exhausted
    #[error(
        "Provider error ({code}): {message}. Tried {} model identifier(s) in {elapsed_ms}ms: {}",
        .attempted.len(),
        .attempted.join(", ")
    )]
    ProviderModel {
        code: String,
        message: String,
        attempted: Vec<String>,
        elapsed_ms: u64,
    },

    /// Provider rejected the request for a reason unrelated to the model
    #[error("Provider validation error ({code}): {message}")]
    ProviderValidation { code: String, message: String },

    /// Any other provider failure
    #[error("Provider error ({code}): {message}")]
    Provider { code: String, message: String },

    /// Malformed request caught before dispatch (programming error)
    #[error("Request precondition violated: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl KbChatError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Validation(_) => exit_codes::INVALID_INPUT,
            Self::ProviderAuth { .. } => exit_codes::AUTH_ERROR,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Provider error code, when the failure came from the provider
    pub fn provider_code(&self) -> Option<&str> {
        match self {
            Self::ProviderAuth { code, .. }
            | Self::ProviderModel { code, .. }
            | Self::ProviderValidation { code, .. }
            | Self::Provider { code, .. } => Some(code),
            _ => None,
        }
    }

    /// True for the model-rejection class that the resolver retries
    pub fn is_retryable_model_error(&self) -> bool {
        matches!(self, Self::ProviderModel { .. })
    }
}
