//! Provider error normalization and classification

use crate::error::KbChatError;
use serde_json::Value;
use std::fmt;

/// Error codes signalling credential or signature problems
const AUTH_CODES: &[&str] = &[
    "UnrecognizedClientException",
    "InvalidClientTokenId",
    "SignatureDoesNotMatch",
    "InvalidSignatureException",
    "ExpiredTokenException",
    "MissingAuthenticationTokenException",
];

/// Error codes for throttling and service-side faults
const TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "ServiceUnavailableException",
    "InternalServerException",
    "ServiceQuotaExceededException",
];

/// Words in a validation message that point at the model identifier
const MODEL_HINTS: &[&str] = &["invalid", "model", "identifier"];

pub const VALIDATION_EXCEPTION: &str = "ValidationException";
pub const TRANSPORT_ERROR: &str = "TransportError";

/// Raw failure reported by a provider collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
    /// HTTP status, absent for transport failures
    pub status: Option<u16>,
}

/// Internal classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    ValidationModel,
    ValidationOther,
    Transient,
    Unknown,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Failure before any HTTP status was received
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(TRANSPORT_ERROR, message)
    }

    /// Build from an HTTP error response
    ///
    /// The code comes from the `x-amzn-ErrorType` header when present, else from
    /// the body's `__type`/`code` field. The message comes from the body's
    /// `message` field, else the raw body, else the status text.
    pub fn from_http(status: u16, error_type: Option<&str>, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();

        let code = error_type
            .map(|t| t.split(':').next().unwrap_or(t).trim().to_string())
            .filter(|c| !c.is_empty())
            .or_else(|| {
                let json = json.as_ref()?;
                let raw = json
                    .get("__type")
                    .or_else(|| json.get("code"))
                    .or_else(|| json.get("Code"))?
                    .as_str()?;
                Some(raw.rsplit('#').next().unwrap_or(raw).to_string())
            })
            .unwrap_or_else(|| format!("HTTP{}", status));

        let message = json
            .as_ref()
            .and_then(|j| j.get("message").or_else(|| j.get("Message")))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown error")
                    .to_string()
            });

        Self {
            code,
            message,
            status: Some(status),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        classify_error(self)
    }

    /// Map into the crate taxonomy; model rejections are not retried here
    pub fn into_error(self) -> KbChatError {
        match self.kind() {
            ErrorKind::Auth => KbChatError::ProviderAuth {
                code: self.code,
                message: self.message,
            },
            ErrorKind::ValidationModel | ErrorKind::ValidationOther => {
                KbChatError::ProviderValidation {
                    code: self.code,
                    message: self.message,
                }
            }
            ErrorKind::Transient | ErrorKind::Unknown => KbChatError::Provider {
                code: self.code,
                message: self.message,
            },
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self {
                code: format!("HTTP{}", status.as_u16()),
                message: e.to_string(),
                status: Some(status.as_u16()),
            },
            None => Self::transport(e.to_string()),
        }
    }
}

/// Classify a provider failure
pub fn classify_error(error: &ProviderError) -> ErrorKind {
    let code = error.code.as_str();

    if AUTH_CODES.contains(&code) {
        return ErrorKind::Auth;
    }

    if code == VALIDATION_EXCEPTION {
        let message = error.message.to_lowercase();
        return if MODEL_HINTS.iter().any(|hint| message.contains(hint)) {
            ErrorKind::ValidationModel
        } else {
            ErrorKind::ValidationOther
        };
    }

    if TRANSIENT_CODES.contains(&code) || code == TRANSPORT_ERROR {
        return ErrorKind::Transient;
    }

    ErrorKind::Unknown
}
