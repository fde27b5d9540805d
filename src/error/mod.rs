//! Error handling for skill-audit.
//!
//! This module provides:
//! - [`AuditError`]: The main error enum for all audit operations
//! - [`ErrorCode`]: Standardized error codes for machine parsing
//! - [`StructuredError`]: Rich error type with suggestions and context

mod codes;
mod suggestions;

use std::io;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::audit::parser::ParseError;

pub use codes::ErrorCode;
pub use suggestions::suggest_for_error;

/// Main error type for skill-audit operations.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Missing required config: {0}")]
    MissingConfig(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Write failed for {path}: {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Invalid state transition for {path}: {from} -> {to}")]
    InvalidTransition {
        path: String,
        from: String,
        to: String,
    },

    #[error("Auto-fix regression in {path}: {}", .codes.join(", "))]
    RegressionDetected { path: String, codes: Vec<String> },
}

impl AuditError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io(_) => ErrorCode::IoError,
            Self::Parse(_) => ErrorCode::DocumentParseError,
            Self::DocumentNotFound(_) => ErrorCode::DocumentNotFound,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Config(_) => ErrorCode::ConfigInvalid,
            Self::MissingConfig(_) => ErrorCode::ConfigMissingRequired,
            Self::ValidationFailed(_) => ErrorCode::ValidationFailed,
            Self::WriteFailed { .. } => ErrorCode::StorageWriteError,
            Self::InvalidTransition { .. } => ErrorCode::AssertionFailed,
            Self::RegressionDetected { .. } => ErrorCode::RegressionDetected,
        }
    }

    /// Get context information for this error as JSON.
    #[must_use]
    pub fn context(&self) -> Option<Value> {
        match self {
            Self::Parse(ParseError::InvalidEncoding {
                path, valid_up_to, ..
            }) => Some(serde_json::json!({ "path": path, "valid_up_to": valid_up_to })),
            Self::DocumentNotFound(path) => Some(serde_json::json!({ "path": path })),
            Self::MissingConfig(key) => Some(serde_json::json!({ "config_key": key })),
            Self::WriteFailed { path, reason } => {
                Some(serde_json::json!({ "path": path, "reason": reason }))
            }
            Self::InvalidTransition { path, from, to } => {
                Some(serde_json::json!({ "path": path, "from": from, "to": to }))
            }
            Self::RegressionDetected { path, codes } => {
                Some(serde_json::json!({ "path": path, "codes": codes }))
            }
            _ => None,
        }
    }

    /// Convert this error to a structured error.
    #[must_use]
    pub fn to_structured(&self) -> StructuredError {
        StructuredError::from_audit_error(self)
    }
}

/// A structured error with machine-readable code, suggestion, and context.
///
/// Emitted in machine output mode so callers can act on failures
/// without scraping messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    /// The error code (e.g., "DOCUMENT_PARSE_ERROR")
    pub code: ErrorCode,

    /// The numeric error code (e.g., 102)
    pub numeric_code: u16,

    /// Human-readable error message
    pub message: String,

    /// Actionable suggestion for recovery
    pub suggestion: String,

    /// Additional context for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Whether this error is potentially recoverable by the user
    pub recoverable: bool,

    /// Error category (e.g., "document", "config")
    pub category: String,
}

impl StructuredError {
    /// Create a new structured error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            numeric_code: code.numeric(),
            suggestion: code.suggestion().to_string(),
            context: None,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
            code,
            message: message.into(),
        }
    }

    /// Create a structured error from an [`AuditError`].
    #[must_use]
    pub fn from_audit_error(err: &AuditError) -> Self {
        let code = err.code();
        let context = err.context();
        let suggestion = suggest_for_error(code, context.as_ref());

        Self {
            code,
            numeric_code: code.numeric(),
            message: err.to_string(),
            suggestion,
            context,
            recoverable: code.is_recoverable(),
            category: code.category().to_string(),
        }
    }

    /// Add context to this error.
    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self.suggestion = suggest_for_error(self.code, self.context.as_ref());
        self
    }
}

impl std::fmt::Display for StructuredError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<&AuditError> for StructuredError {
    fn from(err: &AuditError) -> Self {
        Self::from_audit_error(err)
    }
}

/// Result type alias using [`AuditError`].
pub type Result<T> = std::result::Result<T, AuditError>;
