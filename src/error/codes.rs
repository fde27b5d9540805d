//! Standardized error codes for machine-parseable output.
//!
//! Error codes follow a numeric taxonomy:
//! - 1xx: Document errors
//! - 3xx: Config errors
//! - 6xx: Storage errors
//! - 8xx: Validation errors
//! - 9xx: Internal errors

use serde::{Deserialize, Serialize};

/// Standardized error codes for machine output.
///
/// Each variant maps to a numeric code (e.g., `DocumentNotFound` -> E101).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================
    // Document errors (1xx)
    // ========================================
    /// E101: Requested document or directory does not exist
    DocumentNotFound,
    /// E102: Document bytes are not valid UTF-8
    DocumentParseError,

    // ========================================
    // Config errors (3xx)
    // ========================================
    /// E302: Config file has invalid syntax or values
    ConfigInvalid,
    /// E304: Required config value is missing
    ConfigMissingRequired,

    // ========================================
    // Storage errors (6xx)
    // ========================================
    /// E602: Failed to write a revised document or proposal file
    StorageWriteError,
    /// E605: Serialization/deserialization failed
    SerializationError,

    // ========================================
    // Validation errors (8xx)
    // ========================================
    /// E801: One or more documents still have compliance gaps
    ValidationFailed,

    // ========================================
    // Internal errors (9xx)
    // ========================================
    /// E904: Internal assertion failed
    AssertionFailed,
    /// E905: An auto-fix introduced a gap that was not present before
    RegressionDetected,
    /// E906: IO operation failed
    IoError,
}

impl ErrorCode {
    /// Get the numeric error code (e.g., `DocumentNotFound` -> 101).
    #[must_use]
    pub const fn numeric(&self) -> u16 {
        match self {
            Self::DocumentNotFound => 101,
            Self::DocumentParseError => 102,

            Self::ConfigInvalid => 302,
            Self::ConfigMissingRequired => 304,

            Self::StorageWriteError => 602,
            Self::SerializationError => 605,

            Self::ValidationFailed => 801,

            Self::AssertionFailed => 904,
            Self::RegressionDetected => 905,
            Self::IoError => 906,
        }
    }

    /// Get the error code as a formatted string (e.g., "E101").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("E{}", self.numeric())
    }

    /// Get the default suggestion for this error code.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::DocumentNotFound => "Check the path. Directories are scanned for SKILL.md files",
            Self::DocumentParseError => "Re-save the file as UTF-8. Other documents in the batch are unaffected",
            Self::ConfigInvalid => "Check TOML syntax and values in the config file. Run `skill-audit rules` to see the active catalog",
            Self::ConfigMissingRequired => "Set the required config value in .skill-audit.toml or via SKILL_AUDIT_* environment variables",
            Self::StorageWriteError => "Check disk space and write permissions, or re-run with --dry-run",
            Self::SerializationError => "The report could not be serialized. Try a different --output-format",
            Self::ValidationFailed => "Review the residual gaps and proposals, apply the approved changes, then re-run",
            Self::AssertionFailed => "Internal assertion failed. This is a bug. Please report with full context",
            Self::RegressionDetected => "An auto-fix introduced a new gap. This is a bug in the fixer; re-run with --dry-run and report the document",
            Self::IoError => "File operation failed. Check path exists and permissions are correct",
        }
    }

    /// Check if this error is potentially recoverable by the user.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::DocumentNotFound
            | Self::DocumentParseError
            | Self::ConfigInvalid
            | Self::ConfigMissingRequired
            | Self::StorageWriteError
            | Self::ValidationFailed
            | Self::IoError => true,

            Self::SerializationError | Self::AssertionFailed | Self::RegressionDetected => false,
        }
    }

    /// Get the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.numeric() / 100 {
            1 => "document",
            3 => "config",
            6 => "storage",
            8 => "validation",
            9 => "internal",
            _ => "unknown",
        }
    }

    /// Iterate over all error codes.
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::DocumentNotFound,
            Self::DocumentParseError,
            Self::ConfigInvalid,
            Self::ConfigMissingRequired,
            Self::StorageWriteError,
            Self::SerializationError,
            Self::ValidationFailed,
            Self::AssertionFailed,
            Self::RegressionDetected,
            Self::IoError,
        ]
        .into_iter()
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code_string())
    }
}
