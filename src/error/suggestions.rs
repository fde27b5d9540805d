//! Context-aware error suggestions.
//!
//! Complements the static suggestions in the `codes` module with hints
//! that mention the offending path or key.

use serde_json::Value;

use super::codes::ErrorCode;

/// Generate a context-aware suggestion for an error.
///
/// Falls back to [`ErrorCode::suggestion`] when the context carries nothing
/// more specific.
pub fn suggest_for_error(code: ErrorCode, context: Option<&Value>) -> String {
    match code {
        ErrorCode::DocumentNotFound => suggest_document_not_found(context),
        ErrorCode::DocumentParseError => suggest_parse_error(context),
        ErrorCode::ConfigMissingRequired => suggest_config_missing(context),
        ErrorCode::RegressionDetected => suggest_regression(context),
        _ => code.suggestion().to_string(),
    }
}

fn context_str<'a>(context: Option<&'a Value>, key: &str) -> Option<&'a str> {
    context.and_then(|c| c.get(key)).and_then(Value::as_str)
}

fn suggest_document_not_found(context: Option<&Value>) -> String {
    match context_str(context, "path") {
        Some(path) => format!(
            "'{path}' does not exist. Pass a SKILL.md file or a directory containing skills/*/SKILL.md"
        ),
        None => ErrorCode::DocumentNotFound.suggestion().to_string(),
    }
}

fn suggest_parse_error(context: Option<&Value>) -> String {
    let path = context_str(context, "path");
    let offset = context.and_then(|c| c.get("valid_up_to")).and_then(Value::as_u64);
    match (path, offset) {
        (Some(path), Some(offset)) => format!(
            "'{path}' has an invalid byte sequence after byte {offset}. Re-save it as UTF-8"
        ),
        _ => ErrorCode::DocumentParseError.suggestion().to_string(),
    }
}

fn suggest_config_missing(context: Option<&Value>) -> String {
    match context_str(context, "config_key") {
        Some(key) => format!("Set `{key}` in .skill-audit.toml or the global config file"),
        None => ErrorCode::ConfigMissingRequired.suggestion().to_string(),
    }
}

fn suggest_regression(context: Option<&Value>) -> String {
    match context_str(context, "path") {
        Some(path) => format!(
            "Auto-fix introduced new gaps in '{path}'. Nothing was written for it; run `skill-audit fix --dry-run --diff {path}` and report the output"
        ),
        None => ErrorCode::RegressionDetected.suggestion().to_string(),
    }
}
