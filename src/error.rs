//! Error types for the Gemini tools MCP server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Hint shown when the Gemini CLI rejects the stored credentials.
pub const AUTH_HINT: &str = "Please run 'gemini auth login' to authenticate.";

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("File path '{path}' is outside allowed directories. Allowed: {allowed:?}")]
    PathOutsideSandbox { path: String, allowed: Vec<PathBuf> },

    #[error("File does not exist: {0}")]
    PathNotFound(String),

    #[error("Not a regular file: {0}")]
    NotAFile(String),

    #[error("Failed to find gemini executable '{0}' in PATH")]
    GeminiNotFound(String),

    #[error("Gemini CLI authentication error: {0}")]
    AuthenticationRequired(String),

    #[error("Gemini CLI error (exit code {code:?}): {message}")]
    CliFailure { code: Option<i32>, message: String },

    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Gemini CLI did not finish within {0:?}")]
    ProcessTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Machine-readable classification of a failed tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PathOutsideSandbox,
    PathNotFound,
    NotAFile,
    BinaryNotFound,
    AuthenticationRequired,
    ExternalToolFailure,
    MissingParameter,
    Timeout,
    Io,
}

impl GeminiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeminiError::PathOutsideSandbox { .. } => ErrorKind::PathOutsideSandbox,
            GeminiError::PathNotFound(_) => ErrorKind::PathNotFound,
            GeminiError::NotAFile(_) => ErrorKind::NotAFile,
            GeminiError::GeminiNotFound(_) => ErrorKind::BinaryNotFound,
            GeminiError::AuthenticationRequired(_) => ErrorKind::AuthenticationRequired,
            GeminiError::CliFailure { .. } => ErrorKind::ExternalToolFailure,
            GeminiError::MissingParameter(_) => ErrorKind::MissingParameter,
            GeminiError::ProcessTimeout(_) => ErrorKind::Timeout,
            GeminiError::Io(_) => ErrorKind::Io,
        }
    }

    /// User-facing remediation for this failure.
    pub fn hint(&self) -> &'static str {
        match self {
            GeminiError::PathOutsideSandbox { .. } => {
                "Restrict file access to an allowed directory, or add the directory to GEMINI_MCP_ALLOWED_DIRS."
            }
            GeminiError::PathNotFound(_) => "Check that the file exists and the path is spelled correctly.",
            GeminiError::NotAFile(_) => "Pass individual files, not directories.",
            GeminiError::GeminiNotFound(_) => {
                "Install Gemini CLI and make sure it is on PATH (check with `which gemini`)."
            }
            GeminiError::AuthenticationRequired(_) => AUTH_HINT,
            GeminiError::CliFailure { .. } => "Check the Gemini CLI error message and retry.",
            GeminiError::MissingParameter(_) => "Provide the missing parameter and call the tool again.",
            GeminiError::ProcessTimeout(_) => {
                "Reduce the size of the request or raise GEMINI_MCP_TIMEOUT_SECS."
            }
            GeminiError::Io(_) => "Check file permissions and available disk space.",
        }
    }
}

pub type Result<T> = std::result::Result<T, GeminiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::AuthenticationRequired).unwrap();
        assert_eq!(json, "\"authentication_required\"");
    }

    #[test]
    fn test_missing_binary_maps_to_binary_not_found() {
        let err = GeminiError::GeminiNotFound("gemini".to_string());
        assert_eq!(err.kind(), ErrorKind::BinaryNotFound);
        assert!(err.hint().contains("PATH"));
    }

    #[test]
    fn test_auth_error_carries_login_hint() {
        let err = GeminiError::AuthenticationRequired("not authenticated".to_string());
        assert_eq!(err.hint(), AUTH_HINT);
    }

    #[test]
    fn test_io_error_converts() {
        let err: GeminiError = std::io::Error::other("boom").into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
