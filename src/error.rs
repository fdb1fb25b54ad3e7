use std::path::PathBuf;

use thiserror::Error;

use crate::languages::LanguageKind;

/// Failures a tool call can report back to the caller.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error(
        "invalid {kind} language code '{code}'; valid codes: {}",
        valid.join(", ")
    )]
    InvalidLanguageCode {
        kind: LanguageKind,
        code: String,
        valid: Vec<String>,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool '{0}' is already registered")]
    DuplicateToolName(String),

    #[error("failed to fetch {kind} languages: {message}")]
    UpstreamUnavailable { kind: LanguageKind, message: String },

    #[error("{0}")]
    UpstreamError(String),

    #[error("{}: {message}", path.display())]
    DocumentIoError { path: PathBuf, message: String },
}

impl ToolError {
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        ToolError::InvalidArguments(message.into())
    }

    pub(crate) fn document_io(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ToolError::DocumentIoError {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Failures raised by the DeepL HTTP client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to DeepL failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("DeepL API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("unexpected DeepL response: {0}")]
    Decode(String),

    #[error("document translation failed: {0}")]
    DocumentFailed(String),
}

impl From<ApiError> for ToolError {
    fn from(err: ApiError) -> Self {
        ToolError::UpstreamError(err.to_string())
    }
}
