//! The JSON envelope printed for every invocation.

use std::path::Path;

use serde::Serialize;

use crate::error::ErrorKind;

/// Outcome of one conversion attempt, serialized as the tool's only output.
///
/// Built only through [`ConversionReport::converted`] and
/// [`ConversionReport::failed`] (or the driver shortcuts on top of `failed`),
/// so `markdown_content` and `error` are never both set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    pub markdown_content: Option<String>,
    pub title: Option<String>,
    pub error: Option<ErrorRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    pub traceback: Option<String>,
}

/// Base name of `path`, falling back to the path as given when it has none
/// (e.g. `..` or `/`).
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Extension of `path` with its leading dot, or an empty string.
pub fn dotted_extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default()
}

impl ConversionReport {
    pub fn converted(
        filename: String,
        file_extension: String,
        markdown: String,
        title: String,
    ) -> Self {
        Self {
            success: true,
            filename: Some(filename),
            file_extension: Some(file_extension),
            markdown_content: Some(markdown),
            title: Some(title),
            error: None,
        }
    }

    pub fn failed(
        filename: Option<String>,
        file_extension: Option<String>,
        kind: ErrorKind,
        message: String,
        traceback: Option<String>,
    ) -> Self {
        Self {
            success: false,
            filename,
            file_extension,
            markdown_content: None,
            title: None,
            error: Some(ErrorRecord {
                kind,
                message,
                traceback,
            }),
        }
    }

    /// Wrong number of command-line arguments.
    pub fn argument_error() -> Self {
        Self::failed(
            None,
            None,
            ErrorKind::ArgumentError,
            "Usage: docmd <file_path>".to_string(),
            None,
        )
    }

    /// The path given on the command line does not exist.
    pub fn file_not_found(path: &Path) -> Self {
        Self::failed(
            Some(file_name_of(path)),
            None,
            ErrorKind::FileNotFoundError,
            format!("File not found: {}", path.display()),
            None,
        )
    }

    pub fn to_compact(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Two-space indented rendering.
    pub fn to_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
