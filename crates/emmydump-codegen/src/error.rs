//! Error types for annotation generation
//!
//! Two levels:
//! - `FormatError` is raised while rendering one declaration and only ever
//!   costs that declaration
//! - `CodegenError` aborts the whole dump (directory creation, file writes)

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

impl CodegenError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CodegenError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Malformed type '{type_name}': {reason}")]
    MalformedType { type_name: String, reason: String },

    #[error("Empty {what} name")]
    EmptyName { what: &'static str },

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),
}

impl FormatError {
    pub fn malformed(type_name: &str, reason: impl Into<String>) -> Self {
        FormatError::MalformedType {
            type_name: type_name.to_string(),
            reason: reason.into(),
        }
    }
}
