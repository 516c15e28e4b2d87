//! Error types for notegarden.
//!
//! Library crates use [`GardenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Severity is part of the taxonomy: [`GardenError::InvalidNode`] is absorbed
//! per node by the source adapters, while [`GardenError::Retrieval`] and
//! [`GardenError::ArtifactIo`] abort the build.

use std::path::PathBuf;

/// Top-level error type for all notegarden operations.
#[derive(Debug, thiserror::Error)]
pub enum GardenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A content node is malformed for its kind (e.g. a remote block without a uid).
    #[error("invalid node {id}: {reason}")]
    InvalidNode { id: String, reason: String },

    /// The content query boundary could not be reached or returned malformed data.
    #[error("retrieval error: {message}")]
    Retrieval { message: String },

    /// Copying or deleting a generated artifact failed.
    #[error("artifact I/O error at {path:?}: {source}")]
    ArtifactIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Network/HTTP error while fetching a remote graph export.
    #[error("network error: {0}")]
    Network(String),

    /// Export parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Node store error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing template binding, invalid format, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, GardenError>;

impl GardenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-node error for the given node id.
    pub fn invalid_node(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a retrieval error, keeping the underlying cause text verbatim.
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Self::Retrieval {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a `std::io::Error` raised while provisioning a generated artifact.
    pub fn artifact_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ArtifactIo {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must abort the build.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidNode { .. })
    }
}
