use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for blogpatch operations
#[derive(Debug, Error)]
pub enum PatchError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Server URL not configured. Run 'blogpatch config --server <URL>' first.")]
    ServerNotConfigured,

    // Transport errors
    #[error("Operation channel is not open")]
    ChannelUnavailable,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server rejected request ({status}): {msg}")]
    Api { status: i64, msg: String },

    // Protocol errors
    #[error("Version gap: expected {expected}, got {actual}")]
    VersionGap { expected: i64, actual: i64 },

    #[error("Duplicate {field} operation in cycle {version}")]
    DuplicateOperation { field: String, version: i64 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Unknown operate type code {0}")]
    UnknownOperateType(i32),
}

/// Result type alias for blogpatch operations
pub type Result<T> = std::result::Result<T, PatchError>;

/// A serializable representation of PatchError for IPC (e.g., a web view host)
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&PatchError> for SerializableError {
    fn from(err: &PatchError) -> Self {
        let kind = match err {
            PatchError::Io(_) => "Io",
            PatchError::FileRead { .. } => "FileRead",
            PatchError::FileWrite { .. } => "FileWrite",
            PatchError::Json(_) => "Json",
            PatchError::ConfigParse(_) => "ConfigParse",
            PatchError::ConfigSerialize(_) => "ConfigSerialize",
            PatchError::NoConfigDir => "NoConfigDir",
            PatchError::ServerNotConfigured => "ServerNotConfigured",
            PatchError::ChannelUnavailable => "ChannelUnavailable",
            PatchError::Transport(_) => "Transport",
            PatchError::Api { .. } => "Api",
            PatchError::VersionGap { .. } => "VersionGap",
            PatchError::DuplicateOperation { .. } => "DuplicateOperation",
            PatchError::InvalidOperation(_) => "InvalidOperation",
            PatchError::UnknownField(_) => "UnknownField",
            PatchError::UnknownOperateType(_) => "UnknownOperateType",
        }
        .to_string();

        let path = match err {
            PatchError::FileRead { path, .. } => Some(path.clone()),
            PatchError::FileWrite { path, .. } => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<PatchError> for SerializableError {
    fn from(err: PatchError) -> Self {
        SerializableError::from(&err)
    }
}

impl PatchError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// Whether the error came from the network boundary (pull/push/channel).
    ///
    /// These are reported to the user as a transient notification; they never
    /// leave the in-memory document half-updated.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            PatchError::ChannelUnavailable | PatchError::Transport(_) | PatchError::Api { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializable_kind_and_message() {
        let err = PatchError::Api {
            status: 500,
            msg: "blog locked".to_string(),
        };
        let ser = err.to_serializable();
        assert_eq!(ser.kind, "Api");
        assert!(ser.message.contains("blog locked"));
        assert!(ser.path.is_none());
    }

    #[test]
    fn test_network_classification() {
        assert!(PatchError::ChannelUnavailable.is_network());
        assert!(PatchError::Transport("reset".into()).is_network());
        assert!(!PatchError::UnknownField("x".into()).is_network());
    }
}
