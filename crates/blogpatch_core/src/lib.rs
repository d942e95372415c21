#![doc = include_str!("../README.md")]

/// Sync configuration (TOML)
pub mod config;

/// The editable document, its fields and sensitive spans
pub mod document;

/// Error (common error types)
pub mod error;

/// Operation kinds, codes and the wire message
pub mod operation;

/// Character-offset string helpers
pub mod text;

/// Prefix/suffix operation classifier
pub mod classify;

/// Paragraph decomposition of the content field
pub mod paragraph;

/// Sensitive-span reconciliation
pub mod reconcile;

/// Composition/pull gate and version counter
pub mod gate;

/// Per-field change subscriptions
pub mod watch;

/// Operation channel and document API transports
pub mod transport;

/// Edit session (watch, classify, dispatch)
pub mod session;

/// Receiving side that replays the operation stream
pub mod replica;

pub use document::{EditableDocument, Field, FieldValue, SensitiveSpan, SpanKind};
pub use error::{PatchError, Result};
pub use operation::{EditOperation, OperateTypeCode, OperationKind};
pub use session::{DispatchOutcome, EditSession, TransmissionStatus};

#[cfg(test)]
pub mod test_utils;
