//! Shared fixtures for unit tests.

use std::future::Future;

use crate::document::{EditableDocument, STATUS_SENSITIVE_FILTER, SensitiveSpan, SpanKind};
use crate::session::EditSession;
use crate::transport::{MemoryChannel, MemoryDocumentApi};

pub(crate) fn block_on_test<F: Future>(f: F) -> F::Output {
    futures_lite::future::block_on(f)
}

/// A document under review with one span per text field.
pub(crate) fn reviewed_document() -> EditableDocument {
    EditableDocument {
        id: Some(1),
        user_id: Some(10),
        title: "Hello sensitive world".to_string(),
        description: "A risky description".to_string(),
        content: "para one\n\npara two".to_string(),
        link: String::new(),
        status: STATUS_SENSITIVE_FILTER,
        sensitive_content_list: vec![
            SensitiveSpan::new(6, 15, SpanKind::Title),
            SensitiveSpan::new(2, 7, SpanKind::Description),
            SensitiveSpan::new(0, 4, SpanKind::Content),
        ],
        version: 20,
    }
}

pub(crate) type MemorySession = EditSession<MemoryChannel, MemoryDocumentApi>;

/// A session over in-memory transports, plus handles to inspect them. The API
/// starts out serving `doc`.
pub(crate) fn memory_session(
    doc: EditableDocument,
) -> (MemorySession, MemoryChannel, MemoryDocumentApi) {
    let channel = MemoryChannel::new();
    let api = MemoryDocumentApi::with_row(doc.clone());
    let session = EditSession::new(doc, channel.clone(), api.clone());
    (session, channel, api)
}
