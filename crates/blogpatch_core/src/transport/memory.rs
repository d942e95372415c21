//! In-memory transports.
//!
//! Both types are cheap handles over shared state, so a test can keep a clone
//! to inspect traffic after handing the other clone to a session.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BoxFuture, DocumentApi, OperationChannel};
use crate::document::EditableDocument;
use crate::error::{PatchError, Result};
use crate::operation::EditOperation;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct ChannelState {
    open: bool,
    sent: Vec<String>,
    inbox: VecDeque<String>,
}

/// A channel that records every frame it is asked to send.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    state: Arc<Mutex<ChannelState>>,
}

impl MemoryChannel {
    /// An open channel.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChannelState {
                open: true,
                sent: Vec::new(),
                inbox: VecDeque::new(),
            })),
        }
    }

    pub fn close(&self) {
        lock(&self.state).open = false;
    }

    pub fn reopen(&self) {
        lock(&self.state).open = true;
    }

    /// Frames accepted so far, in order.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Accepted frames parsed back into operations. Frames that fail to parse
    /// are skipped.
    pub fn sent_operations(&self) -> Vec<EditOperation> {
        lock(&self.state)
            .sent
            .iter()
            .filter_map(|frame| EditOperation::from_message(frame).ok())
            .collect()
    }

    /// Queue a frame as if the peer had sent it.
    pub fn deliver(&self, message: impl Into<String>) {
        lock(&self.state).inbox.push_back(message.into());
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationChannel for MemoryChannel {
    fn send(&self, message: String) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.open {
            return Err(PatchError::ChannelUnavailable);
        }
        state.sent.push(message);
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    fn receive_messages(&self) -> Vec<String> {
        lock(&self.state).inbox.drain(..).collect()
    }
}

#[derive(Debug, Default)]
struct ApiState {
    row: EditableDocument,
    pushes: usize,
    pulls: usize,
    fail_pushes: bool,
    fail_pulls: bool,
}

/// A document API backed by a single in-memory row.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentApi {
    state: Arc<Mutex<ApiState>>,
}

impl MemoryDocumentApi {
    /// Serve `row` as the authoritative document.
    pub fn with_row(row: EditableDocument) -> Self {
        Self {
            state: Arc::new(Mutex::new(ApiState {
                row,
                ..ApiState::default()
            })),
        }
    }

    /// The current server-side row.
    pub fn row(&self) -> EditableDocument {
        lock(&self.state).row.clone()
    }

    /// Overwrite the server-side row, as another editor would.
    pub fn set_row(&self, row: EditableDocument) {
        lock(&self.state).row = row;
    }

    pub fn push_count(&self) -> usize {
        lock(&self.state).pushes
    }

    pub fn pull_count(&self) -> usize {
        lock(&self.state).pulls
    }

    /// Make subsequent pushes fail with a server error.
    pub fn fail_pushes(&self, fail: bool) {
        lock(&self.state).fail_pushes = fail;
    }

    /// Make subsequent pulls fail with a transport error.
    pub fn fail_pulls(&self, fail: bool) {
        lock(&self.state).fail_pulls = fail;
    }
}

impl DocumentApi for MemoryDocumentApi {
    fn pull_echo<'a>(&'a self, blog_id: Option<i64>) -> BoxFuture<'a, Result<EditableDocument>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            if state.fail_pulls {
                return Err(PatchError::Transport("connection refused".to_string()));
            }
            if let Some(id) = blog_id
                && state.row.id != Some(id)
            {
                return Err(PatchError::Api {
                    status: 404,
                    msg: format!("blog {} not found", id),
                });
            }
            state.pulls += 1;
            Ok(state.row.clone())
        })
    }

    fn push_all<'a>(&'a self, doc: &'a EditableDocument) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut state = lock(&self.state);
            if state.fail_pushes {
                return Err(PatchError::Api {
                    status: 500,
                    msg: "push rejected".to_string(),
                });
            }
            state.pushes += 1;
            state.row = doc.clone();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::block_on_test;

    #[test]
    fn test_closed_channel_rejects() {
        let channel = MemoryChannel::new();
        channel.send("a".to_string()).unwrap();
        channel.close();
        assert!(matches!(
            channel.send("b".to_string()),
            Err(PatchError::ChannelUnavailable)
        ));
        assert_eq!(channel.sent(), vec!["a".to_string()]);
    }

    #[test]
    fn test_inbox_drains() {
        let channel = MemoryChannel::new();
        channel.deliver("one");
        channel.deliver("two");
        assert_eq!(channel.receive_messages(), vec!["one", "two"]);
        assert!(channel.receive_messages().is_empty());
    }

    #[test]
    fn test_api_push_then_pull() {
        let api = MemoryDocumentApi::default();
        let mut doc = EditableDocument::new();
        doc.id = Some(1);
        doc.title = "Pushed".to_string();

        block_on_test(api.push_all(&doc)).unwrap();
        let pulled = block_on_test(api.pull_echo(Some(1))).unwrap();
        assert_eq!(pulled, doc);
        assert_eq!(api.push_count(), 1);
        assert_eq!(api.pull_count(), 1);

        assert!(block_on_test(api.pull_echo(Some(2))).is_err());
    }

    #[test]
    fn test_api_failure_injection() {
        let api = MemoryDocumentApi::default();
        api.fail_pushes(true);
        let err = block_on_test(api.push_all(&EditableDocument::new())).unwrap_err();
        assert!(matches!(err, PatchError::Api { status: 500, .. }));
        assert_eq!(api.push_count(), 0);
    }
}
