//! Transports for operations and full-state documents.
//!
//! Two seams, both injected into [`EditSession`](crate::session::EditSession):
//!
//! - [`OperationChannel`]: an ordered, fire-and-forget text-frame connection
//!   that carries incremental operations (a WebSocket in production).
//! - [`DocumentApi`]: request/response calls that push or pull the whole
//!   document row (HTTP in production).
//!
//! In-memory implementations live in [`memory`]; the native ones are behind the
//! `native-sync` feature.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::document::EditableDocument;
use crate::error::{PatchError, Result};

pub mod memory;
#[cfg(all(feature = "native-sync", not(target_arch = "wasm32")))]
pub mod native;

pub use memory::{MemoryChannel, MemoryDocumentApi};
#[cfg(all(feature = "native-sync", not(target_arch = "wasm32")))]
pub use native::{HttpDocumentApi, WebSocketChannel};

/// A boxed future that is Send on native targets.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future (not Send on WASM, which is single-threaded).
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Path of the full-state push endpoint, relative to the API base.
pub const PUSH_ALL_PATH: &str = "/sys/blog/edit/push/all";
/// Path of the full-state pull endpoint, relative to the API base.
pub const PULL_ECHO_PATH: &str = "/sys/blog/edit/pull/echo";
/// Path of the operation WebSocket, relative to the WebSocket base.
pub const OPERATION_WS_PATH: &str = "/edit/ws";

/// Ordered text-frame connection for incremental operations.
///
/// `send` only hands the frame to the connection; there is no acknowledgement.
pub trait OperationChannel: Send + Sync {
    /// Queue a text frame. Fails with [`PatchError::ChannelUnavailable`] when
    /// the connection is not open.
    fn send(&self, message: String) -> Result<()>;

    /// Whether frames can currently be sent.
    fn is_open(&self) -> bool;

    /// Drain frames received from the peer since the last call.
    fn receive_messages(&self) -> Vec<String>;
}

/// Full-state document calls.
pub trait DocumentApi: Send + Sync {
    /// Fetch the authoritative row, optionally for a specific blog.
    fn pull_echo<'a>(&'a self, blog_id: Option<i64>) -> BoxFuture<'a, Result<EditableDocument>>;

    /// Replace the remote row with `doc`.
    fn push_all<'a>(&'a self, doc: &'a EditableDocument) -> BoxFuture<'a, Result<()>>;
}

/// Status value of a successful response envelope.
pub const STATUS_OK: i64 = 200;

/// The `{status, msg, data}` envelope every API response is wrapped in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub status: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    /// Unwrap the payload, turning a non-200 status into [`PatchError::Api`].
    pub fn into_result(self) -> Result<Option<T>> {
        if self.status == STATUS_OK {
            Ok(self.data)
        } else {
            Err(PatchError::Api {
                status: self.status,
                msg: self.msg,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let env: ApiEnvelope<EditableDocument> = serde_json::from_str(
            r#"{"status":200,"msg":"ok","data":{"id":3,"title":"T","version":9}}"#,
        )
        .unwrap();
        let doc = env.into_result().unwrap().unwrap();
        assert_eq!(doc.id, Some(3));
        assert_eq!(doc.version, 9);
    }

    #[test]
    fn test_envelope_error_carries_msg() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":401,"msg":"token expired","data":null}"#).unwrap();
        match env.into_result() {
            Err(PatchError::Api { status, msg }) => {
                assert_eq!(status, 401);
                assert_eq!(msg, "token expired");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_envelope_without_data() {
        let env: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"status":200,"msg":"saved"}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), None);
    }

    fn decode<T: serde::de::DeserializeOwned>(json: &str) -> Result<Option<T>> {
        serde_json::from_str::<ApiEnvelope<T>>(json)?.into_result()
    }

    #[test]
    fn test_envelope_decodes_generic_payload() {
        let doc: Option<EditableDocument> =
            decode(r#"{"status":200,"msg":"ok","data":{"title":"T"}}"#).unwrap();
        assert_eq!(doc.map(|d| d.title), Some("T".to_string()));

        let empty: Option<EditableDocument> = decode(r#"{"status":200,"data":null}"#).unwrap();
        assert_eq!(empty, None);
    }
}
