//! Native transports: a tokio-tungstenite operation channel and a reqwest
//! document API.

use std::collections::VecDeque;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use url::Url;

use super::{
    ApiEnvelope, BoxFuture, DocumentApi, OPERATION_WS_PATH, OperationChannel, PULL_ECHO_PATH,
    PUSH_ALL_PATH,
};
use crate::config::SyncConfig;
use crate::document::EditableDocument;
use crate::error::{PatchError, Result};

fn transport(err: impl Display) -> PatchError {
    PatchError::Transport(err.to_string())
}

/// Operation WebSocket URL for `config`: `{ws_base}/edit/ws?token=..&blogId=..`.
pub fn operation_endpoint(config: &SyncConfig) -> Result<Url> {
    let mut url = Url::parse(&format!("{}{}", config.ws_base()?, OPERATION_WS_PATH))
        .map_err(transport)?;
    {
        let mut query = url.query_pairs_mut();
        if let Some(token) = &config.session_token {
            query.append_pair("token", token);
        }
        if let Some(id) = config.blog_id {
            query.append_pair("blogId", &id.to_string());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url)
}

/// WebSocket operation channel.
///
/// Outgoing frames go through an unbounded queue drained by a writer task;
/// incoming text frames are buffered for [`receive_messages`]. Once either
/// side of the socket fails or closes, the channel reports itself closed.
///
/// [`receive_messages`]: OperationChannel::receive_messages
pub struct WebSocketChannel {
    tx: mpsc::UnboundedSender<String>,
    open: Arc<AtomicBool>,
    inbox: Arc<Mutex<VecDeque<String>>>,
}

impl WebSocketChannel {
    /// Connect and spawn the reader and writer tasks. Must be called from
    /// within a tokio runtime.
    pub async fn connect(config: &SyncConfig) -> Result<Self> {
        let url = operation_endpoint(config)?;
        let mut request = url.as_str().into_client_request().map_err(transport)?;
        if let Some(token) = &config.session_token {
            let value = HeaderValue::from_str(token).map_err(transport)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (ws_stream, _) = connect_async(request)
            .await
            .map_err(|e| PatchError::Transport(format!("WebSocket connection failed: {}", e)))?;
        info!("[blogpatch] operation channel connected to {}", url);

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let open = Arc::new(AtomicBool::new(true));
        let inbox = Arc::new(Mutex::new(VecDeque::new()));

        let writer_open = Arc::clone(&open);
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    error!("[blogpatch] send error: {}", e);
                    break;
                }
            }
            writer_open.store(false, Ordering::SeqCst);
            let _ = write.close().await;
        });

        let reader_open = Arc::clone(&open);
        let reader_inbox = Arc::clone(&inbox);
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => reader_inbox
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push_back(text.as_str().to_string()),
                    Ok(Message::Close(_)) => {
                        info!("[blogpatch] operation channel closed by server");
                        break;
                    }
                    Ok(other) => debug!("[blogpatch] ignoring frame: {:?}", other),
                    Err(e) => {
                        error!("[blogpatch] read error: {}", e);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
        });

        Ok(Self { tx, open, inbox })
    }
}

impl OperationChannel for WebSocketChannel {
    fn send(&self, message: String) -> Result<()> {
        if !self.is_open() {
            return Err(PatchError::ChannelUnavailable);
        }
        self.tx.send(message).map_err(|_| {
            warn!("[blogpatch] writer task gone, marking channel closed");
            self.open.store(false, Ordering::SeqCst);
            PatchError::ChannelUnavailable
        })
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    fn receive_messages(&self) -> Vec<String> {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

/// Document API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDocumentApi {
    client: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl HttpDocumentApi {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let base = config.api_base()?.to_string();
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(transport)?;
        Ok(Self {
            client,
            base,
            token: config.session_token.clone(),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, token),
            None => request,
        }
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Option<T>> {
        let response = self.authorize(request).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let msg = response.text().await.unwrap_or_default();
            return Err(PatchError::Api {
                status: i64::from(status.as_u16()),
                msg,
            });
        }
        let envelope: ApiEnvelope<T> = response.json().await.map_err(transport)?;
        envelope.into_result()
    }
}

impl DocumentApi for HttpDocumentApi {
    fn pull_echo<'a>(&'a self, blog_id: Option<i64>) -> BoxFuture<'a, Result<EditableDocument>> {
        Box::pin(async move {
            let mut request = self.client.get(format!("{}{}", self.base, PULL_ECHO_PATH));
            if let Some(id) = blog_id {
                request = request.query(&[("blogId", id)]);
            }
            // An empty payload means there is no saved draft yet.
            let doc = self.send::<EditableDocument>(request).await?;
            Ok(doc.unwrap_or_default())
        })
    }

    fn push_all<'a>(&'a self, doc: &'a EditableDocument) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let request = self
                .client
                .post(format!("{}{}", self.base, PUSH_ALL_PATH))
                .json(doc);
            self.send::<serde_json::Value>(request).await?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_endpoint() {
        let config = SyncConfig {
            server_url: Some("https://blog.example.com".to_string()),
            session_token: Some("t k".to_string()),
            blog_id: Some(12),
            ..SyncConfig::default()
        };
        let url = operation_endpoint(&config).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://blog.example.com/edit/ws?token=t+k&blogId=12"
        );
    }

    #[test]
    fn test_operation_endpoint_without_query() {
        let config = SyncConfig {
            ws_url: Some("ws://localhost:9000".to_string()),
            ..SyncConfig::default()
        };
        assert_eq!(
            operation_endpoint(&config).unwrap().as_str(),
            "ws://localhost:9000/edit/ws"
        );
    }

    #[test]
    fn test_http_api_requires_server() {
        assert!(matches!(
            HttpDocumentApi::new(&SyncConfig::default()),
            Err(PatchError::ServerNotConfigured)
        ));
    }
}
