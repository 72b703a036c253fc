//! Relay client: the checkpoint's encrypted upstream connection.
//!
//! Owns the WebSocket to the broker under this key's tenant identity,
//! seals every outgoing decision request, and correlates decrypted
//! responses back to their pending waits. Connection loss is absorbed
//! here: the send path closes the broken connection, backs off, redials,
//! and rewrites, bounded by the retry policy. Only a fully exhausted
//! budget surfaces to the caller.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vetogate_core::crypto::{self, Key};
use vetogate_core::protocol::{self, DecisionRequest, DecisionResponse};
use vetogate_core::{Result, VetoGateError};

use crate::backoff::RetryPolicy;
use crate::pending::PendingWaits;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

pub struct RelayClient {
    broker_url: String,
    tenant_id: String,
    key: Key,
    retry: RetryPolicy,
    // Write half of the live connection, if any. The read half lives in a
    // spawned read loop that exits when the connection does.
    sink: Mutex<Option<WsSink>>,
    pending: Arc<PendingWaits>,
}

impl RelayClient {
    /// Build a client for `broker_url` (e.g. `ws://127.0.0.1:9090`). The
    /// tenant identity is derived from the key; the key itself never leaves
    /// this process toward the broker.
    pub fn new(broker_url: impl Into<String>, key: Key, retry: RetryPolicy) -> Self {
        let tenant_id = crypto::derive_tenant_id(&key);
        Self {
            broker_url: broker_url.into(),
            tenant_id,
            key,
            retry,
            sink: Mutex::new(None),
            pending: Arc::new(PendingWaits::new()),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Number of requests still waiting for a decision.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Dial the broker's upstream endpoint and start the read loop.
    /// Replaces any previous connection.
    pub async fn connect(&self) -> Result<()> {
        let url = format!("{}/ws/upstream/{}", self.broker_url, self.tenant_id);
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| VetoGateError::ConnectFailed(e.to_string()))?;
        let (write, read) = stream.split();

        {
            let mut guard = self.sink.lock().await;
            if let Some(mut old) = guard.replace(write) {
                let _ = old.close().await;
            }
        }

        tokio::spawn(read_loop(
            read,
            self.key.clone(),
            Arc::clone(&self.pending),
            self.tenant_id.clone(),
        ));

        tracing::info!(tenant = %self.tenant_id, "connected to relay upstream");
        Ok(())
    }

    /// Seal and send one decision request; returns the handle that will
    /// carry its response. The request is encrypted exactly once (a fresh
    /// nonce per encryption); retries retransmit the same sealed frame.
    ///
    /// On exhausted retries the pending entry is removed and the error
    /// surfaces to the caller, which must resolve the check itself.
    pub async fn send_request(
        &self,
        req: &DecisionRequest,
    ) -> Result<tokio::sync::oneshot::Receiver<DecisionResponse>> {
        let plaintext = protocol::encode_request(req)?;
        let frame = crypto::encrypt(&self.key, &plaintext)?;

        let rx = self.pending.register(&req.id);
        match self.write_with_retry(&req.id, frame).await {
            Ok(()) => Ok(rx),
            Err(e) => {
                self.pending.abandon(&req.id);
                Err(e)
            }
        }
    }

    async fn write_with_retry(&self, request_id: &str, frame: Vec<u8>) -> Result<()> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.try_write(frame.clone()).await {
                Ok(()) => {
                    tracing::debug!(request_id, attempts, "request frame sent");
                    return Ok(());
                }
                Err(e) => {
                    if !self.retry.may_retry(attempts) {
                        tracing::warn!(request_id, attempts, error = %e, "send retries exhausted");
                        return Err(VetoGateError::SendExhausted { attempts });
                    }
                    tracing::warn!(request_id, attempt = attempts, error = %e, "relay write failed; reconnecting");
                    self.drop_connection().await;
                    self.retry.pause().await;
                    if let Err(e) = self.connect().await {
                        tracing::warn!(error = %e, "reconnect failed");
                    }
                }
            }
        }
    }

    async fn try_write(&self, frame: Vec<u8>) -> Result<()> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(VetoGateError::NotConnected)?;
        match sink.send(Message::Binary(frame)).await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Connection is broken; forget it so the retry path redials.
                *guard = None;
                Err(VetoGateError::ConnectFailed(e.to_string()))
            }
        }
    }

    async fn drop_connection(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.close().await;
        }
    }

    /// Close the connection, announcing the close to the broker first.
    /// Idempotent; pending waits are left to time out on their own.
    pub async fn close(&self) {
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
            tracing::info!(tenant = %self.tenant_id, "relay connection closed");
        }
    }

    pub(crate) fn abandon_wait(&self, id: &str) -> bool {
        self.pending.abandon(id)
    }
}

/// Read frames until the connection ends. Every failure mode here is
/// fail-closed and local: a frame that cannot be authenticated or parsed is
/// dropped without touching any pending wait, and a response with no wait
/// (already timed out, or unknown) is discarded.
async fn read_loop(mut read: WsSource, key: Key, pending: Arc<PendingWaits>, tenant_id: String) {
    while let Some(next) = read.next().await {
        let msg = match next {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(tenant = %tenant_id, error = %e, "relay connection lost");
                break;
            }
        };
        let frame = match msg {
            Message::Binary(b) => b,
            Message::Close(_) => {
                tracing::info!(tenant = %tenant_id, "relay closed the connection");
                break;
            }
            // tungstenite answers pings internally; nothing else matters here
            _ => continue,
        };

        let plaintext = match crypto::decrypt(&key, &frame) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(tenant = %tenant_id, error = %e, "dropping unauthenticated frame");
                continue;
            }
        };
        let resp = match protocol::decode_response(&plaintext) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(tenant = %tenant_id, error = %e, "dropping malformed response");
                continue;
            }
        };

        let request_id = resp.request_id.clone();
        if pending.resolve(resp) {
            tracing::debug!(request_id, "decision delivered");
        } else {
            tracing::debug!(request_id, "no pending wait; response discarded");
        }
    }
}
