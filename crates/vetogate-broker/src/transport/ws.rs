//! WebSocket pairing handlers and the per-connection forwarding loop.
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS on the upstream/downstream endpoints
//! - Claim the tenant's slot for this side (last connection wins; the
//!   previous occupant is evicted and its session loop closed)
//! - Forward every data frame verbatim to the paired side, in arrival
//!   order; if no peer is connected the frame is dropped, not queued
//! - Keepalive ping tick
//! - On read error or close: clear only this side's slot, and only if this
//!   connection still owns it
//!
//! The loop never looks inside a frame. Payloads are ciphertext end to end
//! and the broker has no key.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::app_state::BrokerState;
use crate::registry::{Side, SlotConn};

pub async fn upstream_upgrade(
    State(app): State<BrokerState>,
    Path(tenant_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(app, tenant_id, Side::Upstream, socket))
}

pub async fn downstream_upgrade(
    State(app): State<BrokerState>,
    Path(tenant_id): Path<String>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| run_session(app, tenant_id, Side::Downstream, socket))
}

fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.as_bytes().len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) | Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

async fn run_session(app: BrokerState, tenant_id: String, side: Side, socket: WebSocket) {
    let tenant = app.registry().tenant(&tenant_id);
    let seq = app.registry().next_seq();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(app.cfg().broker.forward_queue);

    // Claim the slot. Dropping the evicted occupant's sender ends its
    // session loop, which closes its socket.
    if let Some(prior) = tenant.claim(side, SlotConn { seq, tx: out_tx }) {
        tracing::info!(
            tenant = %tenant_id,
            side = side.as_str(),
            evicted_seq = prior.seq,
            "replacing prior connection"
        );
    }
    tracing::info!(tenant = %tenant_id, side = side.as_str(), "peer connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = Duration::from_millis(app.cfg().broker.ping_interval_ms);
    let mut ping_tick = tokio::time::interval(ping_every);
    ping_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ping_tick.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            // frames forwarded from the paired side
            maybe_out = out_rx.recv() => {
                match maybe_out {
                    Some(m) => {
                        if ws_tx.send(m).await.is_err() {
                            break;
                        }
                    }
                    // sender dropped: this connection was evicted
                    None => break,
                }
            }

            // frames arriving from this side
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                let Ok(msg) = incoming else {
                    tracing::debug!(tenant = %tenant_id, side = side.as_str(), "read error");
                    break;
                };

                match msg {
                    m @ (Message::Binary(_) | Message::Text(_)) => {
                        let bytes_len = frame_len(&m);
                        match tenant.sender(side.peer()) {
                            Some(peer_tx) => {
                                // Never await the peer's queue: a full queue
                                // drops the frame, it must not stall this
                                // session.
                                if peer_tx.try_send(m).is_ok() {
                                    tracing::debug!(
                                        tenant = %tenant_id,
                                        from = side.as_str(),
                                        bytes = bytes_len,
                                        "forwarded frame"
                                    );
                                } else {
                                    tracing::debug!(
                                        tenant = %tenant_id,
                                        from = side.as_str(),
                                        bytes = bytes_len,
                                        "peer not draining; frame dropped"
                                    );
                                }
                            }
                            None => {
                                tracing::debug!(
                                    tenant = %tenant_id,
                                    from = side.as_str(),
                                    bytes = bytes_len,
                                    "no peer connected; frame dropped"
                                );
                            }
                        }
                    }
                    Message::Ping(payload) => {
                        if ws_tx.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Message::Pong(_) => {}
                    Message::Close(_) => break,
                }
            }

            // keepalive
            _ = ping_tick.tick() => {
                if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    // Only the current occupant may clear the slot; an evicted connection
    // must not knock out its replacement.
    if tenant.clear_if_current(side, seq) {
        tracing::info!(tenant = %tenant_id, side = side.as_str(), "peer disconnected");
    } else {
        tracing::debug!(tenant = %tenant_id, side = side.as_str(), "session ended after eviction");
    }
}
