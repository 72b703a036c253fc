//! Pairing and forwarding behavior of a live broker.
//!
//! Each test binds a broker to an ephemeral port and speaks to it with raw
//! WebSocket peers. Frames here are arbitrary bytes: the broker must treat
//! them as opaque whether or not they are valid ciphertext.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vetogate_broker::{app_state::BrokerState, config::BrokerConfig, router};

type Peer = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_broker() -> SocketAddr {
    spawn_broker_with(BrokerConfig::default()).await
}

async fn spawn_broker_with(cfg: BrokerConfig) -> SocketAddr {
    let state = BrokerState::new(cfg);
    let app = router::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr, side: &str, tenant: &str) -> Peer {
    let url = format!("ws://{addr}/ws/{side}/{tenant}");
    let (peer, _) = connect_async(url).await.expect("connect failed");
    // Give the broker's session task a moment to claim the slot; the
    // handshake completes client-side slightly before that happens.
    tokio::time::sleep(Duration::from_millis(50)).await;
    peer
}

/// Next binary frame, skipping keepalive traffic.
async fn next_binary(peer: &mut Peer) -> Option<Vec<u8>> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), peer.next())
            .await
            .expect("timed out waiting for frame")?;
        match msg.expect("read failed") {
            Message::Binary(b) => return Some(b),
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(_) => return None,
            other => panic!("unexpected message: {other:?}"),
        }
    }
}

/// Assert no binary frame arrives within `window`.
async fn assert_quiet(peer: &mut Peer, window: Duration) {
    let got = tokio::time::timeout(window, async {
        loop {
            match peer.next().await {
                Some(Ok(Message::Binary(b))) => return Some(b),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await;
    match got {
        Err(_) => {}           // window elapsed, nothing arrived
        Ok(None) => {}         // connection ended without a frame
        Ok(Some(b)) => panic!("unexpected frame of {} bytes", b.len()),
    }
}

#[tokio::test]
async fn forwards_verbatim_in_both_directions() {
    let addr = spawn_broker().await;
    let mut up = connect(addr, "upstream", "tenant-a").await;
    let mut down = connect(addr, "downstream", "tenant-a").await;

    up.send(Message::Binary(vec![1, 2, 3, 0xff])).await.unwrap();
    assert_eq!(next_binary(&mut down).await.unwrap(), vec![1, 2, 3, 0xff]);

    down.send(Message::Binary(vec![9, 8, 7])).await.unwrap();
    assert_eq!(next_binary(&mut up).await.unwrap(), vec![9, 8, 7]);
}

#[tokio::test]
async fn forwards_in_arrival_order() {
    let addr = spawn_broker().await;
    let mut up = connect(addr, "upstream", "tenant-a").await;
    let mut down = connect(addr, "downstream", "tenant-a").await;

    for i in 0u8..10 {
        up.send(Message::Binary(vec![i])).await.unwrap();
    }
    for i in 0u8..10 {
        assert_eq!(next_binary(&mut down).await.unwrap(), vec![i]);
    }
}

#[tokio::test]
async fn new_downstream_evicts_previous() {
    let addr = spawn_broker().await;
    let mut up = connect(addr, "upstream", "tenant-a").await;
    let mut old_down = connect(addr, "downstream", "tenant-a").await;
    let mut new_down = connect(addr, "downstream", "tenant-a").await;

    // The evicted connection is closed by the broker.
    let evicted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match old_down.next().await {
                Some(Ok(Message::Close(_))) | None => return true,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return true,
            }
        }
    })
    .await
    .expect("old downstream was not closed");
    assert!(evicted);

    // Frames now reach only the replacement.
    up.send(Message::Binary(b"after eviction".to_vec()))
        .await
        .unwrap();
    assert_eq!(
        next_binary(&mut new_down).await.unwrap(),
        b"after eviction".to_vec()
    );
}

#[tokio::test]
async fn new_upstream_evicts_previous() {
    let addr = spawn_broker().await;
    let mut old_up = connect(addr, "upstream", "tenant-a").await;
    let mut new_up = connect(addr, "upstream", "tenant-a").await;
    let mut down = connect(addr, "downstream", "tenant-a").await;

    let evicted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match old_up.next().await {
                Some(Ok(Message::Close(_))) | None => return true,
                Some(Ok(_)) => continue,
                Some(Err(_)) => return true,
            }
        }
    })
    .await
    .expect("old upstream was not closed");
    assert!(evicted);

    down.send(Message::Binary(b"to new upstream".to_vec()))
        .await
        .unwrap();
    assert_eq!(
        next_binary(&mut new_up).await.unwrap(),
        b"to new upstream".to_vec()
    );
}

#[tokio::test]
async fn tenants_are_isolated() {
    let addr = spawn_broker().await;
    let mut a_up = connect(addr, "upstream", "tenant-a").await;
    let mut a_down = connect(addr, "downstream", "tenant-a").await;
    let mut b_down = connect(addr, "downstream", "tenant-b").await;

    a_up.send(Message::Binary(b"a only".to_vec())).await.unwrap();

    assert_eq!(next_binary(&mut a_down).await.unwrap(), b"a only".to_vec());
    assert_quiet(&mut b_down, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn frames_without_peer_are_dropped_not_queued() {
    let addr = spawn_broker().await;
    let mut up = connect(addr, "upstream", "tenant-a").await;

    // No downstream yet: this frame must be dropped.
    up.send(Message::Binary(b"lost".to_vec())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut down = connect(addr, "downstream", "tenant-a").await;
    up.send(Message::Binary(b"delivered".to_vec())).await.unwrap();

    // Only the post-connect frame arrives.
    assert_eq!(next_binary(&mut down).await.unwrap(), b"delivered".to_vec());
    assert_quiet(&mut down, Duration::from_millis(300)).await;
}

#[tokio::test]
async fn one_side_closing_leaves_the_other_connected() {
    let addr = spawn_broker().await;
    let mut up = connect(addr, "upstream", "tenant-a").await;
    let down = connect(addr, "downstream", "tenant-a").await;

    drop(down);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Upstream survives and a new downstream pairs up again.
    let mut down2 = connect(addr, "downstream", "tenant-a").await;
    up.send(Message::Binary(b"still here".to_vec())).await.unwrap();
    assert_eq!(
        next_binary(&mut down2).await.unwrap(),
        b"still here".to_vec()
    );
}

/// Pour large frames into the connection while the other side isn't
/// reading, then switch to small marker frames on a slow cadence.
fn flood_then_beacon(mut tx: futures_util::stream::SplitSink<Peer, Message>) {
    tokio::spawn(async move {
        for _ in 0..100 {
            if tx
                .send(Message::Binary(vec![0x5a; 256 * 1024]))
                .await
                .is_err()
            {
                return;
            }
        }
        for _ in 0..100 {
            if tx.send(Message::Binary(b"beacon".to_vec())).await.is_err() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });
}

async fn wait_for_beacon(rx: &mut futures_util::stream::SplitStream<Peer>) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(Ok(msg)) = rx.next().await {
            if let Message::Binary(b) = msg {
                if b == b"beacon" {
                    return;
                }
            }
        }
        panic!("connection ended before a beacon arrived");
    })
    .await
    .expect("no beacon arrived; forwarding is wedged");
}

#[tokio::test]
async fn mutual_flood_does_not_wedge_the_tenant() {
    let mut cfg = BrokerConfig::default();
    cfg.broker.forward_queue = 2;
    let addr = spawn_broker_with(cfg).await;

    let up = connect(addr, "upstream", "tenant-a").await;
    let down = connect(addr, "downstream", "tenant-a").await;
    let (up_tx, mut up_rx) = up.split();
    let (down_tx, mut down_rx) = down.split();

    // Both sides flood while neither reads. The queues fill at once; each
    // session must drop overflow instead of parking on the other's queue,
    // or the pair deadlocks and never recovers.
    flood_then_beacon(up_tx);
    flood_then_beacon(down_tx);
    tokio::time::sleep(Duration::from_secs(1)).await;

    // Once the peers start draining, both directions still deliver.
    tokio::join!(wait_for_beacon(&mut up_rx), wait_for_beacon(&mut down_rx));
}

#[tokio::test]
async fn onboarding_page_names_the_tenant() {
    let addr = spawn_broker().await;
    let body = http_get(addr, "/s/abc123").await;
    assert!(body.contains("abc123"));
}

/// Minimal HTTP GET over a plain TcpStream (no HTTP client dependency).
async fn http_get(addr: SocketAddr, path: &str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();
    let mut buf = String::new();
    stream.read_to_string(&mut buf).await.unwrap();
    buf
}
