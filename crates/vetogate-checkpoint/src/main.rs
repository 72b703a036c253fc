//! VetoGate checkpoint binary.
//!
//! Startup order matters: the key is resolved first (a malformed key is
//! fatal, there is no identity without it), the share link is logged for
//! out-of-band delivery to the decision surface, then the relay client
//! dials the broker and the check endpoint starts serving.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use vetogate_checkpoint::{config, http, relay::RelayClient, service::CheckpointService};
use vetogate_core::crypto::Key;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("VETOGATE_CHECKPOINT_CONFIG")
        .unwrap_or_else(|_| "vetogate-checkpoint.yaml".to_string());
    let cfg = if std::path::Path::new(&path).exists() {
        config::load_from_file(&path).expect("config load failed")
    } else {
        config::CheckpointConfig::default()
    };
    let section = cfg.checkpoint;

    let key = match &section.key {
        Some(encoded) => Key::from_url_b64(encoded).expect("checkpoint.key is not a valid key"),
        None => {
            let key = Key::generate();
            tracing::info!("no key configured; generated an ephemeral one");
            key
        }
    };

    let client = Arc::new(RelayClient::new(
        section.broker_url.clone(),
        key.clone(),
        section.retry.policy(),
    ));

    // The fragment stays client-side in a browser; the broker never sees it.
    let http_base = section
        .broker_url
        .replacen("wss://", "https://", 1)
        .replacen("ws://", "http://", 1);
    tracing::info!(
        tenant = %client.tenant_id(),
        share_url = %format!("{}/s/{}#{}", http_base, client.tenant_id(), key.to_url_b64()),
        "decision surface onboarding link"
    );

    if let Err(e) = client.connect().await {
        tracing::warn!(error = %e, "initial relay connect failed; will retry on first check");
    }

    let service = Arc::new(CheckpointService::new(
        Arc::clone(&client),
        section.check_timeout(),
    ));

    let listen: SocketAddr = section
        .listen
        .parse()
        .expect("checkpoint.listen must be a valid SocketAddr");
    let app = http::build_router(service);

    tracing::info!(%listen, "vetogate-checkpoint starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    client.close().await;
    tracing::info!("vetogate-checkpoint shutdown complete");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
