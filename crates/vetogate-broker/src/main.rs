//! VetoGate broker binary.
//!
//! - WebSocket pairing endpoints: /ws/upstream/:tenant_id, /ws/downstream/:tenant_id
//! - Onboarding page: /s/:tenant_id
//! - Config: VETOGATE_BROKER_CONFIG (YAML path), defaults otherwise
//! - Graceful shutdown on ctrl-c

use std::net::SocketAddr;

use tracing_subscriber::{fmt, EnvFilter};

use vetogate_broker::{app_state::BrokerState, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::var("VETOGATE_BROKER_CONFIG")
        .unwrap_or_else(|_| "vetogate-broker.yaml".to_string());
    let cfg = if std::path::Path::new(&path).exists() {
        config::load_from_file(&path).expect("config load failed")
    } else {
        config::BrokerConfig::default()
    };

    let listen: SocketAddr = cfg
        .broker
        .listen
        .parse()
        .expect("broker.listen must be a valid SocketAddr");

    let state = BrokerState::new(cfg);
    let app = router::build_router(state);

    tracing::info!(%listen, "vetogate-broker starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    tracing::info!("vetogate-broker shutdown complete");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
