//! Axum router wiring (HTTP -> WS upgrade).
//!
//! Three routes per tenant identity: the upstream pairing endpoint, the
//! downstream pairing endpoint, and the onboarding page.

use axum::{routing::get, Router};

use crate::{app_state::BrokerState, onboard, transport};

pub fn build_router(state: BrokerState) -> Router {
    Router::new()
        .route("/ws/upstream/:tenant_id", get(transport::ws::upstream_upgrade))
        .route("/ws/downstream/:tenant_id", get(transport::ws::downstream_upgrade))
        .route("/s/:tenant_id", get(onboard::onboard_page))
        .with_state(state)
}
