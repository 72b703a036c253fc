//! Check endpoint: the service's native input/output shape over HTTP.
//!
//! `POST /v1/check` takes the request attributes as JSON and returns the
//! binary verdict. Translating a proxy's own authorization-check protocol
//! (e.g. Envoy ext_authz) into this shape is the proxy adapter's job, not
//! this crate's.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::service::{CheckAttributes, CheckpointService};

#[derive(Debug, Deserialize)]
pub struct CheckBody {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct CheckReply {
    pub approved: bool,
}

pub fn build_router(service: Arc<CheckpointService>) -> Router {
    Router::new()
        .route("/v1/check", post(check_handler))
        .with_state(service)
}

async fn check_handler(
    State(service): State<Arc<CheckpointService>>,
    Json(body): Json<CheckBody>,
) -> Json<CheckReply> {
    let verdict = service
        .check(CheckAttributes {
            method: body.method,
            path: body.path,
            headers: body.headers,
        })
        .await;
    Json(CheckReply {
        approved: verdict.allowed(),
    })
}
