//! Onboarding page route.
//!
//! `GET /s/:tenant_id` is where a shareable link lands. The real decision
//! surface ships separately; this placeholder only confirms the namespace
//! and reminds the visitor that the key never reaches the broker (it rides
//! in the URL fragment, which browsers do not send).

use axum::{extract::Path, response::Html};

pub async fn onboard_page(Path(tenant_id): Path<String>) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html>\n<head><title>VetoGate</title></head>\n<body>\n\
         <h1>VetoGate decision surface</h1>\n\
         <p>Tenant namespace: <code>{tenant_id}</code></p>\n\
         <p>Connect a decision surface to <code>/ws/downstream/{tenant_id}</code>.\n\
         The decryption key is carried in this link's fragment and is never sent to this server.</p>\n\
         </body>\n</html>\n"
    ))
}
