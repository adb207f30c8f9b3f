use crate::GIT_COMMIT_HASH;
use crate::api::handlers::newsletter::NewsletterState;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, error, info_span};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    /// `ok` or `error`, from a subscriber store ping.
    store: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses (
        (status = 200, description = "Subscriber store is reachable", body = Health),
        (status = 503, description = "Subscriber store is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(
    method: Method,
    newsletter_state: Extension<Arc<NewsletterState>>,
) -> impl IntoResponse {
    let store_ok = match newsletter_state
        .store()
        .ping()
        .instrument(info_span!("store.ping"))
        .await
    {
        Ok(()) => true,
        Err(err) => {
            error!("Subscriber store ping failed: {err:#}");
            false
        }
    };

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store: if store_ok { "ok" } else { "error" }.to_string(),
    };

    let mut headers = HeaderMap::new();
    if let Some(value) = app_header(&health) {
        headers.insert("X-App", value);
    }

    let status = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    // HEAD probes only get the status and headers.
    if method == Method::GET {
        (status, headers, Json(health)).into_response()
    } else {
        (status, headers, Body::empty()).into_response()
    }
}

/// `name:version:short-hash`, hash left empty outside a git checkout.
fn app_header(health: &Health) -> Option<HeaderValue> {
    let short_hash = health.commit.get(..7).filter(|_| health.commit.len() > 7);
    HeaderValue::from_str(&format!(
        "{}:{}:{}",
        health.name,
        health.version,
        short_hash.unwrap_or_default()
    ))
    .map_err(|err| error!("Failed to build X-App header: {err}"))
    .ok()
}
