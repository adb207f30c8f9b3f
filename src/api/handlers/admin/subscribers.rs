use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
};
use std::sync::Arc;

use super::{
    session::require_admin,
    state::AdminState,
    types::{SubscriberListQuery, SubscriberListResponse, SubscriberSummary},
};
use crate::api::{
    error::ApiError,
    handlers::newsletter::{NewsletterState, SubscriberRecord, mask_email},
};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[utoipa::path(
    get,
    path = "/api/admin/subscribers",
    params(SubscriberListQuery),
    responses(
        (status = 200, description = "Newest subscribers first, emails masked", body = SubscriberListResponse),
        (status = 401, description = "Missing, invalid or expired session"),
        (status = 500, description = "server_error"),
    ),
    tag = "admin"
)]
pub async fn list_subscribers(
    headers: HeaderMap,
    admin_state: Extension<Arc<AdminState>>,
    newsletter_state: Extension<Arc<NewsletterState>>,
    Query(query): Query<SubscriberListQuery>,
) -> Result<Json<SubscriberListResponse>, ApiError> {
    require_admin(&headers, &admin_state)?;

    let limit = clamp_limit(query.limit);
    let records = newsletter_state.store().list(limit).await?;

    Ok(Json(SubscriberListResponse {
        subscribers: records.into_iter().map(summary).collect(),
    }))
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn summary(record: SubscriberRecord) -> SubscriberSummary {
    SubscriberSummary {
        id: record.id.to_string(),
        email: mask_email(&record.email),
        locale: record.locale,
        confirmed: record.confirmed,
        unsubscribed: record.unsubscribed,
        created_at: record.created_at.to_rfc3339(),
    }
}
