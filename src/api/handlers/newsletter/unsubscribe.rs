//! Two-step unsubscribe.
//!
//! Email clients and link scanners prefetch GET links, so the link in the
//! newsletter only leads to a feedback page. The page posts back to perform
//! the state change.

use axum::{
    Json,
    extract::{Extension, Query},
    response::Redirect,
};
use std::sync::Arc;
use tracing::info;

use super::{
    state::NewsletterState,
    storage::TokenRole,
    types::{LocaleResponse, TokenQuery, UnsubscribeRequest},
    utils::{locale_or_default, non_blank, unsubscribe_page_path},
};
use crate::api::error::ApiError;

#[utoipa::path(
    get,
    path = "/api/newsletter/unsubscribe",
    params(TokenQuery),
    responses(
        (status = 303, description = "Redirect to the unsubscribe feedback page; never changes state")
    ),
    tag = "newsletter"
)]
pub async fn unsubscribe_link(Query(query): Query<TokenQuery>) -> Redirect {
    let locale = locale_or_default(query.locale.as_deref());
    Redirect::to(&unsubscribe_page_path(
        locale,
        non_blank(query.token.as_deref()),
    ))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/unsubscribe",
    request_body = UnsubscribeRequest,
    responses(
        (status = 200, description = "Unsubscribed (idempotent)", body = LocaleResponse),
        (status = 400, description = "missing_token"),
        (status = 404, description = "invalid_token"),
        (status = 500, description = "server_error"),
    ),
    tag = "newsletter"
)]
pub async fn unsubscribe(
    newsletter_state: Extension<Arc<NewsletterState>>,
    payload: Option<Json<UnsubscribeRequest>>,
) -> Result<Json<LocaleResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let Some(token) = non_blank(request.token.as_deref()) else {
        return Err(ApiError::validation("missing_token"));
    };

    let store = newsletter_state.store();
    let record = store
        .find_by_token(token, TokenRole::Unsubscribe)
        .await?
        .ok_or_else(|| ApiError::not_found("invalid_token"))?;

    store
        .mark_unsubscribed(
            record.id,
            non_blank(request.reason.as_deref()),
            non_blank(request.feedback.as_deref()),
        )
        .await?;

    if !record.unsubscribed {
        info!(subscriber_id = %record.id, "newsletter unsubscribed");
    }

    Ok(Json(LocaleResponse {
        success: true,
        locale: record.locale,
    }))
}
