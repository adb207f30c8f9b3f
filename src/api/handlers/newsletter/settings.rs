//! Subscriber preferences reachable from the links in newsletter emails.
//!
//! Either subscriber token opens the settings: the unsubscribe token is tried
//! first, then the confirm token. Only the locale preference can be changed.

use axum::{
    Json,
    extract::{Extension, Query},
};
use std::sync::Arc;
use tracing::info;

use super::{
    state::NewsletterState,
    storage::{SubscriberRecord, SubscriberStore, TokenRole},
    types::{LocaleResponse, SettingsResponse, SettingsUpdateRequest, TokenQuery},
    utils::{mask_email, non_blank, valid_locale},
};
use crate::api::error::ApiError;

#[utoipa::path(
    get,
    path = "/api/newsletter/settings",
    params(TokenQuery),
    responses(
        (status = 200, description = "Current preferences with a masked email", body = SettingsResponse),
        (status = 400, description = "missing_token"),
        (status = 404, description = "invalid_token"),
        (status = 500, description = "server_error"),
    ),
    tag = "newsletter"
)]
pub async fn settings(
    newsletter_state: Extension<Arc<NewsletterState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let token =
        non_blank(query.token.as_deref()).ok_or_else(|| ApiError::validation("missing_token"))?;
    let record = find_by_any_token(newsletter_state.store(), token).await?;

    Ok(Json(SettingsResponse {
        email: mask_email(&record.email),
        locale: record.locale,
        confirmed: record.confirmed,
    }))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/settings",
    request_body = SettingsUpdateRequest,
    responses(
        (status = 200, description = "Locale preference saved", body = LocaleResponse),
        (status = 400, description = "missing_token or invalid_locale"),
        (status = 404, description = "invalid_token"),
        (status = 500, description = "server_error"),
    ),
    tag = "newsletter"
)]
pub async fn update_settings(
    newsletter_state: Extension<Arc<NewsletterState>>,
    payload: Option<Json<SettingsUpdateRequest>>,
) -> Result<Json<LocaleResponse>, ApiError> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let token =
        non_blank(request.token.as_deref()).ok_or_else(|| ApiError::validation("missing_token"))?;
    let locale = request
        .locale
        .as_deref()
        .map(str::trim)
        .filter(|locale| valid_locale(locale))
        .ok_or_else(|| ApiError::validation("invalid_locale"))?;

    let store = newsletter_state.store();
    let record = find_by_any_token(store, token).await?;
    store.update_locale_preference(record.id, locale).await?;
    info!(subscriber_id = %record.id, locale, "newsletter locale updated");

    Ok(Json(LocaleResponse {
        success: true,
        locale: locale.to_string(),
    }))
}

async fn find_by_any_token(
    store: &dyn SubscriberStore,
    token: &str,
) -> Result<SubscriberRecord, ApiError> {
    if let Some(record) = store.find_by_token(token, TokenRole::Unsubscribe).await? {
        return Ok(record);
    }
    store
        .find_by_token(token, TokenRole::Confirm)
        .await?
        .ok_or_else(|| ApiError::not_found("invalid_token"))
}

#[cfg(test)]
mod tests {
    use super::super::{memory_storage::MemorySubscriberStore, storage::SubscribeOutcome};
    use super::*;
    use anyhow::{Result, anyhow};

    #[tokio::test]
    async fn both_token_roles_open_settings() -> Result<()> {
        let store = MemorySubscriberStore::new();
        let SubscribeOutcome::Created(record) = store.subscribe("reader@example.com", "es").await?
        else {
            return Err(anyhow!("expected a new subscriber"));
        };
        let confirm = record.confirm_token.clone().unwrap_or_default();

        let by_unsubscribe = find_by_any_token(&store, &record.unsubscribe_token).await;
        let by_confirm = find_by_any_token(&store, &confirm).await;
        assert_eq!(by_unsubscribe.ok().map(|found| found.id), Some(record.id));
        assert_eq!(by_confirm.ok().map(|found| found.id), Some(record.id));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let store = MemorySubscriberStore::new();
        let result = find_by_any_token(&store, "nope").await;
        assert!(matches!(result, Err(ApiError::NotFound(code)) if code == "invalid_token"));
    }
}
