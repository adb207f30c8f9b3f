//! Newsletter signup (double opt-in, step one).
//!
//! The response is the same for new, pending and already-confirmed addresses so
//! the endpoint cannot be used to probe the subscriber list.

use anyhow::Context;
use axum::{Json, extract::Extension};
use std::sync::Arc;
use tracing::info;

use super::{
    state::NewsletterState,
    storage::{SubscribeOutcome, SubscriberRecord},
    types::SubscribeRequest,
    utils::{DEFAULT_LOCALE, build_confirm_url, build_unsubscribe_url, valid_email, valid_locale},
};
use crate::api::{
    email::EmailMessage,
    error::ApiError,
    handlers::admin::{credentials::normalize_email, types::SuccessResponse},
};

const CONFIRM_TEMPLATE: &str = "newsletter_confirm";

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Confirmation email sent if the address needs one.", body = SuccessResponse),
        (status = 400, description = "invalid_email or invalid_locale"),
        (status = 500, description = "server_error"),
    ),
    tag = "newsletter"
)]
pub async fn subscribe(
    newsletter_state: Extension<Arc<NewsletterState>>,
    payload: Option<Json<SubscribeRequest>>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("invalid_email"));
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(ApiError::validation("invalid_email"));
    }

    let locale = match request.locale.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_LOCALE,
        Some(locale) if valid_locale(locale) => locale,
        Some(_) => return Err(ApiError::validation("invalid_locale")),
    };

    match newsletter_state.store().subscribe(&email, locale).await? {
        SubscribeOutcome::Created(record) | SubscribeOutcome::Rearmed(record) => {
            send_confirmation(&newsletter_state, &record)?;
            info!(subscriber_id = %record.id, "newsletter confirmation sent");
        }
        SubscribeOutcome::AlreadyConfirmed => {
            info!("newsletter signup for an already confirmed address");
        }
    }

    Ok(Json(SuccessResponse { success: true }))
}

fn send_confirmation(state: &NewsletterState, record: &SubscriberRecord) -> anyhow::Result<()> {
    let token = record
        .confirm_token
        .as_deref()
        .context("subscriber has no confirm token")?;
    let site = state.config().site_base_url();
    let message = EmailMessage {
        to_email: record.email.clone(),
        template: CONFIRM_TEMPLATE.to_string(),
        locale: record.locale.clone(),
        confirm_url: build_confirm_url(site, token, &record.locale)?,
        unsubscribe_url: build_unsubscribe_url(site, &record.unsubscribe_token)?,
    };
    state
        .email()
        .send(&message)
        .context("failed to send confirmation email")
}
