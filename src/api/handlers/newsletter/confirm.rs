//! Newsletter confirmation link (double opt-in, step two).

use axum::{
    extract::{Extension, Query},
    response::Redirect,
};
use std::sync::Arc;
use tracing::{error, info};

use super::{
    state::NewsletterState,
    storage::{SubscriberStore, TokenRole},
    types::TokenQuery,
    utils::{confirm_status_path, locale_or_default, non_blank},
};

/// Terminal status page the browser is sent to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfirmStatus {
    Success,
    Already,
    Invalid,
    Error,
}

impl ConfirmStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Already => "already",
            Self::Invalid => "invalid",
            Self::Error => "error",
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/newsletter/confirm",
    params(TokenQuery),
    responses(
        (status = 303, description = "Redirect to /{locale}/newsletter/confirmed?status=success|already|invalid|error")
    ),
    tag = "newsletter"
)]
pub async fn confirm(
    newsletter_state: Extension<Arc<NewsletterState>>,
    Query(query): Query<TokenQuery>,
) -> Redirect {
    let locale = locale_or_default(query.locale.as_deref());
    let status = match non_blank(query.token.as_deref()) {
        Some(token) => confirm_token(newsletter_state.store(), token).await,
        None => ConfirmStatus::Invalid,
    };
    Redirect::to(&confirm_status_path(locale, status.as_str()))
}

/// Resolve a confirm token and confirm its subscriber once.
pub(crate) async fn confirm_token(store: &dyn SubscriberStore, token: &str) -> ConfirmStatus {
    let record = match store.find_by_token(token, TokenRole::Confirm).await {
        Ok(Some(record)) => record,
        Ok(None) => return ConfirmStatus::Invalid,
        Err(err) => {
            error!("Failed to look up confirm token: {err:#}");
            return ConfirmStatus::Error;
        }
    };

    if record.confirmed {
        return ConfirmStatus::Already;
    }

    if let Err(err) = store.mark_confirmed(record.id).await {
        error!("Failed to confirm subscriber: {err:#}");
        return ConfirmStatus::Error;
    }
    if let Err(err) = store.clear_confirm_token(record.id).await {
        // Already confirmed; a reused link still reports `already`.
        error!("Failed to clear confirm token: {err:#}");
    }

    info!(subscriber_id = %record.id, "newsletter subscription confirmed");
    ConfirmStatus::Success
}
