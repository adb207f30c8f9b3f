//! Admin session cookie, guard and the session/logout endpoints.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;

use super::{
    session_token::now_millis,
    state::{AdminConfig, AdminState},
    types::{SessionResponse, SuccessResponse},
};
use crate::api::error::ApiError;

pub const SESSION_COOKIE_NAME: &str = "hourglass_admin_session";

const UNAUTHORIZED: &str = "Unauthorized";

#[utoipa::path(
    get,
    path = "/api/admin/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    tag = "admin"
)]
pub async fn session(
    headers: HeaderMap,
    admin_state: Extension<Arc<AdminState>>,
) -> Result<Json<SessionResponse>, ApiError> {
    let expires_at = require_admin(&headers, &admin_state)?;
    Ok(Json(SessionResponse {
        authenticated: true,
        expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = SuccessResponse)
    ),
    tag = "admin"
)]
pub async fn logout(admin_state: Extension<Arc<AdminState>>) -> impl IntoResponse {
    // Tokens are stateless; logging out only drops the cookie on this client.
    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(admin_state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    (
        StatusCode::OK,
        response_headers,
        Json(SuccessResponse { success: true }),
    )
}

/// Validate the caller's admin token and return its expiry in epoch millis.
pub(crate) fn require_admin(headers: &HeaderMap, state: &AdminState) -> Result<i64, ApiError> {
    extract_session_token(headers)
        .and_then(|token| state.tokens().expires_at(&token, now_millis()))
        .ok_or_else(|| ApiError::unauthorized(UNAUTHORIZED))
}

/// Build the `HttpOnly` cookie carrying the admin token.
pub(super) fn session_cookie(
    config: &AdminConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Strict; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

fn clear_session_cookie(config: &AdminConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Bearer header first, then the session cookie.
fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        })
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    // Browsers may send several Cookie headers once HTTP/2 splits them.
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
                .then(|| val.trim().to_string())
        })
}
