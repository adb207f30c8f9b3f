//! Admin login endpoint.
//!
//! Flow Overview:
//! 1) Reject locked-out clients before reading the payload (429).
//! 2) Reject malformed payloads (400).
//! 3) Verify the credential pair; count failures (401).
//! 4) On success clear the failure record and set the session cookie (200).

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use std::{net::SocketAddr, sync::Arc};
use tracing::{info, warn};

use super::{
    login_attempts::AttemptDecision,
    session::session_cookie,
    session_token::{IssuedSession, now_millis},
    state::AdminState,
    types::{LoginRequest, SuccessResponse},
    utils::client_key,
};
use crate::api::error::ApiError;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LoginOutcome {
    Authenticated(IssuedSession),
    Rejected,
    Blocked(AttemptDecision),
}

/// Gate, verify and record a single login attempt.
pub(crate) fn attempt_login_at(
    state: &AdminState,
    client: &str,
    email: &str,
    password: &str,
    now_millis: i64,
) -> LoginOutcome {
    let decision = state.attempts().check_at(client, now_millis);
    if matches!(decision, AttemptDecision::Blocked { .. }) {
        return LoginOutcome::Blocked(decision);
    }

    if state.credentials().verify(email, password) {
        state.attempts().record_success(client);
        LoginOutcome::Authenticated(state.tokens().issue_at(now_millis))
    } else {
        state.attempts().record_failure_at(client, now_millis);
        LoginOutcome::Rejected
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in; session cookie set.", body = SuccessResponse),
        (status = 400, description = "Malformed request."),
        (status = 401, description = "Invalid credentials."),
        (status = 429, description = "Too many failed attempts."),
    ),
    tag = "admin"
)]
pub async fn login(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    admin_state: Extension<Arc<AdminState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let client = client_key(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        admin_state.config().trust_proxy_headers(),
    );

    let decision = admin_state.attempts().check(&client);
    if matches!(decision, AttemptDecision::Blocked { .. }) {
        warn!(client = %client, "admin login attempt while locked out");
        return Err(rate_limited(&decision));
    }

    let Some(Json(request)) = payload else {
        return Err(ApiError::validation("Email and password are required"));
    };
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    match attempt_login_at(
        &admin_state,
        &client,
        &request.email,
        &request.password,
        now_millis(),
    ) {
        LoginOutcome::Authenticated(session) => {
            info!(client = %client, "admin signed in");
            let cookie = session_cookie(admin_state.config(), &session.token)
                .map_err(|err| anyhow::anyhow!("failed to build session cookie: {err}"))?;
            let mut response_headers = HeaderMap::new();
            response_headers.insert(SET_COOKIE, cookie);
            Ok((
                StatusCode::OK,
                response_headers,
                Json(SuccessResponse { success: true }),
            ))
        }
        LoginOutcome::Rejected => {
            warn!(client = %client, "admin login rejected");
            Err(ApiError::unauthorized(INVALID_CREDENTIALS))
        }
        LoginOutcome::Blocked(decision) => {
            warn!(client = %client, "admin login attempt while locked out");
            Err(rate_limited(&decision))
        }
    }
}

fn rate_limited(decision: &AttemptDecision) -> ApiError {
    ApiError::RateLimited {
        retry_after_minutes: decision.retry_after_minutes(),
        retry_after_seconds: decision.retry_after_seconds(),
    }
}
