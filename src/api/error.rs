//! API error taxonomy and its HTTP mapping.
//!
//! Bodies are always `{"error": "<code or message>"}`. Dependency failures are
//! logged here and reach the client only as `server_error`.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),
    /// Bad credentials or an invalid/expired session.
    #[error("{0}")]
    Unauthorized(String),
    #[error("Too many login attempts. Please try again in {retry_after_minutes} minute(s).")]
    RateLimited {
        retry_after_minutes: i64,
        retry_after_seconds: i64,
    },
    /// A token that does not resolve to a record.
    #[error("{0}")]
    NotFound(String),
    #[error("dependency failure: {0:#}")]
    Dependency(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(code: impl Into<String>) -> Self {
        Self::Validation(code.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound(code.into())
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; never includes internal error detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Dependency(_) => "server_error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Dependency(err) = &self {
            error!("Dependency failure: {err:#}");
        }

        let status = self.status_code();
        let body = Json(json!({ "error": self.public_message() }));
        let mut response = (status, body).into_response();

        if let Self::RateLimited {
            retry_after_seconds,
            ..
        } = self
        {
            if let Ok(value) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Result<serde_json::Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::validation("missing_token").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unauthorized("Invalid credentials").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RateLimited {
                retry_after_minutes: 3,
                retry_after_seconds: 150
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::not_found("invalid_token").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn dependency_error_hides_detail() -> Result<()> {
        let response = ApiError::from(anyhow!("connection refused to 10.0.0.3")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await?;
        assert_eq!(body["error"], "server_error");
        Ok(())
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() -> Result<()> {
        let response = ApiError::RateLimited {
            retry_after_minutes: 3,
            retry_after_seconds: 150,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("150")
        );
        let body = body_json(response).await?;
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.contains("3 minute"), "unexpected message: {message}");
        Ok(())
    }

    #[tokio::test]
    async fn validation_code_is_the_body() -> Result<()> {
        let response = ApiError::validation("invalid_locale").into_response();
        let body = body_json(response).await?;
        assert_eq!(body, json!({ "error": "invalid_locale" }));
        Ok(())
    }
}
