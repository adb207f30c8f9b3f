//! Request/response types for newsletter endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubscribeRequest {
    pub email: String,
    pub locale: Option<String>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct TokenQuery {
    pub token: Option<String>,
    /// Language of the page redirected to; unknown values fall back to `en`.
    pub locale: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UnsubscribeRequest {
    pub token: Option<String>,
    pub feedback: Option<String>,
    pub reason: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LocaleResponse {
    pub success: bool,
    pub locale: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SettingsResponse {
    pub locale: String,
    pub confirmed: bool,
    /// Masked address, e.g. `ab***@example.com`.
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct SettingsUpdateRequest {
    pub token: Option<String>,
    pub locale: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn unsubscribe_request_fields_are_optional() -> Result<()> {
        let request: UnsubscribeRequest = serde_json::from_value(serde_json::json!({}))?;
        assert!(request.token.is_none());
        assert!(request.reason.is_none());

        let request: UnsubscribeRequest = serde_json::from_value(
            serde_json::json!({ "token": "t", "reason": "too_frequent", "feedback": "bye" }),
        )?;
        assert_eq!(request.token.as_deref(), Some("t"));
        assert_eq!(request.feedback.as_deref(), Some("bye"));
        Ok(())
    }

    #[test]
    fn subscribe_request_requires_email() {
        let missing: Result<SubscribeRequest, _> =
            serde_json::from_value(serde_json::json!({ "locale": "de" }));
        assert!(missing.is_err());
    }
}
