//! Request/response types for admin endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub authenticated: bool,
    /// Milliseconds since the Unix epoch.
    pub expires_at: i64,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubscriberSummary {
    pub id: String,
    pub email: String,
    pub locale: String,
    pub confirmed: bool,
    pub unsubscribed: bool,
    pub created_at: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SubscriberListResponse {
    pub subscribers: Vec<SubscriberSummary>,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct SubscriberListQuery {
    /// Maximum rows to return (1-500, default 50).
    pub limit: Option<i64>,
}
