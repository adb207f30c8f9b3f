//! Subscriber store contract used by the newsletter and admin endpoints.
//!
//! Tokens are opaque lookup keys generated by the store. Each subscriber owns
//! one confirm token (spent on confirmation) and one durable unsubscribe token
//! that every newsletter email links to.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Which of the two subscriber tokens a lookup should match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenRole {
    /// Matches the live confirm token and the one spent by a confirmation,
    /// so a reused link resolves to the (already confirmed) subscriber.
    Confirm,
    Unsubscribe,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub id: Uuid,
    pub email: String,
    pub locale: String,
    pub confirmed: bool,
    pub confirm_token: Option<String>,
    pub unsubscribe_token: String,
    pub unsubscribed: bool,
    pub unsubscribe_reason: Option<String>,
    pub unsubscribe_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

/// Result of a subscribe request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// New address; a confirmation email is due.
    Created(SubscriberRecord),
    /// Known but unconfirmed or unsubscribed address; confirm token re-armed.
    Rearmed(SubscriberRecord),
    /// Confirmed and active; nothing to send.
    AlreadyConfirmed,
}

#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn find_by_token(&self, token: &str, role: TokenRole)
    -> Result<Option<SubscriberRecord>>;

    async fn mark_confirmed(&self, id: Uuid) -> Result<()>;

    /// Spend the confirm token so the link cannot confirm again.
    async fn clear_confirm_token(&self, id: Uuid) -> Result<()>;

    /// Idempotent; reason/feedback of a repeated call overwrite earlier ones only when present.
    async fn mark_unsubscribed(
        &self,
        id: Uuid,
        reason: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<()>;

    async fn update_locale_preference(&self, id: Uuid, locale: &str) -> Result<()>;

    /// Create or re-arm a subscription for a normalized email.
    async fn subscribe(&self, email: &str, locale: &str) -> Result<SubscribeOutcome>;

    /// Newest first.
    async fn list(&self, limit: i64) -> Result<Vec<SubscriberRecord>>;

    /// Cheap liveness probe for `/health`.
    async fn ping(&self) -> Result<()>;
}
