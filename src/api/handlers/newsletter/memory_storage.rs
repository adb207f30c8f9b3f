//! In-process subscriber store for local runs and tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::storage::{SubscribeOutcome, SubscriberRecord, SubscriberStore, TokenRole};
use super::utils::generate_subscriber_token;

struct Entry {
    record: SubscriberRecord,
    /// Confirm token spent by the last confirmation.
    consumed_confirm_token: Option<String>,
}

#[derive(Default)]
pub struct MemorySubscriberStore {
    entries: Mutex<HashMap<Uuid, Entry>>,
}

impl MemorySubscriberStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn entry_mut(entries: &mut HashMap<Uuid, Entry>, id: Uuid) -> Result<&mut Entry> {
    entries
        .get_mut(&id)
        .ok_or_else(|| anyhow!("subscriber {id} not found"))
}

#[async_trait]
impl SubscriberStore for MemorySubscriberStore {
    async fn find_by_token(
        &self,
        token: &str,
        role: TokenRole,
    ) -> Result<Option<SubscriberRecord>> {
        let entries = self.entries.lock().await;
        let found = entries.values().find(|entry| match role {
            TokenRole::Confirm => {
                entry.record.confirm_token.as_deref() == Some(token)
                    || entry.consumed_confirm_token.as_deref() == Some(token)
            }
            TokenRole::Unsubscribe => entry.record.unsubscribe_token == token,
        });
        Ok(found.map(|entry| entry.record.clone()))
    }

    async fn mark_confirmed(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entry_mut(&mut entries, id)?;
        if !entry.record.confirmed {
            entry.record.confirmed = true;
            entry.record.confirmed_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn clear_confirm_token(&self, id: Uuid) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entry_mut(&mut entries, id)?;
        if let Some(token) = entry.record.confirm_token.take() {
            entry.consumed_confirm_token = Some(token);
        }
        Ok(())
    }

    async fn mark_unsubscribed(
        &self,
        id: Uuid,
        reason: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entry_mut(&mut entries, id)?;
        let record = &mut entry.record;
        if !record.unsubscribed {
            record.unsubscribed = true;
            record.unsubscribed_at = Some(Utc::now());
        }
        if let Some(reason) = reason {
            record.unsubscribe_reason = Some(reason.to_string());
        }
        if let Some(feedback) = feedback {
            record.unsubscribe_feedback = Some(feedback.to_string());
        }
        record.confirm_token = None;
        Ok(())
    }

    async fn update_locale_preference(&self, id: Uuid, locale: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entry_mut(&mut entries, id)?.record.locale = locale.to_string();
        Ok(())
    }

    async fn subscribe(&self, email: &str, locale: &str) -> Result<SubscribeOutcome> {
        let confirm_token = generate_subscriber_token()?;
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries
            .values_mut()
            .find(|entry| entry.record.email == email)
        {
            let record = &mut entry.record;
            if record.confirmed && !record.unsubscribed {
                return Ok(SubscribeOutcome::AlreadyConfirmed);
            }
            record.locale = locale.to_string();
            record.confirmed = false;
            record.confirmed_at = None;
            record.unsubscribed = false;
            record.unsubscribed_at = None;
            record.confirm_token = Some(confirm_token);
            entry.consumed_confirm_token = None;
            return Ok(SubscribeOutcome::Rearmed(record.clone()));
        }

        let record = SubscriberRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            locale: locale.to_string(),
            confirmed: false,
            confirm_token: Some(confirm_token),
            unsubscribe_token: generate_subscriber_token()?,
            unsubscribed: false,
            unsubscribe_reason: None,
            unsubscribe_feedback: None,
            created_at: Utc::now(),
            confirmed_at: None,
            unsubscribed_at: None,
        };
        entries.insert(
            record.id,
            Entry {
                record: record.clone(),
                consumed_confirm_token: None,
            },
        );
        Ok(SubscribeOutcome::Created(record))
    }

    async fn list(&self, limit: i64) -> Result<Vec<SubscriberRecord>> {
        let entries = self.entries.lock().await;
        let mut records: Vec<SubscriberRecord> =
            entries.values().map(|entry| entry.record.clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(records)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
