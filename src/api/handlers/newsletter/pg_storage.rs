//! PostgreSQL subscriber store (`sql/schema.sql`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use super::storage::{SubscribeOutcome, SubscriberRecord, SubscriberStore, TokenRole};
use super::utils::generate_subscriber_token;

const COLUMNS: &str = "id, email, locale, confirmed, confirm_token, unsubscribe_token, \
     unsubscribed, unsubscribe_reason, unsubscribe_feedback, created_at, confirmed_at, \
     unsubscribed_at";

#[derive(Clone)]
pub struct PgSubscriberStore {
    pool: PgPool,
}

impl PgSubscriberStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

impl<'r> FromRow<'r, PgRow> for SubscriberRecord {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            locale: row.try_get("locale")?,
            confirmed: row.try_get("confirmed")?,
            confirm_token: row.try_get("confirm_token")?,
            unsubscribe_token: row.try_get("unsubscribe_token")?,
            unsubscribed: row.try_get("unsubscribed")?,
            unsubscribe_reason: row.try_get("unsubscribe_reason")?,
            unsubscribe_feedback: row.try_get("unsubscribe_feedback")?,
            created_at: row.try_get("created_at")?,
            confirmed_at: row.try_get("confirmed_at")?,
            unsubscribed_at: row.try_get("unsubscribed_at")?,
        })
    }
}

fn record_from_row(row: &PgRow) -> Result<SubscriberRecord> {
    SubscriberRecord::from_row(row).context("failed to decode subscriber row")
}

#[async_trait]
impl SubscriberStore for PgSubscriberStore {
    async fn find_by_token(
        &self,
        token: &str,
        role: TokenRole,
    ) -> Result<Option<SubscriberRecord>> {
        let query = match role {
            TokenRole::Confirm => format!(
                "SELECT {COLUMNS} FROM newsletter_subscribers \
                 WHERE confirm_token = $1 OR consumed_confirm_token = $1"
            ),
            TokenRole::Unsubscribe => format!(
                "SELECT {COLUMNS} FROM newsletter_subscribers WHERE unsubscribe_token = $1"
            ),
        };
        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to look up subscriber by token")?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn mark_confirmed(&self, id: Uuid) -> Result<()> {
        let query = r"
            UPDATE newsletter_subscribers
            SET confirmed = TRUE, confirmed_at = COALESCE(confirmed_at, NOW())
            WHERE id = $1
        ";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to mark subscriber confirmed")?;
        Ok(())
    }

    async fn clear_confirm_token(&self, id: Uuid) -> Result<()> {
        let query = r"
            UPDATE newsletter_subscribers
            SET consumed_confirm_token = confirm_token, confirm_token = NULL
            WHERE id = $1 AND confirm_token IS NOT NULL
        ";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to clear confirm token")?;
        Ok(())
    }

    async fn mark_unsubscribed(
        &self,
        id: Uuid,
        reason: Option<&str>,
        feedback: Option<&str>,
    ) -> Result<()> {
        let query = r"
            UPDATE newsletter_subscribers
            SET unsubscribed = TRUE,
                unsubscribed_at = COALESCE(unsubscribed_at, NOW()),
                unsubscribe_reason = COALESCE($2, unsubscribe_reason),
                unsubscribe_feedback = COALESCE($3, unsubscribe_feedback),
                confirm_token = NULL
            WHERE id = $1
        ";
        sqlx::query(query)
            .bind(id)
            .bind(reason)
            .bind(feedback)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to mark subscriber unsubscribed")?;
        Ok(())
    }

    async fn update_locale_preference(&self, id: Uuid, locale: &str) -> Result<()> {
        let query = "UPDATE newsletter_subscribers SET locale = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(locale)
            .execute(&self.pool)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to update locale preference")?;
        Ok(())
    }

    async fn subscribe(&self, email: &str, locale: &str) -> Result<SubscribeOutcome> {
        let confirm_token = generate_subscriber_token()?;
        let unsubscribe_token = generate_subscriber_token()?;

        // Active confirmed rows are left untouched and return nothing.
        let query = format!(
            "INSERT INTO newsletter_subscribers \
                 (id, email, locale, confirm_token, unsubscribe_token) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (email) DO UPDATE \
                 SET locale = EXCLUDED.locale, \
                     confirmed = FALSE, \
                     confirmed_at = NULL, \
                     unsubscribed = FALSE, \
                     unsubscribed_at = NULL, \
                     confirm_token = EXCLUDED.confirm_token, \
                     consumed_confirm_token = NULL \
                 WHERE NOT newsletter_subscribers.confirmed \
                    OR newsletter_subscribers.unsubscribed \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let row = sqlx::query(&query)
            .bind(Uuid::new_v4())
            .bind(email)
            .bind(locale)
            .bind(&confirm_token)
            .bind(&unsubscribe_token)
            .fetch_optional(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await
            .context("failed to upsert subscriber")?;

        let Some(row) = row else {
            return Ok(SubscribeOutcome::AlreadyConfirmed);
        };
        let inserted: bool = row
            .try_get("inserted")
            .context("failed to decode upsert result")?;
        let record = record_from_row(&row)?;
        Ok(if inserted {
            SubscribeOutcome::Created(record)
        } else {
            SubscribeOutcome::Rearmed(record)
        })
    }

    async fn list(&self, limit: i64) -> Result<Vec<SubscriberRecord>> {
        let query =
            format!("SELECT {COLUMNS} FROM newsletter_subscribers ORDER BY created_at DESC LIMIT $1");
        let rows = sqlx::query(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to list subscribers")?;

        rows.iter().map(record_from_row).collect()
    }

    async fn ping(&self) -> Result<()> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
