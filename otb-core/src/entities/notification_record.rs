//! Persistent notification dedup ledger.
//!
//! A row per (event, user) that has had at least one successful delivery
//! attempt. Checked before dispatch so a retried lifecycle command never
//! re-delivers the same event to the same user.

use sqlx::PgPool;
use time::PrimitiveDateTime;
use uuid::Uuid;

use super::UserId;

pub struct NotificationRecord;

impl NotificationRecord {
    pub async fn exists(
        pool: &PgPool,
        event_id: Uuid,
        user_id: UserId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM notification_records WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Record a dispatched (event, user) pair.
    ///
    /// Returns `false` when the pair was already recorded by a
    /// concurrent dispatcher.
    pub async fn record(pool: &PgPool, event_id: Uuid, user_id: UserId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO notification_records (event_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (event_id, user_id) DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop records older than the cutoff. Keeps the ledger bounded over
    /// long uptimes; the TTL must comfortably outlive any command retry.
    pub async fn purge_older_than(
        pool: &PgPool,
        cutoff: PrimitiveDateTime,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notification_records WHERE sent_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
