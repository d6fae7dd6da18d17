//! Seance records and their status transitions.

use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "seance_status", rename_all = "lowercase")]
pub enum SeanceStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl From<SeanceStatus> for otb_sdk::objects::SeanceStatus {
    fn from(status: SeanceStatus) -> Self {
        match status {
            SeanceStatus::Scheduled => Self::Scheduled,
            SeanceStatus::Completed => Self::Completed,
            SeanceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<otb_sdk::objects::SeanceStatus> for SeanceStatus {
    fn from(status: otb_sdk::objects::SeanceStatus) -> Self {
        match status {
            otb_sdk::objects::SeanceStatus::Scheduled => Self::Scheduled,
            otb_sdk::objects::SeanceStatus::Completed => Self::Completed,
            otb_sdk::objects::SeanceStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Seance {
    pub id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub status: SeanceStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeanceInsert {
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

impl Seance {
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            "SELECT id, theatre_id, show_id, starts_at, ends_at, status FROM seances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Fetch the seance with an exclusive row lock.
    ///
    /// Serializes every concurrent booker of this seance; the lock is
    /// held until the surrounding transaction commits or rolls back.
    pub async fn lock_by_id_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            "SELECT id, theatre_id, show_id, starts_at, ends_at, status FROM seances WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    pub async fn insert_new(pool: &PgPool, insert: SeanceInsert) -> Result<Seance, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            r#"
            INSERT INTO seances (theatre_id, show_id, starts_at, ends_at, status)
            VALUES ($1, $2, $3, $4, 'scheduled')
            RETURNING id, theatre_id, show_id, starts_at, ends_at, status
            "#,
        )
        .bind(insert.theatre_id)
        .bind(insert.show_id)
        .bind(insert.starts_at)
        .bind(insert.ends_at)
        .fetch_one(pool)
        .await
    }

    /// Cancel the seance if it is still scheduled.
    ///
    /// Returns `None` when the seance was not in the scheduled state,
    /// which guards against a racing cancel or sweep.
    pub async fn cancel_if_scheduled(pool: &PgPool, id: i64) -> Result<Option<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            r#"
            UPDATE seances SET status = 'cancelled'
            WHERE id = $1 AND status = 'scheduled'
            RETURNING id, theatre_id, show_id, starts_at, ends_at, status
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Apply a manager update to a still-scheduled seance.
    ///
    /// Returns `None` when the seance left the scheduled state between
    /// validation and the write.
    pub async fn apply_update(
        pool: &PgPool,
        id: i64,
        theatre_id: i64,
        show_id: i64,
        starts_at: PrimitiveDateTime,
        ends_at: PrimitiveDateTime,
        status: SeanceStatus,
    ) -> Result<Option<Seance>, sqlx::Error> {
        sqlx::query_as::<_, Seance>(
            r#"
            UPDATE seances
            SET theatre_id = $2, show_id = $3, starts_at = $4, ends_at = $5, status = $6
            WHERE id = $1 AND status = 'scheduled'
            RETURNING id, theatre_id, show_id, starts_at, ends_at, status
            "#,
        )
        .bind(id)
        .bind(theatre_id)
        .bind(show_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(status)
        .fetch_optional(pool)
        .await
    }

    /// Complete every scheduled seance whose end time has passed.
    ///
    /// Bounded by status rather than a time window, so a missed sweep
    /// tick is picked up by the next one.
    pub async fn complete_overdue_tx(
        tx: &mut Transaction<'_, Postgres>,
        now: PrimitiveDateTime,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE seances SET status = 'completed'
            WHERE status = 'scheduled' AND ends_at <= $1
            RETURNING id
            "#,
        )
        .bind(now)
        .fetch_all(&mut **tx)
        .await
    }

    /// Id of a scheduled seance in the theatre whose time range crosses
    /// the given one, if any. Touching boundaries do not conflict.
    pub async fn find_conflicting(
        pool: &PgPool,
        theatre_id: i64,
        starts_at: PrimitiveDateTime,
        ends_at: PrimitiveDateTime,
        exclude_id: Option<i64>,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM seances
            WHERE theatre_id = $1
              AND status = 'scheduled'
              AND starts_at < $3
              AND ends_at > $2
              AND ($4::BIGINT IS NULL OR id <> $4)
            LIMIT 1
            "#,
        )
        .bind(theatre_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(exclude_id)
        .fetch_optional(pool)
        .await
    }

    /// Number of seances ever created for the show, in any status.
    pub async fn count_for_show(pool: &PgPool, show_id: i64) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seances WHERE show_id = $1")
            .bind(show_id)
            .fetch_one(pool)
            .await
    }
}
