//! Ticket records: one user's claim on one seat for one seance.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Inactive,
}

impl From<TicketStatus> for otb_sdk::objects::TicketStatus {
    fn from(status: TicketStatus) -> Self {
        match status {
            TicketStatus::Active => Self::Active,
            TicketStatus::Inactive => Self::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "seat_occupancy", rename_all = "lowercase")]
pub enum SeatOccupancy {
    Occupied,
    Free,
}

impl From<SeatOccupancy> for otb_sdk::objects::SeatOccupancy {
    fn from(occupancy: SeatOccupancy) -> Self {
        match occupancy {
            SeatOccupancy::Occupied => Self::Occupied,
            SeatOccupancy::Free => Self::Free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub seance_id: i64,
    pub seat_id: i64,
    pub user_id: UserId,
    pub status: TicketStatus,
    pub seat_status: SeatOccupancy,
    pub total_price: Decimal,
    pub purchased_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketInsert {
    pub seance_id: i64,
    pub seat_id: i64,
    pub user_id: UserId,
    pub total_price: Decimal,
}

impl Ticket {
    /// Whether a live claim already exists for the (seance, seat) pair.
    ///
    /// Must run inside the transaction holding the seance row lock so
    /// the answer stays true until the booking commits.
    pub async fn live_claim_exists_tx(
        tx: &mut Transaction<'_, Postgres>,
        seance_id: i64,
        seat_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM tickets
                WHERE seance_id = $1 AND seat_id = $2
                  AND status = 'active' AND seat_status = 'occupied'
            )
            "#,
        )
        .bind(seance_id)
        .bind(seat_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Insert a freshly booked ticket (active, seat occupied).
    pub async fn insert_booked_tx(
        tx: &mut Transaction<'_, Postgres>,
        insert: TicketInsert,
    ) -> Result<Ticket, sqlx::Error> {
        sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (seance_id, seat_id, user_id, status, seat_status, total_price)
            VALUES ($1, $2, $3, 'active', 'occupied', $4)
            RETURNING id, seance_id, seat_id, user_id, status, seat_status, total_price, purchased_at
            "#,
        )
        .bind(insert.seance_id)
        .bind(insert.seat_id)
        .bind(insert.user_id)
        .bind(insert.total_price)
        .fetch_one(&mut **tx)
        .await
    }

    /// Deactivate every active ticket of the given seances.
    ///
    /// `seat_status` is untouched: the claim stays in place as a
    /// historical record of who sat where.
    pub async fn deactivate_for_seances_tx(
        tx: &mut Transaction<'_, Postgres>,
        seance_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tickets SET status = 'inactive'
            WHERE seance_id = ANY($1) AND status = 'active'
            "#,
        )
        .bind(seance_ids)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Seat ids with a live claim on the seance.
    pub async fn occupied_seat_ids(pool: &PgPool, seance_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT seat_id FROM tickets
            WHERE seance_id = $1 AND status = 'active' AND seat_status = 'occupied'
            ORDER BY seat_id
            "#,
        )
        .bind(seance_id)
        .fetch_all(pool)
        .await
    }

    /// Distinct users holding a live claim on the seance — the affected
    /// user set of a lifecycle command.
    pub async fn active_holder_ids(
        pool: &PgPool,
        seance_id: i64,
    ) -> Result<Vec<UserId>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT user_id FROM tickets
            WHERE seance_id = $1 AND status = 'active' AND seat_status = 'occupied'
            "#,
        )
        .bind(seance_id)
        .fetch_all(pool)
        .await
    }
}
