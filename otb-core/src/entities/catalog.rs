//! Read-only reference data: theatres, rows, seats, shows, managers.
//!
//! Owned by the administration subsystem; this engine only queries it.

use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Theatre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Show {
    pub id: i64,
    pub title: String,
    pub start_price: Decimal,
}

/// A seat joined with its row, as the booking service needs it: the row
/// carries the price markup and the row number used in conflict messages.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SeatInRow {
    pub seat_id: i64,
    pub seat_number: i32,
    pub row_id: i64,
    pub row_number: i32,
    pub theatre_id: i64,
    pub price_markup: Decimal,
}

impl Theatre {
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Theatre>, sqlx::Error> {
        sqlx::query_as::<_, Theatre>("SELECT id, name FROM theatres WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

impl Show {
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<Show>, sqlx::Error> {
        sqlx::query_as::<_, Show>("SELECT id, title, start_price FROM shows WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

impl SeatInRow {
    pub async fn get_by_seat_id(pool: &PgPool, seat_id: i64) -> Result<Option<SeatInRow>, sqlx::Error> {
        sqlx::query_as::<_, SeatInRow>(
            r#"
            SELECT s.id AS seat_id,
                   s.number AS seat_number,
                   r.id AS row_id,
                   r.number AS row_number,
                   r.theatre_id AS theatre_id,
                   r.price_markup AS price_markup
            FROM seats s
            JOIN theatre_rows r ON r.id = s.row_id
            WHERE s.id = $1
            "#,
        )
        .bind(seat_id)
        .fetch_optional(pool)
        .await
    }
}

/// Theatre assignment of a manager, or `None` for an unknown manager.
pub async fn manager_theatre(pool: &PgPool, manager_id: i64) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT theatre_id FROM managers WHERE id = $1")
        .bind(manager_id)
        .fetch_optional(pool)
        .await
}
