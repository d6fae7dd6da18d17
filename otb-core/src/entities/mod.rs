//! Database models and queries.
//!
//! Each entity owns its SQL: a plain struct deriving `sqlx::FromRow`
//! plus async methods taking an executor. Methods suffixed `_tx` run
//! inside a caller-owned transaction; the rest take the pool.

pub mod catalog;
pub mod messenger_identity;
pub mod notification_record;
pub mod seance;
pub mod ticket;

use time::{OffsetDateTime, PrimitiveDateTime};

/// Identifier of a ticket-holding user. Users live in an external
/// accounts subsystem; this engine only ever carries their ids.
pub type UserId = i64;

/// Current UTC wall-clock time as the naive timestamp type used by all
/// database columns.
pub fn now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}
