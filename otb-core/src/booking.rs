//! Booking service.
//!
//! Owns the core correctness property of the engine: for a given
//! (seance, seat) pair, at most one ticket holds a live claim at any
//! instant, no matter how many bookers race.
//!
//! The protocol is lock-then-recheck inside one transaction:
//! 1. `SELECT ... FOR UPDATE` on the seance row serializes all
//!    concurrent bookers of that seance.
//! 2. The live-claim check runs under that lock, so a loser observes
//!    the winner's ticket even though it committed after the loser's
//!    transaction began.
//! 3. The partial unique index on tickets backs the same invariant at
//!    the storage layer; a violation is re-mapped to the same conflict
//!    error the check produces.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info};

use crate::entities::catalog::{SeatInRow, Show};
use crate::entities::seance::{Seance, SeanceStatus};
use crate::entities::ticket::{Ticket, TicketInsert};
use crate::entities::UserId;

/// Errors that can occur while booking.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Seance does not exist
    #[error("seance {0} not found")]
    SeanceNotFound(i64),

    /// Seat does not exist
    #[error("seat {0} not found")]
    SeatNotFound(i64),

    /// Show referenced by the seance does not exist
    #[error("show {0} not found")]
    ShowNotFound(i64),

    /// Seance is completed or cancelled
    #[error("seance {0} is not open for booking")]
    SeanceNotBookable(i64),

    /// Another ticket already holds the seat
    #[error("seat {seat} in row {row} is already taken")]
    SeatTaken { row: i32, seat: i32 },
}

/// Books seats and reports seat occupancy.
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Book a seat for a user on a seance.
    ///
    /// Exactly one of N concurrent calls for the same (seance, seat)
    /// succeeds; the others return [`BookingError::SeatTaken`] naming
    /// the row and seat for client messaging.
    pub async fn book_seat(
        &self,
        seance_id: i64,
        seat_id: i64,
        user_id: UserId,
    ) -> Result<Ticket, BookingError> {
        let seat = SeatInRow::get_by_seat_id(&self.pool, seat_id)
            .await?
            .ok_or(BookingError::SeatNotFound(seat_id))?;

        let mut tx = self.pool.begin().await?;

        // Dropping `tx` before commit rolls everything back, so every
        // error path below releases the lock cleanly.
        let seance = Seance::lock_by_id_tx(&mut tx, seance_id)
            .await?
            .ok_or(BookingError::SeanceNotFound(seance_id))?;

        if seance.status != SeanceStatus::Scheduled {
            return Err(BookingError::SeanceNotBookable(seance_id));
        }

        if Ticket::live_claim_exists_tx(&mut tx, seance_id, seat_id).await? {
            debug!(
                seance_id,
                seat_id,
                user_id,
                "booking rejected, seat already claimed"
            );
            return Err(BookingError::SeatTaken {
                row: seat.row_number,
                seat: seat.seat_number,
            });
        }

        let show = Show::get_by_id(&self.pool, seance.show_id)
            .await?
            .ok_or(BookingError::ShowNotFound(seance.show_id))?;

        let total_price = ticket_price(seat.price_markup, show.start_price);

        let ticket = match Ticket::insert_booked_tx(
            &mut tx,
            TicketInsert {
                seance_id,
                seat_id,
                user_id,
                total_price,
            },
        )
        .await
        {
            Ok(ticket) => ticket,
            // The partial unique index fired despite the row lock; treat
            // it exactly like the in-transaction check.
            Err(e) if is_unique_violation(&e) => {
                return Err(BookingError::SeatTaken {
                    row: seat.row_number,
                    seat: seat.seat_number,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        info!(
            seance_id,
            seat_id,
            user_id,
            ticket_id = ticket.id,
            price = %ticket.total_price,
            "seat booked"
        );

        Ok(ticket)
    }

    /// Seat ids of the seance with a live claim.
    pub async fn occupied_seats(&self, seance_id: i64) -> Result<Vec<i64>, BookingError> {
        Seance::get_by_id(&self.pool, seance_id)
            .await?
            .ok_or(BookingError::SeanceNotFound(seance_id))?;
        Ok(Ticket::occupied_seat_ids(&self.pool, seance_id).await?)
    }
}

/// Ticket price: the row's markup on top of the show's base price.
pub fn ticket_price(row_markup: Decimal, show_start_price: Decimal) -> Decimal {
    row_markup + show_start_price
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_ticket_price_is_markup_plus_base() {
        let price = ticket_price(Decimal::new(2550, 2), Decimal::new(10000, 2));
        assert_eq!(price, Decimal::new(12550, 2));
    }

    #[test]
    fn test_ticket_price_zero_markup() {
        let base = Decimal::new(7500, 2);
        assert_eq!(ticket_price(Decimal::ZERO, base), base);
    }
}
