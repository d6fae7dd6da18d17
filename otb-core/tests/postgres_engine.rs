//! Engine properties that need a real Postgres behind them.
//!
//! These tests exercise the transactional booking invariant and the
//! sweeper against a live database and are ignored by default. To run
//! them:
//!
//! ```text
//! export DATABASE_URL=postgres://localhost/otb_test
//! sqlx migrate run   # or: otb-server --migrate
//! cargo test -p otb-core -- --ignored
//! ```
//!
//! Each test creates its own theatre/show/seance fixtures, so they can
//! share one database, but they are not safe to run against production
//! data.

use otb_core::booking::{BookingError, BookingService};
use otb_core::entities::notification_record::NotificationRecord;
use otb_core::entities::seance::{Seance, SeanceInsert, SeanceStatus};
use otb_core::entities::ticket::{Ticket, TicketStatus};
use otb_core::entities::now_utc;
use otb_core::lifecycle::sweep_once;
use sqlx::PgPool;
use time::Duration;
use uuid::Uuid;

async fn connect() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for ignored tests");
    PgPool::connect(&url).await.expect("connect to test database")
}

struct Fixture {
    theatre_id: i64,
    show_id: i64,
    seat_id: i64,
}

/// Insert a theatre with one row and one seat, plus a show.
async fn fixture(pool: &PgPool) -> Fixture {
    let theatre_id: i64 =
        sqlx::query_scalar("INSERT INTO theatres (name) VALUES ('Test Hall') RETURNING id")
            .fetch_one(pool)
            .await
            .expect("insert theatre");

    let row_id: i64 = sqlx::query_scalar(
        "INSERT INTO theatre_rows (theatre_id, number, price_markup) VALUES ($1, 5, 25.00) RETURNING id",
    )
    .bind(theatre_id)
    .fetch_one(pool)
    .await
    .expect("insert row");

    let seat_id: i64 =
        sqlx::query_scalar("INSERT INTO seats (row_id, number) VALUES ($1, 3) RETURNING id")
            .bind(row_id)
            .fetch_one(pool)
            .await
            .expect("insert seat");

    let show_id: i64 = sqlx::query_scalar(
        "INSERT INTO shows (title, start_price) VALUES ('Hamlet', 100.00) RETURNING id",
    )
    .fetch_one(pool)
    .await
    .expect("insert show");

    Fixture {
        theatre_id,
        show_id,
        seat_id,
    }
}

async fn scheduled_seance(pool: &PgPool, fx: &Fixture, start_offset: Duration) -> Seance {
    let starts_at = now_utc() + start_offset;
    Seance::insert_new(
        pool,
        SeanceInsert {
            theatre_id: fx.theatre_id,
            show_id: fx.show_id,
            starts_at,
            ends_at: starts_at + Duration::hours(2),
        },
    )
    .await
    .expect("insert seance")
}

#[tokio::test]
#[ignore = "requires a live Postgres (set DATABASE_URL), run with --ignored"]
async fn concurrent_bookers_one_winner() {
    let pool = connect().await;
    let fx = fixture(&pool).await;
    let seance = scheduled_seance(&pool, &fx, Duration::days(1)).await;

    let service = BookingService::new(pool.clone());
    let bookers: Vec<_> = (0..8)
        .map(|i| {
            let service = service.clone();
            let seance_id = seance.id;
            let seat_id = fx.seat_id;
            tokio::spawn(async move { service.book_seat(seance_id, seat_id, 100 + i).await })
        })
        .collect();

    let mut winners = 0;
    let mut conflicts = 0;
    for handle in bookers {
        match handle.await.expect("booker task") {
            Ok(ticket) => {
                assert_eq!(ticket.status, TicketStatus::Active);
                winners += 1;
            }
            Err(BookingError::SeatTaken { row, seat }) => {
                assert_eq!((row, seat), (5, 3));
                conflicts += 1;
            }
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set DATABASE_URL), run with --ignored"]
async fn booking_rejected_on_cancelled_seance() {
    let pool = connect().await;
    let fx = fixture(&pool).await;
    let seance = scheduled_seance(&pool, &fx, Duration::days(1)).await;

    Seance::cancel_if_scheduled(&pool, seance.id)
        .await
        .expect("cancel query")
        .expect("seance was scheduled");

    let service = BookingService::new(pool.clone());
    let result = service.book_seat(seance.id, fx.seat_id, 100).await;
    assert!(matches!(result, Err(BookingError::SeanceNotBookable(_))));
}

#[tokio::test]
#[ignore = "requires a live Postgres (set DATABASE_URL), run with --ignored"]
async fn sweep_completes_overdue_seance_and_deactivates_tickets() {
    let pool = connect().await;
    let fx = fixture(&pool).await;
    // Ended yesterday, still scheduled.
    let seance = scheduled_seance(&pool, &fx, Duration::days(-2)).await;

    let service = BookingService::new(pool.clone());
    let ticket = service
        .book_seat(seance.id, fx.seat_id, 200)
        .await
        .expect("book before sweep");

    let now = now_utc();
    let outcome = sweep_once(&pool, now).await.expect("sweep");
    assert!(outcome.completed >= 1);

    let swept = Seance::get_by_id(&pool, seance.id)
        .await
        .expect("query seance")
        .expect("seance exists");
    assert_eq!(swept.status, SeanceStatus::Completed);

    let holders = Ticket::active_holder_ids(&pool, seance.id)
        .await
        .expect("query holders");
    assert!(holders.is_empty(), "ticket {} should be inactive", ticket.id);

    // Idempotence: a second sweep finds nothing to do for this seance.
    let again = sweep_once(&pool, now).await.expect("second sweep");
    assert_eq!(again.completed, 0);
}

#[tokio::test]
#[ignore = "requires a live Postgres (set DATABASE_URL), run with --ignored"]
async fn notification_record_dedups_per_event_and_user() {
    let pool = connect().await;
    let event_id = Uuid::new_v4();

    assert!(!NotificationRecord::exists(&pool, event_id, 42)
        .await
        .expect("exists query"));

    assert!(NotificationRecord::record(&pool, event_id, 42)
        .await
        .expect("first record"));
    // Second attempt is absorbed.
    assert!(!NotificationRecord::record(&pool, event_id, 42)
        .await
        .expect("second record"));

    assert!(NotificationRecord::exists(&pool, event_id, 42)
        .await
        .expect("exists query"));

    // A different user of the same event is unaffected.
    assert!(NotificationRecord::record(&pool, event_id, 43)
        .await
        .expect("other user"));
}
