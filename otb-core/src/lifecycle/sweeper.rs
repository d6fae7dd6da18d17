//! Lifecycle sweeper.
//!
//! A perpetual background task that, on a fixed interval:
//! - completes every scheduled seance whose end time has passed,
//! - deactivates the active tickets of those seances,
//! - prunes expired notification dedup records.
//!
//! Ticks are idempotent (queries are bounded by status, not a time
//! window), a failed tick is logged and retried on the next one, and a
//! slow tick delays the next rather than overlapping it.

use sqlx::PgPool;
use time::PrimitiveDateTime;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::entities::notification_record::NotificationRecord;
use crate::entities::seance::Seance;
use crate::entities::ticket::Ticket;
use crate::entities::now_utc;

/// Timing knobs for the sweeper.
#[derive(Debug, Clone, Copy)]
pub struct SweeperConfig {
    /// Interval between ticks.
    pub tick_interval: std::time::Duration,
    /// Age beyond which notification dedup records are dropped.
    pub dedup_ttl: time::Duration,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            tick_interval: std::time::Duration::from_secs(5),
            dedup_ttl: time::Duration::days(30),
        }
    }
}

/// What one sweep tick changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepOutcome {
    /// Seances moved from scheduled to completed.
    pub completed: usize,
    /// Tickets moved from active to inactive.
    pub deactivated: u64,
}

/// Sweeper advances seance and ticket status based on wall-clock time.
pub struct Sweeper {
    pool: PgPool,
    config: SweeperConfig,
}

impl Sweeper {
    pub fn new(pool: PgPool, config: SweeperConfig) -> Self {
        Self { pool, config }
    }

    /// Run the Sweeper until shutdown is signaled.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.tick_interval.as_secs(),
            "Sweeper started"
        );

        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Sweeper received shutdown signal");
                        break;
                    }
                }

                _ = ticker.tick() => {
                    let now = now_utc();
                    self.tick(now).await;
                }
            }
        }

        info!("Sweeper shutdown complete");
    }

    /// One tick: sweep, then prune. Errors are logged, never raised —
    /// the next tick retries against the same status-bounded queries.
    async fn tick(&self, now: PrimitiveDateTime) {
        match sweep_once(&self.pool, now).await {
            Ok(outcome) if outcome.completed > 0 => {
                info!(
                    completed = outcome.completed,
                    deactivated = outcome.deactivated,
                    "sweep tick advanced seances"
                );
            }
            Ok(_) => debug!("sweep tick, nothing overdue"),
            Err(e) => error!(error = %e, "sweep tick failed"),
        }

        let cutoff = now - self.config.dedup_ttl;
        match NotificationRecord::purge_older_than(&self.pool, cutoff).await {
            Ok(purged) if purged > 0 => {
                debug!(purged, "pruned expired notification records");
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "failed to prune notification records"),
        }
    }
}

/// Complete overdue seances and deactivate their tickets, atomically.
///
/// Takes `now` from the caller so tests can drive the sweep with a
/// fixed clock. Re-running with the same data is a no-op.
pub async fn sweep_once(pool: &PgPool, now: PrimitiveDateTime) -> Result<SweepOutcome, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let completed_ids = Seance::complete_overdue_tx(&mut tx, now).await?;
    let deactivated = if completed_ids.is_empty() {
        0
    } else {
        Ticket::deactivate_for_seances_tx(&mut tx, &completed_ids).await?
    };

    tx.commit().await?;

    Ok(SweepOutcome {
        completed: completed_ids.len(),
        deactivated,
    })
}
