//! Manager-initiated lifecycle commands.
//!
//! Each command authorizes the manager against the seance's theatre,
//! validates, computes the affected user set *before* mutating state,
//! applies the change, and emits lifecycle events. Emission is a channel
//! send; delivery happens in the dispatcher and its outcome never
//! reaches the command's caller.

use sqlx::PgPool;
use thiserror::Error;
use time::PrimitiveDateTime;
use tracing::{error, info};

use crate::entities::catalog::{self, Show, Theatre};
use crate::entities::seance::{Seance, SeanceInsert, SeanceStatus};
use crate::entities::ticket::Ticket;
use crate::events::{Audience, LifecycleEvent, LifecycleEventSender, SeanceChange};

use super::validate::{validate_schedule, ScheduleError};

/// Errors that can occur in lifecycle commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Seance does not exist
    #[error("seance {0} not found")]
    SeanceNotFound(i64),

    /// Theatre does not exist
    #[error("theatre {0} not found")]
    TheatreNotFound(i64),

    /// Show does not exist
    #[error("show {0} not found")]
    ShowNotFound(i64),

    /// Manager is not assigned to the theatre
    #[error("manager {manager_id} is not assigned to theatre {theatre_id}")]
    Forbidden { manager_id: i64, theatre_id: i64 },

    /// The proposed time slot is malformed
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The proposed time slot crosses another seance in the theatre
    #[error("time slot overlaps seance {0} in the same theatre")]
    Overlapping(i64),

    /// The seance already left the scheduled state
    #[error("seance {0} is not scheduled")]
    NotScheduled(i64),
}

/// `PUT /seances/{id}`-shaped command input.
#[derive(Debug, Clone)]
pub struct UpdateSeance {
    pub seance_id: i64,
    pub manager_id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
    pub status: SeanceStatus,
}

/// `POST /seances`-shaped command input.
#[derive(Debug, Clone)]
pub struct AddSeance {
    pub manager_id: i64,
    pub theatre_id: i64,
    pub show_id: i64,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: PrimitiveDateTime,
}

/// Executes manager commands against the seance ledger.
#[derive(Clone)]
pub struct LifecycleService {
    pool: PgPool,
    events: LifecycleEventSender,
}

impl LifecycleService {
    pub fn new(pool: PgPool, events: LifecycleEventSender) -> Self {
        Self { pool, events }
    }

    /// Cancel a scheduled seance and notify every ticket holder.
    pub async fn cancel_seance(
        &self,
        seance_id: i64,
        manager_id: i64,
    ) -> Result<Seance, CommandError> {
        let seance = Seance::get_by_id(&self.pool, seance_id)
            .await?
            .ok_or(CommandError::SeanceNotFound(seance_id))?;

        self.ensure_manager_of(manager_id, seance.theatre_id).await?;

        if seance.status != SeanceStatus::Scheduled {
            return Err(CommandError::NotScheduled(seance_id));
        }

        // Affected set first: after the status flips, holders still
        // reference the seance, but the rule is to capture the set at
        // the moment of the command.
        let affected = Ticket::active_holder_ids(&self.pool, seance_id).await?;

        let cancelled = Seance::cancel_if_scheduled(&self.pool, seance_id)
            .await?
            .ok_or(CommandError::NotScheduled(seance_id))?;

        let show = Show::get_by_id(&self.pool, cancelled.show_id)
            .await?
            .ok_or(CommandError::ShowNotFound(cancelled.show_id))?;
        let theatre = Theatre::get_by_id(&self.pool, cancelled.theatre_id)
            .await?
            .ok_or(CommandError::TheatreNotFound(cancelled.theatre_id))?;

        info!(
            seance_id,
            manager_id,
            affected = affected.len(),
            "seance cancelled"
        );

        self.emit(
            Audience::Users(affected),
            SeanceChange::Cancellation {
                show_title: show.title,
                theatre_name: theatre.name,
                starts_at: cancelled.starts_at,
            },
        )
        .await;

        Ok(cancelled)
    }

    /// Update a scheduled seance's theatre, show, time slot or status.
    ///
    /// Fires a reschedule event when the start time moved and a show
    /// change event when the show was swapped; the checks are
    /// independent, so one update may emit both, either or neither.
    pub async fn update_seance(&self, cmd: UpdateSeance) -> Result<Seance, CommandError> {
        let old = Seance::get_by_id(&self.pool, cmd.seance_id)
            .await?
            .ok_or(CommandError::SeanceNotFound(cmd.seance_id))?;

        self.ensure_manager_of(cmd.manager_id, old.theatre_id).await?;
        if cmd.theatre_id != old.theatre_id {
            Theatre::get_by_id(&self.pool, cmd.theatre_id)
                .await?
                .ok_or(CommandError::TheatreNotFound(cmd.theatre_id))?;
            self.ensure_manager_of(cmd.manager_id, cmd.theatre_id).await?;
        }

        if old.status != SeanceStatus::Scheduled {
            return Err(CommandError::NotScheduled(cmd.seance_id));
        }

        let old_show = Show::get_by_id(&self.pool, old.show_id)
            .await?
            .ok_or(CommandError::ShowNotFound(old.show_id))?;
        let new_show = if cmd.show_id == old.show_id {
            old_show.clone()
        } else {
            Show::get_by_id(&self.pool, cmd.show_id)
                .await?
                .ok_or(CommandError::ShowNotFound(cmd.show_id))?
        };

        validate_schedule(cmd.starts_at, cmd.ends_at)?;

        if let Some(other) = Seance::find_conflicting(
            &self.pool,
            cmd.theatre_id,
            cmd.starts_at,
            cmd.ends_at,
            Some(cmd.seance_id),
        )
        .await?
        {
            return Err(CommandError::Overlapping(other));
        }

        let affected = Ticket::active_holder_ids(&self.pool, cmd.seance_id).await?;

        let updated = Seance::apply_update(
            &self.pool,
            cmd.seance_id,
            cmd.theatre_id,
            cmd.show_id,
            cmd.starts_at,
            cmd.ends_at,
            cmd.status,
        )
        .await?
        .ok_or(CommandError::NotScheduled(cmd.seance_id))?;

        info!(
            seance_id = cmd.seance_id,
            manager_id = cmd.manager_id,
            affected = affected.len(),
            time_changed = updated.starts_at != old.starts_at,
            show_changed = updated.show_id != old.show_id,
            "seance updated"
        );

        if updated.starts_at != old.starts_at {
            // Holders know the seance under its old title.
            self.emit(
                Audience::Users(affected.clone()),
                SeanceChange::Reschedule {
                    show_title: old_show.title.clone(),
                    old_starts_at: old.starts_at,
                    new_starts_at: updated.starts_at,
                },
            )
            .await;
        }

        if updated.show_id != old.show_id {
            self.emit(
                Audience::Users(affected),
                SeanceChange::ShowChange {
                    old_show_title: old_show.title,
                    new_show_title: new_show.title,
                    starts_at: updated.starts_at,
                },
            )
            .await;
        }

        Ok(updated)
    }

    /// Schedule a new seance; announce a premiere when it is the show's
    /// first seance ever.
    pub async fn add_seance(&self, cmd: AddSeance) -> Result<Seance, CommandError> {
        let theatre = Theatre::get_by_id(&self.pool, cmd.theatre_id)
            .await?
            .ok_or(CommandError::TheatreNotFound(cmd.theatre_id))?;
        let show = Show::get_by_id(&self.pool, cmd.show_id)
            .await?
            .ok_or(CommandError::ShowNotFound(cmd.show_id))?;

        self.ensure_manager_of(cmd.manager_id, cmd.theatre_id).await?;

        validate_schedule(cmd.starts_at, cmd.ends_at)?;

        if let Some(other) =
            Seance::find_conflicting(&self.pool, cmd.theatre_id, cmd.starts_at, cmd.ends_at, None)
                .await?
        {
            return Err(CommandError::Overlapping(other));
        }

        let is_premiere = Seance::count_for_show(&self.pool, cmd.show_id).await? == 0;

        let seance = Seance::insert_new(
            &self.pool,
            SeanceInsert {
                theatre_id: cmd.theatre_id,
                show_id: cmd.show_id,
                starts_at: cmd.starts_at,
                ends_at: cmd.ends_at,
            },
        )
        .await?;

        info!(
            seance_id = seance.id,
            manager_id = cmd.manager_id,
            is_premiere,
            "seance added"
        );

        if is_premiere {
            // No tickets exist yet, so the audience is the messaging
            // channel's subscriber list rather than ticket holders.
            self.emit(
                Audience::Subscribers,
                SeanceChange::Premiere {
                    show_title: show.title,
                    theatre_name: theatre.name,
                    starts_at: seance.starts_at,
                },
            )
            .await;
        }

        Ok(seance)
    }

    /// Single authorization policy: the manager must be assigned to the
    /// theatre they are operating on.
    async fn ensure_manager_of(&self, manager_id: i64, theatre_id: i64) -> Result<(), CommandError> {
        match catalog::manager_theatre(&self.pool, manager_id).await? {
            Some(assigned) if assigned == theatre_id => Ok(()),
            _ => Err(CommandError::Forbidden {
                manager_id,
                theatre_id,
            }),
        }
    }

    async fn emit(&self, audience: Audience, change: SeanceChange) {
        let event = LifecycleEvent::new(audience, change);
        let kind = event.change.kind();
        let event_id = event.event_id;
        if let Err(e) = self.events.send(event).await {
            // Dispatcher gone; the command itself already succeeded.
            error!(%event_id, kind, error = %e, "failed to enqueue lifecycle event");
        }
    }
}
