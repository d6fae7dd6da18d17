//! Seance lifecycle: manager commands and the periodic sweeper.
//!
//! Status transitions are monotonic — scheduled seances move to
//! completed (sweeper) or cancelled (manager) and never back. The one
//! self-transition is scheduled → scheduled: a reschedule changes time,
//! show or theatre without leaving the state.

pub mod commands;
pub mod sweeper;
pub mod validate;

pub use commands::{AddSeance, CommandError, LifecycleService, UpdateSeance};
pub use sweeper::{sweep_once, SweepOutcome, Sweeper, SweeperConfig};
