use std::io;
use std::sync::Arc;

use foodfight_core::{Action, FieldState, Symbol};
use thiserror::Error;

/// Best-effort abort of a call in flight, e.g. killing an agent process.
pub type Canceller = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("agent I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("agent sent malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("agent closed its output")]
    Closed,
    #[error("agent exceeded its time budget")]
    Timeout,
    #[error("controller worker stopped")]
    Worker,
}

/// Decision-making capability for one player.
///
/// Called at most once per player per turn with the pre-turn snapshot. An
/// `Err` retires the controller for the rest of the match.
pub trait Controller: Send {
    fn play_action(
        &mut self,
        field: &FieldState,
        team: Symbol,
        player: Symbol,
    ) -> Result<Option<Action>, ControllerError>;

    /// Hook used when a call overruns its deadline.
    fn canceller(&self) -> Option<Canceller> {
        None
    }
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn play_action(
        &mut self,
        field: &FieldState,
        team: Symbol,
        player: Symbol,
    ) -> Result<Option<Action>, ControllerError> {
        (**self).play_action(field, team, player)
    }

    fn canceller(&self) -> Option<Canceller> {
        (**self).canceller()
    }
}
