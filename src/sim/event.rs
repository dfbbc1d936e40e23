/// Events emitted during a simulation step.
/// The presentation layer consumes these for status messages.

use crate::domain::cublet::CubletId;
use crate::domain::face::Move;
use crate::domain::turn::TurnId;
use crate::error::CubeError;
use super::detector::CompletionReason;

#[derive(Clone, Debug, PartialEq)]
pub enum CubeEvent {
    /// Grouping finished; `members` are the cublets captured into the pivot.
    TurnStarted { turn: TurnId, mv: Move, members: Vec<CubletId> },
    TurnSettled { turn: TurnId, mv: Move, solved: bool },
    CubeSolved,
    /// A request was refused. `mv` is `None` when the request never parsed.
    MoveRejected { mv: Option<Move>, error: CubeError },
    BacklogDiscarded { count: usize },
    Stopped,
    Fault { error: CubeError },
    BatchComplete { reason: CompletionReason },
    Reset,
}
