/// WorldState: the complete state of one cube session.
///
/// ## Ownership
///
///   - `lattice`  : the 27 cublets. Written only by the animator's settle
///                   step and by `reset`.
///   - `animator` : the single in-flight turn, if any.
///   - `scheduler`: FIFO of pending requests; reads animator status only.
///   - `detector` : batch completion heuristic; reads scheduler status only.
///
/// Everything is driven from `step::step(world, now_ms)`; nothing here
/// keeps its own clock.

use crate::config::CubeConfig;
use crate::domain::face::Move;
use crate::domain::inspect::{self, CubeSnapshot};
use crate::domain::lattice::Lattice;
use crate::domain::turn::TurnAnimator;
use crate::error::CubeError;
use super::detector::CompletionDetector;
use super::event::CubeEvent;
use super::queue::Scheduler;

pub struct WorldState {
    // ── Core ──
    pub lattice: Lattice,
    pub animator: TurnAnimator,
    pub scheduler: Scheduler,
    pub detector: CompletionDetector,

    /// Events raised by entry points between steps; flushed by the next `step`.
    pub pending_events: Vec<CubeEvent>,

    // ── Session ──
    pub scramble_length: usize,
    /// Moves of the most recent scramble, until undone or reset.
    pub last_scramble: Vec<Move>,
    pub routine_cursor: usize,
    pub moves_settled: u64,

    // ── UI ──
    pub message: String,
    pub message_until_ms: u64,
    /// `Some` while the notation prompt is open.
    pub prompt: Option<String>,
}

impl WorldState {
    pub fn new(cfg: &CubeConfig) -> Self {
        WorldState {
            lattice: Lattice::new(cfg.animation.spacing),
            animator: TurnAnimator::new(cfg.animation.turn_duration_ms),
            scheduler: Scheduler::new(),
            detector: CompletionDetector::new(&cfg.detector),
            pending_events: vec![],
            scramble_length: cfg.scramble_length,
            last_scramble: vec![],
            routine_cursor: 0,
            moves_settled: 0,
            message: String::new(),
            message_until_ms: 0,
            prompt: None,
        }
    }

    pub fn set_message(&mut self, msg: &str, now_ms: u64, duration_ms: u64) {
        self.message = msg.to_string();
        self.message_until_ms = now_ms + duration_ms;
    }

    /// True while a turn is between Grouping and the end of Settling.
    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    /// Anything queued or in flight.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.animator.is_animating() || !self.scheduler.is_idle()
    }

    pub fn snapshot(&self) -> Result<CubeSnapshot, CubeError> {
        inspect::snapshot(&self.lattice)
    }

    pub fn is_solved(&self) -> Result<bool, CubeError> {
        inspect::is_solved(&self.lattice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::face::Face;

    #[test]
    fn fresh_world_is_solved_and_idle() {
        let world = WorldState::new(&CubeConfig::default());
        assert!(!world.is_animating());
        assert!(!world.is_busy());
        assert_eq!(world.is_solved(), Ok(true));
        let snap = world.snapshot().unwrap();
        for face in Face::ALL {
            assert_eq!(snap.face(face).len(), 9);
            assert!(snap.is_uniform(face));
        }
    }

    #[test]
    fn message_expires_by_time() {
        let mut world = WorldState::new(&CubeConfig::default());
        world.set_message("hello", 1000, 500);
        assert_eq!(world.message, "hello");
        assert_eq!(world.message_until_ms, 1500);
    }
}
