/// Move queue and scheduler.
///
/// An explicit FIFO of `QueueEntry` values drained by `pump()`. At most one
/// entry is in flight (its turn owned by the animator); the next entry is
/// popped only after the in-flight turn has settled and its sink resolved.
///
/// Every entry's `CompletionSink` is resolved exactly once: `Settled` when
/// its turn finishes, `Aborted` when a stop or reset discards it, or
/// `Failed` when the request could not be carried out.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::domain::face::Move;
use crate::domain::lattice::Lattice;
use crate::domain::turn::{SettledTurn, TurnAnimator};
use crate::error::CubeError;
use super::event::CubeEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Settled,
    Aborted,
    Failed(CubeError),
}

#[allow(dead_code)]
impl MoveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveOutcome::Settled)
    }
}

/// Opaque per-request completion signal supplied by the caller.
pub struct CompletionSink(Option<Box<dyn FnOnce(MoveOutcome)>>);

impl CompletionSink {
    pub fn new(f: impl FnOnce(MoveOutcome) + 'static) -> Self {
        CompletionSink(Some(Box::new(f)))
    }

    /// A sink nobody listens to.
    pub fn none() -> Self {
        CompletionSink(None)
    }

    pub fn resolve(self, outcome: MoveOutcome) {
        if let Some(f) = self.0 {
            f(outcome);
        }
    }
}

impl fmt::Debug for CompletionSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.is_some() { "CompletionSink(..)" } else { "CompletionSink(none)" })
    }
}

/// Deferred value side of a sink: poll it to learn the outcome.
#[derive(Clone, Debug, Default)]
pub struct MoveTicket(Rc<RefCell<Option<MoveOutcome>>>);

#[allow(dead_code)]
impl MoveTicket {
    pub fn pair() -> (MoveTicket, CompletionSink) {
        let ticket = MoveTicket::default();
        let slot = Rc::clone(&ticket.0);
        let sink = CompletionSink::new(move |outcome| {
            *slot.borrow_mut() = Some(outcome);
        });
        (ticket, sink)
    }

    pub fn outcome(&self) -> Option<MoveOutcome> {
        self.0.borrow().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.0.borrow().is_some()
    }
}

#[derive(Debug)]
pub struct QueueEntry {
    pub id: u64,
    pub mv: Move,
    sink: CompletionSink,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: VecDeque<QueueEntry>,
    in_flight: Option<QueueEntry>,
    stop_requested: bool,
    fault: Option<CubeError>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// Backlog length, not counting the in-flight entry.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_none()
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    pub fn fault(&self) -> Option<&CubeError> {
        self.fault.as_ref()
    }

    /// Queued moves in the order they will run, not counting the in-flight one.
    pub fn pending(&self) -> impl Iterator<Item = Move> + '_ {
        self.queue.iter().map(|e| e.mv)
    }

    /// Append a request. While a stop is pending or after a fault the
    /// request is resolved immediately instead of queued.
    pub fn enqueue(&mut self, mv: Move, sink: CompletionSink, events: &mut Vec<CubeEvent>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if let Some(fault) = &self.fault {
            warn!(%mv, "move refused after consistency fault");
            events.push(CubeEvent::MoveRejected { mv: Some(mv), error: fault.clone() });
            sink.resolve(MoveOutcome::Failed(fault.clone()));
            return id;
        }
        if self.stop_requested {
            debug!(%mv, "move refused while stopping");
            sink.resolve(MoveOutcome::Aborted);
            return id;
        }

        self.queue.push_back(QueueEntry { id, mv, sink });
        id
    }

    /// Start the head entry if the animator is idle. Returns true when a
    /// turn started.
    pub fn pump(&mut self, lattice: &mut Lattice, animator: &mut TurnAnimator, now_ms: u64, events: &mut Vec<CubeEvent>) -> bool {
        if self.in_flight.is_some() || animator.is_animating() {
            return false;
        }
        while let Some(entry) = self.queue.pop_front() {
            match animator.begin(lattice, entry.mv, now_ms) {
                Ok(turn) => {
                    debug!(entry = entry.id, turn = turn.id.0, backlog = self.queue.len(), "dequeued");
                    events.push(CubeEvent::TurnStarted {
                        turn: turn.id,
                        mv: turn.mv,
                        members: turn.members.clone(),
                    });
                    self.in_flight = Some(entry);
                    return true;
                }
                Err(e) if e.is_fatal() => {
                    entry.sink.resolve(MoveOutcome::Failed(e.clone()));
                    self.latch_fault(e, events);
                    return false;
                }
                Err(e) => {
                    events.push(CubeEvent::MoveRejected { mv: Some(entry.mv), error: e.clone() });
                    entry.sink.resolve(MoveOutcome::Failed(e));
                }
            }
        }
        false
    }

    /// Commit a settled turn: resolve its entry, then either honour a
    /// pending stop or leave the next entry for `pump()`.
    pub fn on_settled(&mut self, settled: &SettledTurn, lattice: &Lattice, events: &mut Vec<CubeEvent>) {
        let Some(entry) = self.in_flight.take() else {
            warn!(turn = settled.turn.id.0, "settled turn had no queue entry");
            return;
        };

        if let Err(e) = lattice.verify() {
            entry.sink.resolve(MoveOutcome::Failed(e.clone()));
            self.latch_fault(e, events);
            return;
        }

        events.push(CubeEvent::TurnSettled { turn: settled.turn.id, mv: entry.mv, solved: settled.solved });
        if settled.solved {
            events.push(CubeEvent::CubeSolved);
        }
        debug!(entry = entry.id, "resolved");
        entry.sink.resolve(MoveOutcome::Settled);

        if self.stop_requested {
            self.finish_stop(events);
        }
    }

    /// Cooperative stop: the in-flight turn finishes, the backlog does not start.
    pub fn stop(&mut self, events: &mut Vec<CubeEvent>) {
        if self.in_flight.is_some() {
            info!(backlog = self.queue.len(), "stop requested, finishing current turn");
            self.stop_requested = true;
        } else {
            self.finish_stop(events);
        }
    }

    fn finish_stop(&mut self, events: &mut Vec<CubeEvent>) {
        let count = self.discard_backlog(MoveOutcome::Aborted);
        if count > 0 {
            events.push(CubeEvent::BacklogDiscarded { count });
        }
        self.stop_requested = false;
        info!(discarded = count, "execution stopped");
        events.push(CubeEvent::Stopped);
    }

    /// Resolve every entry, in flight or queued, as aborted. Used by reset.
    pub fn abort_all(&mut self) -> usize {
        let mut count = self.discard_backlog(MoveOutcome::Aborted);
        if let Some(entry) = self.in_flight.take() {
            entry.sink.resolve(MoveOutcome::Aborted);
            count += 1;
        }
        self.stop_requested = false;
        self.fault = None;
        count
    }

    fn discard_backlog(&mut self, outcome: MoveOutcome) -> usize {
        let count = self.queue.len();
        for entry in self.queue.drain(..) {
            entry.sink.resolve(outcome.clone());
        }
        count
    }

    fn latch_fault(&mut self, fault: CubeError, events: &mut Vec<CubeEvent>) {
        error!(error = %fault, "lattice corrupt, scheduler halted until reset");
        let count = self.discard_backlog(MoveOutcome::Failed(fault.clone()));
        if count > 0 {
            events.push(CubeEvent::BacklogDiscarded { count });
        }
        self.stop_requested = false;
        self.fault = Some(fault.clone());
        events.push(CubeEvent::Fault { error: fault });
    }
}
