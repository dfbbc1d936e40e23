/// The step function and the entry points that feed it.
///
/// Processing order inside `step`:
///   1. Flush events raised by entry points since the last step
///   2. Advance the in-flight turn; commit it if it settled
///   3. Start the next queued turn if the animator is free
///   4. Poll the completion detector
///   5. Expire the status message
///
/// Entry points (`request_move`, `execute_sequence`, `reset`, `stop`, ...)
/// may be called at any time between steps. They never advance animation
/// themselves, but a request that finds the scheduler idle starts its turn
/// (Grouping) immediately.

use tracing::{info, warn};

use crate::domain::face::{Direction, Face, Move};
use crate::error::CubeError;
use super::event::CubeEvent;
use super::queue::{CompletionSink, MoveOutcome};
use super::script;
use super::world::WorldState;

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, now_ms: u64) -> Vec<CubeEvent> {
    let mut events = std::mem::take(&mut world.pending_events);

    resolve_turn(world, now_ms, &mut events);
    pump(world, now_ms, &mut events);
    resolve_detector(world, now_ms, &mut events);

    if !world.message.is_empty() && now_ms >= world.message_until_ms {
        world.message.clear();
    }

    events
}

fn resolve_turn(world: &mut WorldState, now_ms: u64, events: &mut Vec<CubeEvent>) {
    let Some(settled) = world.animator.advance(&mut world.lattice, now_ms) else { return };
    world.moves_settled += 1;
    world.scheduler.on_settled(&settled, &world.lattice, events);
    world.detector.note_activity(now_ms);
}

/// Start the next queued turn. A turn start counts as activity, so the
/// detector's failsafe measures quiet time between turn boundaries.
fn pump(world: &mut WorldState, now_ms: u64, events: &mut Vec<CubeEvent>) {
    if world.scheduler.pump(&mut world.lattice, &mut world.animator, now_ms, events) {
        world.detector.note_activity(now_ms);
    }
}

fn resolve_detector(world: &mut WorldState, now_ms: u64, events: &mut Vec<CubeEvent>) {
    let busy = world.is_busy();
    if let Some(reason) = world.detector.poll(now_ms, busy) {
        events.push(CubeEvent::BatchComplete { reason });
    }
}

// ══════════════════════════════════════════════════════════════
// Move API
// ══════════════════════════════════════════════════════════════

/// Queue one move. Returns the queue entry id.
pub fn request_move(world: &mut WorldState, mv: Move, sink: CompletionSink, now_ms: u64) -> u64 {
    let id = world.scheduler.enqueue(mv, sink, &mut world.pending_events);
    world.detector.note_activity(now_ms);
    let mut events = std::mem::take(&mut world.pending_events);
    pump(world, now_ms, &mut events);
    world.pending_events = events;
    id
}

/// Queue a turn on a face given by identifier (`"right"`, `"R"`, ...).
/// An unknown identifier resolves the sink with `InvalidFace` and leaves
/// the cube untouched.
#[allow(dead_code)]
pub fn request_turn(world: &mut WorldState, face: &str, direction: Direction, sink: CompletionSink, now_ms: u64) -> Option<u64> {
    match face.parse::<Face>() {
        Ok(face) => Some(request_move(world, Move::new(face, direction), sink, now_ms)),
        Err(e) => {
            reject(world, e, sink);
            None
        }
    }
}

/// Queue a move given in notation (`"R"`, `"R'"`, `"R′"`, `"RPrime"`).
#[allow(dead_code)]
pub fn execute_notation(world: &mut WorldState, symbol: &str, sink: CompletionSink, now_ms: u64) -> Option<u64> {
    match symbol.parse::<Move>() {
        Ok(mv) => Some(request_move(world, mv, sink, now_ms)),
        Err(e) => {
            reject(world, e, sink);
            None
        }
    }
}

/// Queue a list of notation symbols. Bad symbols are reported and skipped;
/// `sink` fires once, after the last valid move resolves. With nothing
/// valid to run it fires immediately.
pub fn execute_sequence<S: AsRef<str>>(world: &mut WorldState, symbols: &[S], sink: CompletionSink, now_ms: u64) -> usize {
    let mut moves = Vec::with_capacity(symbols.len());
    for sym in symbols {
        match sym.as_ref().parse::<Move>() {
            Ok(mv) => moves.push(mv),
            Err(e) => {
                warn!(error = %e, "skipping symbol in sequence");
                world.pending_events.push(CubeEvent::MoveRejected { mv: None, error: e });
            }
        }
    }
    enqueue_moves(world, &moves, sink, now_ms)
}

/// Queue already-parsed moves with one completion sink for the whole run.
pub fn enqueue_moves(world: &mut WorldState, moves: &[Move], sink: CompletionSink, now_ms: u64) -> usize {
    let Some((&last, rest)) = moves.split_last() else {
        world.detector.note_activity(now_ms);
        sink.resolve(MoveOutcome::Settled);
        return 0;
    };
    for &mv in rest {
        request_move(world, mv, CompletionSink::none(), now_ms);
    }
    request_move(world, last, sink, now_ms);
    moves.len()
}

fn reject(world: &mut WorldState, error: CubeError, sink: CompletionSink) {
    warn!(error = %error, "request rejected");
    world.pending_events.push(CubeEvent::MoveRejected { mv: None, error: error.clone() });
    sink.resolve(MoveOutcome::Failed(error));
}

// ══════════════════════════════════════════════════════════════
// Control
// ══════════════════════════════════════════════════════════════

/// Back to the solved layout. Drops the in-flight turn and the backlog,
/// resolving every pending sink as aborted, and clears a latched fault.
/// A batch in progress is abandoned without a completion event.
pub fn reset(world: &mut WorldState, now_ms: u64) {
    world.animator.cancel(&mut world.lattice);
    world.lattice.reset();
    let aborted = world.scheduler.abort_all();
    world.last_scramble.clear();
    world.detector.disarm();
    world.detector.note_activity(now_ms);
    world.moves_settled = 0;
    info!(aborted, "cube reset");
    world.pending_events.push(CubeEvent::Reset);
}

/// Cooperative stop: the current turn finishes, nothing queued starts.
pub fn stop(world: &mut WorldState) {
    world.scheduler.stop(&mut world.pending_events);
}

/// Caller-side activity the detector should count (console output etc).
pub fn note_activity(world: &mut WorldState, now_ms: u64) {
    world.detector.note_activity(now_ms);
}

pub fn scramble(world: &mut WorldState, now_ms: u64) -> Vec<Move> {
    let moves = script::scramble(world.scramble_length);
    enqueue_moves(world, &moves, CompletionSink::none(), now_ms);
    world.last_scramble = moves.clone();
    moves
}

/// Queue the inverse of the last scramble. Returns how many moves were
/// queued; zero when there is nothing to undo.
pub fn undo_scramble(world: &mut WorldState, now_ms: u64) -> usize {
    let undo = script::invert(&std::mem::take(&mut world.last_scramble));
    if undo.is_empty() {
        return 0;
    }
    enqueue_moves(world, &undo, CompletionSink::none(), now_ms)
}

// ══════════════════════════════════════════════════════════════
// Batches
// ══════════════════════════════════════════════════════════════

/// Start watching for the end of a scripted run.
pub fn begin_batch(world: &mut WorldState, now_ms: u64) {
    world.detector.arm(now_ms);
}

/// The script has issued everything; completion fires once the queue drains.
pub fn finish_batch(world: &mut WorldState) {
    world.detector.mark_completed();
}

/// Run a notation line as one batch. Returns how many moves were queued.
pub fn run_batch(world: &mut WorldState, text: &str, now_ms: u64) -> usize {
    begin_batch(world, now_ms);
    let (moves, errors) = script::parse_sequence(text);
    for e in errors {
        warn!(error = %e, "skipping symbol in batch");
        world.pending_events.push(CubeEvent::MoveRejected { mv: None, error: e });
    }
    let queued = enqueue_moves(world, &moves, CompletionSink::none(), now_ms);
    finish_batch(world);
    queued
}

/// Run the next built-in routine as a batch. Returns its name.
pub fn run_next_routine(world: &mut WorldState, now_ms: u64) -> &'static str {
    let routine = &script::ROUTINES[world.routine_cursor % script::ROUTINES.len()];
    world.routine_cursor = (world.routine_cursor + 1) % script::ROUTINES.len();
    begin_batch(world, now_ms);
    execute_sequence(world, routine.moves, CompletionSink::none(), now_ms);
    finish_batch(world);
    routine.name
}
