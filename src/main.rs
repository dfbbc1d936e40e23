/// Entry point and frame loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::CubeConfig;
use domain::face::Face;
use sim::detector::CompletionReason;
use sim::event::CubeEvent;
use sim::queue::CompletionSink;
use sim::script;
use sim::step;
use sim::world::WorldState;
use ui::input::{Action, InputState};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const MESSAGE_MS: u64 = 2500;

fn main() {
    let config = CubeConfig::load();
    init_tracing(&config);

    let mut world = WorldState::new(&config);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Error: {e}");
    }

    println!();
    println!("Settled {} turns since the last reset.", world.moves_settled);
}

/// Logs go to `general.log_file` when set. Without it nothing is written:
/// stdout and stderr belong to the alternate screen.
fn init_tracing(config: &CubeConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let Some(path) = &config.log_file else {
        tracing_subscriber::registry().with(env_filter).init();
        return;
    };

    match File::create(path) {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            info!(path = %path.display(), "logging initialized");
        }
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            tracing_subscriber::registry().with(env_filter).init();
        }
    }
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &CubeConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let clock = Instant::now();
    let tick_rate = config.animation.tick_rate_ms;
    let mut last_tick: u64 = 0;

    loop {
        let now_ms = clock.elapsed().as_millis() as u64;

        kb.drain_events();
        if kb.resized {
            renderer.invalidate();
        }
        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_actions(world, &kb, now_ms) {
            break;
        }

        if now_ms >= last_tick + tick_rate {
            let events = step::step(world, now_ms);
            process_events(world, &events, now_ms);
            last_tick = now_ms;
        }

        renderer.render(world, now_ms)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Apply this frame's key actions. Returns true to quit.
fn handle_actions(world: &mut WorldState, kb: &InputState, now_ms: u64) -> bool {
    for action in kb.actions(world.prompt.is_some()) {
        match action {
            Action::Quit => return true,
            Action::Turn(mv) => {
                step::request_move(world, mv, CompletionSink::none(), now_ms);
            }
            Action::Scramble => {
                let moves = step::scramble(world, now_ms);
                let msg = format!("Scramble: {}", script::format_sequence(&moves));
                world.set_message(&msg, now_ms, MESSAGE_MS * 2);
            }
            Action::UndoScramble => {
                let msg = match step::undo_scramble(world, now_ms) {
                    0 => String::from("Nothing to undo"),
                    n => format!("Undoing scramble ({n} moves)"),
                };
                world.set_message(&msg, now_ms, MESSAGE_MS);
            }
            Action::Reset => step::reset(world, now_ms),
            Action::Stop => step::stop(world),
            Action::NextRoutine => {
                let name = step::run_next_routine(world, now_ms);
                world.set_message(&format!("Routine: {name}"), now_ms, MESSAGE_MS);
            }
            Action::Inspect => inspect(world, now_ms),
            Action::OpenPrompt => world.prompt = Some(String::new()),
            Action::PromptChar(c) => {
                if let Some(text) = world.prompt.as_mut() {
                    text.push(c);
                }
                step::note_activity(world, now_ms);
            }
            Action::PromptBackspace => {
                if let Some(text) = world.prompt.as_mut() {
                    text.pop();
                }
            }
            Action::PromptSubmit => {
                let text = world.prompt.take().unwrap_or_default();
                if !text.trim().is_empty() {
                    let queued = step::run_batch(world, &text, now_ms);
                    world.set_message(&format!("Queued {queued} moves"), now_ms, MESSAGE_MS);
                }
            }
            Action::PromptCancel => world.prompt = None,
        }
    }
    false
}

/// Log the per-face snapshot and summarize it on the message line.
fn inspect(world: &mut WorldState, now_ms: u64) {
    let msg = match world.snapshot() {
        Ok(snap) => {
            for face in Face::ALL {
                info!(%face, colors = ?snap.color_names(face), "snapshot");
            }
            let uniform = Face::ALL.into_iter().filter(|&f| snap.is_uniform(f)).count();
            format!("{uniform}/6 faces uniform")
        }
        Err(e) => e.to_string(),
    };
    world.set_message(&msg, now_ms, MESSAGE_MS);
}

/// Turn step events into status messages.
fn process_events(world: &mut WorldState, events: &[CubeEvent], now_ms: u64) {
    for event in events {
        let msg = match event {
            CubeEvent::CubeSolved => String::from("Solved!"),
            CubeEvent::MoveRejected { mv: Some(mv), error } => format!("{mv} rejected: {error}"),
            CubeEvent::MoveRejected { mv: None, error } => format!("Rejected: {error}"),
            CubeEvent::BacklogDiscarded { count } => format!("Discarded {count} queued moves"),
            CubeEvent::Stopped if events.iter().any(|e| matches!(e, CubeEvent::BacklogDiscarded { .. })) => continue,
            CubeEvent::Stopped => String::from("Stopped"),
            CubeEvent::Fault { error } => format!("{error}. Press Backspace to reset"),
            CubeEvent::BatchComplete { reason } => match reason {
                CompletionReason::Marked => String::from("Batch complete"),
                CompletionReason::GraceElapsed => String::from("Batch complete (idle)"),
                CompletionReason::Failsafe => String::from("Batch timed out"),
            },
            CubeEvent::Reset => String::from("Reset"),
            CubeEvent::TurnStarted { .. } | CubeEvent::TurnSettled { .. } => continue,
        };
        world.set_message(&msg, now_ms, MESSAGE_MS);
    }
}
