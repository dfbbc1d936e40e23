/// Input state tracker.
///
/// Collects the key presses that arrived since the last frame and maps
/// them to cube actions. Every action is edge-triggered: one press, one
/// action. Key repeats count as presses so holding a face key keeps
/// queueing turns, the same way a held key keeps typing.
///
/// Release events are ignored; they only appear on terminals with
/// keyboard enhancement enabled.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::face::{Direction, Face, Move};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Turn(Move),
    Scramble,
    UndoScramble,
    Reset,
    Stop,
    NextRoutine,
    Inspect,
    OpenPrompt,
    PromptChar(char),
    PromptBackspace,
    PromptSubmit,
    PromptCancel,
    Quit,
}

pub struct InputState {
    /// Press/Repeat key events collected during the last drain.
    pub raw_events: Vec<KeyEvent>,
    /// The terminal was resized since the last drain.
    pub resized: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            raw_events: Vec::with_capacity(8),
            resized: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the simulation step.
    pub fn drain_events(&mut self) {
        self.raw_events.clear();
        self.resized = false;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    self.raw_events.push(key);
                }
                Ok(Event::Resize(_, _)) => self.resized = true,
                _ => {}
            }
        }
    }

    /// Actions for this frame, in arrival order.
    pub fn actions(&self, prompt_open: bool) -> Vec<Action> {
        let mut out = Vec::with_capacity(self.raw_events.len());
        // The prompt state can change mid-frame (Enter opens it, Enter
        // submits it), so translate against the running state.
        let mut prompt_open = prompt_open;
        for key in &self.raw_events {
            if let Some(action) = translate(key, prompt_open) {
                match action {
                    Action::OpenPrompt => prompt_open = true,
                    Action::PromptSubmit | Action::PromptCancel => prompt_open = false,
                    _ => {}
                }
                out.push(action);
            }
        }
        out
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(is_ctrl_c)
    }
}

fn is_ctrl_c(k: &KeyEvent) -> bool {
    k.modifiers.contains(KeyModifiers::CONTROL)
        && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
}

/// Map one key to an action.
///
/// Outside the prompt a lowercase face letter turns clockwise and an
/// uppercase one counter-clockwise. Inside the prompt printable keys are
/// text.
pub fn translate(key: &KeyEvent, prompt_open: bool) -> Option<Action> {
    if is_ctrl_c(key) {
        return Some(Action::Quit);
    }

    if prompt_open {
        return match key.code {
            KeyCode::Enter => Some(Action::PromptSubmit),
            KeyCode::Esc => Some(Action::PromptCancel),
            KeyCode::Backspace => Some(Action::PromptBackspace),
            KeyCode::Char(c) => Some(Action::PromptChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char(' ') => Some(Action::Scramble),
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('?') => Some(Action::Inspect),
        KeyCode::Char('z') => Some(Action::UndoScramble),
        KeyCode::Char(c) => {
            let face = Face::from_letter(c.to_ascii_uppercase())?;
            let direction = if c.is_ascii_uppercase() {
                Direction::CounterClockwise
            } else {
                Direction::Clockwise
            };
            Some(Action::Turn(Move::new(face, direction)))
        }
        KeyCode::Backspace => Some(Action::Reset),
        KeyCode::Esc => Some(Action::Stop),
        KeyCode::Tab => Some(Action::NextRoutine),
        KeyCode::Enter => Some(Action::OpenPrompt),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn letter_case_picks_direction() {
        assert_eq!(
            translate(&key(KeyCode::Char('r')), false),
            Some(Action::Turn(Move::new(Face::Right, Direction::Clockwise)))
        );
        assert_eq!(
            translate(&KeyEvent::new(KeyCode::Char('U'), KeyModifiers::SHIFT), false),
            Some(Action::Turn(Move::new(Face::Top, Direction::CounterClockwise)))
        );
        assert_eq!(translate(&key(KeyCode::Char('x')), false), None);
    }

    #[test]
    fn control_keys() {
        assert_eq!(translate(&key(KeyCode::Char(' ')), false), Some(Action::Scramble));
        assert_eq!(translate(&key(KeyCode::Backspace), false), Some(Action::Reset));
        assert_eq!(translate(&key(KeyCode::Esc), false), Some(Action::Stop));
        assert_eq!(translate(&key(KeyCode::Tab), false), Some(Action::NextRoutine));
        assert_eq!(translate(&key(KeyCode::Enter), false), Some(Action::OpenPrompt));
        assert_eq!(translate(&key(KeyCode::Char('q')), false), Some(Action::Quit));
        assert_eq!(translate(&key(KeyCode::Char('?')), false), Some(Action::Inspect));
        assert_eq!(translate(&key(KeyCode::Char('z')), false), Some(Action::UndoScramble));
        assert_eq!(
            translate(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), true),
            Some(Action::Quit)
        );
    }

    #[test]
    fn prompt_captures_text() {
        assert_eq!(translate(&key(KeyCode::Char('r')), true), Some(Action::PromptChar('r')));
        assert_eq!(translate(&key(KeyCode::Char('q')), true), Some(Action::PromptChar('q')));
        assert_eq!(translate(&key(KeyCode::Esc), true), Some(Action::PromptCancel));
        assert_eq!(translate(&key(KeyCode::Enter), true), Some(Action::PromptSubmit));
    }

    #[test]
    fn prompt_state_follows_the_frame() {
        let mut input = InputState::new();
        input.raw_events = vec![
            key(KeyCode::Enter),
            key(KeyCode::Char('R')),
            key(KeyCode::Enter),
            key(KeyCode::Char('r')),
        ];
        assert_eq!(input.actions(false), vec![
            Action::OpenPrompt,
            Action::PromptChar('R'),
            Action::PromptSubmit,
            Action::Turn(Move::new(Face::Right, Direction::Clockwise)),
        ]);
    }
}
