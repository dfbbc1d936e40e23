/// Move sequences: parsing, inversion, scrambles and the built-in routines.
///
/// Routines are fixed demonstration sequences grouped by the stage of a
/// beginner's method they are named after. They do not inspect the cube and
/// do not solve it.

use crate::domain::face::Move;
use crate::error::CubeError;

pub struct Routine {
    pub name: &'static str,
    pub moves: &'static [&'static str],
}

pub const ROUTINES: &[Routine] = &[
    Routine { name: "Cross", moves: &["F", "R", "U", "R'", "U'", "F'"] },
    Routine { name: "First layer corners", moves: &["R", "U", "R'", "U'"] },
    Routine { name: "Second layer", moves: &["U", "R", "U'", "R'", "U'", "F'", "U", "F"] },
    Routine { name: "Top cross", moves: &["F", "R", "U", "R'", "U'", "F'"] },
    Routine { name: "Top corners", moves: &["R", "U", "R'", "U", "R", "U", "U", "R'"] },
    Routine { name: "Position last layer", moves: &["U", "R", "U'", "L'", "U", "R'", "U'", "L"] },
    Routine {
        name: "Orient last layer",
        moves: &["R", "R", "U", "F", "B'", "R", "R", "F'", "B", "U", "R", "R"],
    },
];

/// Split on whitespace and commas, parse each symbol. Bad symbols are
/// returned alongside the good moves rather than aborting the parse.
pub fn parse_sequence(text: &str) -> (Vec<Move>, Vec<CubeError>) {
    let mut moves = Vec::new();
    let mut errors = Vec::new();
    for sym in text.split(|c: char| c.is_whitespace() || c == ',').filter(|s| !s.is_empty()) {
        match sym.parse::<Move>() {
            Ok(mv) => moves.push(mv),
            Err(e) => errors.push(e),
        }
    }
    (moves, errors)
}

/// The sequence that undoes `moves`: reversed, each direction flipped.
pub fn invert(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(|m| m.inverse()).collect()
}

pub fn format_sequence(moves: &[Move]) -> String {
    moves.iter().map(Move::to_string).collect::<Vec<_>>().join(" ")
}

/// Uniformly random quarter turns.
pub fn scramble(length: usize) -> Vec<Move> {
    let all = Move::all();
    (0..length)
        .map(|_| all[rand::random_range(0..all.len())])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::face::{Direction, Face};

    #[test]
    fn parse_mixed_separators() {
        let (moves, errors) = parse_sequence("R U',F′  BPrime");
        assert!(errors.is_empty());
        assert_eq!(format_sequence(&moves), "R U' F' B'");
    }

    #[test]
    fn parse_keeps_going_past_bad_symbols() {
        let (moves, errors) = parse_sequence("R X U2 D");
        assert_eq!(format_sequence(&moves), "R D");
        assert_eq!(errors, vec![
            CubeError::InvalidMoveSymbol("X".into()),
            CubeError::InvalidMoveSymbol("U2".into()),
        ]);
    }

    #[test]
    fn invert_reverses_and_flips() {
        let (moves, _) = parse_sequence("R U F'");
        assert_eq!(format_sequence(&invert(&moves)), "F U' R'");
        assert_eq!(invert(&invert(&moves)), moves);
    }

    #[test]
    fn scramble_has_requested_length() {
        assert_eq!(scramble(20).len(), 20);
        assert!(scramble(0).is_empty());
    }

    #[test]
    fn routines_are_valid_notation() {
        for r in ROUTINES {
            for sym in r.moves {
                assert!(sym.parse::<Move>().is_ok(), "{}: {sym}", r.name);
            }
        }
        let first: Move = ROUTINES[0].moves[0].parse().unwrap();
        assert_eq!(first, Move::new(Face::Front, Direction::Clockwise));
    }
}
