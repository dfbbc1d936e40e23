/// Faces, axes, sticker colors and move notation.
/// Face properties are queried via methods, not stored as tables,
/// so face semantics are centralized here.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::CubeError;

/// One of the three lattice axes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> glam::Vec3 {
        match self {
            Axis::X => glam::Vec3::X,
            Axis::Y => glam::Vec3::Y,
            Axis::Z => glam::Vec3::Z,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Face {
    Right,  // +x
    Left,   // -x
    Top,    // +y
    Bottom, // -y
    Front,  // +z
    Back,   // -z
}

impl Face {
    /// Slot order: [+x, -x, +y, -y, +z, -z].
    pub const ALL: [Face; 6] = [
        Face::Right, Face::Left, Face::Top, Face::Bottom, Face::Front, Face::Back,
    ];

    pub fn axis(self) -> Axis {
        match self {
            Face::Right | Face::Left => Axis::X,
            Face::Top | Face::Bottom => Axis::Y,
            Face::Front | Face::Back => Axis::Z,
        }
    }

    /// Sign of the outward normal along `axis()`: +1 or -1.
    pub fn sign(self) -> i8 {
        match self {
            Face::Right | Face::Top | Face::Front => 1,
            Face::Left | Face::Bottom | Face::Back => -1,
        }
    }

    /// Index into a cublet's 6 color slots.
    pub fn slot(self) -> usize {
        self.axis().index() * 2 + if self.sign() > 0 { 0 } else { 1 }
    }

    /// Face whose outward normal is the given integer unit vector.
    pub fn from_normal(n: [i8; 3]) -> Option<Face> {
        match n {
            [1, 0, 0] => Some(Face::Right),
            [-1, 0, 0] => Some(Face::Left),
            [0, 1, 0] => Some(Face::Top),
            [0, -1, 0] => Some(Face::Bottom),
            [0, 0, 1] => Some(Face::Front),
            [0, 0, -1] => Some(Face::Back),
            _ => None,
        }
    }

    pub fn normal(self) -> [i8; 3] {
        let mut n = [0i8; 3];
        n[self.axis().index()] = self.sign();
        n
    }

    /// Color a solved cube shows on this face.
    pub fn canonical_color(self) -> StickerColor {
        match self {
            Face::Right => StickerColor::Orange,
            Face::Left => StickerColor::Red,
            Face::Top => StickerColor::White,
            Face::Bottom => StickerColor::Yellow,
            Face::Front => StickerColor::Blue,
            Face::Back => StickerColor::Green,
        }
    }

    /// Standard notation letter.
    pub fn letter(self) -> char {
        match self {
            Face::Right => 'R',
            Face::Left => 'L',
            Face::Top => 'U',
            Face::Bottom => 'D',
            Face::Front => 'F',
            Face::Back => 'B',
        }
    }

    pub fn from_letter(c: char) -> Option<Face> {
        match c {
            'R' => Some(Face::Right),
            'L' => Some(Face::Left),
            'U' => Some(Face::Top),
            'D' => Some(Face::Bottom),
            'F' => Some(Face::Front),
            'B' => Some(Face::Back),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Face::Right => "right",
            Face::Left => "left",
            Face::Top => "top",
            Face::Bottom => "bottom",
            Face::Front => "front",
            Face::Back => "back",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts a face name (`"right"`, case-insensitive) or its notation letter.
impl FromStr for Face {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(face) = Face::from_letter(c) {
                return Ok(face);
            }
        }
        Face::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CubeError::InvalidFace(s.to_string()))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn inverse(self) -> Direction {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StickerColor {
    Orange,
    Red,
    White,
    Yellow,
    Blue,
    Green,
    /// Interior slot, never visible on a solved cube.
    Gray,
}

impl StickerColor {
    pub fn name(self) -> &'static str {
        match self {
            StickerColor::Orange => "orange",
            StickerColor::Red => "red",
            StickerColor::White => "white",
            StickerColor::Yellow => "yellow",
            StickerColor::Blue => "blue",
            StickerColor::Green => "green",
            StickerColor::Gray => "gray",
        }
    }
}

impl Default for StickerColor {
    fn default() -> Self {
        StickerColor::Gray
    }
}

/// A notated quarter turn, e.g. `R` or `U'`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Move {
    pub face: Face,
    pub direction: Direction,
}

impl Move {
    pub fn new(face: Face, direction: Direction) -> Self {
        Move { face, direction }
    }

    pub fn inverse(self) -> Move {
        Move { face: self.face, direction: self.direction.inverse() }
    }

    /// All 12 quarter turns, clockwise before prime for each face.
    pub fn all() -> [Move; 12] {
        let mut out = [Move::new(Face::Right, Direction::Clockwise); 12];
        for (i, face) in Face::ALL.into_iter().enumerate() {
            out[i * 2] = Move::new(face, Direction::Clockwise);
            out[i * 2 + 1] = Move::new(face, Direction::CounterClockwise);
        }
        out
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Clockwise => write!(f, "{}", self.face.letter()),
            Direction::CounterClockwise => write!(f, "{}'", self.face.letter()),
        }
    }
}

/// Parses `R`, `R'`, `R′` and the scripting-style `RPrime`.
impl FromStr for Move {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sym = s.trim();
        let invalid = || CubeError::InvalidMoveSymbol(s.to_string());

        let mut chars = sym.chars();
        let face = chars.next().and_then(Face::from_letter).ok_or_else(invalid)?;
        let direction = match chars.as_str() {
            "" => Direction::Clockwise,
            "'" | "′" | "Prime" => Direction::CounterClockwise,
            _ => return Err(invalid()),
        };
        Ok(Move { face, direction })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_follow_signed_axis_order() {
        let slots: Vec<usize> = Face::ALL.iter().map(|f| f.slot()).collect();
        assert_eq!(slots, vec![0, 1, 2, 3, 4, 5]);
        for face in Face::ALL {
            assert_eq!(Face::from_normal(face.normal()), Some(face));
        }
    }

    #[test]
    fn parse_notation_variants() {
        assert_eq!("R".parse::<Move>().unwrap(), Move::new(Face::Right, Direction::Clockwise));
        assert_eq!("U'".parse::<Move>().unwrap(), Move::new(Face::Top, Direction::CounterClockwise));
        assert_eq!("F′".parse::<Move>().unwrap(), Move::new(Face::Front, Direction::CounterClockwise));
        assert_eq!("BPrime".parse::<Move>().unwrap(), Move::new(Face::Back, Direction::CounterClockwise));
    }

    #[test]
    fn parse_rejects_unknown_symbols() {
        for bad in ["", "X", "r", "R2", "R''", "Rprime"] {
            match bad.parse::<Move>() {
                Err(CubeError::InvalidMoveSymbol(sym)) => assert_eq!(sym, bad),
                other => panic!("{bad:?} parsed as {other:?}"),
            }
        }
    }

    #[test]
    fn face_names_and_letters() {
        assert_eq!("Right".parse::<Face>().unwrap(), Face::Right);
        assert_eq!("D".parse::<Face>().unwrap(), Face::Bottom);
        assert!(matches!("middle".parse::<Face>(), Err(CubeError::InvalidFace(_))));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mv in Move::all() {
            assert_eq!(mv.to_string().parse::<Move>().unwrap(), mv);
        }
    }
}
