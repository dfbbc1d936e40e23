/// Read-only projections of the lattice: per-face color snapshot,
/// solved predicate, and the 3x3 sticker grid a renderer draws.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::CubeError;
use super::cublet::Cublet;
use super::face::{Face, StickerColor};
use super::lattice::Lattice;

/// Per-face sticker colors in member discovery order.
///
/// Order depends on lattice storage order, which turns permute; compare
/// snapshots as multisets or by uniformity, never element-wise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CubeSnapshot {
    pub faces: BTreeMap<Face, Vec<StickerColor>>,
}

impl CubeSnapshot {
    pub fn face(&self, face: Face) -> &[StickerColor] {
        self.faces.get(&face).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn color_names(&self, face: Face) -> Vec<&'static str> {
        self.face(face).iter().map(|c| c.name()).collect()
    }

    pub fn is_uniform(&self, face: Face) -> bool {
        let colors = self.face(face);
        colors.first().is_some_and(|first| colors.iter().all(|c| c == first))
    }
}

pub fn snapshot(lattice: &Lattice) -> Result<CubeSnapshot, CubeError> {
    let mut faces = BTreeMap::new();
    for face in Face::ALL {
        let colors = lattice.select(face)?
            .into_iter()
            .filter_map(|id| lattice.get(id))
            .map(|c| c.color_on(face))
            .collect();
        faces.insert(face, colors);
    }
    Ok(CubeSnapshot { faces })
}

/// Local uniformity per face: every member shows the first member's color.
pub fn is_solved(lattice: &Lattice) -> Result<bool, CubeError> {
    for face in Face::ALL {
        let members: Vec<&Cublet> = lattice.select(face)?
            .into_iter()
            .filter_map(|id| lattice.get(id))
            .collect();
        let Some(first) = members.first().map(|c| c.color_on(face)) else { continue };
        if members.iter().any(|c| c.color_on(face) != first) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Stickers of `face` as seen from outside, row 0 at the top.
///
/// Net orientation: side faces are viewed upright (top up); the top face
/// is viewed with the back edge up, the bottom face with the front edge up.
pub fn face_grid(lattice: &Lattice, face: Face) -> [[StickerColor; 3]; 3] {
    let mut grid = [[StickerColor::Gray; 3]; 3];
    for c in lattice.cublets().iter().filter(|c| c.is_on(face)) {
        let [x, y, z] = c.coord;
        let (row, col) = match face {
            Face::Front => (1 - y, x + 1),
            Face::Back => (1 - y, 1 - x),
            Face::Right => (1 - y, 1 - z),
            Face::Left => (1 - y, z + 1),
            Face::Top => (z + 1, x + 1),
            Face::Bottom => (1 - z, x + 1),
        };
        grid[row as usize][col as usize] = c.color_on(face);
    }
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lattice::DEFAULT_SPACING;

    #[test]
    fn reset_snapshot_is_uniform_nine_per_face() {
        let lattice = Lattice::new(DEFAULT_SPACING);
        let snap = snapshot(&lattice).unwrap();
        for face in Face::ALL {
            assert_eq!(snap.face(face).len(), 9);
            assert!(snap.is_uniform(face));
            assert_eq!(snap.face(face)[0], face.canonical_color());
        }
        assert!(is_solved(&lattice).unwrap());
    }

    #[test]
    fn color_names_use_lowercase_words() {
        let lattice = Lattice::new(DEFAULT_SPACING);
        let snap = snapshot(&lattice).unwrap();
        assert_eq!(snap.color_names(Face::Right), vec!["orange"; 9]);
        assert_eq!(snap.color_names(Face::Back), vec!["green"; 9]);
    }

    #[test]
    fn a_single_wrong_sticker_breaks_solved() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let id = lattice.at([1, 1, 1]).unwrap().id;
        lattice.get_mut(id).unwrap().colors[Face::Top.slot()] = StickerColor::Red;
        assert!(!is_solved(&lattice).unwrap());
        assert!(!snapshot(&lattice).unwrap().is_uniform(Face::Top));
    }

    #[test]
    fn grid_places_corner_stickers() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        // Tag the top-front-right corner so its grid cell is identifiable.
        let id = lattice.at([1, 1, 1]).unwrap().id;
        lattice.get_mut(id).unwrap().colors[Face::Front.slot()] = StickerColor::Gray;
        let front = face_grid(&lattice, Face::Front);
        assert_eq!(front[0][2], StickerColor::Gray);
        assert_eq!(front[1][1], StickerColor::Blue);
        let solved_top = face_grid(&lattice, Face::Top);
        assert!(solved_top.iter().flatten().all(|&c| c == StickerColor::White));
    }
}
