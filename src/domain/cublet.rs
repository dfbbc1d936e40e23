/// Cublets: the 27 pieces of the lattice.
///
/// Each cublet carries two views of where it is:
///   - `coord`    : integer logical coordinate, the authoritative key.
///   - `transform`: visual proxy (position + orientation) for a renderer.
///
/// `membership` says which frame `transform` is expressed in: the lattice
/// root (`Free`) or the rotating pivot of an in-flight turn (`Pivot`).

use glam::{Quat, Vec3};

use super::face::{Axis, Face, StickerColor};

/// Integer logical coordinate, each axis in {-1, 0, 1}.
pub type Coord = [i8; 3];

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CubletId(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Membership {
    Free,
    Pivot,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Transform { position, rotation: Quat::IDENTITY }
    }

    /// Express `self` (relative to a parent rotated by `parent`) in world space.
    pub fn under(self, parent: Quat) -> Transform {
        Transform {
            position: parent * self.position,
            rotation: (parent * self.rotation).normalize(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Cublet {
    pub id: CubletId,
    pub coord: Coord,
    /// Sticker colors by world direction, slot order [+x, -x, +y, -y, +z, -z].
    pub colors: [StickerColor; 6],
    pub transform: Transform,
    pub membership: Membership,
}

impl Cublet {
    /// A cublet in solved position: a slot gets its face's color iff the
    /// cublet sits on that face.
    pub fn solved(id: CubletId, coord: Coord, spacing: f32) -> Self {
        let mut colors = [StickerColor::Gray; 6];
        for face in Face::ALL {
            if coord[face.axis().index()] == face.sign() {
                colors[face.slot()] = face.canonical_color();
            }
        }
        Cublet {
            id,
            coord,
            colors,
            transform: Transform::at(coord_to_position(coord, spacing)),
            membership: Membership::Free,
        }
    }

    #[inline]
    pub fn color_on(&self, face: Face) -> StickerColor {
        self.colors[face.slot()]
    }

    #[inline]
    pub fn is_on(&self, face: Face) -> bool {
        self.coord[face.axis().index()] == face.sign()
    }

    /// Re-index sticker slots after a quarter turn so each slot still names
    /// the world direction it faces.
    pub fn rebase_colors(&mut self, axis: Axis, quarter: i8) {
        let old = self.colors;
        for face in Face::ALL {
            let turned = rotate_quarter(face.normal(), axis, quarter);
            if let Some(dest) = Face::from_normal(turned) {
                self.colors[dest.slot()] = old[face.slot()];
            }
        }
    }
}

pub fn coord_to_position(coord: Coord, spacing: f32) -> Vec3 {
    Vec3::new(coord[0] as f32, coord[1] as f32, coord[2] as f32) * spacing
}

/// Nearest integer coordinate for a world position. Components are first
/// rounded to hundredths to shed floating-point residue. The result is not
/// clamped to the lattice; `Lattice::verify` reports anything outside it.
pub fn position_to_coord(position: Vec3, spacing: f32) -> Coord {
    let snapped = quantize(position);
    let c = |v: f32| (v / spacing).round() as i8;
    [c(snapped.x), c(snapped.y), c(snapped.z)]
}

#[inline]
pub fn quantize(position: Vec3) -> Vec3 {
    (position * 100.0).round() / 100.0
}

/// Rotate an integer vector a quarter turn about `axis`.
/// `quarter` is +1 for +90 degrees (right-hand rule), -1 for -90 degrees.
pub fn rotate_quarter(v: [i8; 3], axis: Axis, quarter: i8) -> [i8; 3] {
    let s = quarter;
    let [x, y, z] = v;
    match axis {
        Axis::X => [x, -s * z, s * y],
        Axis::Y => [s * z, y, -s * x],
        Axis::Z => [-s * y, s * x, z],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solved_corner_has_three_stickers() {
        let c = Cublet::solved(CubletId(0), [1, 1, 1], 1.02);
        assert_eq!(c.color_on(Face::Right), StickerColor::Orange);
        assert_eq!(c.color_on(Face::Top), StickerColor::White);
        assert_eq!(c.color_on(Face::Front), StickerColor::Blue);
        assert_eq!(c.color_on(Face::Left), StickerColor::Gray);
        assert_eq!(c.colors.iter().filter(|&&k| k != StickerColor::Gray).count(), 3);
    }

    #[test]
    fn core_has_no_stickers() {
        let c = Cublet::solved(CubletId(13), [0, 0, 0], 1.02);
        assert!(c.colors.iter().all(|&k| k == StickerColor::Gray));
        assert_eq!(c.transform.position, Vec3::ZERO);
    }

    #[test]
    fn quarter_rotation_matches_glam() {
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            for quarter in [1i8, -1] {
                let q = Quat::from_axis_angle(axis.unit(), quarter as f32 * std::f32::consts::FRAC_PI_2);
                for face in Face::ALL {
                    let n = face.normal();
                    let expected = q * Vec3::new(n[0] as f32, n[1] as f32, n[2] as f32);
                    let got = rotate_quarter(n, axis, quarter);
                    assert_eq!(position_to_coord(expected, 1.0), got, "{axis:?} {quarter} {face:?}");
                }
            }
        }
    }

    #[test]
    fn four_quarters_are_identity() {
        let v = [1, -1, 0];
        let mut r = v;
        for _ in 0..4 { r = rotate_quarter(r, Axis::Y, 1); }
        assert_eq!(r, v);
    }

    #[test]
    fn rebase_moves_front_sticker_to_top() {
        // -90 degrees about +x carries +z onto +y.
        let mut c = Cublet::solved(CubletId(0), [1, 0, 1], 1.02);
        c.rebase_colors(Axis::X, -1);
        assert_eq!(c.color_on(Face::Top), StickerColor::Blue);
        assert_eq!(c.color_on(Face::Right), StickerColor::Orange);
        assert_eq!(c.color_on(Face::Front), StickerColor::Gray);
    }

    #[test]
    fn position_to_coord_absorbs_drift() {
        let p = Vec3::new(1.0199, -1.0203, 0.0004);
        assert_eq!(position_to_coord(p, 1.02), [1, -1, 0]);
    }

    #[test]
    fn position_to_coord_keeps_off_lattice_results() {
        let p = Vec3::new(2.04, 0.0, -2.04);
        assert_eq!(position_to_coord(p, 1.02), [2, 0, -2]);
    }
}
