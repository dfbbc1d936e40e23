/// Lattice: owns the 27 cublets and the transient pivot group.
///
/// ## Two frames
///
///   - root : cublets with `Membership::Free`; `transform` is world space.
///   - pivot: cublets with `Membership::Pivot`; `transform` is relative to
///             `pivot`, whose rotation the turn animator drives.
///
/// Moving a cublet between frames changes its membership tag and re-expresses
/// its transform so its world placement is unchanged.
///
/// ## Face selection
///
/// `select()` answers from logical coordinates. `select_visual()` is the
/// tolerance-based geometric test used only to reconcile the visual layer.

use glam::Quat;

use crate::error::CubeError;
use super::cublet::{Cublet, CubletId, Membership, Transform};
use super::face::Face;

/// Distance from a face plane within which a visual proxy counts as on it.
pub const FACE_TOLERANCE: f32 = 0.1;

/// Cublet edge (1.0) plus the gap between cublets (0.02).
pub const DEFAULT_SPACING: f32 = 1.02;

#[derive(Clone, Debug)]
pub struct PivotGroup {
    pub rotation: Quat,
}

#[derive(Clone, Debug)]
pub struct Lattice {
    cublets: Vec<Cublet>,
    pivot: PivotGroup,
    spacing: f32,
}

impl Lattice {
    pub fn new(spacing: f32) -> Self {
        let mut lattice = Lattice {
            cublets: Vec::with_capacity(27),
            pivot: PivotGroup { rotation: Quat::IDENTITY },
            spacing,
        };
        lattice.reset();
        lattice
    }

    /// Discard every cublet and rebuild the solved layout.
    pub fn reset(&mut self) {
        self.cublets.clear();
        self.pivot.rotation = Quat::IDENTITY;
        for x in -1..=1i8 {
            for y in -1..=1i8 {
                for z in -1..=1i8 {
                    let id = CubletId(self.cublets.len());
                    self.cublets.push(Cublet::solved(id, [x, y, z], self.spacing));
                }
            }
        }
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn cublets(&self) -> &[Cublet] {
        &self.cublets
    }

    pub fn get(&self, id: CubletId) -> Option<&Cublet> {
        self.cublets.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: CubletId) -> Option<&mut Cublet> {
        self.cublets.get_mut(id.0)
    }

    /// Cublet currently holding a logical coordinate.
    #[cfg(test)]
    pub fn at(&self, coord: super::cublet::Coord) -> Option<&Cublet> {
        self.cublets.iter().find(|c| c.coord == coord)
    }

    #[cfg(test)]
    pub fn pivot_rotation(&self) -> Quat {
        self.pivot.rotation
    }

    pub(crate) fn set_pivot_rotation(&mut self, rotation: Quat) {
        self.pivot.rotation = rotation;
    }

    #[cfg(test)]
    pub fn pivot_members(&self) -> impl Iterator<Item = &Cublet> + '_ {
        self.cublets.iter().filter(|c| c.membership == Membership::Pivot)
    }

    /// World-space transform of a cublet, whichever frame owns it.
    pub fn world_transform(&self, id: CubletId) -> Option<Transform> {
        let c = self.get(id)?;
        Some(match c.membership {
            Membership::Free => c.transform,
            Membership::Pivot => c.transform.under(self.pivot.rotation),
        })
    }

    /// Move a root cublet into the pivot frame, preserving its world transform.
    pub(crate) fn attach_to_pivot(&mut self, id: CubletId) {
        let inverse = self.pivot.rotation.inverse();
        if let Some(c) = self.get_mut(id) {
            if c.membership == Membership::Free {
                c.transform = c.transform.under(inverse);
                c.membership = Membership::Pivot;
            }
        }
    }

    /// Return a pivot cublet to the root frame at the given world transform.
    pub(crate) fn detach_from_pivot(&mut self, id: CubletId, world: Transform) {
        if let Some(c) = self.get_mut(id) {
            c.transform = world;
            c.membership = Membership::Free;
        }
    }

    // ── Face selection ──

    /// Cublets whose logical coordinate lies on `face`, in storage order.
    pub fn select(&self, face: Face) -> Result<Vec<CubletId>, CubeError> {
        let members: Vec<CubletId> = self.cublets.iter()
            .filter(|c| c.is_on(face))
            .map(|c| c.id)
            .collect();
        if members.is_empty() {
            return Err(CubeError::ConsistencyFault(format!("face {face} resolved to zero members")));
        }
        Ok(members)
    }

    /// Like `select()`, keyed by a face name or notation letter.
    #[allow(dead_code)]
    pub fn select_named(&self, face: &str) -> Result<Vec<CubletId>, CubeError> {
        let face: Face = face.parse()?;
        self.select(face)
    }

    /// Cublets whose visual proxy sits on the `face` plane, within tolerance.
    pub fn select_visual(&self, face: Face) -> Vec<CubletId> {
        let axis = face.axis().index();
        let plane = face.sign() as f32 * self.spacing;
        self.cublets.iter()
            .filter_map(|c| {
                let world = self.world_transform(c.id)?;
                ((world.position[axis] - plane).abs() < FACE_TOLERANCE).then_some(c.id)
            })
            .collect()
    }

    /// Check the lattice invariants while no turn is in flight:
    /// 27 free cublets, pairwise distinct coordinates spanning {-1,0,1}^3,
    /// and visual face membership agreeing with logical membership.
    pub fn verify(&self) -> Result<(), CubeError> {
        if self.cublets.len() != 27 {
            return Err(CubeError::ConsistencyFault(format!("{} cublets in lattice", self.cublets.len())));
        }
        let mut seen = [false; 27];
        for c in &self.cublets {
            if c.membership != Membership::Free {
                return Err(CubeError::ConsistencyFault(format!("cublet {} still in pivot", c.id.0)));
            }
            if c.coord.iter().any(|v| !(-1..=1).contains(v)) {
                return Err(CubeError::ConsistencyFault(format!("cublet {} off lattice at {:?}", c.id.0, c.coord)));
            }
            let slot = ((c.coord[0] + 1) * 9 + (c.coord[1] + 1) * 3 + (c.coord[2] + 1)) as usize;
            if seen[slot] {
                return Err(CubeError::ConsistencyFault(format!("coordinate {:?} occupied twice", c.coord)));
            }
            seen[slot] = true;
        }
        for face in Face::ALL {
            let mut logical = self.select(face)?;
            let mut visual = self.select_visual(face);
            logical.sort();
            visual.sort();
            if logical != visual {
                return Err(CubeError::ConsistencyFault(format!("visual layer disagrees on face {face}")));
            }
        }
        Ok(())
    }
}
