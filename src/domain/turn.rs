/// Turn animator: the single-turn state machine.
///
/// ```text
///   Idle ──begin()──▶ Grouping ──▶ Interpolating ──advance()──▶ Settling ──▶ Idle
/// ```
///
///   - **Grouping** (inside `begin`): resolve the face's members, move them
///     into the pivot frame without a visible jump, fix axis and angle.
///   - **Interpolating** (each `advance`): set the pivot rotation directly
///     from axis + angle × progress. Member transforms are not touched.
///   - **Settling** (the `advance` that reaches progress 1): capture each
///     member's final world transform, quantize it, derive the new logical
///     coordinate, re-index stickers, hand the member back to the root.
///
/// Only one turn exists at a time. `begin` while not Idle is rejected;
/// queuing is the scheduler's job.

use std::f32::consts::FRAC_PI_2;

use glam::Quat;
use tracing::{debug, error, info, warn};

use crate::error::CubeError;
use super::cublet::{position_to_coord, quantize, CubletId, Transform};
use super::face::{Axis, Direction, Face, Move};
use super::inspect;
use super::lattice::Lattice;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct TurnId(pub u64);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimatorPhase {
    Idle,
    Grouping,
    Interpolating,
    Settling,
}

/// One in-flight quarter turn.
#[derive(Clone, Debug)]
pub struct Turn {
    pub id: TurnId,
    pub mv: Move,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub axis: Axis,
    /// +1 for +90 degrees about `axis`, -1 for -90 degrees.
    pub quarter: i8,
    /// Members captured at Grouping, in lattice storage order.
    pub members: Vec<CubletId>,
}

impl Turn {
    /// Clockwise is judged facing the face from outside. About the positive
    /// axis that is -90 degrees, flipped for the three negative faces.
    pub fn quarter_for(face: Face, direction: Direction) -> i8 {
        let clockwise = direction == Direction::Clockwise;
        let negative_face = face.sign() < 0;
        if clockwise != negative_face { -1 } else { 1 }
    }

    pub fn angle(&self) -> f32 {
        self.quarter as f32 * FRAC_PI_2
    }

    /// Clamped to [0, 1]; a zero duration is complete immediately.
    pub fn progress(&self, now_ms: u64) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms) as f32;
        (elapsed / self.duration_ms as f32).clamp(0.0, 1.0)
    }
}

/// Result of the Settling phase, handed to whoever requested the turn.
#[derive(Clone, Debug)]
pub struct SettledTurn {
    pub turn: Turn,
    pub solved: bool,
}

pub struct TurnAnimator {
    phase: AnimatorPhase,
    current: Option<Turn>,
    duration_ms: u64,
    next_id: u64,
}

impl TurnAnimator {
    pub fn new(duration_ms: u64) -> Self {
        TurnAnimator {
            phase: AnimatorPhase::Idle,
            current: None,
            duration_ms,
            next_id: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> AnimatorPhase {
        self.phase
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.phase != AnimatorPhase::Idle
    }

    pub fn current(&self) -> Option<&Turn> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Start a turn. Runs Grouping and leaves the animator Interpolating.
    pub fn begin(&mut self, lattice: &mut Lattice, mv: Move, now_ms: u64) -> Result<&Turn, CubeError> {
        if self.phase != AnimatorPhase::Idle {
            warn!(%mv, phase = ?self.phase, "turn rejected: another turn is in flight");
            return Err(CubeError::BusyRejected);
        }

        self.phase = AnimatorPhase::Grouping;
        let members = match lattice.select(mv.face) {
            Ok(m) => m,
            Err(e) => {
                error!(%mv, error = %e, "grouping failed");
                self.phase = AnimatorPhase::Idle;
                return Err(e);
            }
        };

        lattice.set_pivot_rotation(Quat::IDENTITY);
        for &id in &members {
            lattice.attach_to_pivot(id);
        }

        let turn = Turn {
            id: TurnId(self.next_id),
            mv,
            start_ms: now_ms,
            duration_ms: self.duration_ms,
            axis: mv.face.axis(),
            quarter: Turn::quarter_for(mv.face, mv.direction),
            members,
        };
        self.next_id += 1;
        debug!(turn = turn.id.0, %mv, members = turn.members.len(), "grouping -> interpolating");

        self.phase = AnimatorPhase::Interpolating;
        Ok(self.current.insert(turn))
    }

    /// Advance the in-flight turn to `now_ms`. Returns the settled turn on
    /// the tick that completes it.
    pub fn advance(&mut self, lattice: &mut Lattice, now_ms: u64) -> Option<SettledTurn> {
        if self.phase != AnimatorPhase::Interpolating {
            return None;
        }
        let turn = self.current.as_ref()?;
        let progress = turn.progress(now_ms);
        lattice.set_pivot_rotation(Quat::from_axis_angle(turn.axis.unit(), turn.angle() * progress));

        if progress < 1.0 {
            return None;
        }
        let turn = self.current.take()?;
        Some(self.settle(lattice, turn))
    }

    fn settle(&mut self, lattice: &mut Lattice, turn: Turn) -> SettledTurn {
        self.phase = AnimatorPhase::Settling;
        let spacing = lattice.spacing();

        for &id in &turn.members {
            let Some(world) = lattice.world_transform(id) else { continue };
            let snapped = Transform { position: quantize(world.position), rotation: world.rotation };
            if let Some(c) = lattice.get_mut(id) {
                c.coord = position_to_coord(snapped.position, spacing);
                c.rebase_colors(turn.axis, turn.quarter);
            }
            lattice.detach_from_pivot(id, snapped);
        }
        lattice.set_pivot_rotation(Quat::IDENTITY);

        let solved = inspect::is_solved(lattice).unwrap_or(false);
        if solved {
            info!(turn = turn.id.0, mv = %turn.mv, "cube solved");
        }
        debug!(turn = turn.id.0, mv = %turn.mv, "settling -> idle");
        self.phase = AnimatorPhase::Idle;
        SettledTurn { turn, solved }
    }

    /// Drop the in-flight turn without committing it. Members return to the
    /// root at their current world placement; the caller is expected to
    /// rebuild the lattice.
    pub fn cancel(&mut self, lattice: &mut Lattice) -> Option<Turn> {
        let turn = self.current.take()?;
        for &id in &turn.members {
            if let Some(world) = lattice.world_transform(id) {
                lattice.detach_from_pivot(id, world);
            }
        }
        lattice.set_pivot_rotation(Quat::IDENTITY);
        self.phase = AnimatorPhase::Idle;
        debug!(turn = turn.id.0, "turn cancelled");
        Some(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cublet::{Coord, Membership};
    use crate::domain::face::StickerColor;
    use crate::domain::lattice::DEFAULT_SPACING;
    use proptest::prelude::*;

    fn apply(lattice: &mut Lattice, anim: &mut TurnAnimator, mv: Move, now: &mut u64) -> SettledTurn {
        anim.begin(lattice, mv, *now).unwrap();
        *now += anim.duration_ms();
        anim.advance(lattice, *now).expect("turn should settle at full duration")
    }

    fn layout(lattice: &Lattice) -> Vec<(Coord, [StickerColor; 6])> {
        lattice.cublets().iter().map(|c| (c.coord, c.colors)).collect()
    }

    #[test]
    fn phases_run_in_order() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(500);
        assert_eq!(anim.phase(), AnimatorPhase::Idle);

        anim.begin(&mut lattice, "R".parse().unwrap(), 1000).unwrap();
        assert_eq!(anim.phase(), AnimatorPhase::Interpolating);
        assert!(anim.is_animating());
        assert_eq!(lattice.pivot_members().count(), 9);

        assert!(anim.advance(&mut lattice, 1250).is_none());
        assert_eq!(anim.phase(), AnimatorPhase::Interpolating);

        let settled = anim.advance(&mut lattice, 1500).unwrap();
        assert_eq!(settled.turn.members.len(), 9);
        assert!(!settled.solved);
        assert_eq!(anim.phase(), AnimatorPhase::Idle);
        assert!(anim.current().is_none());
        assert!(lattice.cublets().iter().all(|c| c.membership == Membership::Free));
        assert!(lattice.verify().is_ok());
    }

    #[test]
    fn second_begin_is_busy_rejected() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(500);
        anim.begin(&mut lattice, "U".parse().unwrap(), 0).unwrap();
        let before: Vec<Coord> = lattice.cublets().iter().map(|c| c.coord).collect();
        let err = anim.begin(&mut lattice, "F".parse().unwrap(), 10).unwrap_err();
        assert_eq!(err, CubeError::BusyRejected);
        assert_eq!(anim.current().unwrap().mv, "U".parse().unwrap());
        let after: Vec<Coord> = lattice.cublets().iter().map(|c| c.coord).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn interpolation_sets_pivot_from_progress() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(400);
        anim.begin(&mut lattice, "R".parse().unwrap(), 0).unwrap();
        anim.advance(&mut lattice, 200);
        let expected = Quat::from_axis_angle(glam::Vec3::X, -FRAC_PI_2 * 0.5);
        assert!(lattice.pivot_rotation().abs_diff_eq(expected, 1e-5));
        // Members keep their grouping-time local transforms mid-turn.
        let logical: Vec<Coord> = lattice.pivot_members().map(|c| c.coord).collect();
        assert!(logical.iter().all(|c| c[0] == 1));
    }

    #[test]
    fn direction_sign_flips_for_negative_faces() {
        assert_eq!(Turn::quarter_for(Face::Right, Direction::Clockwise), -1);
        assert_eq!(Turn::quarter_for(Face::Left, Direction::Clockwise), 1);
        assert_eq!(Turn::quarter_for(Face::Top, Direction::CounterClockwise), 1);
        assert_eq!(Turn::quarter_for(Face::Bottom, Direction::CounterClockwise), -1);
        assert_eq!(Turn::quarter_for(Face::Back, Direction::Clockwise), 1);
    }

    #[test]
    fn r_carries_front_right_column_up() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(100);
        let corner = lattice.at([1, 1, 1]).unwrap().id;
        let mut now = 0;
        apply(&mut lattice, &mut anim, "R".parse().unwrap(), &mut now);
        let c = lattice.get(corner).unwrap();
        assert_eq!(c.coord, [1, 1, -1]);
        assert_eq!(c.color_on(Face::Top), StickerColor::Blue);
        assert_eq!(c.color_on(Face::Back), StickerColor::White);
        assert_eq!(c.color_on(Face::Right), StickerColor::Orange);
    }

    #[test]
    fn u_carries_front_to_left() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(100);
        let edge = lattice.at([0, 1, 1]).unwrap().id;
        let mut now = 0;
        apply(&mut lattice, &mut anim, "U".parse().unwrap(), &mut now);
        let c = lattice.get(edge).unwrap();
        assert_eq!(c.coord, [-1, 1, 0]);
        assert_eq!(c.color_on(Face::Left), StickerColor::Blue);
    }

    #[test]
    fn every_turn_followed_by_its_inverse_is_identity() {
        for mv in Move::all() {
            let mut lattice = Lattice::new(DEFAULT_SPACING);
            let mut anim = TurnAnimator::new(50);
            let original = layout(&lattice);
            let mut now = 0;
            apply(&mut lattice, &mut anim, mv, &mut now);
            assert_ne!(layout(&lattice), original, "{mv} changed nothing");
            apply(&mut lattice, &mut anim, mv.inverse(), &mut now);
            assert_eq!(layout(&lattice), original, "{mv} then inverse");
            assert!(lattice.verify().is_ok());
        }
    }

    #[test]
    fn four_quarter_turns_restore_without_drift() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(30);
        let original = layout(&lattice);
        let mut now = 0;
        for _ in 0..25 {
            for _ in 0..4 {
                apply(&mut lattice, &mut anim, "F".parse().unwrap(), &mut now);
            }
        }
        assert_eq!(layout(&lattice), original);
        assert!(lattice.verify().is_ok());
        for c in lattice.cublets() {
            assert!(c.transform.rotation.abs_diff_eq(Quat::IDENTITY, 1e-3)
                || c.transform.rotation.abs_diff_eq(-Quat::IDENTITY, 1e-3));
        }
    }

    #[test]
    fn cancel_returns_members_to_root() {
        let mut lattice = Lattice::new(DEFAULT_SPACING);
        let mut anim = TurnAnimator::new(500);
        anim.begin(&mut lattice, "B".parse().unwrap(), 0).unwrap();
        anim.advance(&mut lattice, 100);
        let cancelled = anim.cancel(&mut lattice).unwrap();
        assert_eq!(cancelled.members.len(), 9);
        assert_eq!(anim.phase(), AnimatorPhase::Idle);
        assert_eq!(lattice.pivot_members().count(), 0);
        assert!(anim.advance(&mut lattice, 1000).is_none());
    }

    proptest! {
        #[test]
        fn coordinates_stay_a_permutation(indices in proptest::collection::vec(0usize..12, 0..40)) {
            let moves = Move::all();
            let mut lattice = Lattice::new(DEFAULT_SPACING);
            let mut anim = TurnAnimator::new(20);
            let mut now = 0;
            for i in indices {
                apply(&mut lattice, &mut anim, moves[i], &mut now);
                prop_assert!(lattice.verify().is_ok());
            }
            let mut coords: Vec<Coord> = lattice.cublets().iter().map(|c| c.coord).collect();
            coords.sort();
            coords.dedup();
            prop_assert_eq!(coords.len(), 27);
        }

        #[test]
        fn sequence_then_reverse_inverse_is_solved(indices in proptest::collection::vec(0usize..12, 1..25)) {
            let moves = Move::all();
            let mut lattice = Lattice::new(DEFAULT_SPACING);
            let mut anim = TurnAnimator::new(20);
            let mut now = 0;
            for &i in &indices {
                apply(&mut lattice, &mut anim, moves[i], &mut now);
            }
            for &i in indices.iter().rev() {
                apply(&mut lattice, &mut anim, moves[i].inverse(), &mut now);
            }
            prop_assert!(inspect::is_solved(&lattice).unwrap());
        }
    }
}
