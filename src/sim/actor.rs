//! Rogue AI cores: actor data, lifecycle and the generational arena
//!
//! Behavior lives in `ai`; this module owns what an actor *is*.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Body;
use super::pathfinding::{PathQuery, find_path};
use super::grid::Grid;

/// Lifecycle of a rogue core. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lifecycle {
    Hostile,
    /// Stability exhausted; inert until the player captures it
    Contained,
    /// Captured (terminal)
    Sanitized,
}

/// Variant-specific state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActorKind {
    Standard,
    Guardian {
        shield: f32,
        /// Shield-down cue already fired for the current depletion
        shield_broken: bool,
    },
    Seeker {
        orbit_angle: f32,
    },
    Repair {
        target: Option<ActorHandle>,
    },
    Boss {
        phase: u8,
        phase_timer: f32,
    },
}

impl ActorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActorKind::Standard => "core",
            ActorKind::Guardian { .. } => "guardian",
            ActorKind::Seeker { .. } => "seeker",
            ActorKind::Repair { .. } => "repair drone",
            ActorKind::Boss { .. } => "boss",
        }
    }
}

pub const STANDARD_STABILITY: f32 = 100.0;
pub const GUARDIAN_STABILITY: f32 = 500.0;
pub const GUARDIAN_SHIELD: f32 = 200.0;
pub const SEEKER_STABILITY: f32 = 30.0;
pub const BOSS_STABILITY: f32 = 2500.0;

/// A rogue core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub body: Body,
    /// Hit-point analogue; clamped at 0 on containment
    pub stability: f32,
    pub max_stability: f32,
    pub lifecycle: Lifecycle,
    pub stun_timer: f32,
    pub repath_timer: f32,
    pub path: Vec<Vec2>,
    pub path_index: usize,
    pub kind: ActorKind,
}

/// What a damage application did to the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Absorbed by a guardian shield; `broke` on the hit that emptied it
    Shielded { broke: bool },
    Damaged,
    /// This hit moved the actor from Hostile to Contained
    Contained,
    /// Target already defeated
    Ignored,
}

impl Actor {
    fn with_kind(pos: Vec2, size: f32, stability: f32, kind: ActorKind) -> Self {
        Self {
            body: Body::new(pos, Vec2::splat(size)),
            stability,
            max_stability: stability,
            lifecycle: Lifecycle::Hostile,
            stun_timer: 0.0,
            repath_timer: 0.0,
            path: Vec::new(),
            path_index: 0,
            kind,
        }
    }

    pub fn standard(pos: Vec2) -> Self {
        Self::with_kind(pos, 28.0, STANDARD_STABILITY, ActorKind::Standard)
    }

    pub fn guardian(pos: Vec2) -> Self {
        Self::with_kind(
            pos,
            52.0,
            GUARDIAN_STABILITY,
            ActorKind::Guardian {
                shield: GUARDIAN_SHIELD,
                shield_broken: false,
            },
        )
    }

    pub fn seeker(pos: Vec2, orbit_angle: f32) -> Self {
        Self::with_kind(pos, 20.0, SEEKER_STABILITY, ActorKind::Seeker { orbit_angle })
    }

    pub fn repair(pos: Vec2) -> Self {
        Self::with_kind(pos, 24.0, STANDARD_STABILITY, ActorKind::Repair { target: None })
    }

    pub fn boss(pos: Vec2) -> Self {
        Self::with_kind(
            pos,
            96.0,
            BOSS_STABILITY,
            ActorKind::Boss {
                phase: 1,
                phase_timer: 0.0,
            },
        )
    }

    #[inline]
    pub fn is_hostile(&self) -> bool {
        self.lifecycle == Lifecycle::Hostile
    }

    #[inline]
    pub fn is_boss(&self) -> bool {
        matches!(self.kind, ActorKind::Boss { .. })
    }

    /// Shield currently absorbing hits
    pub fn shield_up(&self) -> bool {
        matches!(self.kind, ActorKind::Guardian { shield, .. } if shield > 0.0)
    }

    /// Apply damage: guardian shields absorb the whole hit first, otherwise
    /// stability drops and reaching zero contains the actor.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if !self.is_hostile() {
            return DamageOutcome::Ignored;
        }
        if let ActorKind::Guardian {
            shield,
            shield_broken,
        } = &mut self.kind
            && *shield > 0.0
        {
            *shield = (*shield - amount).max(0.0);
            let broke = *shield <= 0.0 && !*shield_broken;
            if broke {
                *shield_broken = true;
            }
            return DamageOutcome::Shielded { broke };
        }

        self.stability -= amount;
        if self.stability <= 0.0 {
            self.contain();
            DamageOutcome::Contained
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Hostile -> Contained: stops acting, velocity zeroed, stability clamped
    pub fn contain(&mut self) {
        if self.lifecycle == Lifecycle::Hostile {
            self.lifecycle = Lifecycle::Contained;
            self.stability = self.stability.max(0.0);
            self.body.vel = Vec2::ZERO;
            self.path.clear();
        }
    }

    /// Contained -> Sanitized. Returns false for any other starting state.
    ///
    /// Swarm-class actors leave no husk and are deactivated for pruning.
    pub fn sanitize(&mut self) -> bool {
        if self.lifecycle != Lifecycle::Contained {
            return false;
        }
        self.lifecycle = Lifecycle::Sanitized;
        if matches!(self.kind, ActorKind::Seeker { .. } | ActorKind::Repair { .. }) {
            self.body.active = false;
        }
        true
    }

    /// Recompute the path to `target`.
    ///
    /// Same-tile and invalid goals clear the path; an unreachable goal keeps
    /// the stale path so the actor continues toward its last known target.
    pub fn repath(&mut self, target: Vec2, grid: &Grid) {
        match find_path(grid, self.body.center(), target) {
            PathQuery::Found(path) => {
                self.path = path;
                self.path_index = 0;
            }
            PathQuery::SameTile | PathQuery::InvalidGoal => {
                self.path.clear();
                self.path_index = 0;
            }
            PathQuery::Unreachable => {
                log::trace!("{} keeps stale path: target unreachable", self.kind.label());
            }
        }
    }

    /// Current waypoint, if the path is not exhausted
    pub fn waypoint(&self) -> Option<Vec2> {
        self.path.get(self.path_index).copied()
    }
}

/// Generational handle into an `ActorArena`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    actor: Option<Actor>,
}

/// Actor storage. Removed slots bump their generation so stale handles
/// resolve to `None`; iteration follows slot order.
#[derive(Debug, Clone, Default)]
pub struct ActorArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ActorArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, actor: Actor) -> ActorHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.actor = Some(actor);
            return ActorHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            actor: Some(actor),
        });
        ActorHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: ActorHandle) -> Option<&Actor> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.actor.as_ref())
    }

    pub fn get_mut(&mut self, handle: ActorHandle) -> Option<&mut Actor> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.actor.as_mut())
    }

    pub fn remove(&mut self, handle: ActorHandle) -> Option<Actor> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let actor = slot.actor.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(actor)
    }

    /// Drop every inactive actor, releasing its slot
    pub fn prune_inactive(&mut self) -> usize {
        let dead: Vec<ActorHandle> = self
            .iter()
            .filter(|(_, a)| !a.body.active)
            .map(|(h, _)| h)
            .collect();
        for handle in &dead {
            self.remove(*handle);
        }
        dead.len()
    }

    /// Live handles in slot order
    pub fn handles(&self) -> Vec<ActorHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActorHandle, &Actor)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.actor.as_ref().map(|a| {
                (
                    ActorHandle {
                        index: i as u32,
                        generation: s.generation,
                    },
                    a,
                )
            })
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ActorHandle, &mut Actor)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            let generation = s.generation;
            s.actor.as_mut().map(|a| {
                (
                    ActorHandle {
                        index: i as u32,
                        generation,
                    },
                    a,
                )
            })
        })
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.slots.iter().filter_map(|s| s.actor.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::{AmmoKind, Slug, resolve_hit};
    use proptest::prelude::*;

    fn slug(ammo: AmmoKind) -> Slug {
        Slug::spawn(Vec2::ZERO, Vec2::X, 800.0, true, ammo)
    }

    #[test]
    fn test_standard_hits_contain_at_zero() {
        let mut a = Actor::standard(Vec2::ZERO);
        let dmg = resolve_hit(&slug(AmmoKind::Standard), false).damage;
        assert_eq!(a.take_damage(dmg), DamageOutcome::Damaged);
        assert_eq!(a.take_damage(dmg), DamageOutcome::Damaged);
        assert_eq!(a.stability, 50.0);
        assert_eq!(a.lifecycle, Lifecycle::Hostile);
        assert_eq!(a.take_damage(dmg), DamageOutcome::Damaged);
        assert_eq!(a.stability, 25.0);
        assert_eq!(a.take_damage(dmg), DamageOutcome::Contained);
        assert_eq!(a.lifecycle, Lifecycle::Contained);
        assert_eq!(a.stability, 0.0);
    }

    #[test]
    fn test_containment_clamps_and_stops() {
        let mut a = Actor::standard(Vec2::ZERO);
        a.body.vel = Vec2::new(50.0, 0.0);
        assert_eq!(a.take_damage(150.0), DamageOutcome::Contained);
        assert_eq!(a.stability, 0.0);
        assert_eq!(a.body.vel, Vec2::ZERO);
        assert_eq!(a.take_damage(10.0), DamageOutcome::Ignored);
        assert_eq!(a.stability, 0.0);
    }

    #[test]
    fn test_guardian_shield_absorbs_then_breaks_once() {
        let mut g = Actor::guardian(Vec2::ZERO);
        assert!(g.shield_up());
        assert_eq!(g.take_damage(150.0), DamageOutcome::Shielded { broke: false });
        assert_eq!(g.take_damage(150.0), DamageOutcome::Shielded { broke: true });
        assert!(!g.shield_up());
        assert_eq!(g.stability, GUARDIAN_STABILITY);
        assert_eq!(g.take_damage(25.0), DamageOutcome::Damaged);
        assert_eq!(g.stability, GUARDIAN_STABILITY - 25.0);
    }

    #[test]
    fn test_sanitize_requires_contained() {
        let mut a = Actor::standard(Vec2::ZERO);
        assert!(!a.sanitize());
        a.contain();
        assert!(a.sanitize());
        assert_eq!(a.lifecycle, Lifecycle::Sanitized);
        assert!(!a.sanitize());
        assert!(a.body.active);

        let mut s = Actor::seeker(Vec2::ZERO, 0.0);
        s.contain();
        assert!(s.sanitize());
        assert!(!s.body.active);
    }

    #[test]
    fn test_repath_policy() {
        let grid = Grid::from_rows(&["#######", "#..#..#", "#######"]);
        let mut a = Actor::standard(Vec2::new(42.0, 42.0));
        a.path = vec![Vec2::new(1.0, 1.0)];
        // Unreachable keeps the stale path
        a.repath(Grid::tile_center(5, 1), &grid);
        assert_eq!(a.path.len(), 1);
        // Wall goal clears it
        a.repath(Grid::tile_center(3, 1), &grid);
        assert!(a.path.is_empty());
        // Reachable goal replaces it
        a.path = vec![Vec2::new(1.0, 1.0)];
        a.path_index = 1;
        a.repath(Grid::tile_center(2, 1), &grid);
        assert_eq!(a.path, vec![Grid::tile_center(2, 1)]);
        assert_eq!(a.path_index, 0);
    }

    #[test]
    fn test_arena_stale_handles() {
        let mut arena = ActorArena::new();
        let a = arena.insert(Actor::standard(Vec2::ZERO));
        let b = arena.insert(Actor::seeker(Vec2::ZERO, 0.0));
        assert_eq!(arena.len(), 2);
        arena.get_mut(a).map(|x| x.body.active = false);
        assert_eq!(arena.prune_inactive(), 1);
        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_some());

        // Slot is reused with a new generation
        let c = arena.insert(Actor::boss(Vec2::ZERO));
        assert_ne!(a, c);
        assert!(arena.get(a).is_none());
        assert!(arena.get(c).is_some_and(|x| x.is_boss()));
        assert_eq!(arena.handles(), vec![c, b]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Damage(f32),
        Contain,
        Sanitize,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0.0f32..200.0).prop_map(Op::Damage),
            Just(Op::Contain),
            Just(Op::Sanitize),
        ]
    }

    proptest! {
        #[test]
        fn prop_lifecycle_monotonic(ops in proptest::collection::vec(op(), 0..40)) {
            let mut a = Actor::guardian(Vec2::ZERO);
            let mut last = a.lifecycle;
            for op in ops {
                match op {
                    Op::Damage(d) => { a.take_damage(d); }
                    Op::Contain => a.contain(),
                    Op::Sanitize => { a.sanitize(); }
                }
                prop_assert!(a.lifecycle >= last);
                if a.lifecycle != Lifecycle::Hostile {
                    prop_assert!(a.stability >= 0.0);
                }
                last = a.lifecycle;
            }
        }
    }
}
