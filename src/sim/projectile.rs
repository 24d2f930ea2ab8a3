//! Kinetic slugs: ricocheting projectiles
//!
//! A slug reflects perfectly off walls, losing one bounce from its budget and
//! gaining power with every ricochet. It only knows about walls; hits against
//! actors and the player are resolved by the tick using `resolve_hit`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::ActorHandle;
use super::collision::Body;
use super::grid::Grid;
use crate::consts::*;

/// Bounce budget of a fresh slug
pub const SLUG_BOUNCES: i32 = 4;
/// Power multiplier gained per survived ricochet
pub const BOUNCE_POWER_GAIN: f32 = 0.65;
/// Maximum trail points kept for rendering
pub const TRAIL_LENGTH: usize = 12;
pub const SLUG_SIZE: f32 = 6.0;

pub const EMP_DAMAGE_SCALE: f32 = 0.5;
pub const EMP_STUN_SECONDS: f32 = 1.2;
pub const PIERCING_DAMAGE_SCALE: f32 = 1.5;

/// Ammo modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AmmoKind {
    #[default]
    Standard,
    /// Half damage, stuns the target
    Emp,
    /// 1.5x damage, passes through unshielded targets
    Piercing,
}

/// A projectile entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slug {
    pub body: Body,
    /// Remaining ricochets; the slug dies when this goes negative
    pub bounces: i32,
    pub power: f32,
    pub player_owned: bool,
    pub ammo: AmmoKind,
    /// Recent positions for rendering (oldest first)
    #[serde(skip)]
    pub trail: VecDeque<Vec2>,
    /// Actors a piercing slug has already passed through
    #[serde(skip)]
    pub pierced: Vec<ActorHandle>,
}

impl Slug {
    /// Spawn a slug at `origin` heading along `direction`
    pub fn spawn(origin: Vec2, direction: Vec2, speed: f32, player_owned: bool, ammo: AmmoKind) -> Self {
        let mut body = Body::new(origin, Vec2::splat(SLUG_SIZE));
        body.vel = direction.normalize_or_zero() * speed;
        body.facing = body.vel.y.atan2(body.vel.x);
        Self {
            body,
            bounces: SLUG_BOUNCES,
            power: 1.0,
            player_owned,
            ammo,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
            pierced: Vec::new(),
        }
    }

    #[inline]
    pub fn active(&self) -> bool {
        self.body.active
    }

    /// Advance one tick. Returns the number of ricochets taken.
    pub fn update(&mut self, dt: f32, grid: &Grid) -> u32 {
        if !self.body.active {
            return 0;
        }
        self.record_trail();

        let delta = self.body.vel * dt;
        let steps = (delta.length() / STEP_UNIT) as u32 + 1;
        let mut step = delta / steps as f32;
        let mut ricochets = 0;

        for _ in 0..steps {
            self.body.pos.x += step.x;
            if self.in_wall(grid) {
                self.body.pos.x -= step.x;
                self.body.vel.x = -self.body.vel.x;
                step.x = -step.x;
                ricochets += 1;
                self.bounce();
            }
            self.body.pos.y += step.y;
            if self.in_wall(grid) {
                self.body.pos.y -= step.y;
                self.body.vel.y = -self.body.vel.y;
                step.y = -step.y;
                ricochets += 1;
                self.bounce();
            }
            if !self.body.active {
                break;
            }
        }

        self.body.bounds.x = self.body.pos.x;
        self.body.bounds.y = self.body.pos.y;

        let extent = crate::world_size();
        let p = self.body.pos;
        if p.x < 0.0 || p.y < 0.0 || p.x > extent.x || p.y > extent.y {
            self.body.active = false;
        }
        ricochets
    }

    fn in_wall(&self, grid: &Grid) -> bool {
        let (tx, ty) = Grid::tile_coords(self.body.pos);
        grid.is_wall(tx, ty)
    }

    /// Spend one bounce; survive with more power or deactivate
    pub fn bounce(&mut self) {
        self.bounces -= 1;
        if self.bounces < 0 {
            self.body.active = false;
        } else {
            self.power += BOUNCE_POWER_GAIN;
        }
    }

    fn record_trail(&mut self) {
        self.trail.push_back(self.body.pos);
        while self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }
}

/// Outcome of a player slug striking an actor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResolution {
    pub damage: f32,
    /// Stun applied to the target (seconds)
    pub stun: Option<f32>,
    /// Whether the slug is spent
    pub consumed: bool,
}

/// Damage rule: `SLUG_BASE_DAMAGE x power`, with ammo modifiers.
///
/// Piercing slugs survive the hit unless they strike an active shield.
pub fn resolve_hit(slug: &Slug, target_shielded: bool) -> HitResolution {
    let mut damage = SLUG_BASE_DAMAGE * slug.power;
    let mut stun = None;
    match slug.ammo {
        AmmoKind::Standard => {}
        AmmoKind::Emp => {
            damage *= EMP_DAMAGE_SCALE;
            stun = Some(EMP_STUN_SECONDS);
        }
        AmmoKind::Piercing => damage *= PIERCING_DAMAGE_SCALE,
    }
    HitResolution {
        damage,
        stun,
        consumed: slug.ammo != AmmoKind::Piercing || target_shielded,
    }
}
