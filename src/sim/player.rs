//! The player suit: movement, resources and abilities
//!
//! Resource bookkeeping runs on real (undilated) time; the tick decides which
//! abilities fire and what they do to the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Body;
use super::grid::Grid;
use crate::consts::*;

pub const PLAYER_SIZE: f32 = 24.0;
pub const MAX_INTEGRITY: f32 = 100.0;
pub const MAX_ENERGY: f32 = 100.0;
pub const ENERGY_REGEN: f32 = 12.0;
pub const MAX_REFLEX: f32 = 100.0;
pub const REFLEX_DRAIN: f32 = 25.0;
pub const REFLEX_REGEN: f32 = 15.0;
pub const MAX_SHIELD: f32 = 25.0;
pub const SHIELD_REGEN: f32 = 5.0;

pub const MAGAZINE_SIZE: u32 = 12;
pub const STARTING_RESERVE: u32 = 60;
pub const SHOOT_COOLDOWN: f32 = 0.25;

pub const DASH_COST: f32 = 30.0;
pub const DASH_DURATION: f32 = 0.15;
pub const SHOCKWAVE_COST: f32 = 50.0;
pub const STEP_INTERVAL: f32 = 0.3;

/// Player state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    /// Suit integrity (health); the run ends at zero
    pub integrity: f32,
    pub energy: f32,
    pub reflex: f32,
    pub reflex_active: bool,
    /// Absorbs damage before integrity
    pub shield: f32,
    pub loaded: u32,
    pub reserve: u32,
    pub dash_timer: f32,
    pub shoot_cooldown: f32,
    pub step_timer: f32,
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        let mut body = Body::new(pos, Vec2::splat(PLAYER_SIZE));
        body.clamp_to_interior = true;
        Self {
            body,
            integrity: MAX_INTEGRITY,
            energy: MAX_ENERGY,
            reflex: MAX_REFLEX,
            reflex_active: false,
            shield: MAX_SHIELD,
            loaded: MAGAZINE_SIZE,
            reserve: STARTING_RESERVE,
            dash_timer: 0.0,
            shoot_cooldown: 0.0,
            step_timer: 0.0,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.body.center()
    }

    #[inline]
    pub fn dashing(&self) -> bool {
        self.dash_timer > 0.0
    }

    #[inline]
    pub fn alive(&self) -> bool {
        self.integrity > 0.0
    }

    /// Set walking velocity from a movement intent. Ignored mid-dash.
    pub fn steer(&mut self, intent: Vec2) {
        if !self.dashing() {
            self.body.vel = intent.normalize_or_zero() * PLAYER_SPEED;
        }
    }

    /// Advance body and resources by real `dt`.
    ///
    /// Returns true when a footstep lands this tick.
    pub fn update(&mut self, dt: f32, grid: &Grid) -> bool {
        if self.dash_timer > 0.0 {
            self.dash_timer -= dt;
        }
        self.body.advance(dt, grid);
        if self.shoot_cooldown > 0.0 {
            self.shoot_cooldown -= dt;
        }
        self.energy = (self.energy + ENERGY_REGEN * dt).min(MAX_ENERGY);
        if self.shield < MAX_SHIELD {
            self.shield = (self.shield + SHIELD_REGEN * dt).min(MAX_SHIELD);
        }
        if self.reflex_active {
            self.reflex -= REFLEX_DRAIN * dt;
            if self.reflex <= 0.0 {
                self.reflex = 0.0;
                self.reflex_active = false;
            }
        } else {
            self.reflex = (self.reflex + REFLEX_REGEN * dt).min(MAX_REFLEX);
        }

        if self.body.vel.length_squared() > 1.0 && !self.dashing() {
            self.step_timer -= dt;
            if self.step_timer <= 0.0 {
                self.step_timer = STEP_INTERVAL;
                return true;
            }
        } else {
            self.step_timer = 0.0;
        }
        false
    }

    /// Burst along the current motion (up when standing still)
    pub fn try_dash(&mut self) -> bool {
        if self.energy <= DASH_COST {
            return false;
        }
        let mut dir = self.body.vel.normalize_or_zero();
        if dir == Vec2::ZERO {
            dir = Vec2::NEG_Y;
        }
        self.body.vel = dir * DASH_SPEED;
        self.dash_timer = DASH_DURATION;
        self.energy -= DASH_COST;
        true
    }

    /// Spend energy on a shockwave if affordable
    pub fn try_shockwave(&mut self) -> bool {
        if self.energy <= SHOCKWAVE_COST {
            return false;
        }
        self.energy -= SHOCKWAVE_COST;
        true
    }

    pub fn toggle_reflex(&mut self) -> bool {
        self.reflex_active = !self.reflex_active;
        self.reflex_active
    }

    /// Top up the magazine from reserve. Returns slugs moved.
    pub fn reload(&mut self) -> u32 {
        let missing = MAGAZINE_SIZE.saturating_sub(self.loaded);
        let moved = missing.min(self.reserve);
        self.loaded += moved;
        self.reserve -= moved;
        moved
    }

    /// Ready to fire: cooldown elapsed (ammo checked separately)
    #[inline]
    pub fn weapon_ready(&self) -> bool {
        self.shoot_cooldown <= 0.0
    }

    /// Consume one loaded slug and start the cooldown
    pub fn consume_shot(&mut self) -> bool {
        if self.loaded == 0 {
            return false;
        }
        self.loaded -= 1;
        self.shoot_cooldown = SHOOT_COOLDOWN;
        true
    }

    /// Shield soaks first; the rest comes off integrity. Returns integrity lost.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let rest = amount - absorbed;
        self.integrity -= rest;
        rest
    }

    pub fn repair(&mut self, amount: f32) {
        self.integrity = (self.integrity + amount).min(MAX_INTEGRITY);
    }

    /// Debug mode keeps the suit topped up
    pub fn refill(&mut self) {
        self.integrity = MAX_INTEGRITY;
        self.energy = MAX_ENERGY;
        self.loaded = MAGAZINE_SIZE;
    }
}
