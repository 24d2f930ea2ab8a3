//! Recoil Protocol - a top-down tile-grid action game
//!
//! Core modules:
//! - `sim`: Simulation (grid world, movement kernel, projectiles, AI, player)
//! - `audio`: Procedural audio engine (voice pool, ambient bed, delay line)
//! - `settings`: JSON configuration
//! - `persistence`: Fixed-layout binary save record

pub mod audio;
pub mod error;
pub mod persistence;
pub mod settings;
pub mod sim;

pub use error::{RecoilError, RecoilResult};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Side length of a grid tile in world units
    pub const TILE_SIZE: f32 = 40.0;
    /// Grid dimensions in tiles
    pub const MAP_WIDTH: usize = 50;
    pub const MAP_HEIGHT: usize = 50;

    /// Simulation/render loop rate
    pub const TARGET_FPS: u32 = 60;
    /// Fixed per-frame delta (seconds)
    pub const FRAME_DT: f32 = 1.0 / TARGET_FPS as f32;

    /// Movement sub-step length; no single increment exceeds this
    pub const STEP_UNIT: f32 = 4.0;

    pub const PLAYER_SPEED: f32 = 220.0;
    pub const DASH_SPEED: f32 = 850.0;
    pub const AI_SPEED: f32 = 140.0;
    /// World time scale while reflex is active
    pub const REFLEX_SCALE: f32 = 0.25;

    /// Projectile speeds
    pub const PLAYER_SLUG_SPEED: f32 = 800.0;
    pub const ENEMY_SLUG_SPEED: f32 = 450.0;
    /// Base damage of a player slug before multipliers
    pub const SLUG_BASE_DAMAGE: f32 = 25.0;
    /// Damage dealt to the player by an enemy slug
    pub const ENEMY_SLUG_DAMAGE: f32 = 10.0;
}

/// Wrap an angle into [-π, π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can round up to TAU itself
    if wrapped >= PI { wrapped - TAU } else { wrapped }
}

/// Facing angle from `from` toward `to`
#[inline]
pub fn angle_toward(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// World-space extent of the map
#[inline]
pub fn world_size() -> Vec2 {
    Vec2::new(
        consts::MAP_WIDTH as f32 * consts::TILE_SIZE,
        consts::MAP_HEIGHT as f32 * consts::TILE_SIZE,
    )
}
