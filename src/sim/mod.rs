//! Simulation module
//!
//! All gameplay logic lives here, free of audio and platform concerns:
//! - Caller-supplied timestep
//! - Seeded RNG owned by the session
//! - Stable iteration order (arena slot order for actors)

pub mod actor;
pub mod ai;
pub mod autopilot;
pub mod collision;
pub mod geom;
pub mod grid;
pub mod pathfinding;
pub mod player;
pub mod projectile;
pub mod state;
pub mod tick;

pub use actor::{Actor, ActorArena, ActorHandle, ActorKind, DamageOutcome, Lifecycle};
pub use collision::{Axis, Body};
pub use geom::Rect;
pub use grid::{Grid, Tile, TileKind};
pub use pathfinding::{PathQuery, find_path};
pub use player::Player;
pub use projectile::{AmmoKind, HitResolution, Slug, resolve_hit};
pub use state::{
    Echo, Exit, GameEvent, GamePhase, GameState, Item, ItemKind, Objective, Snapshot, ThreatLevel,
};
pub use tick::{TickInput, tick};
