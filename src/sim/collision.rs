//! Kinematic bodies and tile collision
//!
//! The movement kernel shared by the player, AI actors and projectiles:
//! displacement is split into sub-steps no longer than `STEP_UNIT`, and each
//! sub-step is applied and resolved one axis at a time (x, then y) so bodies
//! slide along walls instead of snagging on corners.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use super::grid::{Grid, TileKind};
use crate::consts::*;

/// Velocity factor applied on the blocked axis after a wall push-out
pub const WALL_RESTITUTION: f32 = -0.2;
/// Gap left between a pushed-out body and the wall it touched
pub const SKIN: f32 = 0.001;
/// Displacements shorter than this are treated as no motion
const MIN_AXIS_STEP: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Position, velocity and bounding box of anything that moves on the grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner; `bounds` origin mirrors this after every move
    pub pos: Vec2,
    pub vel: Vec2,
    pub bounds: Rect,
    pub active: bool,
    /// Facing angle (radians)
    pub facing: f32,
    /// Keep the body inside the one-tile interior margin (player-class)
    pub clamp_to_interior: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            bounds: Rect::from_origin(pos, size),
            active: true,
            facing: 0.0,
            clamp_to_interior: false,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bounds.center()
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.bounds.size()
    }

    #[inline]
    fn sync_bounds(&mut self) {
        self.bounds.x = self.pos.x;
        self.bounds.y = self.pos.y;
    }

    /// Integrate velocity over `dt`
    pub fn advance(&mut self, dt: f32, grid: &Grid) {
        self.move_by(self.vel * dt, grid);
    }

    /// Move by `delta` against the grid's walls
    pub fn move_by(&mut self, delta: Vec2, grid: &Grid) {
        let dist = delta.length();
        if dist <= f32::EPSILON {
            self.sync_bounds();
            return;
        }

        let steps = (dist / STEP_UNIT) as u32 + 1;
        let step = delta / steps as f32;

        for _ in 0..steps {
            if step.x.abs() > MIN_AXIS_STEP {
                self.pos.x += step.x;
                self.resolve_axis(grid, Axis::X, step.x);
            }
            if step.y.abs() > MIN_AXIS_STEP {
                self.pos.y += step.y;
                self.resolve_axis(grid, Axis::Y, step.y);
            }
        }

        if self.clamp_to_interior {
            self.clamp_inside(grid);
        }
        self.sync_bounds();
    }

    /// Push the body out of every wall it overlaps along `axis`.
    ///
    /// `motion` is the signed increment just applied on that axis; the body
    /// is placed against the near edge of the wall when moving positive and
    /// the far edge when moving negative.
    pub fn resolve_axis(&mut self, grid: &Grid, axis: Axis, motion: f32) {
        self.sync_bounds();
        let (min_x, min_y, max_x, max_y) = occupied_tiles(&self.bounds, grid);

        for ty in min_y..=max_y {
            for tx in min_x..=max_x {
                let Some(tile) = grid.tile(tx, ty) else { continue };
                if tile.kind != TileKind::Wall || !self.bounds.intersects(&tile.rect) {
                    continue;
                }
                match axis {
                    Axis::X => {
                        self.pos.x = if motion > 0.0 {
                            tile.rect.x - self.bounds.w - SKIN
                        } else {
                            tile.rect.right() + SKIN
                        };
                        self.vel.x *= WALL_RESTITUTION;
                    }
                    Axis::Y => {
                        self.pos.y = if motion > 0.0 {
                            tile.rect.y - self.bounds.h - SKIN
                        } else {
                            tile.rect.bottom() + SKIN
                        };
                        self.vel.y *= WALL_RESTITUTION;
                    }
                }
                self.sync_bounds();
            }
        }
    }

    /// Clamp into `[TILE, (dim - 2) * TILE - size]` on both axes
    fn clamp_inside(&mut self, grid: &Grid) {
        let max_x = (grid.width() as f32 - 2.0) * TILE_SIZE - self.bounds.w;
        let max_y = (grid.height() as f32 - 2.0) * TILE_SIZE - self.bounds.h;
        self.pos.x = self.pos.x.clamp(TILE_SIZE, max_x.max(TILE_SIZE));
        self.pos.y = self.pos.y.clamp(TILE_SIZE, max_y.max(TILE_SIZE));
    }
}

/// Inclusive tile index range covered by `rect`, clamped to the grid
pub fn occupied_tiles(rect: &Rect, grid: &Grid) -> (i32, i32, i32, i32) {
    let last_x = grid.width() as i32 - 1;
    let last_y = grid.height() as i32 - 1;
    let (min_x, min_y) = Grid::tile_coords(rect.origin());
    let (max_x, max_y) = Grid::tile_coords(Vec2::new(rect.right(), rect.bottom()));
    (
        min_x.clamp(0, last_x),
        min_y.clamp(0, last_y),
        max_x.clamp(0, last_x),
        max_y.clamp(0, last_y),
    )
}

/// True when `rect` overlaps any wall tile
pub fn overlaps_wall(rect: &Rect, grid: &Grid) -> bool {
    let (min_x, min_y, max_x, max_y) = occupied_tiles(rect, grid);
    (min_y..=max_y).any(|ty| {
        (min_x..=max_x).any(|tx| {
            grid.tile(tx, ty)
                .is_some_and(|t| t.kind == TileKind::Wall && rect.intersects(&t.rect))
        })
    })
}
