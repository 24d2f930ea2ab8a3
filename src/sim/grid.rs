//! Static tile grid and procedural level construction
//!
//! The grid is written only by `Grid::generate` and read by movement,
//! pathfinding and spawning for the rest of the sector.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geom::Rect;
use crate::consts::*;

/// Candidate rooms carved per generation attempt
pub const ROOM_CANDIDATES: usize = 15;
/// Generation attempts before falling back to the minimal layout
pub const MAX_GENERATION_ATTEMPTS: u32 = 64;
/// Rejection-sampling budget for `find_open_space`
pub const OPEN_SPACE_ATTEMPTS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
}

/// A grid cell and its world-space rectangle
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub rect: Rect,
}

/// Tile grid, row-major
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
    /// Rooms carved by the generator, in tile units
    rooms: Vec<Rect>,
}

impl Grid {
    /// All-wall grid of the given size
    pub fn new(width: usize, height: usize) -> Self {
        let mut tiles = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                tiles.push(Tile {
                    kind: TileKind::Wall,
                    rect: Rect::new(
                        x as f32 * TILE_SIZE,
                        y as f32 * TILE_SIZE,
                        TILE_SIZE,
                        TILE_SIZE,
                    ),
                });
            }
        }
        Self {
            width,
            height,
            tiles,
            rooms: Vec::new(),
        }
    }

    /// Build a grid from text rows: `#` is wall, anything else floor.
    ///
    /// Rows shorter than the widest row are padded with wall.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c != '#' {
                    grid.set(x, y, TileKind::Floor);
                }
            }
        }
        grid
    }

    /// Generate a connected level.
    ///
    /// Retries from scratch until every floor tile is reachable from the
    /// first room, up to `MAX_GENERATION_ATTEMPTS`; then falls back to a
    /// single central room.
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let mut grid = Self::new(MAP_WIDTH, MAP_HEIGHT);
            grid.carve_rooms(rng);
            if grid.rooms.is_empty() {
                log::debug!("Level attempt {attempt}: no rooms placed, retrying");
                continue;
            }
            grid.carve_corridors();
            if grid.is_connected() {
                log::debug!(
                    "Level generated on attempt {attempt} with {} rooms",
                    grid.rooms.len()
                );
                return grid;
            }
            log::debug!("Level attempt {attempt}: disconnected floor, retrying");
        }
        log::warn!(
            "Level generation did not converge after {MAX_GENERATION_ATTEMPTS} attempts, using fallback layout"
        );
        Self::fallback(MAP_WIDTH, MAP_HEIGHT)
    }

    /// Deterministic minimal layout: one room in the middle of the map
    pub fn fallback(width: usize, height: usize) -> Self {
        let mut grid = Self::new(width, height);
        let rw = (width / 3).max(1);
        let rh = (height / 3).max(1);
        let room = Rect::new(
            ((width - rw) / 2) as f32,
            ((height - rh) / 2) as f32,
            rw as f32,
            rh as f32,
        );
        grid.fill_room(&room);
        grid.rooms.push(room);
        grid
    }

    fn carve_rooms<R: Rng>(&mut self, rng: &mut R) {
        for _ in 0..ROOM_CANDIDATES {
            let w = rng.random_range(6..12usize);
            let h = rng.random_range(6..12usize);
            if w + 2 > self.width || h + 2 > self.height {
                continue;
            }
            let x = rng.random_range(1..self.width - w);
            let y = rng.random_range(1..self.height - h);
            let room = Rect::new(x as f32, y as f32, w as f32, h as f32);

            if self.rooms.iter().any(|r| room.intersects(&r.inflate(1.0))) {
                continue;
            }
            self.fill_room(&room);
            self.rooms.push(room);
        }
    }

    fn fill_room(&mut self, room: &Rect) {
        let (x0, y0) = (room.x as usize, room.y as usize);
        for y in y0..y0 + room.h as usize {
            for x in x0..x0 + room.w as usize {
                self.set(x, y, TileKind::Floor);
            }
        }
    }

    /// Join consecutive room centers: dig along x on the first room's row,
    /// then along y on the second room's column.
    fn carve_corridors(&mut self) {
        for i in 1..self.rooms.len() {
            let a = self.rooms[i - 1].center();
            let b = self.rooms[i].center();
            let (ax, ay) = (a.x as i32, a.y as i32);
            let (bx, by) = (b.x as i32, b.y as i32);

            let x_dir = if bx > ax { 1 } else { -1 };
            let mut x = ax;
            while x != bx {
                self.set(x as usize, ay as usize, TileKind::Floor);
                x += x_dir;
            }
            let y_dir = if by > ay { 1 } else { -1 };
            let mut y = ay;
            while y != by {
                self.set(bx as usize, y as usize, TileKind::Floor);
                y += y_dir;
            }
        }
    }

    /// Breadth-first, 4-connected flood over floor tiles from `start`.
    ///
    /// Returns a row-major reachability mask (empty start yields all false).
    pub fn flood_fill(&self, start: (usize, usize)) -> Vec<bool> {
        let mut reached = vec![false; self.width * self.height];
        if !self.is_floor(start.0 as i32, start.1 as i32) {
            return reached;
        }
        let mut queue = VecDeque::new();
        reached[self.index(start.0, start.1)] = true;
        queue.push_back(start);

        while let Some((cx, cy)) = queue.pop_front() {
            for (dx, dy) in NEIGHBORS {
                let nx = cx as i32 + dx;
                let ny = cy as i32 + dy;
                if self.is_floor(nx, ny) {
                    let idx = self.index(nx as usize, ny as usize);
                    if !reached[idx] {
                        reached[idx] = true;
                        queue.push_back((nx as usize, ny as usize));
                    }
                }
            }
        }
        reached
    }

    /// True when every floor tile is reachable from the first room's center
    /// (or from any floor tile when there are no rooms).
    pub fn is_connected(&self) -> bool {
        let start = match self.rooms.first() {
            Some(room) => {
                let c = room.center();
                (c.x as usize, c.y as usize)
            }
            None => match self.tiles.iter().position(|t| t.kind == TileKind::Floor) {
                Some(i) => (i % self.width, i / self.width),
                None => return true,
            },
        };
        let reached = self.flood_fill(start);
        self.tiles
            .iter()
            .zip(&reached)
            .all(|(tile, &r)| tile.kind == TileKind::Wall || r)
    }

    /// Find a wall-free spot for a `w` x `h` body.
    ///
    /// Rejection-samples floor tiles; a candidate is accepted when its
    /// footprint (inset 2 units into the tile) overlaps no wall in the
    /// surrounding 4x4 neighborhood. Entity-entity overlap is not checked.
    /// Falls back to the map center.
    pub fn find_open_space<R: Rng>(&self, rng: &mut R, w: f32, h: f32) -> Vec2 {
        if self.width > 2 && self.height > 2 {
            for _ in 0..OPEN_SPACE_ATTEMPTS {
                let x = rng.random_range(1..self.width - 1) as i32;
                let y = rng.random_range(1..self.height - 1) as i32;
                if !self.is_floor(x, y) {
                    continue;
                }
                let candidate = Rect::new(
                    x as f32 * TILE_SIZE + 2.0,
                    y as f32 * TILE_SIZE + 2.0,
                    w,
                    h,
                );
                let blocked = (y - 1..=y + 2).any(|sy| {
                    (x - 1..=x + 2).any(|sx| {
                        self.tile(sx, sy).is_some_and(|t| {
                            t.kind == TileKind::Wall && candidate.intersects(&t.rect)
                        })
                    })
                });
                if !blocked {
                    return candidate.origin();
                }
            }
        }
        Vec2::new(
            self.width as f32 * TILE_SIZE / 2.0,
            self.height as f32 * TILE_SIZE / 2.0,
        )
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn rooms(&self) -> &[Rect] {
        &self.rooms
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        if self.in_bounds(x, y) {
            Some(&self.tiles[self.index(x as usize, y as usize)])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, kind: TileKind) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.tiles[idx].kind = kind;
        }
    }

    /// Out-of-bounds reads as "not floor"
    #[inline]
    pub fn is_floor(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_some_and(|t| t.kind == TileKind::Floor)
    }

    /// Out-of-bounds reads as "not wall"
    #[inline]
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.tile(x, y).is_some_and(|t| t.kind == TileKind::Wall)
    }

    /// Tile coordinates containing a world position (floor division)
    #[inline]
    pub fn tile_coords(pos: Vec2) -> (i32, i32) {
        (
            (pos.x / TILE_SIZE).floor() as i32,
            (pos.y / TILE_SIZE).floor() as i32,
        )
    }

    /// World-space center of a tile
    #[inline]
    pub fn tile_center(x: i32, y: i32) -> Vec2 {
        Vec2::new(
            x as f32 * TILE_SIZE + TILE_SIZE / 2.0,
            y as f32 * TILE_SIZE + TILE_SIZE / 2.0,
        )
    }

    /// Number of floor tiles
    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.kind == TileKind::Floor).count()
    }
}

/// 4-connected neighbor offsets
pub(crate) const NEIGHBORS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
