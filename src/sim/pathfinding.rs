//! Grid pathfinding
//!
//! Uniform-cost search over 4-connected floor tiles, ordered by
//! `cost + manhattan distance to goal` (A* with an admissible heuristic).
//! Waypoints are tile centers in traversal order, excluding the start tile.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use glam::Vec2;

use super::grid::{Grid, NEIGHBORS};

/// Result of a path query
#[derive(Debug, Clone, PartialEq)]
pub enum PathQuery {
    /// Start and goal share a tile; nothing to do
    SameTile,
    /// Goal tile is outside the grid or a wall
    InvalidGoal,
    /// Waypoints from the tile after the start up to the goal tile center
    Found(Vec<Vec2>),
    /// Search exhausted without reaching the goal
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Frontier {
    priority: f32,
    x: i32,
    y: i32,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .total_cmp(&other.priority)
            .then_with(|| (self.x, self.y).cmp(&(other.x, other.y)))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path between two world positions (each snapped to its tile)
pub fn find_path(grid: &Grid, from: Vec2, to: Vec2) -> PathQuery {
    let (sx, sy) = Grid::tile_coords(from);
    let (ex, ey) = Grid::tile_coords(to);

    if (sx, sy) == (ex, ey) {
        return PathQuery::SameTile;
    }
    if !grid.is_floor(ex, ey) {
        return PathQuery::InvalidGoal;
    }
    if !grid.in_bounds(sx, sy) {
        return PathQuery::Unreachable;
    }

    let width = grid.width();
    let idx = |x: i32, y: i32| y as usize * width + x as usize;

    let cells = width * grid.height();
    let mut cost = vec![f32::INFINITY; cells];
    let mut parent: Vec<Option<(i32, i32)>> = vec![None; cells];
    let mut visited = vec![false; cells];
    let mut open = BinaryHeap::new();

    cost[idx(sx, sy)] = 0.0;
    open.push(Reverse(Frontier {
        priority: 0.0,
        x: sx,
        y: sy,
    }));

    let mut found = false;
    while let Some(Reverse(Frontier { x: cx, y: cy, .. })) = open.pop() {
        if (cx, cy) == (ex, ey) {
            found = true;
            break;
        }
        let ci = idx(cx, cy);
        if visited[ci] {
            continue;
        }
        visited[ci] = true;

        for (dx, dy) in NEIGHBORS {
            let (nx, ny) = (cx + dx, cy + dy);
            if !grid.is_floor(nx, ny) {
                continue;
            }
            let ni = idx(nx, ny);
            if visited[ni] {
                continue;
            }
            let tentative = cost[ci] + 1.0;
            if tentative < cost[ni] {
                cost[ni] = tentative;
                parent[ni] = Some((cx, cy));
                let h = ((nx - ex).abs() + (ny - ey).abs()) as f32;
                open.push(Reverse(Frontier {
                    priority: tentative + h,
                    x: nx,
                    y: ny,
                }));
            }
        }
    }

    if !found {
        return PathQuery::Unreachable;
    }

    let mut path = Vec::new();
    let (mut cx, mut cy) = (ex, ey);
    while (cx, cy) != (sx, sy) {
        path.push(Grid::tile_center(cx, cy));
        match parent[idx(cx, cy)] {
            Some((px, py)) => {
                cx = px;
                cy = py;
            }
            None => break,
        }
    }
    path.reverse();
    PathQuery::Found(path)
}
