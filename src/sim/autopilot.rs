//! Demo autopilot
//!
//! Fills a `TickInput` from the current state so the headless binary can play
//! on its own: capture contained cores, hunt hostile ones, then head for the
//! exit. Reads state only, so it stays deterministic.

use glam::Vec2;

use super::actor::Lifecycle;
use super::pathfinding::{PathQuery, find_path};
use super::state::{GamePhase, GameState};
use super::tick::TickInput;

/// Engage hostiles within this distance
const ENGAGE_RANGE: f32 = 320.0;
/// Waypoints closer than this are treated as reached
const WAYPOINT_SLACK: f32 = 6.0;

pub fn drive(state: &GameState, input: &mut TickInput) {
    if state.phase == GamePhase::GameOver {
        input.restart = true;
        return;
    }

    let me = state.player.center();

    let nearest = |lifecycle: Lifecycle| {
        state
            .actors
            .actors()
            .filter(|a| a.lifecycle == lifecycle)
            .map(|a| a.body.center())
            .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)))
    };
    let hostile = nearest(Lifecycle::Hostile);
    let contained = nearest(Lifecycle::Contained);

    // Shoot whatever is close
    if let Some(enemy) = hostile.filter(|e| e.distance(me) < ENGAGE_RANGE) {
        input.aim = enemy;
        input.fire = state.player.loaded > 0;
        let crowd = state
            .actors
            .actors()
            .filter(|a| a.is_hostile() && a.body.center().distance(me) < 200.0)
            .count();
        input.ability = crowd >= 3 && state.player.energy > 60.0;
    }
    if state.player.loaded == 0 && state.player.reserve > 0 {
        input.reload = true;
    }

    let goal = if state.exit.unlocked {
        Some(state.exit.rect.center())
    } else {
        contained.or(hostile)
    };
    let Some(goal) = goal else {
        return;
    };
    if input.aim == Vec2::ZERO {
        input.aim = goal;
    }

    input.move_intent = match find_path(&state.grid, me, goal) {
        PathQuery::Found(path) => {
            let next = path
                .iter()
                .copied()
                .find(|wp| wp.distance(me) > WAYPOINT_SLACK)
                .unwrap_or(goal);
            next - me
        }
        PathQuery::SameTile => goal - me,
        PathQuery::InvalidGoal | PathQuery::Unreachable => Vec2::ZERO,
    };
}
