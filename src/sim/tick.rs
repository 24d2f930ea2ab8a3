//! Fixed timestep simulation tick
//!
//! Per tick: discrete actions, player movement, pickups, player fire, AI,
//! projectiles, hazards, then sector bookkeeping. While reflex is active the
//! world advances at `dt * REFLEX_SCALE` and the player at full `dt`.

use glam::Vec2;
use rand::Rng;

use super::actor::DamageOutcome;
use super::ai::{self, Target};
use super::autopilot;
use super::projectile::{AmmoKind, Slug, resolve_hit};
use super::state::{
    BATTERY_SLUGS, CONTAIN_SCORE, ECHO_DAMAGE, ECHO_SPREAD, Echo, GameEvent, GamePhase, GameState,
    ItemKind, REPAIR_KIT_AMOUNT, SANITIZE_SCORE,
};
use crate::consts::*;

/// Shockwave clears enemy slugs within this distance
pub const SHOCKWAVE_CLEAR_RADIUS: f32 = 250.0;
/// Shockwave damages actors within this distance
pub const SHOCKWAVE_RADIUS: f32 = 200.0;
pub const SHOCKWAVE_DAMAGE: f32 = 150.0;
pub const SHOCKWAVE_KNOCKBACK: f32 = 1200.0;
pub const SHOCKWAVE_STUN: f32 = 0.8;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement intent (any length; normalized by the player)
    pub move_intent: Vec2,
    /// World-space aim point
    pub aim: Vec2,
    pub fire: bool,
    pub dash: bool,
    pub toggle_reflex: bool,
    pub reload: bool,
    /// Shockwave ability
    pub ability: bool,
    pub select_ammo: Option<AmmoKind>,
    /// Rebuild the sector after game over
    pub restart: bool,
    pub toggle_debug: bool,
    /// Debug only: jump to the next sector
    pub skip_sector: bool,
    /// Let the autopilot play
    pub autopilot: bool,
}

/// Advance the game state by one tick of `dt` seconds
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let mut input = input.clone();
    if input.autopilot {
        autopilot::drive(state, &mut input);
    }
    let input = &input;

    if input.toggle_debug {
        state.debug_mode = !state.debug_mode;
        log::info!("Debug mode {}", if state.debug_mode { "on" } else { "off" });
        state.events.push(GameEvent::DebugToggled {
            enabled: state.debug_mode,
        });
    }
    if state.debug_mode && input.skip_sector {
        state.sector += 1;
        state.build_sector();
        return;
    }
    if state.phase == GamePhase::GameOver {
        if input.restart {
            state.build_sector();
        }
        return;
    }

    state.time_ticks += 1;
    handle_actions(state, input);

    let world_dt = if state.player.reflex_active {
        dt * REFLEX_SCALE
    } else {
        dt
    };

    // Player runs on real time
    state.player.steer(input.move_intent);
    state.player.body.facing = crate::angle_toward(state.player.center(), input.aim);
    if state.player.update(dt, &state.grid) {
        state.events.push(GameEvent::Footstep);
    }
    state.update_objective();
    if state.debug_mode {
        state.player.refill();
    }

    collect_items(state);
    fire_weapon(state, input);

    let target = Target {
        center: state.player.center(),
    };
    let shots = ai::update_actors(
        &mut state.actors,
        &state.grid,
        target,
        world_dt,
        &mut state.rng,
        &mut state.events,
    );
    state.slugs.extend(shots);
    sanitize_contact(state);

    update_slugs(state, world_dt);
    update_echoes(state, world_dt);

    if state.exit.unlocked && state.player.body.bounds.intersects(&state.exit.rect) {
        log::info!("Sector {} cleared, score {}", state.sector, state.score);
        state.events.push(GameEvent::SectorCleared {
            sector: state.sector,
            score: state.score,
            integrity: state.player.integrity,
        });
        state.sector += 1;
        state.build_sector();
        return;
    }

    if !state.player.alive() {
        state.phase = GamePhase::GameOver;
        log::info!("Protocol failure in sector {}", state.sector);
        state.events.push(GameEvent::GameOver {
            sector: state.sector,
            score: state.score,
        });
    }
}

/// Discrete triggers: reflex, ammo, reload, shockwave, dash
fn handle_actions(state: &mut GameState, input: &TickInput) {
    if input.toggle_reflex {
        let active = state.player.toggle_reflex();
        state.events.push(GameEvent::ReflexToggled { active });
    }
    if let Some(ammo) = input.select_ammo
        && ammo != state.ammo
    {
        state.ammo = ammo;
        state.events.push(GameEvent::AmmoSelected { ammo });
    }
    if input.reload {
        let slugs = state.player.reload();
        if slugs > 0 {
            state.events.push(GameEvent::Reloaded { slugs });
        }
    }
    if input.ability {
        if state.player.try_shockwave() {
            shockwave(state);
        } else {
            state.events.push(GameEvent::LowEnergy);
        }
    }
    if input.dash {
        if state.player.try_dash() {
            state.events.push(GameEvent::Dashed);
        } else {
            state.events.push(GameEvent::LowEnergy);
        }
    }
}

/// Area pulse around the player
fn shockwave(state: &mut GameState) {
    let origin = state.player.body.pos;
    state.events.push(GameEvent::Shockwave { pos: origin });

    for slug in state.slugs.iter_mut().filter(|s| !s.player_owned) {
        if slug.body.pos.distance(origin) < SHOCKWAVE_CLEAR_RADIUS {
            slug.body.active = false;
        }
    }

    for (_, actor) in state.actors.iter_mut() {
        if !actor.is_hostile() || actor.body.pos.distance(origin) >= SHOCKWAVE_RADIUS {
            continue;
        }
        let pos = actor.body.center();
        let outcome = actor.take_damage(SHOCKWAVE_DAMAGE);
        let mut push = (actor.body.pos - origin).normalize_or_zero();
        if push == Vec2::ZERO {
            push = Vec2::NEG_Y;
        }
        if outcome != DamageOutcome::Contained {
            actor.body.vel = push * SHOCKWAVE_KNOCKBACK;
            actor.stun_timer = SHOCKWAVE_STUN;
        }
        let kind = actor.kind.label();
        push_damage_events(&mut state.events, &mut state.score, outcome, pos, kind);
    }
}

/// Translate a damage outcome into score and events
fn push_damage_events(
    events: &mut Vec<GameEvent>,
    score: &mut u32,
    outcome: DamageOutcome,
    pos: Vec2,
    kind: &'static str,
) {
    match outcome {
        DamageOutcome::Shielded { broke } => {
            events.push(GameEvent::ShieldHit { pos });
            if broke {
                events.push(GameEvent::ShieldDown { pos });
            }
        }
        DamageOutcome::Damaged => events.push(GameEvent::ActorHit { pos }),
        DamageOutcome::Contained => {
            *score += CONTAIN_SCORE;
            events.push(GameEvent::ActorContained { pos, kind });
        }
        DamageOutcome::Ignored => {}
    }
}

fn collect_items(state: &mut GameState) {
    let player = &mut state.player;
    for item in state.items.iter_mut().filter(|i| i.active) {
        if !player.body.bounds.intersects(&item.rect) {
            continue;
        }
        item.active = false;
        match item.kind {
            ItemKind::RepairKit => player.repair(REPAIR_KIT_AMOUNT),
            ItemKind::BatteryPack => player.reserve += BATTERY_SLUGS,
        }
        state.events.push(GameEvent::ItemCollected {
            kind: item.kind,
            pos: item.rect.origin(),
        });
    }
    state.items.retain(|i| i.active);
}

fn fire_weapon(state: &mut GameState, input: &TickInput) {
    if !input.fire || !state.player.weapon_ready() {
        return;
    }
    let origin = state.player.center();
    if !state.player.consume_shot() {
        // Hold the click to the fire cadence
        state.player.shoot_cooldown = super::player::SHOOT_COOLDOWN;
        state.events.push(GameEvent::EmptyClick);
        return;
    }
    let dir = input.aim - origin;
    let dir = if dir.length_squared() > f32::EPSILON {
        dir
    } else {
        Vec2::from_angle(state.player.body.facing)
    };
    state
        .slugs
        .push(Slug::spawn(origin, dir, PLAYER_SLUG_SPEED, true, state.ammo));
    state.events.push(GameEvent::PlayerFired {
        pos: origin,
        ammo: state.ammo,
    });
}

/// Capture contained actors the player is touching
fn sanitize_contact(state: &mut GameState) {
    let bounds = state.player.body.bounds;
    for (_, actor) in state.actors.iter_mut() {
        if actor.body.bounds.intersects(&bounds) && actor.sanitize() {
            state.score += SANITIZE_SCORE;
            state.events.push(GameEvent::ActorSanitized {
                pos: actor.body.center(),
                kind: actor.kind.label(),
            });
        }
    }
}

fn update_slugs(state: &mut GameState, dt: f32) {
    for slug in state.slugs.iter_mut() {
        if !slug.active() {
            continue;
        }
        if slug.update(dt, &state.grid) > 0 {
            state.events.push(GameEvent::Ricochet { pos: slug.body.pos });
        }
        if !slug.active() {
            continue;
        }

        if slug.player_owned {
            for (handle, actor) in state.actors.iter_mut() {
                if !actor.is_hostile()
                    || slug.pierced.contains(&handle)
                    || !slug.body.bounds.intersects(&actor.body.bounds)
                {
                    continue;
                }
                let hit = resolve_hit(slug, actor.shield_up());
                if let Some(stun) = hit.stun {
                    actor.stun_timer = stun;
                }
                let outcome = actor.take_damage(hit.damage);
                let pos = actor.body.center();
                push_damage_events(&mut state.events, &mut state.score, outcome, pos, actor.kind.label());
                if hit.consumed {
                    slug.body.active = false;
                    break;
                }
                slug.pierced.push(handle);
            }
        } else if slug.body.bounds.intersects(&state.player.body.bounds) {
            slug.body.active = false;
            let amount = state.player.take_damage(ENEMY_SLUG_DAMAGE);
            state.events.push(GameEvent::PlayerDamaged { amount });
        }
    }
    state.slugs.retain(|s| s.active());
}

fn update_echoes(state: &mut GameState, dt: f32) {
    let spawn_roll = state.rng.random_range(0..1000u32);
    if spawn_roll < 1 + state.sector {
        let offset = Vec2::new(
            state.rng.random_range(-ECHO_SPREAD..ECHO_SPREAD),
            state.rng.random_range(-ECHO_SPREAD..ECHO_SPREAD),
        );
        state.echoes.push(Echo::new(state.player.body.pos + offset));
    }

    let target = state.player.body.pos;
    for echo in state.echoes.iter_mut() {
        echo.update(dt, target);
        if echo.body.active && echo.body.bounds.intersects(&state.player.body.bounds) {
            echo.body.active = false;
            let amount = state.player.take_damage(ECHO_DAMAGE);
            state.events.push(GameEvent::PlayerDamaged { amount });
        }
    }
    state.echoes.retain(|e| e.body.active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actor::{Actor, Lifecycle};
    use crate::sim::grid::Grid;
    use crate::sim::player::{MAGAZINE_SIZE, Player};

    /// Sector with an empty open room: the player alone at tile (5, 5)
    fn arena() -> GameState {
        let mut state = GameState::new(1);
        let mut rows = vec!["#".repeat(30)];
        for _ in 0..20 {
            rows.push(format!("#{}#", ".".repeat(28)));
        }
        rows.push("#".repeat(30));
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        state.grid = Grid::from_rows(&refs);
        state.actors.clear();
        state.items.clear();
        state.slugs.clear();
        state.echoes.clear();
        state.player = Player::new(Grid::tile_center(5, 5));
        state.exit.rect.x = Grid::tile_center(25, 18).x;
        state.exit.rect.y = Grid::tile_center(25, 18).y;
        state.drain_events();
        state
    }

    fn aim_right(state: &GameState) -> TickInput {
        TickInput {
            aim: state.player.center() + Vec2::new(500.0, 0.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_fire_spawns_player_slug() {
        let mut state = arena();
        let mut input = aim_right(&state);
        input.fire = true;
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.slugs.len(), 1);
        assert!(state.slugs[0].player_owned);
        assert!(state.slugs[0].body.vel.x > 0.0);
        assert_eq!(state.player.loaded, MAGAZINE_SIZE - 1);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::PlayerFired { .. })));
    }

    #[test]
    fn test_empty_magazine_clicks() {
        let mut state = arena();
        state.player.loaded = 0;
        let mut input = aim_right(&state);
        input.fire = true;
        tick(&mut state, &input, FRAME_DT);
        assert!(state.slugs.is_empty());
        assert!(state.events.contains(&GameEvent::EmptyClick));
    }

    #[test]
    fn test_slug_contains_actor_and_scores() {
        let mut state = arena();
        let mut actor = Actor::standard(Grid::tile_center(9, 5));
        actor.stability = 20.0;
        let h = state.actors.insert(actor);
        let mut input = aim_right(&state);
        input.fire = true;
        tick(&mut state, &input, FRAME_DT);
        input.fire = false;
        for _ in 0..30 {
            tick(&mut state, &input, FRAME_DT);
        }
        assert_eq!(state.actors.get(h).map(|a| a.lifecycle), Some(Lifecycle::Contained));
        assert_eq!(state.score, CONTAIN_SCORE);
        assert!(state.events.iter().any(|e| matches!(e, GameEvent::ActorContained { .. })));
    }

    #[test]
    fn test_piercing_passes_through() {
        let mut state = arena();
        state.ammo = AmmoKind::Piercing;
        let mut a = Actor::standard(Grid::tile_center(9, 5));
        a.stability = 1000.0;
        let mut b = Actor::standard(Grid::tile_center(13, 5));
        b.stability = 1000.0;
        let a = state.actors.insert(a);
        let b = state.actors.insert(b);
        let slug = Slug::spawn(
            Grid::tile_center(7, 5) + Vec2::splat(10.0),
            Vec2::X,
            PLAYER_SLUG_SPEED,
            true,
            AmmoKind::Piercing,
        );
        state.slugs.push(slug);
        for _ in 0..20 {
            update_slugs(&mut state, FRAME_DT);
        }
        // Each hit exactly once for 37.5
        assert_eq!(state.actors.get(a).map(|x| x.stability), Some(962.5));
        assert_eq!(state.actors.get(b).map(|x| x.stability), Some(962.5));
    }

    #[test]
    fn test_piercing_stops_at_shield() {
        use crate::sim::actor::{ActorKind, GUARDIAN_SHIELD};

        let mut state = arena();
        let mut front = Actor::standard(Grid::tile_center(9, 5));
        front.stability = 1000.0;
        let front = state.actors.insert(front);
        let guardian = state.actors.insert(Actor::guardian(Grid::tile_center(12, 5)));
        let guardian_stability = state.actors.get(guardian).map(|g| g.stability);
        let mut behind = Actor::standard(Grid::tile_center(17, 5));
        behind.stability = 1000.0;
        let behind = state.actors.insert(behind);

        state.slugs.push(Slug::spawn(
            Grid::tile_center(7, 5) + Vec2::splat(10.0),
            Vec2::X,
            PLAYER_SLUG_SPEED,
            true,
            AmmoKind::Piercing,
        ));
        for _ in 0..40 {
            update_slugs(&mut state, FRAME_DT);
        }

        assert_eq!(state.actors.get(front).map(|a| a.stability), Some(962.5));
        // The shield takes the hit and the slug is spent
        assert!(matches!(
            state.actors.get(guardian).map(|g| &g.kind),
            Some(ActorKind::Guardian { shield, .. }) if *shield == GUARDIAN_SHIELD - 37.5
        ));
        assert_eq!(state.actors.get(guardian).map(|g| g.stability), guardian_stability);
        assert_eq!(state.actors.get(behind).map(|a| a.stability), Some(1000.0));
        assert!(state.slugs.is_empty());
    }

    #[test]
    fn test_enemy_slug_damages_player() {
        let mut state = arena();
        state.player.shield = 0.0;
        let at = state.player.body.pos + Vec2::new(-30.0, 9.0);
        state
            .slugs
            .push(Slug::spawn(at, Vec2::X, ENEMY_SLUG_SPEED, false, AmmoKind::Standard));
        for _ in 0..10 {
            update_slugs(&mut state, FRAME_DT);
        }
        assert!(state.slugs.is_empty());
        assert_eq!(state.player.integrity, 100.0 - ENEMY_SLUG_DAMAGE);
        assert!(state.events.contains(&GameEvent::PlayerDamaged {
            amount: ENEMY_SLUG_DAMAGE
        }));
    }

    #[test]
    fn test_sanitize_on_contact() {
        let mut state = arena();
        let mut actor = Actor::standard(state.player.body.pos + Vec2::new(4.0, 4.0));
        actor.contain();
        let h = state.actors.insert(actor);
        let input = aim_right(&state);
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.actors.get(h).map(|a| a.lifecycle), Some(Lifecycle::Sanitized));
        assert_eq!(state.score, SANITIZE_SCORE);
    }

    #[test]
    fn test_shockwave_contains_and_clears() {
        let mut state = arena();
        let near = state.actors.insert(Actor::standard(state.player.body.pos + Vec2::new(80.0, 0.0)));
        let far = state.actors.insert(Actor::standard(state.player.body.pos + Vec2::new(600.0, 0.0)));
        let enemy_slug = Slug::spawn(
            state.player.body.pos + Vec2::new(0.0, 120.0),
            Vec2::X,
            ENEMY_SLUG_SPEED,
            false,
            AmmoKind::Standard,
        );
        state.slugs.push(enemy_slug);
        let energy = state.player.energy;
        let mut input = aim_right(&state);
        input.ability = true;
        tick(&mut state, &input, FRAME_DT);

        assert_eq!(state.actors.get(near).map(|a| a.lifecycle), Some(Lifecycle::Contained));
        assert_eq!(state.actors.get(far).map(|a| a.stability), Some(100.0));
        assert!(state.slugs.iter().all(|s| s.player_owned));
        assert!(state.player.energy < energy - 40.0);
    }

    #[test]
    fn test_reflex_slows_world_not_player() {
        let mut state = arena();
        let slug = Slug::spawn(Grid::tile_center(10, 10), Vec2::X, 600.0, false, AmmoKind::Standard);
        state.slugs.push(slug);
        let start_slug = state.slugs[0].body.pos.x;
        let start_player = state.player.body.pos.x;
        let mut input = aim_right(&state);
        input.toggle_reflex = true;
        input.move_intent = Vec2::X;
        tick(&mut state, &input, FRAME_DT);

        assert!(state.player.reflex_active);
        let slug_moved = state.slugs[0].body.pos.x - start_slug;
        let player_moved = state.player.body.pos.x - start_player;
        assert!((slug_moved - 600.0 * FRAME_DT * REFLEX_SCALE).abs() < 1e-3);
        assert!((player_moved - PLAYER_SPEED * FRAME_DT).abs() < 1e-3);
    }

    #[test]
    fn test_items_collected() {
        let mut state = arena();
        state.player.integrity = 50.0;
        let pos = state.player.body.pos;
        state.items.push(super::super::state::Item {
            kind: ItemKind::RepairKit,
            rect: crate::sim::geom::Rect::from_origin(pos, Vec2::splat(20.0)),
            active: true,
        });
        state.items.push(super::super::state::Item {
            kind: ItemKind::BatteryPack,
            rect: crate::sim::geom::Rect::from_origin(pos, Vec2::splat(20.0)),
            active: true,
        });
        let reserve = state.player.reserve;
        let input = aim_right(&state);
        tick(&mut state, &input, FRAME_DT);
        assert!(state.items.is_empty());
        assert_eq!(state.player.integrity, 80.0);
        assert_eq!(state.player.reserve, reserve + BATTERY_SLUGS);
    }

    #[test]
    fn test_exit_advances_sector() {
        let mut state = arena();
        state.exit.unlocked = true;
        state.exit.rect = crate::sim::geom::Rect::from_origin(state.player.body.pos, Vec2::splat(40.0));
        let input = aim_right(&state);
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.sector, 2);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::SectorCleared {
            sector: 1,
            score: 0,
            integrity: 100.0,
        }));
        assert!(events.contains(&GameEvent::SectorStarted { sector: 2 }));
    }

    #[test]
    fn test_game_over_and_restart() {
        let mut state = arena();
        state.player.integrity = 0.0;
        let input = aim_right(&state);
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.phase, GamePhase::GameOver);
        let ticks = state.time_ticks;
        let input = aim_right(&state);
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.time_ticks, ticks);

        let input = TickInput {
            restart: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.player.integrity, 100.0);
    }

    #[test]
    fn test_debug_skip_sector_requires_debug() {
        let mut state = arena();
        let mut input = TickInput {
            skip_sector: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_DT);
        assert_eq!(state.sector, 1);
        input.toggle_debug = true;
        tick(&mut state, &input, FRAME_DT);
        assert!(state.debug_mode);
        assert_eq!(state.sector, 2);
    }
}
