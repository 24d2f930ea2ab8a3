//! Session state and core simulation types
//!
//! A `GameState` owns everything in a sector: the grid, the player, the actor
//! arena, projectiles, pickups and hazards. Rebuilding a sector drops all of it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, ActorArena, ActorKind, Lifecycle};
use super::collision::Body;
use super::geom::Rect;
use super::grid::Grid;
use super::player::Player;
use super::projectile::{AmmoKind, Slug};

/// Score for bringing an actor's stability to zero
pub const CONTAIN_SCORE: u32 = 50;
/// Score for capturing a contained actor
pub const SANITIZE_SCORE: u32 = 150;

pub const ITEMS_PER_SECTOR: usize = 8;
/// Percent of items that are battery packs
pub const BATTERY_CHANCE: u32 = 40;
pub const REPAIR_KIT_AMOUNT: f32 = 30.0;
pub const BATTERY_SLUGS: u32 = 24;
pub const ITEM_SIZE: f32 = 20.0;
pub const EXIT_SIZE: f32 = 40.0;

pub const ECHO_SIZE: f32 = 32.0;
pub const ECHO_LIFE: f32 = 4.0;
pub const ECHO_SPEED: f32 = 100.0;
pub const ECHO_DAMAGE: f32 = 15.0;
/// Max spawn offset from the player on each axis
pub const ECHO_SPREAD: f32 = 200.0;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    /// Suit integrity exhausted; waiting for restart
    GameOver,
}

/// Sector goal shown on the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    NeutralizeCores,
    ReachExit,
}

impl Objective {
    pub fn description(self) -> &'static str {
        match self {
            Objective::NeutralizeCores => "Neutralize rogue AI cores",
            Objective::ReachExit => "Proceed to extraction point",
        }
    }
}

/// How threatening the current situation is (drives the ambient bed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    Standard,
    Battle,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Restores suit integrity
    RepairKit,
    /// Adds reserve slugs
    BatteryPack,
}

/// A pickup lying on the floor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub rect: Rect,
    pub active: bool,
}

/// Neural echo: a drifting hazard that ignores walls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Echo {
    pub body: Body,
    pub life: f32,
}

impl Echo {
    pub fn new(pos: Vec2) -> Self {
        Self {
            body: Body::new(pos, Vec2::splat(ECHO_SIZE)),
            life: ECHO_LIFE,
        }
    }

    /// Drift toward `target`; walls are not consulted
    pub fn update(&mut self, dt: f32, target: Vec2) {
        self.body.vel = (target - self.body.pos).normalize_or_zero() * ECHO_SPEED;
        self.body.pos += self.body.vel * dt;
        self.body.bounds.x = self.body.pos.x;
        self.body.bounds.y = self.body.pos.y;
        self.life -= dt;
        if self.life <= 0.0 {
            self.body.active = false;
        }
    }
}

/// Sector exit; locked until every actor is sanitized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exit {
    pub rect: Rect,
    pub unlocked: bool,
}

/// Discrete notifications for logging, HUD and audio.
///
/// Drained by the orchestrator after every tick.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SectorStarted { sector: u32 },
    BossDetected { pos: Vec2 },
    PlayerFired { pos: Vec2, ammo: AmmoKind },
    EmptyClick,
    Reloaded { slugs: u32 },
    Dashed,
    Footstep,
    ReflexToggled { active: bool },
    Shockwave { pos: Vec2 },
    AmmoSelected { ammo: AmmoKind },
    LowEnergy,
    EnemyFired { pos: Vec2 },
    Ricochet { pos: Vec2 },
    ActorHit { pos: Vec2 },
    ShieldHit { pos: Vec2 },
    ShieldDown { pos: Vec2 },
    ActorContained { pos: Vec2, kind: &'static str },
    ActorSanitized { pos: Vec2, kind: &'static str },
    BossPhaseShift { pos: Vec2 },
    PlayerDamaged { amount: f32 },
    ItemCollected { kind: ItemKind, pos: Vec2 },
    ExitUnlocked,
    /// Progress at the moment the exit was reached, before the next sector is built
    SectorCleared {
        sector: u32,
        score: u32,
        integrity: f32,
    },
    GameOver { sector: u32, score: u32 },
    DebugToggled { enabled: bool },
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Current sector (1-based)
    pub sector: u32,
    pub score: u32,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub grid: Grid,
    pub player: Player,
    pub actors: ActorArena,
    pub slugs: Vec<Slug>,
    pub items: Vec<Item>,
    pub echoes: Vec<Echo>,
    pub exit: Exit,
    pub objective: Objective,
    /// Ammo the next player shot will use
    pub ammo: AmmoKind,
    pub debug_mode: bool,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// New run starting at sector 1
    pub fn new(seed: u64) -> Self {
        Self::at_sector(seed, 1, 0)
    }

    /// New run resumed at `sector` with `score` carried over
    pub fn at_sector(seed: u64, sector: u32, score: u32) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            sector: sector.max(1),
            score,
            phase: GamePhase::Playing,
            time_ticks: 0,
            grid: Grid::new(0, 0),
            player: Player::new(Vec2::ZERO),
            actors: ActorArena::new(),
            slugs: Vec::new(),
            items: Vec::new(),
            echoes: Vec::new(),
            exit: Exit {
                rect: Rect::default(),
                unlocked: false,
            },
            objective: Objective::NeutralizeCores,
            ammo: AmmoKind::Standard,
            debug_mode: false,
            events: Vec::new(),
        };
        state.build_sector();
        state
    }

    /// Throw away the current sector and build a fresh one for `self.sector`
    pub fn build_sector(&mut self) {
        self.actors.clear();
        self.slugs.clear();
        self.items.clear();
        self.echoes.clear();

        self.grid = Grid::generate(&mut self.rng);
        let start = self.grid.find_open_space(&mut self.rng, 24.0, 24.0);
        self.player = Player::new(start);

        let sector = self.sector;
        for _ in 0..5 + 2 * sector {
            let pos = self.grid.find_open_space(&mut self.rng, 28.0, 28.0);
            self.actors.insert(Actor::standard(pos));
        }
        if sector % 2 == 0 {
            for _ in 0..2 + sector / 2 {
                let pos = self.grid.find_open_space(&mut self.rng, 20.0, 20.0);
                let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
                self.actors.insert(Actor::seeker(pos, angle));
            }
        }
        if sector >= 3 {
            for _ in 0..sector / 3 {
                let pos = self.grid.find_open_space(&mut self.rng, 52.0, 52.0);
                self.actors.insert(Actor::guardian(pos));
            }
        }
        if sector >= 2 {
            for _ in 0..(sector + 1) / 3 {
                let pos = self.grid.find_open_space(&mut self.rng, 24.0, 24.0);
                self.actors.insert(Actor::repair(pos));
            }
        }
        if sector % 5 == 0 {
            let pos = self.grid.find_open_space(&mut self.rng, 80.0, 80.0);
            self.actors.insert(Actor::boss(pos));
            self.events.push(GameEvent::BossDetected { pos });
        }

        for _ in 0..ITEMS_PER_SECTOR {
            let pos = self.grid.find_open_space(&mut self.rng, ITEM_SIZE, ITEM_SIZE);
            let kind = if self.rng.random_range(0..100) < BATTERY_CHANCE {
                ItemKind::BatteryPack
            } else {
                ItemKind::RepairKit
            };
            self.items.push(Item {
                kind,
                rect: Rect::from_origin(pos, Vec2::splat(ITEM_SIZE)),
                active: true,
            });
        }

        let exit_pos = self.grid.find_open_space(&mut self.rng, EXIT_SIZE, EXIT_SIZE);
        self.exit = Exit {
            rect: Rect::from_origin(exit_pos, Vec2::splat(EXIT_SIZE)),
            unlocked: false,
        };
        self.objective = Objective::NeutralizeCores;
        self.phase = GamePhase::Playing;

        log::info!(
            "Sector {} online: {} actors, {} items",
            self.sector,
            self.actors.len(),
            self.items.len()
        );
        self.events.push(GameEvent::SectorStarted { sector });
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Unlock the exit once every actor is sanitized
    pub fn update_objective(&mut self) {
        let all_clear = self
            .actors
            .actors()
            .all(|a| a.lifecycle == Lifecycle::Sanitized);
        if all_clear {
            if !self.exit.unlocked {
                self.exit.unlocked = true;
                self.events.push(GameEvent::ExitUnlocked);
            }
            self.objective = Objective::ReachExit;
        } else {
            self.objective = Objective::NeutralizeCores;
        }
    }

    /// Threat assessment for the ambient bed
    pub fn threat(&self) -> ThreatLevel {
        let player = self.player.center();
        let mut battle = false;
        for actor in self.actors.actors().filter(|a| a.is_hostile()) {
            if actor.is_boss() {
                return ThreatLevel::Boss;
            }
            if actor.body.center().distance(player) < super::ai::AGGRO_RADIUS {
                battle = true;
            }
        }
        if battle {
            ThreatLevel::Battle
        } else {
            ThreatLevel::Standard
        }
    }

    /// Count of actors not yet sanitized
    pub fn remaining_cores(&self) -> usize {
        self.actors
            .actors()
            .filter(|a| a.lifecycle != Lifecycle::Sanitized)
            .count()
    }

    /// Read-only view for rendering and HUD collaborators
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sector: self.sector,
            score: self.score,
            phase: self.phase,
            time_ticks: self.time_ticks,
            objective: self.objective.description(),
            exit_unlocked: self.exit.unlocked,
            ammo: self.ammo,
            player: PlayerView {
                pos: self.player.body.pos,
                facing: self.player.body.facing,
                integrity: self.player.integrity,
                energy: self.player.energy,
                reflex: self.player.reflex,
                reflex_active: self.player.reflex_active,
                shield: self.player.shield,
                loaded: self.player.loaded,
                reserve: self.player.reserve,
            },
            actors: self
                .actors
                .actors()
                .map(|a| ActorView {
                    kind: a.kind.label(),
                    pos: a.body.pos,
                    size: a.body.size(),
                    stability: a.stability,
                    lifecycle: a.lifecycle,
                    shield: match a.kind {
                        ActorKind::Guardian { shield, .. } => Some(shield),
                        _ => None,
                    },
                })
                .collect(),
            slugs: self
                .slugs
                .iter()
                .map(|s| SlugView {
                    pos: s.body.pos,
                    vel: s.body.vel,
                    bounces: s.bounces,
                    power: s.power,
                    player_owned: s.player_owned,
                    ammo: s.ammo,
                })
                .collect(),
            items: self.items.clone(),
            echoes: self.echoes.iter().map(|e| e.body.pos).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub pos: Vec2,
    pub facing: f32,
    pub integrity: f32,
    pub energy: f32,
    pub reflex: f32,
    pub reflex_active: bool,
    pub shield: f32,
    pub loaded: u32,
    pub reserve: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActorView {
    pub kind: &'static str,
    pub pos: Vec2,
    pub size: Vec2,
    pub stability: f32,
    pub lifecycle: Lifecycle,
    pub shield: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlugView {
    pub pos: Vec2,
    pub vel: Vec2,
    pub bounces: i32,
    pub power: f32,
    pub player_owned: bool,
    pub ammo: AmmoKind,
}

/// Serializable read-only state
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub sector: u32,
    pub score: u32,
    pub phase: GamePhase,
    pub time_ticks: u64,
    pub objective: &'static str,
    pub exit_unlocked: bool,
    pub ammo: AmmoKind,
    pub player: PlayerView,
    pub actors: Vec<ActorView>,
    pub slugs: Vec<SlugView>,
    pub items: Vec<Item>,
    pub echoes: Vec<Vec2>,
}
