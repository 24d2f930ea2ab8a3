//! Recoil Protocol entry point
//!
//! Runs the headless frame loop: autopilot input, fixed 60 Hz ticks with
//! frame-delay pacing, event forwarding to the log and the audio engine, and
//! progress saves on sector completion.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::Parser;

use recoil_protocol::Settings;
use recoil_protocol::audio::{AudioEngine, mood_for};
use recoil_protocol::consts::{FRAME_DT, TARGET_FPS};
use recoil_protocol::persistence::{self, SaveRecord};
use recoil_protocol::sim::{GameEvent, GamePhase, GameState, TickInput, tick};

#[derive(Parser, Debug)]
#[command(name = "recoil-protocol", about = "Top-down tile-grid action game (headless)")]
struct Args {
    /// Settings file (JSON)
    #[arg(short, long, default_value = "recoil_settings.json")]
    config: PathBuf,

    /// Run seed (defaults to the clock)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop after this many frames (runs until game over otherwise)
    #[arg(short, long)]
    frames: Option<u64>,

    /// Do not start the audio output thread
    #[arg(long)]
    no_audio: bool,

    /// Do not sleep between frames
    #[arg(long)]
    unpaced: bool,

    /// Ignore any save record
    #[arg(long)]
    fresh: bool,

    /// Write a JSON snapshot of the final state here
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

/// Game instance holding all state
struct Game {
    state: GameState,
    input: TickInput,
    audio: AudioEngine,
    save_path: PathBuf,
    frames: u64,
    last_phase: GamePhase,
}

impl Game {
    fn new(state: GameState, audio: AudioEngine, save_path: PathBuf) -> Self {
        Self {
            last_phase: state.phase,
            state,
            input: TickInput {
                autopilot: true,
                ..Default::default()
            },
            audio,
            save_path,
            frames: 0,
        }
    }

    /// One frame: simulate, then forward what happened
    fn update(&mut self) {
        tick(&mut self.state, &self.input, FRAME_DT);
        self.frames += 1;

        let listener = self.state.player.center();
        for event in self.state.drain_events() {
            log_event(&event);
            self.audio.play_event(&event, listener);
            if let Some(record) = SaveRecord::after_clear(&event) {
                self.save_game(&record);
            }
        }
        self.audio.set_ambient_mood(mood_for(self.state.threat()));

        if self.state.phase != self.last_phase {
            log::debug!("Phase {:?} -> {:?}", self.last_phase, self.state.phase);
            self.last_phase = self.state.phase;
        }
    }

    fn save_game(&self, record: &SaveRecord) {
        if let Err(e) = persistence::save(&self.save_path, record) {
            log::warn!("Failed to save progress: {e}");
        }
    }
}

/// HUD log substitute
fn log_event(event: &GameEvent) {
    match event {
        GameEvent::BossDetected { .. } => log::warn!("WARNING: Massive signal detected"),
        GameEvent::BossPhaseShift { .. } => log::warn!("Boss core destabilizing: phase 2"),
        GameEvent::ActorContained { kind, .. } => log::info!("{kind} contained"),
        GameEvent::ActorSanitized { kind, .. } => log::info!("{kind} sanitized"),
        GameEvent::ShieldDown { .. } => log::info!("Guardian shield collapsed"),
        GameEvent::PlayerDamaged { amount } => log::debug!("Integrity -{amount:.0}"),
        GameEvent::ItemCollected { kind, .. } => log::info!("Collected {kind:?}"),
        GameEvent::ReflexToggled { active } => {
            log::info!("Reflex {}", if *active { "engaged" } else { "released" })
        }
        GameEvent::ExitUnlocked => log::info!("All cores neutralized, extraction open"),
        GameEvent::GameOver { sector, score } => {
            log::warn!("Signal lost in sector {sector}, final score {score}")
        }
        other => log::trace!("{other:?}"),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

/// Resume from the save record when allowed, otherwise start at sector 1
fn initial_state(seed: u64, settings: &Settings, fresh: bool) -> GameState {
    if fresh || !settings.resume {
        return GameState::new(seed);
    }
    match persistence::load(&settings.save_path) {
        Ok(record) => {
            log::info!(
                "Resuming at sector {} with score {}",
                record.sector(),
                record.score()
            );
            let mut state = GameState::at_sector(seed, record.sector(), record.score());
            if record.integrity.is_finite() && record.integrity > 0.0 {
                state.player.integrity = record.integrity.min(state.player.integrity);
            }
            state
        }
        Err(e) => {
            log::info!("No usable save ({e}), starting fresh");
            GameState::new(seed)
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Recoil Protocol starting...");

    let args = Args::parse();
    let mut settings = Settings::load_or_create(&args.config);
    if args.no_audio {
        settings.audio_enabled = false;
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    log::info!("Seed {seed}");

    let mut state = initial_state(seed, &settings, args.fresh);
    state.debug_mode = settings.debug_mode;
    let audio = AudioEngine::new(&settings);
    let mut game = Game::new(state, audio, settings.save_path.clone());

    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(TARGET_FPS));
    loop {
        let started = Instant::now();
        game.update();

        if args.frames.is_some_and(|limit| game.frames >= limit) {
            break;
        }
        // Without a frame limit a run ends at its first game over
        if args.frames.is_none() && game.state.phase == GamePhase::GameOver {
            break;
        }

        if !args.unpaced {
            let spent = started.elapsed();
            if spent < frame_budget {
                thread::sleep(frame_budget - spent);
            }
        }
    }

    log::info!(
        "Stopped after {} frames: sector {}, score {}, {} cores left",
        game.frames,
        game.state.sector,
        game.state.score,
        game.state.remaining_cores()
    );
    game.audio.shutdown();

    if let Some(path) = &args.snapshot {
        let json = serde_json::to_string_pretty(&game.state.snapshot())
            .context("serializing snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("writing snapshot to {}", path.display()))?;
        log::info!("Snapshot written to {}", path.display());
    }

    Ok(())
}
