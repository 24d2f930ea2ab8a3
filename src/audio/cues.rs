//! Game event to sound cue mapping

use glam::Vec2;

use super::mixer::AmbientMood;
use super::voice::SoundKind;
use crate::sim::{AmmoKind, GameEvent, ItemKind, ThreatLevel};

/// Horizontal distance that maps to a hard pan
const PAN_WIDTH: f32 = 400.0;

/// Arguments for one `play` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cue {
    pub kind: SoundKind,
    pub volume: f32,
    pub freq: f32,
    pub pan: f32,
}

impl Cue {
    fn new(kind: SoundKind, volume: f32, freq: f32) -> Self {
        Self {
            kind,
            volume,
            freq,
            pan: 0.0,
        }
    }

    fn at(mut self, pos: Vec2, listener: Vec2) -> Self {
        self.pan = pan_for(pos, listener);
        self
    }
}

/// Stereo position of a world point relative to the listener
pub fn pan_for(pos: Vec2, listener: Vec2) -> f32 {
    ((pos.x - listener.x) / PAN_WIDTH).clamp(-1.0, 1.0)
}

/// Sound for a simulation event, if it has one
pub fn cue_for(event: &GameEvent, listener: Vec2) -> Option<Cue> {
    use SoundKind as S;

    let cue = match *event {
        GameEvent::PlayerFired { ammo, .. } => match ammo {
            AmmoKind::Standard => Cue::new(S::Shoot, 0.5, 180.0),
            AmmoKind::Emp => Cue::new(S::EmpShot, 0.5, 400.0),
            AmmoKind::Piercing => Cue::new(S::PierceShot, 0.5, 300.0),
        },
        GameEvent::EnemyFired { pos } => Cue::new(S::Shoot, 0.15, 120.0).at(pos, listener),
        GameEvent::EmptyClick => Cue::new(S::Empty, 0.4, 150.0),
        GameEvent::Reloaded { .. } => Cue::new(S::Reload, 0.4, 1200.0),
        GameEvent::Dashed => Cue::new(S::Dash, 0.4, 200.0),
        GameEvent::Footstep => Cue::new(S::Step, 0.15, 80.0),
        GameEvent::ReflexToggled { active } => {
            Cue::new(S::UiConfirm, 0.3, if active { 330.0 } else { 220.0 })
        }
        GameEvent::Shockwave { .. } => Cue::new(S::ShieldDown, 0.6, 900.0),
        GameEvent::AmmoSelected { .. } | GameEvent::DebugToggled { .. } => {
            Cue::new(S::UiClick, 0.3, 1000.0)
        }
        GameEvent::LowEnergy => Cue::new(S::LowEnergy, 0.3, 1500.0),
        GameEvent::Ricochet { pos } => Cue::new(S::Ricochet, 0.25, 1800.0).at(pos, listener),
        GameEvent::ActorHit { pos } => Cue::new(S::Hit, 0.4, 220.0).at(pos, listener),
        GameEvent::ShieldHit { pos } => Cue::new(S::Hit, 0.3, 660.0).at(pos, listener),
        GameEvent::ShieldDown { pos } => Cue::new(S::ShieldDown, 0.6, 800.0).at(pos, listener),
        GameEvent::ActorContained { pos, .. } => Cue::new(S::Alert, 0.3, 880.0).at(pos, listener),
        GameEvent::ActorSanitized { pos, .. } => {
            Cue::new(S::Sanitize, 0.5, 660.0).at(pos, listener)
        }
        GameEvent::BossDetected { pos } => Cue::new(S::Alert, 0.5, 440.0).at(pos, listener),
        GameEvent::BossPhaseShift { pos } => Cue::new(S::BossPhase, 0.8, 60.0).at(pos, listener),
        GameEvent::PlayerDamaged { .. } => Cue::new(S::Hit, 0.6, 110.0),
        GameEvent::ItemCollected { kind, pos } => {
            let freq = match kind {
                ItemKind::RepairKit => 520.0,
                ItemKind::BatteryPack => 660.0,
            };
            Cue::new(S::Pickup, 0.4, freq).at(pos, listener)
        }
        GameEvent::ExitUnlocked => Cue::new(S::UiConfirm, 0.5, 440.0),
        GameEvent::SectorCleared { .. } => Cue::new(S::UiConfirm, 0.6, 523.0),
        GameEvent::SectorStarted { .. } => Cue::new(S::UiConfirm, 0.4, 330.0),
        GameEvent::GameOver { .. } => Cue::new(S::BossPhase, 0.7, 40.0),
    };
    Some(cue)
}

/// Ambient mood for the current threat level
pub fn mood_for(threat: ThreatLevel) -> AmbientMood {
    match threat {
        ThreatLevel::Standard => AmbientMood::Standard,
        ThreatLevel::Battle => AmbientMood::Battle,
        ThreatLevel::Boss => AmbientMood::Boss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_follows_horizontal_offset() {
        let me = Vec2::new(500.0, 500.0);
        assert_eq!(pan_for(Vec2::new(500.0, 100.0), me), 0.0);
        assert_eq!(pan_for(Vec2::new(700.0, 500.0), me), 0.5);
        assert_eq!(pan_for(Vec2::new(-500.0, 500.0), me), -1.0);
        assert_eq!(pan_for(Vec2::new(5000.0, 0.0), me), 1.0);
    }

    #[test]
    fn test_ammo_selects_shot_sound() {
        let fired = |ammo| GameEvent::PlayerFired {
            pos: Vec2::ZERO,
            ammo,
        };
        let kind = |ammo| cue_for(&fired(ammo), Vec2::ZERO).map(|c| c.kind);
        assert_eq!(kind(AmmoKind::Standard), Some(SoundKind::Shoot));
        assert_eq!(kind(AmmoKind::Emp), Some(SoundKind::EmpShot));
        assert_eq!(kind(AmmoKind::Piercing), Some(SoundKind::PierceShot));
    }

    #[test]
    fn test_spatial_cue_is_panned() {
        let event = GameEvent::ActorSanitized {
            pos: Vec2::new(100.0, 0.0),
            kind: "core",
        };
        let cue = cue_for(&event, Vec2::new(300.0, 0.0)).expect("sanitize has a cue");
        assert_eq!(cue.kind, SoundKind::Sanitize);
        assert_eq!(cue.pan, -0.5);
    }

    #[test]
    fn test_cue_arguments_in_range() {
        let events = [
            GameEvent::Footstep,
            GameEvent::Dashed,
            GameEvent::LowEnergy,
            GameEvent::GameOver {
                sector: 3,
                score: 900,
            },
            GameEvent::BossPhaseShift {
                pos: Vec2::new(-9000.0, 0.0),
            },
        ];
        for event in &events {
            let cue = cue_for(event, Vec2::ZERO).expect("cue");
            assert!((0.0..=1.0).contains(&cue.volume));
            assert!(cue.freq > 0.0);
            assert!((-1.0..=1.0).contains(&cue.pan));
        }
    }

    #[test]
    fn test_mood_mapping() {
        assert_eq!(mood_for(ThreatLevel::Boss), AmbientMood::Boss);
        assert_eq!(mood_for(ThreatLevel::Battle).target_hz(), 82.0);
    }
}
