//! Sound voices: one slot of the mixer's pool
//!
//! Every kind is a closed-form generator over the voice's progress
//! `t = elapsed / duration`, its phase accumulators and white noise.

use std::f32::consts::TAU;

use rand::Rng;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// Kinetic slug discharge
    Shoot,
    Step,
    Dash,
    Reload,
    /// Impact thud with crunch
    Hit,
    Pickup,
    /// Capture chime
    Sanitize,
    /// Gated square alarm
    Alert,
    Ricochet,
    /// Dry-fire click
    Empty,
    BossPhase,
    UiClick,
    UiConfirm,
    EmpShot,
    PierceShot,
    ShieldDown,
    /// Gated warning beep
    LowEnergy,
}

impl SoundKind {
    /// Fixed voice lifetime in seconds
    pub fn duration(self) -> f32 {
        match self {
            SoundKind::Shoot => 0.3,
            SoundKind::Step => 0.12,
            SoundKind::Dash => 0.4,
            SoundKind::Reload => 0.25,
            SoundKind::Hit => 0.35,
            SoundKind::Pickup => 0.4,
            SoundKind::Sanitize => 0.8,
            SoundKind::Alert => 0.15,
            SoundKind::Ricochet => 0.1,
            SoundKind::Empty => 0.08,
            SoundKind::BossPhase => 1.2,
            SoundKind::UiClick => 0.05,
            SoundKind::UiConfirm => 0.3,
            SoundKind::EmpShot => 0.4,
            SoundKind::PierceShot => 0.5,
            SoundKind::ShieldDown => 0.6,
            SoundKind::LowEnergy => 0.2,
        }
    }
}

#[inline]
fn square(phase: f32, level: f32) -> f32 {
    if phase.sin() > 0.0 { level } else { -level }
}

#[inline]
fn gate(phase: f32) -> f32 {
    if phase.sin() > 0.0 { 1.0 } else { 0.0 }
}

/// One pool slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    pub kind: SoundKind,
    pub active: bool,
    /// Main oscillator phase (radians)
    pub phase: f32,
    /// Secondary phase: gating / pulse LFO
    pub phase2: f32,
    pub elapsed: f32,
    pub duration: f32,
    pub volume: f32,
    pub freq: f32,
    /// -1 (left) to 1 (right)
    pub pan: f32,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            kind: SoundKind::UiClick,
            active: false,
            phase: 0.0,
            phase2: 0.0,
            elapsed: 0.0,
            duration: 0.0,
            volume: 0.0,
            freq: 0.0,
            pan: 0.0,
        }
    }
}

impl Voice {
    /// (Re)start this slot
    pub fn start(&mut self, kind: SoundKind, volume: f32, freq: f32, pan: f32) {
        *self = Self {
            kind,
            active: true,
            phase: 0.0,
            phase2: 0.0,
            elapsed: 0.0,
            duration: kind.duration(),
            volume,
            freq,
            pan,
        };
    }

    /// Produce one mono sample and advance by `dt`.
    ///
    /// A voice whose elapsed time has reached its duration deactivates here
    /// and yields `None`.
    pub fn render<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Option<f32> {
        if !self.active {
            return None;
        }
        let t = self.elapsed / self.duration;
        if t >= 1.0 {
            self.active = false;
            return None;
        }

        let mut noise = || rng.random_range(-1.0f32..=1.0);
        let f = self.freq;
        let p = self.phase;
        let env = (-t * 5.0).exp() * (1.0 - t);
        // Main oscillator rate in Hz, and the optional LFO rate
        let (val, rate, lfo) = match self.kind {
            SoundKind::Shoot => {
                let transient = noise() * (-t * 100.0).exp();
                let body = square(p, 0.8) * (-t * 10.0).exp();
                let tail = noise() * (-t * 4.0).exp() * 0.4;
                (
                    transient * 0.5 + body * 0.6 + tail * 0.3,
                    f * (-t * 15.0).exp(),
                    0.0,
                )
            }
            SoundKind::Step => {
                let thud = p.sin() * (-t * 20.0).exp();
                let scuff = noise() * (-t * 30.0).exp() * 0.5;
                (thud + scuff, 80.0, 0.0)
            }
            SoundKind::Dash => {
                let sweep = (-t * 3.0).exp();
                (noise() * sweep * p.sin(), 200.0 + 1000.0 * (1.0 - t), 0.0)
            }
            SoundKind::Reload => {
                // 15 ms clicks every 60 ms
                let click = if self.elapsed % 0.06 < 0.015 { square(p, 1.0) } else { 0.0 };
                (click * env, 1200.0, 0.0)
            }
            SoundKind::Hit => {
                let crunch = noise() * (-t * 20.0).exp();
                let impact = p.sin() * (-t * 10.0).exp();
                (crunch * 0.7 + impact * 0.5, f, 0.0)
            }
            SoundKind::Pickup => {
                let harmonic = p.sin() + 0.5 * (p * 2.01).sin() + 0.25 * (p * 3.02).sin();
                (harmonic * env, f * (1.0 + t), 0.0)
            }
            SoundKind::Sanitize => {
                let pulse = self.phase2.sin();
                let tone = p.sin() * (0.5 + 0.5 * pulse);
                (tone * (1.0 - t), f - 200.0 * t, 10.0)
            }
            SoundKind::Alert => (square(p, 0.5) * gate(self.phase2), f, 15.0),
            SoundKind::Ricochet => {
                let ping = p.sin() * (-t * 25.0).exp();
                let hiss = noise() * (-t * 40.0).exp();
                (ping * 0.6 + hiss * 0.4, f + 1000.0 * t, 0.0)
            }
            SoundKind::Empty => (square(p, 1.0) * (-t * 50.0).exp(), 150.0, 0.0),
            SoundKind::BossPhase => {
                let sub = p.sin() * (1.0 - t);
                let texture = noise() * 0.2 * (p * 0.1).sin();
                (sub + texture, 60.0 + 100.0 * t, 0.0)
            }
            SoundKind::UiClick => (noise() * (-t * 80.0).exp(), 0.0, 0.0),
            SoundKind::UiConfirm => {
                let step = if t < 0.5 { 1.0 } else { 1.5 };
                let tone = p.sin() + (p * 2.0).sin() * 0.5 + (p * 3.0).sin() * 0.25;
                (tone * env, f * step, 0.0)
            }
            SoundKind::EmpShot => {
                let buzz = p.sin() * (p * 1.05).sin() * (1.0 - t);
                let crackle = noise() * 0.3 * (1.0 - t);
                (buzz + crackle, f + (t * 50.0).sin() * 100.0, 0.0)
            }
            SoundKind::PierceShot => {
                let whistle = p.sin() * (-t * 2.0).exp();
                let heavy = square(p * 0.5, 1.0) * (-t * 10.0).exp();
                (whistle * 0.4 + heavy * 0.7, f * (-t * 5.0).exp(), 0.0)
            }
            SoundKind::ShieldDown => {
                let val = p.sin() * (p * 0.5).sin() * (1.0 - t);
                (val, f - 400.0 * t, 0.0)
            }
            SoundKind::LowEnergy => (p.sin() * gate(self.phase2), 1500.0, 10.0),
        };

        self.phase += TAU * rate * dt;
        self.phase2 += TAU * lfo * dt;
        self.elapsed += dt;
        Some(val * self.volume)
    }
}

/// Linear pan law: the near channel passes at unity, the far channel fades
/// to silence only at full pan.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    ((1.0 - pan).min(1.0), (1.0 + pan).min(1.0))
}
