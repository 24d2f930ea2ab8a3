//! Procedural audio engine
//!
//! Every sound is synthesized at runtime; there are no sample assets.
//! The simulation thread calls `play` / `set_ambient_mood`, the output thread
//! renders. Both sides share one `Mixer` behind a single mutex. Failures
//! (poisoned lock, no output thread) degrade to silence and never reach the
//! caller.

pub mod cues;
pub mod device;
pub mod mixer;
pub mod voice;

use std::sync::{Arc, Mutex};

use glam::Vec2;

pub use cues::{Cue, cue_for, mood_for};
pub use device::OutputThread;
pub use mixer::{AmbientMood, Mixer, VOICE_COUNT};
pub use voice::SoundKind;

use crate::Settings;
use crate::sim::GameEvent;

/// Audio engine front end
pub struct AudioEngine {
    mixer: Arc<Mutex<Mixer>>,
    output: Option<OutputThread>,
    master_volume: f32,
    sfx_volume: f32,
    ambient_volume: f32,
    muted: bool,
}

impl AudioEngine {
    /// Build the mixer and, when enabled, start the output thread
    pub fn new(settings: &Settings) -> Self {
        let mixer = Arc::new(Mutex::new(Mixer::new(settings.sample_rate)));
        let output = if settings.audio_enabled {
            match OutputThread::spawn(Arc::clone(&mixer), settings.buffer_frames) {
                Ok(output) => Some(output),
                Err(e) => {
                    log::warn!("Failed to start audio output - audio disabled: {e}");
                    None
                }
            }
        } else {
            log::info!("Audio output disabled");
            None
        };

        let mut engine = Self {
            mixer,
            output,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.sfx_volume.clamp(0.0, 1.0),
            ambient_volume: settings.ambient_volume.clamp(0.0, 1.0),
            muted: settings.muted,
        };
        engine.apply_gains();
        engine
    }

    /// Whether an output thread is pulling samples
    pub fn is_running(&self) -> bool {
        self.output.as_ref().is_some_and(OutputThread::is_running)
    }

    pub fn frames_rendered(&self) -> u64 {
        self.output.as_ref().map_or(0, OutputThread::frames_rendered)
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
        self.apply_gains();
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
        self.apply_gains();
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_gains();
    }

    /// Get effective volume
    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    fn effective_ambient(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.ambient_volume
        }
    }

    fn apply_gains(&mut self) {
        let (sfx, ambient) = (self.effective_volume(), self.effective_ambient());
        self.with_mixer(|m| m.set_gains(sfx, ambient));
    }

    fn with_mixer(&self, f: impl FnOnce(&mut Mixer)) {
        match self.mixer.lock() {
            Ok(mut mixer) => f(&mut mixer),
            Err(_) => log::warn!("audio mixer poisoned, dropping request"),
        }
    }

    /// Request a sound; silently dropped when the voice pool is full
    pub fn play(&self, kind: SoundKind, volume: f32, freq: f32, pan: f32) {
        self.with_mixer(|m| {
            m.play(kind, volume, freq, pan);
        });
    }

    pub fn set_ambient_mood(&self, mood: AmbientMood) {
        self.with_mixer(|m| m.set_ambient_mood(mood));
    }

    /// Play the cue for a game event heard from `listener`
    pub fn play_event(&self, event: &GameEvent, listener: Vec2) {
        if let Some(cue) = cue_for(event, listener) {
            self.play(cue.kind, cue.volume, cue.freq, cue.pan);
        }
    }

    /// Pull samples directly (used when no output thread is running)
    pub fn render(&self, out: &mut [f32]) {
        match self.mixer.lock() {
            Ok(mut mixer) => mixer.render(out),
            Err(_) => out.fill(0.0),
        }
    }

    pub fn active_voices(&self) -> usize {
        self.mixer.lock().map_or(0, |m| m.active_voices())
    }

    /// Stop the output thread
    pub fn shutdown(&mut self) {
        if let Some(mut output) = self.output.take() {
            output.stop();
            log::info!("Audio stopped after {} frames", output.frames_rendered());
        }
    }
}
