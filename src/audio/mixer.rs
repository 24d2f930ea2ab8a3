//! Stereo mixer: voice pool, ambient bed, delay line and clipping
//!
//! `render` is the device callback body. It never allocates; the only
//! buffer it touches (the delay line) is sized at construction.

use std::f32::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::voice::{SoundKind, Voice, pan_gains};

/// Fixed voice pool capacity
pub const VOICE_COUNT: usize = 32;

/// Per-frame approach rate of the ambient frequency toward its target
const AMBIENT_SMOOTHING: f32 = 0.0001;
/// Fixed ambient bed level
const AMBIENT_LEVEL: f32 = 0.04;
/// Amplitude-modulator rate (Hz)
const AMBIENT_LFO_HZ: f32 = 0.15;
/// Phase accumulators wrap after this many cycles
const PHASE_WRAP: f32 = TAU * 100.0;

const DELAY_SECONDS: f32 = 0.2;
const DELAY_TAP_LEFT: f32 = 0.30;
const DELAY_TAP_RIGHT: f32 = 0.35;
const DELAY_FEEDBACK: f32 = 0.4;
/// Feedback is clamped below unity; at 1 the line diverges
const MAX_FEEDBACK: f32 = 0.95;

/// Background mood, selects the ambient target pitch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbientMood {
    #[default]
    Standard,
    Battle,
    Boss,
}

impl AmbientMood {
    pub fn target_hz(self) -> f32 {
        match self {
            AmbientMood::Standard => 55.0,
            AmbientMood::Battle => 82.0,
            AmbientMood::Boss => 41.0,
        }
    }
}

/// Always-on drone: fundamental, two near-unison partials, a slow amplitude
/// modulator and a noise wind layer.
#[derive(Debug, Clone)]
pub struct AmbientBed {
    freq: f32,
    target: f32,
    phase: f32,
    lfo_phase: f32,
}

impl AmbientBed {
    pub fn new(mood: AmbientMood) -> Self {
        Self {
            freq: mood.target_hz(),
            target: mood.target_hz(),
            phase: 0.0,
            lfo_phase: 0.0,
        }
    }

    pub fn set_mood(&mut self, mood: AmbientMood) {
        self.target = mood.target_hz();
    }

    /// Current (smoothed) fundamental
    pub fn freq(&self) -> f32 {
        self.freq
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// One mono sample, already at ambient level
    pub fn sample(&mut self, dt: f32, noise: f32) -> f32 {
        self.freq += (self.target - self.freq) * AMBIENT_SMOOTHING;

        let p = self.phase;
        let layers = p.sin() + (p * 0.501).sin() * 0.8 + (p * 2.002).sin() * 0.3;
        let swell = 0.5 + 0.5 * self.lfo_phase.sin();
        let wind = noise * (0.2 + 0.3 * (self.lfo_phase * 0.5).sin());
        let value = layers * swell + wind * 0.2;

        self.phase += TAU * self.freq * dt;
        self.lfo_phase += TAU * AMBIENT_LFO_HZ * dt;
        if self.phase > PHASE_WRAP {
            self.phase -= PHASE_WRAP;
        }
        if self.lfo_phase > PHASE_WRAP {
            self.lfo_phase -= PHASE_WRAP;
        }

        value * AMBIENT_LEVEL
    }
}

/// Single-tap feedback delay shared by both channels
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    cursor: usize,
    feedback: f32,
}

impl DelayLine {
    pub fn new(len: usize, feedback: f32) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            cursor: 0,
            feedback: feedback.clamp(0.0, MAX_FEEDBACK),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Mix the delayed signal into a frame and write the frame back
    pub fn process(&mut self, left: f32, right: f32) -> (f32, f32) {
        let delayed = self.buffer[self.cursor];
        let left = left + delayed * DELAY_TAP_LEFT;
        let right = right + delayed * DELAY_TAP_RIGHT;
        self.buffer[self.cursor] = (left + right) * 0.5 * self.feedback;
        self.cursor = (self.cursor + 1) % self.buffer.len();
        (left, right)
    }
}

/// Everything the audio callback needs, behind one lock
pub struct Mixer {
    voices: [Voice; VOICE_COUNT],
    ambient: AmbientBed,
    delay: DelayLine,
    rng: Pcg32,
    sample_rate: u32,
    dt: f32,
    sfx_gain: f32,
    ambient_gain: f32,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let delay_len = (sample_rate as f32 * DELAY_SECONDS) as usize;
        Self {
            voices: [Voice::default(); VOICE_COUNT],
            ambient: AmbientBed::new(AmbientMood::Standard),
            delay: DelayLine::new(delay_len, DELAY_FEEDBACK),
            rng: Pcg32::seed_from_u64(u64::from(sample_rate)),
            sample_rate,
            dt: 1.0 / sample_rate as f32,
            sfx_gain: 1.0,
            ambient_gain: 1.0,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Start a voice in the first free slot.
    ///
    /// Returns false (and changes nothing) when every slot is busy.
    pub fn play(&mut self, kind: SoundKind, volume: f32, freq: f32, pan: f32) -> bool {
        let Some(voice) = self.voices.iter_mut().find(|v| !v.active) else {
            log::trace!("voice pool full, dropping {kind:?}");
            return false;
        };
        voice.start(kind, volume.clamp(0.0, 1.0), freq.max(0.0), pan.clamp(-1.0, 1.0));
        true
    }

    pub fn set_ambient_mood(&mut self, mood: AmbientMood) {
        self.ambient.set_mood(mood);
    }

    pub fn set_gains(&mut self, sfx: f32, ambient: f32) {
        self.sfx_gain = sfx.clamp(0.0, 1.0);
        self.ambient_gain = ambient.clamp(0.0, 1.0);
    }

    pub fn ambient(&self) -> &AmbientBed {
        &self.ambient
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    /// Fill an interleaved stereo buffer (L, R, L, R, ...).
    ///
    /// A trailing half frame is written as silence.
    pub fn render(&mut self, out: &mut [f32]) {
        let mut frames = out.chunks_exact_mut(2);
        for frame in frames.by_ref() {
            let (left, right) = self.next_frame();
            frame[0] = left;
            frame[1] = right;
        }
        frames.into_remainder().fill(0.0);
    }

    fn next_frame(&mut self) -> (f32, f32) {
        let dt = self.dt;
        let noise = self.rng.random_range(-1.0f32..=1.0);
        let mono = self.ambient.sample(dt, noise) * self.ambient_gain;

        let mut left = 0.0;
        let mut right = 0.0;
        for voice in self.voices.iter_mut() {
            if let Some(sample) = voice.render(dt, &mut self.rng) {
                let (gl, gr) = pan_gains(voice.pan);
                left += sample * gl;
                right += sample * gr;
            }
        }
        left *= self.sfx_gain;
        right *= self.sfx_gain;

        let (left, right) = self.delay.process(mono + left, mono + right);
        (left.clamp(-1.0, 1.0), right.clamp(-1.0, 1.0))
    }
}
