//! Game settings and preferences
//!
//! Persisted as JSON, separately from the binary save record.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::RecoilResult;

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Ambient bed volume (0.0 - 1.0)
    pub ambient_volume: f32,
    pub muted: bool,
    /// Start the audio output thread
    pub audio_enabled: bool,
    /// Output sample rate (Hz)
    pub sample_rate: u32,
    /// Stereo frames per output callback
    pub buffer_frames: usize,

    // === Progress ===
    /// Location of the binary save record
    pub save_path: PathBuf,
    /// Resume from the save record on startup
    pub resume: bool,

    // === Gameplay ===
    /// Start with debug mode enabled
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            ambient_volume: 1.0,
            muted: false,
            audio_enabled: true,
            sample_rate: 44_100,
            buffer_frames: 1024,

            save_path: PathBuf::from("recoil_save.bin"),
            resume: true,

            debug_mode: false,
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Using default settings ({}: {e})", path.display());
                Self::default()
            }
        }
    }

    /// Like `load`, but writes the defaults out when no file exists yet so
    /// there is something to edit
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            return Self::load(path);
        }
        let settings = Self::default();
        match settings.save(path) {
            Ok(()) => log::info!("Wrote default settings to {}", path.display()),
            Err(e) => log::warn!("Could not write default settings to {}: {e}", path.display()),
        }
        settings
    }

    fn read(path: &Path) -> RecoilResult<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> RecoilResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
