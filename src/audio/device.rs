//! Headless output device
//!
//! A render thread that pulls interleaved stereo buffers from the mixer at
//! the cadence a sound card would, then discards them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::mixer::Mixer;
use crate::RecoilResult;

pub struct OutputThread {
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl OutputThread {
    /// Start pulling `buffer_frames` frames per callback
    pub fn spawn(mixer: Arc<Mutex<Mixer>>, buffer_frames: usize) -> RecoilResult<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let frames = Arc::new(AtomicU64::new(0));
        let buffer_frames = buffer_frames.max(1);

        let sample_rate = match mixer.lock() {
            Ok(guard) => guard.sample_rate(),
            Err(_) => {
                log::warn!("audio mixer poisoned before start");
                running.store(false, Ordering::Relaxed);
                return Ok(Self {
                    running,
                    frames,
                    handle: None,
                });
            }
        };
        let period = Duration::from_secs_f64(buffer_frames as f64 / f64::from(sample_rate));

        let flag = Arc::clone(&running);
        let counter = Arc::clone(&frames);
        let handle = thread::Builder::new()
            .name("audio-render".into())
            .spawn(move || {
                let mut buffer = vec![0.0f32; buffer_frames * 2];
                while flag.load(Ordering::Relaxed) {
                    match mixer.lock() {
                        Ok(mut guard) => guard.render(&mut buffer),
                        Err(_) => {
                            log::warn!("audio mixer poisoned, output stopped");
                            flag.store(false, Ordering::Relaxed);
                            break;
                        }
                    }
                    counter.fetch_add(buffer_frames as u64, Ordering::Relaxed);
                    thread::sleep(period);
                }
                log::debug!("audio render thread exiting");
            })?;

        log::info!("Audio output: {sample_rate} Hz, {buffer_frames} frames per buffer");
        Ok(Self {
            running,
            frames,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stereo frames handed to the "device" so far
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Signal the thread and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::warn!("audio render thread panicked");
        }
    }
}

impl Drop for OutputThread {
    fn drop(&mut self) {
        self.stop();
    }
}
