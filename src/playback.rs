//! Replay of a finished result video.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::MediaError;
use crate::media::{VideoBackend, fit_within};
use crate::models::Frame;

/// Where replayed frames end up
pub trait FrameDisplay: Send {
    fn show(&mut self, frame: &Frame);

    /// Called once after the last frame
    fn clear(&mut self);
}

/// Plays a result artifact onto a rendering target
pub trait PlaybackDriver: Send + Sync {
    /// Blocks until the video ends; returns the number of frames shown
    fn play(&self, result_path: &Path, display: &mut dyn FrameDisplay) -> Result<u64, MediaError>;
}

/// Replays at a fixed target rate, scaling each frame for display
pub struct PacedPlayback {
    backend: Arc<dyn VideoBackend>,
    pub fps: f64,
    pub max_width: u32,
    pub max_height: u32,
}

impl PacedPlayback {
    pub fn new(backend: Arc<dyn VideoBackend>) -> Self {
        Self {
            backend,
            fps: 120.0,
            max_width: crate::pipeline::DEFAULT_DISPLAY_SIZE.0,
            max_height: crate::pipeline::DEFAULT_DISPLAY_SIZE.1,
        }
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_bounds(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    fn frame_interval(&self) -> Duration {
        if self.fps > 0.0 {
            Duration::from_secs_f64(1.0 / self.fps)
        } else {
            Duration::ZERO
        }
    }
}

impl PlaybackDriver for PacedPlayback {
    fn play(&self, result_path: &Path, display: &mut dyn FrameDisplay) -> Result<u64, MediaError> {
        let mut source = self.backend.open_source(result_path)?;
        let interval = self.frame_interval();
        let start = Instant::now();
        let mut shown = 0u64;

        while let Some(frame) = source.read_next() {
            let due = start + interval.mul_f64(shown as f64);
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            display.show(&fit_within(&frame, self.max_width, self.max_height));
            shown += 1;
        }

        source.release();
        display.clear();
        debug!(path = %result_path.display(), frames = shown, "Playback finished");
        Ok(shown)
    }
}
