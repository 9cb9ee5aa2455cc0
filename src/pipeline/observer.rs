use std::path::Path;

use crate::models::Frame;

/// Receives everything a pipeline run wants to show the user.
///
/// Pipelines call these from their worker thread. Implementations must not
/// block and must not touch UI state directly; they forward to whatever owns
/// the display (see [`crate::host::ChannelObserver`]).
pub trait ProgressObserver: Send + Sync {
    fn on_estimate(&self, text: &str);
    fn on_progress(&self, percent: u8);
    fn on_processing_started(&self);
    /// Processing is over; hosts show the indicator as complete
    fn on_processing_finished(&self);
    fn on_playback_requested(&self, result_path: &Path);
    /// Annotated still image is ready, already scaled for display
    fn on_image_ready(&self, frame: Frame, result_path: &Path);
    /// One-line status for a run that stopped early
    fn on_failure(&self, message: &str);
}

/// Turns frame counts into coalesced percentage updates.
///
/// `percent = floor(processed * 100 / total)`, reported only when it grows.
/// A non-positive total disables reporting for the run.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total: i64,
    processed: i64,
    last_emitted: u8,
}

impl ProgressTracker {
    pub fn new(total_frames: i64) -> Self {
        Self {
            total: total_frames,
            processed: 0,
            last_emitted: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.total > 0
    }

    pub fn processed(&self) -> i64 {
        self.processed
    }

    /// Count one frame; returns the new percentage if it increased
    pub fn advance(&mut self) -> Option<u8> {
        self.processed += 1;
        if !self.is_enabled() {
            return None;
        }

        // Sources may under-report their length
        let percent = (self.processed.saturating_mul(100) / self.total).min(100) as u8;
        self.bump(percent)
    }

    /// Final value at end of stream: 100 unless already reported
    pub fn finish(&mut self) -> Option<u8> {
        if !self.is_enabled() {
            return None;
        }
        self.bump(100)
    }

    fn bump(&mut self, percent: u8) -> Option<u8> {
        if percent > self.last_emitted {
            self.last_emitted = percent;
            Some(percent)
        } else {
            None
        }
    }
}
