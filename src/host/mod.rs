//! UI side of a run.
//!
//! Pipelines run on a worker and only *request* display changes. Each
//! request becomes a [`UiEvent`] on an unbounded channel, so sending never
//! blocks the streaming loop. A single [`UiHost`] drains the channel and is
//! the only place display state is mutated.

pub mod terminal;

use std::path::{Path, PathBuf};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::models::Frame;
use crate::pipeline::ProgressObserver;

pub use terminal::TerminalHost;

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Estimate(String),
    Progress(u8),
    ProcessingStarted,
    ProcessingFinished,
    PlaybackRequested(PathBuf),
    ImageReady { frame: Frame, result_path: PathBuf },
    Failure(String),
}

/// Owner of display state; applies events one at a time
pub trait UiHost {
    fn apply(&mut self, event: UiEvent);
}

/// Observer that forwards every notification to the UI thread.
///
/// Created per run: dropping the last clone closes the channel and ends
/// the host's event loop.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: UnboundedSender<UiEvent>,
}

impl ChannelObserver {
    pub fn new(tx: UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("UI host gone, dropping event");
        }
    }
}

impl ProgressObserver for ChannelObserver {
    fn on_estimate(&self, text: &str) {
        self.send(UiEvent::Estimate(text.to_string()));
    }

    fn on_progress(&self, percent: u8) {
        self.send(UiEvent::Progress(percent));
    }

    fn on_processing_started(&self) {
        self.send(UiEvent::ProcessingStarted);
    }

    fn on_processing_finished(&self) {
        self.send(UiEvent::ProcessingFinished);
    }

    fn on_playback_requested(&self, result_path: &Path) {
        self.send(UiEvent::PlaybackRequested(result_path.to_path_buf()));
    }

    fn on_image_ready(&self, frame: Frame, result_path: &Path) {
        self.send(UiEvent::ImageReady {
            frame,
            result_path: result_path.to_path_buf(),
        });
    }

    fn on_failure(&self, message: &str) {
        self.send(UiEvent::Failure(message.to_string()));
    }
}

/// Observer/receiver pair for one run
pub fn channel() -> (ChannelObserver, UnboundedReceiver<UiEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelObserver::new(tx), rx)
}

/// Apply events to `host` until every observer of the run is dropped.
/// Returns the number of events applied.
pub async fn run_event_loop<H: UiHost + ?Sized>(
    mut events: UnboundedReceiver<UiEvent>,
    host: &mut H,
) -> usize {
    let mut applied = 0;
    while let Some(event) = events.recv().await {
        host.apply(event);
        applied += 1;
    }
    applied
}
