use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::{UiEvent, UiHost};
use crate::models::Frame;
use crate::playback::{FrameDisplay, PlaybackDriver};

const PROCESSING_TEXT: &str = "Processing video... It may take a while.";

/// Terminal rendition of the UI: a progress bar while a video is processed,
/// one-line result and failure messages, and a frame counter during replay.
pub struct TerminalHost {
    estimate: Option<String>,
    progress: Option<ProgressBar>,
    playback: Option<Arc<dyn PlaybackDriver>>,
    playback_threads: Vec<JoinHandle<()>>,
}

impl TerminalHost {
    pub fn new(playback: Option<Arc<dyn PlaybackDriver>>) -> Self {
        Self {
            estimate: None,
            progress: None,
            playback,
            playback_threads: Vec::new(),
        }
    }

    fn status_message(&self) -> String {
        match &self.estimate {
            Some(estimate) => format!("{PROCESSING_TEXT} {estimate}"),
            None => PROCESSING_TEXT.to_string(),
        }
    }

    fn show_progress(&mut self) {
        let style = ProgressStyle::with_template("{msg}\n{wide_bar} {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(100).with_style(style);
        bar.set_message(self.status_message());
        self.progress = Some(bar);
    }

    fn clear_progress(&mut self, complete: bool) {
        if let Some(bar) = self.progress.take() {
            if complete {
                bar.set_position(100);
            }
            bar.finish_and_clear();
        }
        self.estimate = None;
    }

    fn start_playback(&mut self, result_path: &Path) {
        let Some(driver) = self.playback.clone() else {
            return;
        };
        let path = result_path.to_path_buf();
        self.playback_threads.push(std::thread::spawn(move || {
            let mut display = CounterDisplay::new(&path);
            if let Err(e) = driver.play(&path, &mut display) {
                warn!(path = %path.display(), error = %e, "Could not open video for playback");
                display.clear();
            }
        }));
    }

    /// Block until every replay started by this host has ended
    pub fn wait_for_playback(&mut self) {
        for handle in self.playback_threads.drain(..) {
            let _ = handle.join();
        }
    }
}

impl UiHost for TerminalHost {
    fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Estimate(text) => {
                self.estimate = Some(text);
                let message = self.status_message();
                if let Some(bar) = &self.progress {
                    bar.set_message(message);
                }
            }
            UiEvent::ProcessingStarted => self.show_progress(),
            UiEvent::Progress(percent) => {
                if let Some(bar) = &self.progress {
                    bar.set_position(u64::from(percent));
                }
            }
            UiEvent::ProcessingFinished => self.clear_progress(true),
            UiEvent::PlaybackRequested(path) => {
                println!("Result video saved at {}", path.display());
                self.start_playback(&path);
            }
            UiEvent::ImageReady { frame, result_path } => {
                println!("Result image saved at {}", result_path.display());
                println!("Preview: {}x{}", frame.width(), frame.height());
            }
            UiEvent::Failure(message) => {
                self.clear_progress(false);
                eprintln!("{message}");
            }
        }
    }
}

/// Shows replay progress as a running frame count
struct CounterDisplay {
    bar: ProgressBar,
}

impl CounterDisplay {
    fn new(path: &Path) -> Self {
        let style = ProgressStyle::with_template("{spinner} {msg} [{prefix}] {pos} frames")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.set_message(format!("Playing {}", path.display()));
        Self { bar }
    }
}

impl FrameDisplay for CounterDisplay {
    fn show(&mut self, frame: &Frame) {
        self.bar.inc(1);
        self.bar.set_prefix(format!("{}x{}", frame.width(), frame.height()));
    }

    fn clear(&mut self) {
        self.bar.finish_and_clear();
    }
}
