mod image_pipeline;
mod observer;
mod video_pipeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use image_pipeline::{ImageOutcome, ImagePipeline};
pub use observer::{ProgressObserver, ProgressTracker};
pub use video_pipeline::{RunState, RunSummary, VideoPipeline};

use tracing::warn;

use crate::annotate::FrameAnnotator;
use crate::detection::DetectionEngine;
use crate::media::{ImageCodec, VideoBackend};
use crate::paths::derive_result_path;

pub const DEFAULT_SCRATCH_DIR: &str = "frames";
pub const DEFAULT_DISPLAY_SIZE: (u32, u32) = (1100, 800);

/// Collaborators and locations shared by every run
#[derive(Clone)]
pub struct PipelineContext {
    pub engine: Arc<dyn DetectionEngine>,
    pub annotator: FrameAnnotator,
    pub backend: Arc<dyn VideoBackend>,
    pub codec: Arc<dyn ImageCodec>,
    /// Hit snapshots of the current video run; cleared at run start
    pub scratch_dir: PathBuf,
    /// Where `{stem}_result.{ext}` artifacts are written
    pub output_dir: PathBuf,
    /// Bounds for frames handed to the observer for display
    pub display_size: (u32, u32),
}

impl PipelineContext {
    pub fn new(
        engine: Arc<dyn DetectionEngine>,
        backend: Arc<dyn VideoBackend>,
        codec: Arc<dyn ImageCodec>,
    ) -> Self {
        Self {
            engine,
            annotator: FrameAnnotator::default(),
            backend,
            codec,
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            output_dir: PathBuf::from("."),
            display_size: DEFAULT_DISPLAY_SIZE,
        }
    }

    pub fn with_annotator(mut self, annotator: FrameAnnotator) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_display_size(mut self, width: u32, height: u32) -> Self {
        self.display_size = (width, height);
        self
    }

    /// Location of the result artifact for `input`
    pub fn result_path(&self, input: &Path) -> PathBuf {
        self.output_dir.join(derive_result_path(&input.to_string_lossy()))
    }

    /// Create the output directory if missing. A failure is only logged;
    /// the following save or encoder open reports it properly.
    pub(crate) fn prepare_output_dir(&self) {
        if self.output_dir.as_os_str().is_empty() || self.output_dir.is_dir() {
            return;
        }
        if let Err(e) = std::fs::create_dir_all(&self.output_dir) {
            warn!(path = %self.output_dir.display(), error = %e, "Cannot create output directory");
        }
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("engine", &self.engine.name())
            .field("annotator", &self.annotator)
            .field("scratch_dir", &self.scratch_dir)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}
