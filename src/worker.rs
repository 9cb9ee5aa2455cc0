use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::host::ChannelObserver;
use crate::models::Frame;
use crate::paths::MediaKind;
use crate::pipeline::{ImagePipeline, PipelineContext, ProgressObserver, RunSummary, VideoPipeline};

/// A unit of work handed over by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Image(PathBuf),
    Video(PathBuf),
}

impl Job {
    /// Pick the pipeline for `path`, inferring the kind from its extension
    /// unless one is given
    pub fn for_path(path: PathBuf, kind: Option<MediaKind>) -> Self {
        match kind.unwrap_or_else(|| MediaKind::from_path(&path)) {
            MediaKind::Image => Job::Image(path),
            MediaKind::Video => Job::Video(path),
        }
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Image(Option<Frame>),
    Video(Option<RunSummary>),
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        match self {
            JobOutcome::Image(frame) => frame.is_some(),
            JobOutcome::Video(summary) => summary.as_ref().is_some_and(|s| s.sink_finalized),
        }
    }
}

/// Run `job` on the current thread, reporting through `observer`
pub fn execute(ctx: &PipelineContext, job: &Job, observer: &dyn ProgressObserver) -> JobOutcome {
    match job {
        Job::Image(path) => {
            info!(path = %path.display(), "Starting image run");
            JobOutcome::Image(ImagePipeline::new(ctx).process(path, observer))
        }
        Job::Video(path) => {
            let mut pipeline = VideoPipeline::new(ctx);
            info!(path = %path.display(), run_id = %pipeline.run_id(), "Starting video run");
            JobOutcome::Video(pipeline.process(path, observer))
        }
    }
}

/// Executes jobs off the UI thread.
///
/// Each submitted job runs on its own blocking task and owns its observer,
/// so the run's event channel closes as soon as the job ends.
#[derive(Debug, Clone)]
pub struct Worker {
    ctx: Arc<PipelineContext>,
}

impl Worker {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub fn submit(&self, job: Job, observer: ChannelObserver) -> JoinHandle<JobOutcome> {
        let ctx = Arc::clone(&self.ctx);
        tokio::task::spawn_blocking(move || execute(&ctx, &job, &observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_kind_inferred_from_extension() {
        assert_eq!(
            Job::for_path(PathBuf::from("images/stop.jpg"), None),
            Job::Image(PathBuf::from("images/stop.jpg"))
        );
        assert_eq!(
            Job::for_path(PathBuf::from("videos/drive.mp4"), None),
            Job::Video(PathBuf::from("videos/drive.mp4"))
        );
    }

    #[test]
    fn test_explicit_kind_wins() {
        assert_eq!(
            Job::for_path(PathBuf::from("capture.png"), Some(MediaKind::Video)),
            Job::Video(PathBuf::from("capture.png"))
        );
    }
}
