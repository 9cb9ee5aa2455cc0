pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod host;
pub mod media;
pub mod models;
pub mod paths;
pub mod pipeline;
pub mod playback;
pub mod worker;
pub mod workspace;

pub use annotate::FrameAnnotator;
pub use config::Settings;
pub use detection::{ColorBlobDetector, DetectionEngine};
pub use error::{MediaError, PipelineError};
pub use media::{FsImageCodec, ImageCodec, VideoBackend, VideoSink, VideoSource};
pub use models::{Frame, HitRegion, StreamInfo};
pub use paths::{derive_result_path, MediaKind};
pub use pipeline::{
    ImagePipeline, PipelineContext, ProgressObserver, ProgressTracker, RunState, RunSummary,
    VideoPipeline,
};
pub use worker::{Job, JobOutcome, Worker};
