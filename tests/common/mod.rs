mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from the crate for tests
pub use traffic_sign_detector::host::UiEvent;
pub use traffic_sign_detector::{
    Frame, FsImageCodec, HitRegion, ImageCodec, PipelineContext, ProgressObserver, RunState, StreamInfo,
};
