use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the media capabilities (decode, encode, probe)
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Failed to probe media: {0}")]
    Probe(String),
    #[error("No video stream found")]
    NoVideoStream,
    #[error("Invalid stream geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
    #[error("Frame is {actual_width}x{actual_height}, sink expects {width}x{height}")]
    FrameMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
    #[error("Failed to start ffmpeg: {0}")]
    Spawn(String),
    #[error("Encoder exited: {0}")]
    EncoderExited(String),
    #[error("Sink already released")]
    Released,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Failures that stop a pipeline run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not open video: {}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
    #[error("Could not create video writer: {}", path.display())]
    SinkOpen {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
    #[error("Could not load image: {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
    #[error("Could not save image: {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: MediaError,
    },
}
