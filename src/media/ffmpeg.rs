//! Video capabilities backed by the ffmpeg and ffprobe executables.
//!
//! Frames travel as packed rgb24 over pipes: the decoder writes raw frames
//! to stdout, the encoder reads them from stdin.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, ExitStatus};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use tracing::{debug, warn};

use super::{VideoBackend, VideoSink, VideoSource};
use crate::error::MediaError;
use crate::models::{Frame, StreamInfo};

/// How long a freshly spawned encoder must stay alive before the sink
/// counts as opened
const DEFAULT_STARTUP_GRACE: Duration = Duration::from_millis(250);
const STARTUP_POLL: Duration = Duration::from_millis(10);
/// Used when the source reports no usable rate
const FALLBACK_FRAME_RATE: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    /// Encoder passed to `-c:v`
    pub video_codec: String,
    /// ffmpeg executable; the one found by ffmpeg-sidecar when `None`
    pub ffmpeg_path: Option<PathBuf>,
    pub startup_grace: Duration,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            ffmpeg_path: None,
            startup_grace: DEFAULT_STARTUP_GRACE,
        }
    }

    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    fn command(&self) -> FfmpegCommand {
        match &self.ffmpeg_path {
            Some(path) => FfmpegCommand::new_with_path(path),
            None => FfmpegCommand::new(),
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBackend for FfmpegBackend {
    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>, MediaError> {
        Ok(Box::new(FfmpegSource::open(path, self.command())?))
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo) -> Result<Box<dyn VideoSink>, MediaError> {
        Ok(Box::new(FfmpegSink::open(path, info, self)?))
    }
}

/// Parse ffprobe rates such as `30000/1001` or `25`
pub(crate) fn parse_frame_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Read geometry, rate and frame count of the first video stream
pub fn probe_stream(path: &Path) -> Result<StreamInfo, MediaError> {
    let metadata = ffprobe::ffprobe(path).map_err(|e| MediaError::Probe(format!("{e:?}")))?;

    let stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or(MediaError::NoVideoStream)?;

    let width = stream.width.unwrap_or(0).max(0) as u32;
    let height = stream.height.unwrap_or(0).max(0) as u32;
    if width == 0 || height == 0 {
        return Err(MediaError::InvalidGeometry { width, height });
    }

    let frame_rate = parse_frame_rate(&stream.avg_frame_rate)
        .or_else(|| parse_frame_rate(&stream.r_frame_rate))
        .unwrap_or(0.0);

    // Containers without a frame count fall back to duration * rate
    let total_frames = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<i64>().ok())
        .or_else(|| {
            let duration: f64 = stream
                .duration
                .as_deref()
                .or(metadata.format.duration.as_deref())?
                .parse()
                .ok()?;
            Some((duration * frame_rate).round() as i64)
        })
        .unwrap_or(0);

    Ok(StreamInfo {
        width,
        height,
        frame_rate,
        total_frames,
    })
}

pub struct FfmpegSource {
    info: StreamInfo,
    child: FfmpegChild,
    events: FfmpegIterator,
    dropped: u64,
    exhausted: bool,
    released: bool,
}

impl FfmpegSource {
    pub fn open(path: &Path, mut cmd: FfmpegCommand) -> Result<Self, MediaError> {
        let info = probe_stream(path)?;

        cmd.input(path.to_string_lossy().as_ref()).rawvideo();
        let mut child = cmd.spawn().map_err(|e| MediaError::Spawn(e.to_string()))?;
        let events = match child.iter() {
            Ok(events) => events,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MediaError::Spawn(e.to_string()));
            }
        };

        debug!(path = %path.display(), ?info, "Opened video source");
        Ok(Self {
            info,
            child,
            events,
            dropped: 0,
            exhausted: false,
            released: false,
        })
    }
}

impl VideoSource for FfmpegSource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn read_next(&mut self) -> Option<Frame> {
        if self.exhausted || self.released {
            return None;
        }

        for event in self.events.by_ref() {
            match event {
                FfmpegEvent::OutputFrame(raw) => {
                    let (width, height) = (raw.width, raw.height);
                    match Frame::from_rgb_bytes(width, height, raw.data) {
                        Some(frame) => return Some(frame),
                        None => {
                            self.dropped += 1;
                            warn!(width, height, "Dropping truncated frame from decoder");
                        }
                    }
                }
                FfmpegEvent::Error(message) | FfmpegEvent::Log(LogLevel::Error, message) => {
                    warn!(%message, "Decoder reported an error");
                }
                _ => {}
            }
        }

        self.exhausted = true;
        None
    }

    fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if !self.exhausted {
            let _ = self.child.kill();
        }
        if let Err(e) = self.child.wait() {
            warn!(error = %e, "Failed to reap decoder process");
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Rate handed to the encoder: the source's own, or a fixed fallback when
/// the source reports none
pub(crate) fn encoder_frame_rate(info: &StreamInfo) -> f64 {
    if info.frame_rate.is_finite() && info.frame_rate > 0.0 {
        info.frame_rate
    } else {
        warn!(
            reported = info.frame_rate,
            fallback = FALLBACK_FRAME_RATE,
            "Source has no usable frame rate, encoding at fallback rate"
        );
        FALLBACK_FRAME_RATE
    }
}

fn exit_error(status: ExitStatus, last_message: &Mutex<Option<String>>) -> MediaError {
    let detail = last_message.lock().ok().and_then(|m| m.clone());
    match detail {
        Some(message) => MediaError::EncoderExited(format!("{status}: {message}")),
        None => MediaError::EncoderExited(status.to_string()),
    }
}

pub struct FfmpegSink {
    info: StreamInfo,
    child: FfmpegChild,
    stdin: Option<ChildStdin>,
    drain: Option<JoinHandle<()>>,
    last_message: Arc<Mutex<Option<String>>>,
}

impl FfmpegSink {
    /// Spawn the encoder and wait out `backend.startup_grace`.
    ///
    /// An encoder that exits within the grace period (unknown codec,
    /// unwritable output) is an open failure.
    pub fn open(path: &Path, info: &StreamInfo, backend: &FfmpegBackend) -> Result<Self, MediaError> {
        if info.width == 0 || info.height == 0 {
            return Err(MediaError::InvalidGeometry {
                width: info.width,
                height: info.height,
            });
        }

        let size = format!("{}x{}", info.width, info.height);
        let rate = encoder_frame_rate(info);
        let rate_arg = rate.to_string();
        // 4:2:0 chroma needs even dimensions; keep full chroma otherwise
        let pix_fmt = if info.width % 2 == 0 && info.height % 2 == 0 {
            "yuv420p"
        } else {
            "yuv444p"
        };

        let mut cmd = backend.command();
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-s", size.as_str()])
            .args(["-r", rate_arg.as_str()])
            .input("-")
            .args(["-c:v", backend.video_codec.as_str(), "-pix_fmt", pix_fmt])
            .overwrite()
            .output(path.to_string_lossy().as_ref());

        let mut child = cmd.spawn().map_err(|e| MediaError::Spawn(e.to_string()))?;
        let Some(stdin) = child.take_stdin() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(MediaError::Spawn("encoder stdin unavailable".to_string()));
        };

        // Keep stderr flowing so the encoder never stalls on a full pipe
        let last_message = Arc::new(Mutex::new(None));
        let drain = match child.iter() {
            Ok(events) => {
                let last_message = Arc::clone(&last_message);
                Some(std::thread::spawn(move || {
                    for event in events {
                        let (message, is_error) = match event {
                            FfmpegEvent::Error(message)
                            | FfmpegEvent::Log(LogLevel::Error | LogLevel::Fatal, message) => (message, true),
                            FfmpegEvent::Log(_, message) => (message, false),
                            _ => continue,
                        };
                        if is_error {
                            warn!(%message, "Encoder reported an error");
                        }
                        if let Ok(mut slot) = last_message.lock() {
                            *slot = Some(message);
                        }
                    }
                }))
            }
            Err(e) => {
                warn!(error = %e, "Encoder output will not be monitored");
                None
            }
        };

        let mut sink = Self {
            info: *info,
            child,
            stdin: Some(stdin),
            drain,
            last_message,
        };
        sink.await_startup(backend.startup_grace)?;

        debug!(path = %path.display(), %size, rate, "Opened video sink");
        Ok(sink)
    }

    fn await_startup(&mut self, grace: Duration) -> Result<(), MediaError> {
        let start = Instant::now();
        while start.elapsed() < grace {
            match self.child.as_inner_mut().try_wait() {
                Ok(Some(status)) => {
                    self.stdin = None;
                    self.join_drain();
                    return Err(exit_error(status, &self.last_message));
                }
                Ok(None) => std::thread::sleep(STARTUP_POLL),
                Err(e) => {
                    self.abandon();
                    return Err(MediaError::Io(e));
                }
            }
        }
        Ok(())
    }

    fn join_drain(&mut self) {
        if let Some(drain) = self.drain.take() {
            let _ = drain.join();
        }
    }

    fn abandon(&mut self) {
        self.stdin = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.join_drain();
    }
}

impl VideoSink for FfmpegSink {
    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        if frame.width() != self.info.width || frame.height() != self.info.height {
            return Err(MediaError::FrameMismatch {
                width: self.info.width,
                height: self.info.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }
        let stdin = self.stdin.as_mut().ok_or(MediaError::Released)?;
        stdin.write_all(&frame.to_rgb_bytes())?;
        Ok(())
    }

    /// Close the input and wait for the encoder; a failed exit is an error
    fn release(&mut self) -> Result<(), MediaError> {
        // Closing stdin signals end of stream to the encoder
        let Some(stdin) = self.stdin.take() else {
            return Ok(());
        };
        drop(stdin);

        let status = self.child.wait()?;
        self.join_drain();
        if !status.success() {
            return Err(exit_error(status, &self.last_message));
        }
        Ok(())
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            warn!(error = %e, "Failed to finalize encoder");
        }
    }
}
