#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use traffic_sign_detector::host::UiEvent;
use traffic_sign_detector::media::ImageCodec;
use traffic_sign_detector::{
    DetectionEngine, Frame, FsImageCodec, HitRegion, MediaError, PipelineContext,
    ProgressObserver, StreamInfo, VideoBackend, VideoSink, VideoSource,
};

pub const FRAME_WIDTH: u32 = 32;
pub const FRAME_HEIGHT: u32 = 24;

/// Where the scripted engine reports its single hit
pub const HIT: HitRegion = HitRegion {
    x: 10,
    y: 8,
    width: 6,
    height: 6,
};

/// Creates a dark frame whose top-left pixel encodes `tag` in the red channel.
pub fn tagged_frame(tag: u8) -> Frame {
    let mut img = RgbImage::new(FRAME_WIDTH, FRAME_HEIGHT);
    img.put_pixel(0, 0, Rgb([tag, 0, 0]));
    Frame::Color(img)
}

pub fn frame_tag(frame: &Frame) -> u8 {
    match frame {
        Frame::Color(img) => img.get_pixel(0, 0)[0],
        Frame::Gray(img) => img.get_pixel(0, 0)[0],
    }
}

pub fn tagged_frames(count: u8) -> Vec<Frame> {
    (0..count).map(tagged_frame).collect()
}

pub fn stream_info(total_frames: i64) -> StreamInfo {
    StreamInfo {
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        frame_rate: 25.0,
        total_frames,
    }
}

/// Reports one region on frames whose tag is listed.
pub struct ScriptedEngine {
    hits: HashSet<u8>,
}

impl ScriptedEngine {
    pub fn hits_on(tags: &[u8]) -> Self {
        Self {
            hits: tags.iter().copied().collect(),
        }
    }
}

impl DetectionEngine for ScriptedEngine {
    fn detect(&self, frame: &Frame) -> Vec<HitRegion> {
        if self.hits.contains(&frame_tag(frame)) {
            vec![HIT]
        } else {
            Vec::new()
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Shared record of what the in-memory backend saw
#[derive(Default)]
pub struct BackendLog {
    pub written: Mutex<Vec<Frame>>,
    pub sink_opened: Mutex<Option<(PathBuf, StreamInfo)>>,
    pub sources_opened: AtomicUsize,
    pub sources_released: AtomicUsize,
    pub sinks_released: AtomicUsize,
}

impl BackendLog {
    pub fn written_tags(&self) -> Vec<u8> {
        self.written.lock().unwrap().iter().map(frame_tag).collect()
    }
}

/// Video backend that serves a fixed list of frames and records writes.
pub struct MemoryBackend {
    pub frames: Vec<Frame>,
    pub info: StreamInfo,
    pub fail_source: bool,
    pub fail_sink: bool,
    /// Sink release reports an incomplete result file
    pub fail_release: bool,
    /// Damaged frames the source claims to have skipped
    pub dropped: u64,
    /// Sink writes of frames with these tags fail
    pub failing_writes: HashSet<u8>,
    pub log: Arc<BackendLog>,
}

impl MemoryBackend {
    pub fn new(frames: Vec<Frame>, total_frames: i64) -> Self {
        Self {
            frames,
            info: stream_info(total_frames),
            fail_source: false,
            fail_sink: false,
            fail_release: false,
            dropped: 0,
            failing_writes: HashSet::new(),
            log: Arc::new(BackendLog::default()),
        }
    }
}

struct MemorySource {
    frames: VecDeque<Frame>,
    info: StreamInfo,
    dropped: u64,
    log: Arc<BackendLog>,
}

impl VideoSource for MemorySource {
    fn info(&self) -> StreamInfo {
        self.info
    }

    fn read_next(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    fn release(&mut self) {
        self.log.sources_released.fetch_add(1, Ordering::SeqCst);
    }
}

struct MemorySink {
    failing_writes: HashSet<u8>,
    fail_release: bool,
    log: Arc<BackendLog>,
}

impl VideoSink for MemorySink {
    fn write(&mut self, frame: &Frame) -> Result<(), MediaError> {
        if self.failing_writes.contains(&frame_tag(frame)) {
            return Err(MediaError::Io(std::io::Error::other("disk full")));
        }
        self.log.written.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn release(&mut self) -> Result<(), MediaError> {
        self.log.sinks_released.fetch_add(1, Ordering::SeqCst);
        if self.fail_release {
            return Err(MediaError::EncoderExited("exit status: 1".to_string()));
        }
        Ok(())
    }
}

impl VideoBackend for MemoryBackend {
    fn open_source(&self, _path: &Path) -> Result<Box<dyn VideoSource>, MediaError> {
        if self.fail_source {
            return Err(MediaError::NoVideoStream);
        }
        self.log.sources_opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySource {
            frames: self.frames.iter().cloned().collect(),
            info: self.info,
            dropped: self.dropped,
            log: Arc::clone(&self.log),
        }))
    }

    fn open_sink(&self, path: &Path, info: &StreamInfo) -> Result<Box<dyn VideoSink>, MediaError> {
        if self.fail_sink {
            return Err(MediaError::Spawn("no encoder".to_string()));
        }
        *self.log.sink_opened.lock().unwrap() = Some((path.to_path_buf(), *info));
        Ok(Box::new(MemorySink {
            failing_writes: self.failing_writes.clone(),
            fail_release: self.fail_release,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Image codec that writes through to disk and counts calls.
#[derive(Default)]
pub struct CountingCodec {
    pub saves: AtomicUsize,
}

impl CountingCodec {
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl ImageCodec for CountingCodec {
    fn load(&self, path: &Path) -> Result<Frame, MediaError> {
        FsImageCodec.load(path)
    }

    fn save(&self, frame: &Frame, path: &Path) -> Result<(), MediaError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        FsImageCodec.save(frame, path)
    }
}

/// Observer that keeps every notification in arrival order.
#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<UiEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                UiEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_estimate(&self, text: &str) {
        self.push(UiEvent::Estimate(text.to_string()));
    }

    fn on_progress(&self, percent: u8) {
        self.push(UiEvent::Progress(percent));
    }

    fn on_processing_started(&self) {
        self.push(UiEvent::ProcessingStarted);
    }

    fn on_processing_finished(&self) {
        self.push(UiEvent::ProcessingFinished);
    }

    fn on_playback_requested(&self, result_path: &Path) {
        self.push(UiEvent::PlaybackRequested(result_path.to_path_buf()));
    }

    fn on_image_ready(&self, frame: Frame, result_path: &Path) {
        self.push(UiEvent::ImageReady {
            frame,
            result_path: result_path.to_path_buf(),
        });
    }

    fn on_failure(&self, message: &str) {
        self.push(UiEvent::Failure(message.to_string()));
    }
}

/// Creates a context around an in-memory backend with scratch and output
/// directories inside `dir`.
pub fn memory_context(
    backend: MemoryBackend,
    engine: ScriptedEngine,
    dir: &Path,
) -> (PipelineContext, Arc<BackendLog>) {
    let log = Arc::clone(&backend.log);
    let ctx = PipelineContext::new(Arc::new(engine), Arc::new(backend), Arc::new(FsImageCodec))
        .with_scratch_dir(dir.join("frames"))
        .with_output_dir(dir.join("out"));
    (ctx, log)
}

/// Sorted file names directly inside `dir`.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to list directory")
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
