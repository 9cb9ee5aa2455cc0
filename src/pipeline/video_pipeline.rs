use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{PipelineContext, ProgressObserver, ProgressTracker};
use crate::error::PipelineError;
use crate::paths::{estimate_label, snapshot_file_name};
use crate::workspace::clear_folder;

/// Lifecycle of one video run.
///
/// `Idle -> Opening -> Streaming -> Finalizing -> Done`, or
/// `Opening -> Aborted` when the source or sink cannot be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Opening,
    Streaming,
    Finalizing,
    Done,
    Aborted,
}

/// What a completed video run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub result_path: PathBuf,
    pub frames_read: u64,
    /// Damaged frames the source skipped; never written
    pub frames_dropped: u64,
    pub frames_written: u64,
    pub hit_frames: u64,
    pub snapshots_written: u64,
    pub write_failures: u64,
    /// False when the sink could not complete the result file
    pub sink_finalized: bool,
    pub started_at: OffsetDateTime,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn started_at_rfc3339(&self) -> String {
        self.started_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.started_at.to_string())
    }
}

/// Streams a video through detection and annotation into a result file.
///
/// One instance drives one run; it is not resumable.
pub struct VideoPipeline<'a> {
    ctx: &'a PipelineContext,
    run_id: Uuid,
    state: RunState,
}

impl<'a> VideoPipeline<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self {
            ctx,
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(run_id = %self.run_id, from = ?self.state, to = ?next, "Run state change");
        self.state = next;
    }

    fn prepare_scratch_dir(&self) {
        let scratch = &self.ctx.scratch_dir;
        clear_folder(scratch);
        if !scratch.is_dir() {
            if let Err(e) = std::fs::create_dir_all(scratch) {
                warn!(path = %scratch.display(), error = %e, "Cannot create snapshot directory");
            }
        }
    }

    /// Process `input` to completion.
    ///
    /// Only a failure to open the source or the sink stops the run, and it
    /// does so before any frame is read. Snapshot and sink write failures
    /// are logged and counted.
    pub fn run(
        &mut self,
        input: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<RunSummary, PipelineError> {
        let started_at = OffsetDateTime::now_utc();
        let clock = Instant::now();
        let ctx = self.ctx;

        self.transition(RunState::Opening);
        self.prepare_scratch_dir();

        observer.on_estimate(estimate_label(&input.to_string_lossy()));
        observer.on_processing_started();

        let result_path = ctx.result_path(input);

        let mut source = match ctx.backend.open_source(input) {
            Ok(source) => source,
            Err(source) => {
                self.transition(RunState::Aborted);
                return Err(PipelineError::SourceOpen {
                    path: input.to_path_buf(),
                    source,
                });
            }
        };

        let stream = source.info();
        ctx.prepare_output_dir();
        let mut sink = match ctx.backend.open_sink(&result_path, &stream) {
            Ok(sink) => sink,
            Err(source_err) => {
                source.release();
                self.transition(RunState::Aborted);
                return Err(PipelineError::SinkOpen {
                    path: result_path,
                    source: source_err,
                });
            }
        };

        if stream.total_frames <= 0 {
            warn!(total_frames = stream.total_frames, "Source reports no frame count, progress disabled");
        }

        self.transition(RunState::Streaming);
        let mut tracker = ProgressTracker::new(stream.total_frames);
        let mut frames_read = 0u64;
        let mut frames_written = 0u64;
        let mut hit_frames = 0u64;
        let mut snapshots_written = 0u64;
        let mut write_failures = 0u64;
        let mut snapshot_index = 0usize;

        while let Some(mut frame) = source.read_next() {
            frames_read += 1;

            let hits = ctx.annotator.annotate(&mut frame, ctx.engine.as_ref());
            if hits > 0 {
                hit_frames += 1;
                let snapshot = ctx.scratch_dir.join(snapshot_file_name(snapshot_index));
                match ctx.codec.save(&frame, &snapshot) {
                    Ok(()) => snapshots_written += 1,
                    Err(e) => warn!(path = %snapshot.display(), error = %e, "Failed to save snapshot"),
                }
                snapshot_index += 1;
            }

            match sink.write(&frame) {
                Ok(()) => frames_written += 1,
                Err(e) => {
                    write_failures += 1;
                    warn!(frame = frames_read, error = %e, "Failed to write frame");
                }
            }

            if let Some(percent) = tracker.advance() {
                debug!(percent, processed = tracker.processed(), "Progress");
                observer.on_progress(percent);
            }
        }

        self.transition(RunState::Finalizing);
        let frames_dropped = source.dropped_frames();
        if frames_dropped > 0 {
            warn!(frames_dropped, "Source skipped damaged frames");
        }
        source.release();
        let sink_finalized = match sink.release() {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %result_path.display(), error = %e, "Failed to finalize result video");
                false
            }
        };
        if let Some(percent) = tracker.finish() {
            observer.on_progress(percent);
        }
        observer.on_processing_finished();

        self.transition(RunState::Done);
        observer.on_playback_requested(&result_path);

        let summary = RunSummary {
            run_id: self.run_id,
            result_path,
            frames_read,
            frames_dropped,
            frames_written,
            hit_frames,
            snapshots_written,
            write_failures,
            sink_finalized,
            started_at,
            elapsed: clock.elapsed(),
        };
        info!(
            run_id = %summary.run_id,
            started_at = %summary.started_at_rfc3339(),
            frames = summary.frames_read,
            hit_frames = summary.hit_frames,
            dropped = summary.frames_dropped,
            finalized = summary.sink_finalized,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            result = %summary.result_path.display(),
            "Video processed"
        );
        Ok(summary)
    }

    /// Like [`run`](Self::run), but failures become an observer notification
    pub fn process(&mut self, input: &Path, observer: &dyn ProgressObserver) -> Option<RunSummary> {
        match self.run(input, observer) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(run_id = %self.run_id, error = %e, "Video run aborted");
                observer.on_failure(&e.to_string());
                None
            }
        }
    }
}
