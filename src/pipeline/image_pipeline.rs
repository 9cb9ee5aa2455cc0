use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::{PipelineContext, ProgressObserver};
use crate::error::PipelineError;
use crate::media::fit_within;
use crate::models::Frame;

/// Result of annotating one still image
#[derive(Debug, Clone)]
pub struct ImageOutcome {
    pub frame: Frame,
    pub result_path: PathBuf,
    pub hits: usize,
}

/// Single-shot flow: load, annotate, save, hand back for display
pub struct ImagePipeline<'a> {
    ctx: &'a PipelineContext,
}

impl<'a> ImagePipeline<'a> {
    pub fn new(ctx: &'a PipelineContext) -> Self {
        Self { ctx }
    }

    /// Annotate `input` and persist it beside the other results.
    ///
    /// Nothing is written when decoding fails. Exactly one save happens
    /// otherwise, even when no sign was found.
    pub fn run(&self, input: &Path) -> Result<ImageOutcome, PipelineError> {
        let mut frame = self.ctx.codec.load(input).map_err(|source| PipelineError::Decode {
            path: input.to_path_buf(),
            source,
        })?;

        let hits = self.ctx.annotator.annotate(&mut frame, self.ctx.engine.as_ref());

        let result_path = self.ctx.result_path(input);
        self.ctx.prepare_output_dir();
        self.ctx
            .codec
            .save(&frame, &result_path)
            .map_err(|source| PipelineError::Encode {
                path: result_path.clone(),
                source,
            })?;

        info!(input = %input.display(), result = %result_path.display(), hits, "Image processed");
        Ok(ImageOutcome {
            frame,
            result_path,
            hits,
        })
    }

    /// Like [`run`](Self::run), but every outcome goes to `observer`
    pub fn process(&self, input: &Path, observer: &dyn ProgressObserver) -> Option<Frame> {
        match self.run(input) {
            Ok(outcome) => {
                let (max_width, max_height) = self.ctx.display_size;
                observer.on_image_ready(
                    fit_within(&outcome.frame, max_width, max_height),
                    &outcome.result_path,
                );
                Some(outcome.frame)
            }
            Err(e) => {
                warn!(error = %e, "Image run failed");
                observer.on_failure(&e.to_string());
                None
            }
        }
    }
}
