pub mod preprocessing;
pub mod contours;

use tracing::debug;

use crate::models::{Frame, HitRegion};
use preprocessing::HueThresholds;

/// Per-frame detector.
///
/// Implementations must be reentrant: the same engine may be shared across
/// runs and is called once per frame without any per-run reset.
pub trait DetectionEngine: Send + Sync {
    /// Regions of interest in `frame`; may be empty
    fn detect(&self, frame: &Frame) -> Vec<HitRegion>;

    /// Human-readable name (used in logs)
    fn name(&self) -> &str;
}

/// Built-in detector that segments the saturated red and blue paint used on
/// traffic signs and reports compact, roughly square blobs.
#[derive(Debug, Clone)]
pub struct ColorBlobDetector {
    pub min_intensity: u8,
    pub dominance: f32,
    pub gap_radius: u8,
    pub min_area: u32,
    pub min_side: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_fill: f32,
}

impl ColorBlobDetector {
    pub fn new() -> Self {
        Self {
            min_intensity: 100,
            dominance: 1.6,
            gap_radius: 1,
            min_area: 40,
            min_side: 12,
            min_aspect: 0.5,
            max_aspect: 2.0,
            min_fill: 0.2,
        }
    }
}

impl Default for ColorBlobDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionEngine for ColorBlobDetector {
    fn detect(&self, frame: &Frame) -> Vec<HitRegion> {
        // Sign colours cannot be told apart without chroma
        let rgb = match frame {
            Frame::Color(rgb) => rgb,
            Frame::Gray(_) => return Vec::new(),
        };

        let thresholds = HueThresholds {
            min_intensity: self.min_intensity,
            dominance: self.dominance,
        };
        let mask = preprocessing::sign_color_mask(rgb, &thresholds);
        let mask = preprocessing::close_gaps(&mask, self.gap_radius);
        let candidates = contours::find_contours(&mask, self.min_area);
        let total = candidates.len();

        let regions: Vec<HitRegion> = candidates
            .iter()
            .filter(|c| {
                let aspect = c.aspect_ratio();
                c.width() >= self.min_side
                    && c.height() >= self.min_side
                    && aspect >= self.min_aspect
                    && aspect <= self.max_aspect
                    && c.fill_ratio() >= self.min_fill
            })
            .map(|c| c.to_region())
            .collect();

        debug!(candidates = total, kept = regions.len(), "Colour blob detection");
        regions
    }

    fn name(&self) -> &str {
        "Colour Blob Detector"
    }
}
