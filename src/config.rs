use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use crate::annotate::FrameAnnotator;
use crate::detection::ColorBlobDetector;
use crate::media::{FsImageCodec, VideoBackend};
use crate::pipeline::{DEFAULT_DISPLAY_SIZE, DEFAULT_SCRATCH_DIR, PipelineContext};
use crate::playback::PacedPlayback;

/// Application settings, read from an optional TOML file.
/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scratch_dir: PathBuf,
    pub output_dir: PathBuf,
    pub video_codec: String,
    pub marker: MarkerSettings,
    pub detector: DetectorSettings,
    pub playback: PlaybackSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    pub color: [u8; 3],
    pub thickness: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub min_intensity: u8,
    pub dominance: f32,
    pub gap_radius: u8,
    pub min_area: u32,
    pub min_side: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_fill: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub enabled: bool,
    pub fps: f64,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            output_dir: PathBuf::from("."),
            video_codec: "libx264".to_string(),
            marker: MarkerSettings::default(),
            detector: DetectorSettings::default(),
            playback: PlaybackSettings::default(),
        }
    }
}

impl Default for MarkerSettings {
    fn default() -> Self {
        let annotator = FrameAnnotator::default();
        Self {
            color: annotator.color,
            thickness: annotator.thickness,
        }
    }
}

impl Default for DetectorSettings {
    fn default() -> Self {
        let d = ColorBlobDetector::new();
        Self {
            min_intensity: d.min_intensity,
            dominance: d.dominance,
            gap_radius: d.gap_radius,
            min_area: d.min_area,
            min_side: d.min_side,
            min_aspect: d.min_aspect,
            max_aspect: d.max_aspect,
            min_fill: d.min_fill,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fps: 120.0,
            max_width: DEFAULT_DISPLAY_SIZE.0,
            max_height: DEFAULT_DISPLAY_SIZE.1,
        }
    }
}

impl DetectorSettings {
    pub fn build(&self) -> ColorBlobDetector {
        ColorBlobDetector {
            min_intensity: self.min_intensity,
            dominance: self.dominance,
            gap_radius: self.gap_radius,
            min_area: self.min_area,
            min_side: self.min_side,
            min_aspect: self.min_aspect,
            max_aspect: self.max_aspect,
            min_fill: self.min_fill,
        }
    }
}

impl Settings {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("Invalid settings")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("In settings file {:?}", path))
    }

    /// Context for the built-in detector and the still-image codec
    pub fn pipeline_context(&self, backend: Arc<dyn VideoBackend>) -> PipelineContext {
        PipelineContext::new(Arc::new(self.detector.build()), backend, Arc::new(FsImageCodec))
            .with_annotator(FrameAnnotator::new(self.marker.color, self.marker.thickness))
            .with_scratch_dir(self.scratch_dir.clone())
            .with_output_dir(self.output_dir.clone())
            .with_display_size(self.playback.max_width, self.playback.max_height)
    }

    pub fn playback_driver(&self, backend: Arc<dyn VideoBackend>) -> PacedPlayback {
        PacedPlayback::new(backend)
            .with_fps(self.playback.fps)
            .with_bounds(self.playback.max_width, self.playback.max_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.scratch_dir, PathBuf::from("frames"));
        assert_eq!(settings.marker.color, [0, 255, 0]);
        assert_eq!(settings.marker.thickness, 4);
        assert_eq!(settings.playback.fps, 120.0);
        assert!(settings.playback.enabled);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> anyhow::Result<()> {
        let settings = Settings::from_toml_str(
            r#"
            output_dir = "out"

            [marker]
            thickness = 2

            [detector]
            min_area = 100

            [playback]
            enabled = false
            "#,
        )?;
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.marker.thickness, 2);
        assert_eq!(settings.marker.color, [0, 255, 0]);
        assert_eq!(settings.detector.min_area, 100);
        assert_eq!(settings.detector.min_side, 12);
        assert!(!settings.playback.enabled);
        Ok(())
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert!(Settings::from_toml_str("scratch_dir = 5").is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Settings::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }
}
