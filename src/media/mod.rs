//! Decode/encode capabilities consumed by the pipelines.
//!
//! The pipelines only see these traits; [`ffmpeg::FfmpegBackend`] and
//! [`FsImageCodec`] are the implementations used by the binary.

pub mod ffmpeg;

use std::path::Path;

use image::imageops::FilterType;

use crate::error::MediaError;
use crate::models::{Frame, StreamInfo};

/// An opened stream of decoded frames
pub trait VideoSource: Send {
    fn info(&self) -> StreamInfo;

    /// Next frame in stream order, `None` once the stream is exhausted.
    ///
    /// Frames the decoder delivers damaged (short buffers) are skipped, not
    /// returned; they are counted in [`dropped_frames`](Self::dropped_frames).
    fn read_next(&mut self) -> Option<Frame>;

    /// Frames skipped so far because the decoder delivered them damaged
    fn dropped_frames(&self) -> u64 {
        0
    }

    fn release(&mut self);
}

/// An opened encoder accepting frames in presentation order
pub trait VideoSink: Send {
    fn write(&mut self, frame: &Frame) -> Result<(), MediaError>;

    /// Flush and close the output; further writes fail. An error means the
    /// result file is missing or incomplete.
    fn release(&mut self) -> Result<(), MediaError>;
}

/// Factory for sources and sinks
pub trait VideoBackend: Send + Sync {
    fn open_source(&self, path: &Path) -> Result<Box<dyn VideoSource>, MediaError>;

    /// Open an encoder whose geometry and rate match `info` exactly
    fn open_sink(&self, path: &Path, info: &StreamInfo) -> Result<Box<dyn VideoSink>, MediaError>;
}

/// Load/save of still images
pub trait ImageCodec: Send + Sync {
    fn load(&self, path: &Path) -> Result<Frame, MediaError>;
    fn save(&self, frame: &Frame, path: &Path) -> Result<(), MediaError>;
}

/// Still-image codec backed by the `image` crate; format follows the extension
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageCodec;

impl ImageCodec for FsImageCodec {
    fn load(&self, path: &Path) -> Result<Frame, MediaError> {
        let frame = Frame::from_dynamic(image::open(path)?);
        if frame.is_empty() {
            return Err(MediaError::InvalidGeometry {
                width: frame.width(),
                height: frame.height(),
            });
        }
        Ok(frame)
    }

    fn save(&self, frame: &Frame, path: &Path) -> Result<(), MediaError> {
        match frame {
            Frame::Gray(img) => img.save(path)?,
            Frame::Color(img) => img.save(path)?,
        }
        Ok(())
    }
}

/// Scale `frame` to fit inside `max_width` x `max_height`, keeping its
/// aspect ratio. Used for display only; persisted artifacts keep full size.
pub fn fit_within(frame: &Frame, max_width: u32, max_height: u32) -> Frame {
    if frame.is_empty() || max_width == 0 || max_height == 0 {
        return frame.clone();
    }

    let ratio = (max_width as f64 / frame.width() as f64)
        .min(max_height as f64 / frame.height() as f64);
    let width = ((frame.width() as f64 * ratio) as u32).max(1);
    let height = ((frame.height() as f64 * ratio) as u32).max(1);

    if (width, height) == (frame.width(), frame.height()) {
        return frame.clone();
    }

    match frame {
        Frame::Gray(img) => Frame::Gray(image::imageops::resize(img, width, height, FilterType::Triangle)),
        Frame::Color(img) => Frame::Color(image::imageops::resize(img, width, height, FilterType::Triangle)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_fit_within_keeps_aspect() {
        let frame = Frame::Color(RgbImage::new(2200, 800));
        let shown = fit_within(&frame, 1100, 800);
        assert_eq!((shown.width(), shown.height()), (1100, 400));
    }

    #[test]
    fn test_fit_within_scales_small_frames_up() {
        let frame = Frame::Color(RgbImage::new(100, 100));
        let shown = fit_within(&frame, 1100, 800);
        assert_eq!((shown.width(), shown.height()), (800, 800));
    }

    #[test]
    fn test_image_codec_roundtrip_on_disk() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("sign.png");
        let frame = Frame::Color(RgbImage::from_pixel(6, 4, image::Rgb([1, 2, 3])));

        FsImageCodec.save(&frame, &path)?;
        assert_eq!(FsImageCodec.load(&path)?, frame);
        Ok(())
    }

    #[test]
    fn test_image_codec_rejects_garbage() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image")?;
        assert!(FsImageCodec.load(&path).is_err());
        Ok(())
    }
}
