use std::borrow::Cow;

use image::{DynamicImage, GrayImage, RgbImage};

/// A decoded raster image from a still file or a video stream.
///
/// Grayscale frames carry one channel, colour frames three interleaved
/// RGB channels. The pipeline owns a frame for one iteration only.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Gray(GrayImage),
    Color(RgbImage),
}

impl Frame {
    /// Wrap a decoded image. 8-bit luma stays single channel, everything
    /// else is converted to RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Frame::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Frame::Color(rgb),
            other => Frame::Color(other.to_rgb8()),
        }
    }

    /// Build a colour frame from packed rgb24 bytes.
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        RgbImage::from_raw(width, height, data).map(Frame::Color)
    }

    pub fn width(&self) -> u32 {
        match self {
            Frame::Gray(img) => img.width(),
            Frame::Color(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Frame::Gray(img) => img.height(),
            Frame::Color(img) => img.height(),
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            Frame::Gray(_) => 1,
            Frame::Color(_) => 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Packed rgb24 view of the frame, converting grayscale on the fly
    pub fn to_rgb_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Frame::Color(img) => Cow::Borrowed(img.as_raw().as_slice()),
            Frame::Gray(img) => {
                Cow::Owned(DynamicImage::ImageLuma8(img.clone()).to_rgb8().into_raw())
            }
        }
    }
}

/// Axis-aligned rectangle reported by a detector, in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl HitRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Connected region found in a binary mask
#[derive(Debug, Clone)]
pub struct Contour {
    pub label: u32,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
    pub pixel_count: u32,
}

impl Contour {
    /// Single-pixel region at `(x, y)`
    pub fn seed(label: u32, x: u32, y: u32) -> Self {
        Self {
            label,
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 1,
        }
    }

    /// Grow the bounding box to cover `(x, y)` and count the pixel
    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    pub fn area(&self) -> u32 {
        self.pixel_count
    }

    pub fn aspect_ratio(&self) -> f32 {
        let w = self.width() as f32;
        let h = self.height() as f32;
        if h == 0.0 {
            return 0.0;
        }
        w / h
    }

    /// Share of the bounding box covered by mask pixels
    pub fn fill_ratio(&self) -> f32 {
        let box_area = (self.width() * self.height()) as f32;
        if box_area == 0.0 {
            return 0.0;
        }
        self.pixel_count as f32 / box_area
    }

    pub fn to_region(&self) -> HitRegion {
        HitRegion::new(
            self.min_x as i32,
            self.min_y as i32,
            self.width(),
            self.height(),
        )
    }
}

/// Geometry and timing reported by an opened video source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// May be zero or negative when the container does not carry a count
    pub total_frames: i64,
}
