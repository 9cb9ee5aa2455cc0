use image::{Luma, Pixel, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detection::DetectionEngine;
use crate::models::{Frame, HitRegion};

/// Draws a fixed-style outline around every detected region.
#[derive(Debug, Clone, Copy)]
pub struct FrameAnnotator {
    pub color: [u8; 3],
    pub thickness: u32,
}

impl FrameAnnotator {
    pub fn new(color: [u8; 3], thickness: u32) -> Self {
        Self {
            color,
            thickness: thickness.max(1),
        }
    }

    /// Run `engine` on `frame` and outline each hit.
    ///
    /// Mutates `frame` in place: callers that write the frame afterwards see
    /// the markers. Every reported region is drawn once, overlapping or
    /// not. Returns the number of regions.
    pub fn annotate(&self, frame: &mut Frame, engine: &dyn DetectionEngine) -> usize {
        let regions = engine.detect(frame);
        for region in &regions {
            self.draw(frame, region);
        }
        regions.len()
    }

    /// Outline one region, growing outwards by `thickness` pixels
    pub fn draw(&self, frame: &mut Frame, region: &HitRegion) {
        for k in 0..self.thickness {
            let grow = k as i32;
            let rect = Rect::at(region.x - grow, region.y - grow).of_size(
                region.width.max(1) + 2 * k,
                region.height.max(1) + 2 * k,
            );
            match frame {
                Frame::Color(img) => draw_hollow_rect_mut(img, rect, Rgb(self.color)),
                Frame::Gray(img) => {
                    let Luma([level]) = Rgb(self.color).to_luma();
                    draw_hollow_rect_mut(img, rect, Luma([level]))
                }
            }
        }
    }
}

impl Default for FrameAnnotator {
    fn default() -> Self {
        Self::new([0, 255, 0], 4)
    }
}
