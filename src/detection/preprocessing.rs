use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;

/// Colour thresholds for the painted parts of a sign
#[derive(Debug, Clone, Copy)]
pub struct HueThresholds {
    /// Minimum value of the dominant channel
    pub min_intensity: u8,
    /// How many times larger the dominant channel must be than the others
    pub dominance: f32,
}

fn dominates(main: u8, a: u8, b: u8, t: &HueThresholds) -> bool {
    main >= t.min_intensity
        && main as f32 >= a as f32 * t.dominance
        && main as f32 >= b as f32 * t.dominance
}

/// Binary mask (255 = sign colour) of red- or blue-dominant pixels
pub fn sign_color_mask(img: &RgbImage, thresholds: &HueThresholds) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut mask = GrayImage::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if dominates(r, g, b, thresholds) || dominates(b, r, g, thresholds) {
            mask.put_pixel(x, y, Luma([255u8]));
        }
    }

    mask
}

/// Grow the mask so sign rims broken by glare join into one region
pub fn close_gaps(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    dilate(mask, Norm::LInf, radius)
}
