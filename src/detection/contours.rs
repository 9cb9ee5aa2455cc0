use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::models::Contour;

/// Blobs of a binary mask (non-zero = foreground) with at least `min_area`
/// pixels, ordered top to bottom then left to right
pub fn find_contours(mask: &GrayImage, min_area: u32) -> Vec<Contour> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0]));

    let mut blobs: HashMap<u32, Contour> = HashMap::new();
    for (x, y, Luma([label])) in labels.enumerate_pixels() {
        if *label == 0 {
            continue;
        }
        blobs
            .entry(*label)
            .and_modify(|blob| blob.include(x, y))
            .or_insert_with(|| Contour::seed(*label, x, y));
    }

    let mut contours: Vec<Contour> = blobs
        .into_values()
        .filter(|blob| blob.pixel_count >= min_area)
        .collect();
    contours.sort_by_key(|blob| (blob.min_y, blob.min_x));
    contours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_blobs_found_in_scan_order() {
        let mut mask = GrayImage::new(20, 20);
        for y in 2..5 {
            for x in 12..16 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 10..14 {
            for x in 1..4 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }

        let contours = find_contours(&mask, 1);
        assert_eq!(contours.len(), 2);
        assert_eq!((contours[0].min_x, contours[0].min_y), (12, 2));
        assert_eq!(contours[0].area(), 12);
        assert_eq!((contours[1].width(), contours[1].height()), (3, 4));
    }

    #[test]
    fn test_min_area_filters_specks() {
        let mut mask = GrayImage::new(8, 8);
        mask.put_pixel(3, 3, Luma([255]));
        assert!(find_contours(&mask, 2).is_empty());
    }
}
