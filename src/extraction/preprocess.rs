//! Page image cleanup ahead of Tesseract.
//!
//! Grayscale, upscale short scans, 3x3 median denoise, then local adaptive
//! binarization so that pen marks survive uneven lighting.

use std::sync::LazyLock;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use regex::Regex;

/// Radius of the median filter window (1 = 3x3).
const MEDIAN_RADIUS: u32 = 1;

/// Radius of the adaptive threshold block (15 = 31x31).
const THRESHOLD_RADIUS: u32 = 15;

static ROTATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Rotate:\s*(\d+)").unwrap());

/// Clean up a rendered page for OCR.
pub fn preprocess(image: &DynamicImage, target_height: u32) -> GrayImage {
    let gray = upscale(image.to_luma8(), target_height);
    let denoised = imageproc::filter::median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    imageproc::contrast::adaptive_threshold(&denoised, THRESHOLD_RADIUS)
}

/// Scale up with a cubic filter so the page is at least `target_height`
/// pixels tall. Taller images are returned unchanged.
pub fn upscale(image: GrayImage, target_height: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if height == 0 || height >= target_height {
        return image;
    }
    let scale = target_height as f64 / height as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    image::imageops::resize(&image, new_width, target_height, FilterType::CatmullRom)
}

/// Rotate clockwise by the angle Tesseract OSD reports. Angles other than
/// 90, 180 and 270 leave the image as-is.
pub fn rotate(image: DynamicImage, degrees: u32) -> DynamicImage {
    match degrees % 360 {
        90 => image.rotate90(),
        180 => image.rotate180(),
        270 => image.rotate270(),
        _ => image,
    }
}

/// Parse the `Rotate: N` line of `tesseract --psm 0` output.
pub fn parse_osd_rotation(osd: &str) -> Option<u32> {
    ROTATE_RE
        .captures(osd)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
