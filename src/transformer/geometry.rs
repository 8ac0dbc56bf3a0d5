//! Geometric steps of the transformer: merging, grayscale conversion, cropping,
//! rotating, splitting and letterboxing.

use image::imageops::{self, FilterType};
use image::{GenericImageView, ImageBuffer, Luma, RgbImage};

use crate::error::{Error, Result};
use crate::transformer::GrayF32Image;
use crate::types::{Direction, Rect, SplitMode, TargetSize};

/// Letterbox padding value, white.
const PAD_VALUE: f32 = 1.0;

/// Joins two pages of equal height side by side in reading order.
///
/// `first` is the earlier page: left of `second` for LTR, right of it for RTL.
pub fn merge_pages(first: &RgbImage, second: &RgbImage, direction: Direction) -> Result<RgbImage> {
    if first.height() != second.height() {
        return Err(Error::Invariant(format!(
            "Cannot merge pages of heights {} and {}",
            first.height(),
            second.height()
        )));
    }

    let (left, right) = match direction {
        Direction::Ltr => (first, second),
        Direction::Rtl => (second, first),
    };
    let mut spread = RgbImage::new(left.width() + right.width(), left.height());
    imageops::replace(&mut spread, left, 0, 0);
    imageops::replace(&mut spread, right, left.width() as i64, 0);
    Ok(spread)
}

/// Converts to floating point luma in `[0, 1]` with ITU-R 601 weights.
pub fn to_gray_f32(image: &RgbImage) -> GrayF32Image {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
        Luma([luma])
    })
}

/// Crops to `bbox`, clamped to the image. Empty boxes leave the image as is.
pub fn crop(image: GrayF32Image, bbox: Option<Rect>) -> GrayF32Image {
    let Some(bbox) = bbox else {
        return image;
    };
    let bounds = Rect::new(0, 0, image.width(), image.height());
    let rect = bbox.intersect(&bounds);
    if rect.is_empty() || rect == bounds {
        return image;
    }
    imageops::crop_imm(&image, rect.left, rect.top, rect.width(), rect.height()).to_image()
}

/// Aspect-preserving resize onto a white, centered canvas of `target`.
pub fn letterbox(image: GrayF32Image, target: Option<TargetSize>) -> GrayF32Image {
    let Some(target) = target else {
        return image;
    };
    let (width, height) = image.dimensions();
    let image_ratio = width as f64 / height as f64;

    let (new_width, new_height) = if image_ratio > target.aspect() {
        let h = (height as f64 / width as f64 * target.width as f64).round() as u32;
        (target.width, h.clamp(1, target.height))
    } else if image_ratio < target.aspect() {
        let w = (width as f64 / height as f64 * target.height as f64).round() as u32;
        (w.clamp(1, target.width), target.height)
    } else {
        (target.width, target.height)
    };

    let resized = imageops::resize(&image, new_width, new_height, FilterType::Lanczos3);
    if (new_width, new_height) == (target.width, target.height) {
        return resized;
    }

    let mut canvas = ImageBuffer::from_pixel(target.width, target.height, Luma([PAD_VALUE]));
    let x = ((target.width - new_width) as f64 / 2.0).round() as i64;
    let y = ((target.height - new_height) as f64 / 2.0).round() as i64;
    imageops::replace(&mut canvas, &resized, x, y);
    canvas
}

/// Horizontal extents of the two halves of a spread, in reading order.
///
/// With a target canvas and overlap enabled, a half narrower than the target aspect
/// is widened towards the other half until it fills the canvas on its own.
pub fn split_ranges(
    width: u32,
    height: u32,
    target: Option<TargetSize>,
    overlap: bool,
    direction: Direction,
) -> [(u32, u32); 2] {
    let half = width / 2;
    let mut first = (0, half);
    let mut second = (half, width);

    if let Some(target) = target {
        let half_ratio = half as f64 / height as f64;
        if overlap && half_ratio < target.aspect() {
            // A canvas wider than the whole spread caps both halves at the full width,
            // so each half shows the entire spread.
            let fill = ((target.width as u64 * height as u64) / target.height as u64)
                .min(width as u64) as u32;
            first = (0, fill);
            second = (width - fill, width);
        }
    }

    match direction {
        Direction::Ltr => [first, second],
        Direction::Rtl => [second, first],
    }
}

/// Derived page images of a unit, in output order.
///
/// A non-spread yields one image. Spreads yield, per `split_mode`: the whole page
/// (`None`), the page rotated to portrait (`Rotate`), both halves (`Split`), or the
/// rotated page followed by both halves (`Both`).
pub fn derive_pages(
    image: GrayF32Image,
    is_spread: bool,
    split_mode: SplitMode,
    overlap: bool,
    target: Option<TargetSize>,
    direction: Direction,
) -> Vec<GrayF32Image> {
    if !is_spread || split_mode == SplitMode::None {
        return vec![letterbox(image, target)];
    }

    let mut pages = Vec::with_capacity(3);
    if matches!(split_mode, SplitMode::Rotate | SplitMode::Both) {
        // Counter-clockwise, so the left page ends up at the bottom.
        pages.push(letterbox(imageops::rotate270(&image), target));
    }
    if matches!(split_mode, SplitMode::Split | SplitMode::Both) {
        let (width, height) = image.dimensions();
        for (start, end) in split_ranges(width, height, target, overlap, direction) {
            let half = image.view(start, 0, end - start, height).to_image();
            pages.push(letterbox(half, target));
        }
    }
    pages
}
