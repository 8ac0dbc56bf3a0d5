//! Tone mapping for e-ink output: gamma correction with contrast stretch, and
//! quantization to a 16-level gray palette with Floyd-Steinberg dithering.

use image::imageops::{self, ColorMap};
use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::transformer::GrayF32Image;

/// Distance between two palette levels: 0x00, 0x11, ..., 0xFF.
const PALETTE_STEP: u8 = 0x11;
/// Number of gray levels in the output palette.
pub const PALETTE_LEVELS: usize = 16;

/// Applies `gamma` to a `[0, 1]` grayscale image and stretches the result to the
/// full `0..=255` range using the image's own minimum and maximum.
///
/// A flat image cannot be stretched and is only scaled to `0..=255`.
pub fn gamma_correct(image: &GrayF32Image, gamma: f64) -> GrayImage {
    let corrected: Vec<f64> = image
        .pixels()
        .map(|p| (p.0[0] as f64).clamp(0.0, 1.0).powf(gamma))
        .collect();

    let (min, max) = corrected
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    let (offset, scale) = if max > min {
        (min, 255.0 / (max - min))
    } else {
        (0.0, 255.0)
    };

    let mut out = GrayImage::new(image.width(), image.height());
    for (pixel, value) in out.pixels_mut().zip(corrected) {
        pixel.0[0] = ((value - offset) * scale).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// The fixed 16-level gray palette.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayPalette;

impl ColorMap for GrayPalette {
    type Color = Luma<u8>;

    fn index_of(&self, color: &Luma<u8>) -> usize {
        ((color.0[0] as usize + PALETTE_STEP as usize / 2) / PALETTE_STEP as usize)
            .min(PALETTE_LEVELS - 1)
    }

    fn lookup(&self, index: usize) -> Option<Luma<u8>> {
        (index < PALETTE_LEVELS).then(|| Luma([index as u8 * PALETTE_STEP]))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Luma<u8>) {
        let index = self.index_of(color);
        color.0[0] = index as u8 * PALETTE_STEP;
    }
}

/// Dithers to the 16-level palette and expands to three channels for encoding.
pub fn quantize(mut image: GrayImage) -> RgbImage {
    imageops::dither(&mut image, &GrayPalette);
    DynamicImage::ImageLuma8(image).to_rgb8()
}
