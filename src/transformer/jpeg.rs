//! JPEG output for finished pages.
//!
//! Pages are encoded as baseline JPEG with Huffman tables optimized for the page's own
//! symbol statistics. The tables only change the entropy coding, so an optimized page
//! decodes to exactly the same pixels as one written with the standard tables.

use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::{Error, Result};

/// Encodes a page as baseline JPEG with optimized Huffman tables.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    encode(image, quality, true)
}

/// Baseline JPEG with the standard Huffman tables.
pub fn encode_baseline(image: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    encode(image, quality, false)
}

fn encode(image: &RgbImage, quality: u8, optimize: bool) -> Result<Vec<u8>> {
    let (width, height) = image.dimensions();
    let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
        return Err(Error::Unsupported(format!(
            "JPEG pages are limited to 65535 pixels per side, got {}x{}",
            width, height
        )));
    };

    let mut bytes = Vec::new();
    let mut encoder = Encoder::new(&mut bytes, quality);
    encoder.set_optimized_huffman_tables(optimize);
    encoder.encode(image.as_raw(), w, h, ColorType::Rgb)?;

    log::trace!(
        "Encoded {}x{} page at quality {}: {} bytes",
        width,
        height,
        quality,
        bytes.len()
    );
    Ok(bytes)
}
