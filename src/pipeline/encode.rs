//! Image encoding: RGBA surface → PNG or JPEG bytes.
//!
//! PNG keeps the alpha channel. JPEG has none, so surfaces are composited
//! onto white first; otherwise transparent regions would come out black.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;
use tracing::debug;

/// Encode a surface as PNG, preserving transparency.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Encode a surface as JPEG on a white background.
pub fn encode_jpeg(img: &RgbaImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let flattened = DynamicImage::ImageRgb8(composite_on_white(img));
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    flattened.write_with_encoder(encoder)?;
    debug!(
        "Encoded {}x{} → {} bytes JPEG (q={})",
        img.width(),
        img.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}

/// Alpha-blend a surface over an opaque white background.
pub fn composite_on_white(img: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (dst, src) in out.pixels_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        *dst = Rgb([blend(r), blend(g), blend(b)]);
    }
    out
}
