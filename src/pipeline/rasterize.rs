//! Markup rasterisation: SVG text → RGBA surface via resvg.
//!
//! Every call allocates its own pixmap, so concurrent exports never share a
//! drawing surface. The natural size comes from the markup's `width`/`height`
//! or `viewBox`; markup with neither is laid out at the configured fallback
//! size.

use image::RgbaImage;
use resvg::tiny_skia::{Color, Pixmap};
use resvg::usvg::{self, fontdb, Options, Size, Transform, Tree};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Background painted before the markup is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    Transparent,
    White,
}

/// System fonts, loaded once per process on first use.
fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            debug!("Loaded {} font faces", db.len());
            Arc::new(db)
        })
        .clone()
}

/// Parse markup into a render tree.
fn parse(markup: &str, fallback_size: (u32, u32)) -> Result<Tree, String> {
    let mut options = Options {
        fontdb: font_database(),
        ..Options::default()
    };
    if let Some(size) = Size::from_wh(fallback_size.0 as f32, fallback_size.1 as f32) {
        options.default_size = size;
    }
    Tree::from_str(markup, &options).map_err(|e| format!("Failed to parse SVG: {e}"))
}

/// Natural pixel size of the markup, rounded up.
#[cfg(test)]
fn natural_size(markup: &str, fallback_size: (u32, u32)) -> Result<(u32, u32), String> {
    let tree = parse(markup, fallback_size)?;
    Ok(pixel_size(tree.size(), 1.0))
}

fn pixel_size(size: usvg::Size, scale: f32) -> (u32, u32) {
    (
        (size.width() * scale).ceil() as u32,
        (size.height() * scale).ceil() as u32,
    )
}

/// Draw markup at `scale` × its natural size onto a fresh surface.
///
/// Fails without allocating when the surface would exceed `max_pixels`.
pub fn rasterize_markup(
    markup: &str,
    scale: f32,
    background: Background,
    fallback_size: (u32, u32),
    max_pixels: u64,
) -> Result<RgbaImage, String> {
    let tree = parse(markup, fallback_size)?;
    let (width, height) = pixel_size(tree.size(), scale);
    let pixels = width as u64 * height as u64;
    if pixels > max_pixels {
        return Err(format!(
            "{width}x{height} surface ({pixels} px) exceeds the raster limit of {max_pixels} px"
        ));
    }

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| format!("Cannot allocate a {width}x{height} surface"))?;
    if background == Background::White {
        pixmap.fill(Color::WHITE);
    }
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
    debug!("Rasterised markup → {}x{} px (scale {})", width, height, scale);

    Ok(pixmap_to_image(&pixmap))
}

/// Convert tiny-skia's premultiplied pixels into straight-alpha RGBA.
fn pixmap_to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    image
}
