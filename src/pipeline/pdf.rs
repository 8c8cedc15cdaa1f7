//! One-page PDF output: RGB surface → PDF bytes via pdf-writer.
//!
//! The surface is embedded as a single Flate-compressed image XObject that
//! fills the page. The page box has the same aspect ratio as the surface:
//! portrait when height ≥ width, landscape otherwise.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// CSS pixels are 1/96 in; PDF points are 1/72 in.
pub const POINTS_PER_CSS_PIXEL: f32 = 0.75;

/// Longest page side readers are required to handle (200 in).
pub const MAX_PAGE_POINTS: f32 = 14_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn for_size(width: u32, height: u32) -> Self {
        if width > height {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        }
    }
}

/// Page geometry for a surface, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub orientation: PageOrientation,
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageBox {
    pub fn for_surface(width_px: u32, height_px: u32, points_per_pixel: f32) -> Self {
        let orientation = PageOrientation::for_size(width_px, height_px);
        let a = width_px as f32 * points_per_pixel;
        let b = height_px as f32 * points_per_pixel;
        let (long, short) = if a >= b { (a, b) } else { (b, a) };
        let (width_pt, height_pt) = match orientation {
            PageOrientation::Landscape => (long, short),
            PageOrientation::Portrait => (short, long),
        };
        Self {
            orientation,
            width_pt,
            height_pt,
        }
    }
}

/// An encoded one-page document.
#[derive(Debug, Clone)]
pub struct EncodedPdf {
    pub bytes: Vec<u8>,
    pub page_box: PageBox,
}

/// Encode `image` as a one-page PDF whose page exactly fits the image.
pub fn encode_single_page_pdf(
    image: &RgbImage,
    points_per_pixel: f32,
) -> Result<EncodedPdf, String> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("Cannot encode an empty {width}x{height} surface"));
    }
    let page_box = PageBox::for_surface(width, height, points_per_pixel);
    if page_box.width_pt > MAX_PAGE_POINTS || page_box.height_pt > MAX_PAGE_POINTS {
        return Err(format!(
            "page of {}x{} pt exceeds the {MAX_PAGE_POINTS} pt page size limit",
            page_box.width_pt, page_box.height_pt
        ));
    }

    let compressed =
        deflate(image.as_raw()).map_err(|e| format!("Image stream compression failed: {e}"))?;

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let page_tree_id = alloc.bump();
    let page_id = alloc.bump();
    let content_id = alloc.bump();
    let image_id = alloc.bump();
    let image_name = Name(b"Im1");

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(page_tree_id);
    pdf.pages(page_tree_id).kids([page_id]).count(1);

    let mut page = pdf.page(page_id);
    page.media_box(Rect::new(0.0, 0.0, page_box.width_pt, page_box.height_pt));
    page.parent(page_tree_id);
    page.contents(content_id);
    page.resources().x_objects().pair(image_name, image_id);
    page.finish();

    let mut xobject = pdf.image_xobject(image_id, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(width as i32);
    xobject.height(height as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([page_box.width_pt, 0.0, 0.0, page_box.height_pt, 0.0, 0.0]);
    content.x_object(image_name);
    content.restore_state();
    pdf.stream(content_id, &content.finish());

    let bytes = pdf.finish();
    debug!(
        "Encoded {}x{} px → {} bytes PDF ({:?}, {}x{} pt)",
        width,
        height,
        bytes.len(),
        page_box.orientation,
        page_box.width_pt,
        page_box.height_pt
    );

    Ok(EncodedPdf { bytes, page_box })
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}
