//! Per-format export: canonical representation → encoded bytes.
//!
//! Every call starts from the canonical representation and draws onto its
//! own scratch surface, so encodes are independent of each other and safe
//! to run concurrently. Nothing is cached; exporting twice with unchanged
//! state produces identical bytes.
//!
//! | Format | Markup source                       | Page source                  |
//! |--------|-------------------------------------|------------------------------|
//! | svg    | stored markup, verbatim             | unavailable                  |
//! | ai     | stored markup under `.ai` + notice  | unavailable                  |
//! | pdf    | natural size on white → 1-page PDF  | page under cursor → 1-page PDF |
//! | png    | `raster_scale`×, transparent        | page under cursor            |
//! | jpg    | `raster_scale`×, on white           | page under cursor, on white  |

use crate::config::ConverterConfig;
use crate::document::{CanonicalRepresentation, SourceDocument};
use crate::error::ExportError;
use crate::format::ExportFormat;
use crate::output::EncodedExport;
use crate::pipeline::encode::{composite_on_white, encode_jpeg, encode_png};
use crate::pipeline::pdf::{encode_single_page_pdf, POINTS_PER_CSS_PIXEL};
use crate::pipeline::rasterize::{rasterize_markup, Background};
use crate::preview::PageCursor;
use image::RgbaImage;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Shown with every AI export.
pub const AI_APPROXIMATION_NOTICE: &str =
    "AI export is SVG markup saved with an .ai extension; native Illustrator encoding is not produced";

/// `{base}.{ext}`, or `{base}_page{n}.{ext}` for a page of a paginated source.
pub fn export_file_name(
    source: &SourceDocument,
    format: ExportFormat,
    page_num: Option<usize>,
) -> String {
    file_name_with_extension(source, format.extension(), page_num)
}

fn file_name_with_extension(
    source: &SourceDocument,
    extension: &str,
    page_num: Option<usize>,
) -> String {
    match page_num {
        Some(n) => format!("{}_page{}.{}", source.base_name(), n, extension),
        None => format!("{}.{}", source.base_name(), extension),
    }
}

/// Encode the canonical representation in `format`.
///
/// For paginated sources the page under `cursor` is exported.
pub fn encode_export(
    source: &SourceDocument,
    canonical: &CanonicalRepresentation,
    cursor: PageCursor,
    format: ExportFormat,
    config: &ConverterConfig,
) -> Result<EncodedExport, ExportError> {
    let page_num = canonical.is_paginated().then(|| current_index(canonical, cursor) + 1);
    let file_name = export_file_name(source, format, page_num);

    let encoded = match format {
        ExportFormat::Svg | ExportFormat::Ai => {
            let markup = canonical
                .markup()
                .ok_or_else(|| ExportError::FormatUnavailable {
                    format,
                    reason: "the source is a rasterised document with no vector markup".into(),
                })?;
            EncodedExport {
                format,
                file_name,
                mime_type: format.mime_type(),
                bytes: markup.as_bytes().to_vec(),
                notice: (format == ExportFormat::Ai).then(|| AI_APPROXIMATION_NOTICE.to_string()),
            }
        }

        ExportFormat::Pdf => {
            let (surface, points_per_pixel) = surface_for(
                canonical,
                cursor,
                1.0,
                Background::White,
                format,
                config,
            )?;
            match encode_single_page_pdf(&composite_on_white(&surface), points_per_pixel) {
                Ok(pdf) => EncodedExport {
                    format,
                    file_name,
                    mime_type: format.mime_type(),
                    bytes: pdf.bytes,
                    notice: None,
                },
                Err(e) => {
                    warn!("PDF encoding failed for '{}': {}; falling back to PNG", file_name, e);
                    let bytes = encode_png(&surface).map_err(|png_err| {
                        ExportError::EncodeFailure {
                            format,
                            detail: format!("{e}; PNG fallback also failed: {png_err}"),
                        }
                    })?;
                    EncodedExport {
                        format,
                        file_name: file_name_with_extension(source, "png", page_num),
                        mime_type: ExportFormat::Png.mime_type(),
                        bytes,
                        notice: Some(format!(
                            "PDF encoding failed ({e}); saved a PNG of the same image instead"
                        )),
                    }
                }
            }
        }

        ExportFormat::Png | ExportFormat::Jpg => {
            let (surface, _) = surface_for(
                canonical,
                cursor,
                config.raster_scale,
                Background::Transparent,
                format,
                config,
            )?;
            let bytes = if format == ExportFormat::Png {
                encode_png(&surface)
            } else {
                encode_jpeg(&surface, config.jpeg_quality)
            }
            .map_err(|e| ExportError::EncodeFailure {
                format,
                detail: e.to_string(),
            })?;
            EncodedExport {
                format,
                file_name,
                mime_type: format.mime_type(),
                bytes,
                notice: None,
            }
        }
    };

    debug!(
        "Encoded {} → '{}' ({} bytes, {})",
        format,
        encoded.file_name,
        encoded.bytes.len(),
        encoded.mime_type
    );
    Ok(encoded)
}

fn current_index(canonical: &CanonicalRepresentation, cursor: PageCursor) -> usize {
    cursor
        .index()
        .min(canonical.page_count().saturating_sub(1))
}

/// The raster to encode, plus the PDF points each of its pixels spans.
///
/// Markup is drawn at `markup_scale` onto a fresh surface. A page surface is
/// borrowed as-is; it was rendered at `render_scale` pixels per point.
fn surface_for<'a>(
    canonical: &'a CanonicalRepresentation,
    cursor: PageCursor,
    markup_scale: f32,
    background: Background,
    format: ExportFormat,
    config: &ConverterConfig,
) -> Result<(Cow<'a, RgbaImage>, f32), ExportError> {
    match canonical {
        CanonicalRepresentation::MarkupText(markup) => {
            let image = rasterize_markup(
                markup,
                markup_scale,
                background,
                config.fallback_size,
                config.max_raster_pixels,
            )
            .map_err(|detail| ExportError::EncodeFailure { format, detail })?;
            Ok((Cow::Owned(image), POINTS_PER_CSS_PIXEL / markup_scale))
        }
        CanonicalRepresentation::PageSurfaces { pages, .. } => {
            let surface = pages
                .get(current_index(canonical, cursor))
                .ok_or_else(|| ExportError::FormatUnavailable {
                    format,
                    reason: "no rendered page is available".into(),
                })?;
            Ok((Cow::Borrowed(&surface.image), 1.0 / config.render_scale))
        }
    }
}
