//! Paginated-document decoder capability.
//!
//! PDF ingestion needs something that can open a document and rasterise its
//! pages. That capability is injected into the [`crate::session::Session`] at
//! construction instead of living in a global: a session built without a
//! decoder reports [`ConvertError::DecoderUnavailable`] for PDF input, which
//! is a different failure from a malformed file.
//!
//! [`PdfiumDecoder`] is the production implementation on top of
//! `pdfium-render`. Tests and embedders can supply their own
//! [`PaginatedDecoder`].

use crate::document::PageSurface;
use crate::error::ConvertError;
use pdfium_render::prelude::*;
use std::ops::ControlFlow;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// What to render from a paginated document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    /// Render at most this many pages, starting at page 1.
    pub page_limit: usize,
    /// Magnification factor applied to each page.
    pub scale: f32,
    /// Reject pages whose rendered area exceeds this many pixels.
    pub max_page_pixels: u64,
    /// User password for encrypted documents.
    pub password: Option<String>,
}

/// Failure reported by a [`PaginatedDecoder`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("decoder unavailable: {0}")]
    Unavailable(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("access restricted: {0}")]
    AccessRestricted(String),

    #[error("page {page} too large: {detail}")]
    Oversized { page: usize, detail: String },

    #[error("page {page} failed to render: {detail}")]
    PageRender { page: usize, detail: String },
}

/// Opens a paginated document and renders its leading pages.
///
/// Implementations render pages strictly in order, one at a time, handing
/// each surface to `on_page`. Returning [`ControlFlow::Break`] from `on_page`
/// stops the loop after the current page (used to abandon stale loads).
/// The return value is the document's total page count.
///
/// This is a blocking call; the pipeline runs it under `spawn_blocking`.
pub trait PaginatedDecoder: Send + Sync {
    fn render_pages(
        &self,
        bytes: &[u8],
        request: &RenderRequest,
        on_page: &mut dyn FnMut(PageSurface) -> ControlFlow<()>,
    ) -> Result<usize, DecodeError>;
}

/// Where to load the pdfium shared library from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfiumLibrary {
    /// Let the OS loader find `libpdfium` on its search path.
    System,
    /// An explicit library file, or a directory containing it.
    Path(PathBuf),
}

/// [`PaginatedDecoder`] backed by the pdfium C++ library.
///
/// pdfium uses thread-local state, so a fresh binding is created for every
/// call; the decoder itself only remembers where the library lives.
#[derive(Debug, Clone)]
pub struct PdfiumDecoder {
    library: PdfiumLibrary,
}

impl PdfiumDecoder {
    /// Bind to pdfium, failing with `DecoderUnavailable` if it cannot load.
    pub fn bind(library: PdfiumLibrary) -> Result<Self, ConvertError> {
        let decoder = Self { library };
        decoder
            .pdfium()
            .map_err(|e| ConvertError::DecoderUnavailable(e.to_string()))?;
        info!("PDF decoder ready ({:?})", decoder.library);
        Ok(decoder)
    }

    /// Bind using `PDFIUM_LIB_PATH` when set, else the system library.
    pub fn from_env() -> Result<Self, ConvertError> {
        match std::env::var_os("PDFIUM_LIB_PATH") {
            Some(path) if !path.is_empty() => Self::bind(PdfiumLibrary::Path(path.into())),
            _ => Self::bind(PdfiumLibrary::System),
        }
    }

    pub fn library(&self) -> &PdfiumLibrary {
        &self.library
    }

    fn pdfium(&self) -> Result<Pdfium, DecodeError> {
        let bindings = match &self.library {
            PdfiumLibrary::System => Pdfium::bind_to_system_library(),
            PdfiumLibrary::Path(path) if path.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            PdfiumLibrary::Path(path) => Pdfium::bind_to_library(path),
        }
        .map_err(|e| DecodeError::Unavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PaginatedDecoder for PdfiumDecoder {
    fn render_pages(
        &self,
        bytes: &[u8],
        request: &RenderRequest,
        on_page: &mut dyn FnMut(PageSurface) -> ControlFlow<()>,
    ) -> Result<usize, DecodeError> {
        let pdfium = self.pdfium()?;

        let document = pdfium
            .load_pdf_from_byte_slice(bytes, request.password.as_deref())
            .map_err(|e| classify_load_error(&format!("{:?}", e), request.password.is_some()))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(request.scale);

        for idx in 0..total_pages.min(request.page_limit) {
            let page_num = idx + 1;
            let page = pages
                .get(idx as u16)
                .map_err(|e| DecodeError::PageRender {
                    page: page_num,
                    detail: format!("{:?}", e),
                })?;

            let width = (page.width().value * request.scale).ceil().max(0.0) as u64;
            let height = (page.height().value * request.scale).ceil().max(0.0) as u64;
            if width.saturating_mul(height) > request.max_page_pixels {
                return Err(DecodeError::Oversized {
                    page: page_num,
                    detail: format!(
                        "{}x{} px exceeds the {} px limit",
                        width, height, request.max_page_pixels
                    ),
                });
            }

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                DecodeError::PageRender {
                    page: page_num,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image().into_rgba8();
            debug!(
                "Rendered page {} → {}x{} px",
                page_num,
                image.width(),
                image.height()
            );

            if on_page(PageSurface::new(page_num, image)).is_break() {
                debug!("Render loop stopped after page {}", page_num);
                break;
            }
        }

        Ok(total_pages)
    }
}

/// Map a pdfium load error message to a decode failure.
fn classify_load_error(detail: &str, password_given: bool) -> DecodeError {
    if detail.contains("Password") || detail.contains("password") {
        let reason = if password_given {
            "wrong password"
        } else {
            "document is encrypted and requires a password"
        };
        DecodeError::AccessRestricted(reason.to_string())
    } else if detail.contains("Memory") || detail.contains("memory") {
        DecodeError::Oversized {
            page: 0,
            detail: detail.to_string(),
        }
    } else {
        DecodeError::Malformed(detail.to_string())
    }
}
