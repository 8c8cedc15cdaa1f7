//! PDF rasterisation: drive the decoder over the leading pages of a document.
//!
//! The decoder call runs inside `spawn_blocking` because pdfium is CPU-bound
//! and keeps thread-local state. Pages are rendered strictly in order, one at
//! a time; after each page the caller's `keep_going` check decides whether
//! the load is still current, so a superseded load stops early instead of
//! rendering pages nobody will see.

use crate::config::ConverterConfig;
use crate::decoder::{DecodeError, PaginatedDecoder, RenderRequest};
use crate::document::{PageSurface, SourceDocument};
use crate::error::{ConvertError, DecodeFailureKind};
use std::ops::ControlFlow;
use std::sync::Arc;
use tracing::{debug, info};

/// Pages produced by one render pass.
#[derive(Debug)]
pub struct RenderedPages {
    /// Rendered surfaces in page order.
    pub pages: Vec<PageSurface>,
    /// Page count reported by the decoder.
    pub total_pages: usize,
    /// `keep_going` returned false; the result must be discarded.
    pub superseded: bool,
}

/// Render up to `config.page_limit` pages of a PDF at `config.render_scale`.
pub async fn render_pages<F>(
    decoder: Arc<dyn PaginatedDecoder>,
    source: &SourceDocument,
    bytes: Vec<u8>,
    config: &ConverterConfig,
    keep_going: F,
) -> Result<RenderedPages, ConvertError>
where
    F: Fn() -> bool + Send + 'static,
{
    let request = RenderRequest {
        page_limit: config.page_limit,
        scale: config.render_scale,
        max_page_pixels: config.max_page_pixels,
        password: config.password.clone(),
    };
    let progress = config.progress_callback.clone();
    let limit = config.page_limit;

    let result = tokio::task::spawn_blocking(move || {
        let mut pages: Vec<PageSurface> = Vec::with_capacity(limit);
        let mut superseded = false;

        let total_pages = decoder.render_pages(&bytes, &request, &mut |surface| {
            if let Some(ref cb) = progress {
                cb.on_page_rendered(surface.page_num, limit);
            }
            pages.push(surface);
            if keep_going() {
                ControlFlow::Continue(())
            } else {
                superseded = true;
                ControlFlow::Break(())
            }
        })?;

        Ok::<_, DecodeError>(RenderedPages {
            pages,
            total_pages,
            superseded,
        })
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?;

    let mut rendered = result.map_err(|e| decode_failure(source, e))?;

    if rendered.superseded {
        debug!("Render of '{}' superseded", source.file_name);
        return Ok(rendered);
    }

    if rendered.pages.is_empty() {
        return Err(ConvertError::DecodeFailure {
            file_name: source.file_name.clone(),
            kind: DecodeFailureKind::MalformedContainer,
            detail: "document has no pages".to_string(),
        });
    }

    rendered.pages.truncate(limit);
    info!(
        "Rendered {}/{} pages of '{}'",
        rendered.pages.len(),
        rendered.total_pages,
        source.file_name
    );
    Ok(rendered)
}

/// Map a decoder error onto the session error taxonomy.
fn decode_failure(source: &SourceDocument, err: DecodeError) -> ConvertError {
    let file_name = source.file_name.clone();
    match err {
        DecodeError::Unavailable(detail) => ConvertError::DecoderUnavailable(detail),
        DecodeError::AccessRestricted(detail) => ConvertError::DecodeFailure {
            file_name,
            kind: DecodeFailureKind::AccessRestricted,
            detail,
        },
        DecodeError::Oversized { .. } => ConvertError::DecodeFailure {
            file_name,
            kind: DecodeFailureKind::Oversized,
            detail: err.to_string(),
        },
        DecodeError::Malformed(_) | DecodeError::PageRender { .. } => {
            ConvertError::DecodeFailure {
                file_name,
                kind: DecodeFailureKind::MalformedContainer,
                detail: err.to_string(),
            }
        }
    }
}
