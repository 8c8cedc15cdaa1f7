//! Preview projection and page navigation.
//!
//! The preview holds no state of its own: it is a pure function of the
//! canonical representation and the pagination cursor. Markup is shown as-is
//! (vector-faithful); paginated documents show the rendered surface under the
//! cursor.

use crate::document::{CanonicalRepresentation, PageSurface, SourceDocument};
use std::sync::Arc;

/// Index into the page-surface sequence, clamped to `[0, len - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageCursor {
    index: usize,
    len: usize,
}

impl PageCursor {
    /// Cursor at the first page of a `len`-page sequence.
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    /// 0-based index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based position within the sequence.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.len
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    /// Advance one page; stays put on the last page.
    pub fn next(&mut self) -> usize {
        if self.has_next() {
            self.index += 1;
        }
        self.index
    }

    /// Step back one page; stays put on the first page.
    pub fn previous(&mut self) -> usize {
        self.index = self.index.saturating_sub(1);
        self.index
    }

    /// Jump to a 1-based page, clamped to the sequence bounds.
    pub fn go_to(&mut self, page_num: usize) -> usize {
        self.index = page_num
            .saturating_sub(1)
            .min(self.len.saturating_sub(1));
        self.index
    }
}

/// What to display for a loaded document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviewContent<'a> {
    /// Markup injected directly for vector display.
    Markup(&'a str),
    /// A rendered page shown as a raster image.
    Page {
        surface: &'a PageSurface,
        /// 1-based position in the surface sequence.
        position: usize,
        page_count: usize,
        has_previous: bool,
        has_next: bool,
    },
}

/// Project a canonical representation at a cursor into displayable content.
pub fn project(canonical: &CanonicalRepresentation, cursor: PageCursor) -> PreviewContent<'_> {
    match canonical {
        CanonicalRepresentation::MarkupText(text) => PreviewContent::Markup(text),
        CanonicalRepresentation::PageSurfaces { pages, .. } => {
            let index = cursor.index().min(pages.len().saturating_sub(1));
            match pages.get(index) {
                Some(surface) => PreviewContent::Page {
                    surface,
                    position: index + 1,
                    page_count: pages.len(),
                    has_previous: index > 0,
                    has_next: index + 1 < pages.len(),
                },
                // Ingestion never installs an empty page sequence.
                None => PreviewContent::Markup(""),
            }
        }
    }
}

/// Session-level preview state.
#[derive(Debug, Clone)]
pub enum Preview {
    /// Nothing loaded yet.
    Empty,
    /// Ingestion in flight; show a loading indicator.
    Loading { file_name: String },
    /// The last load failed; nothing to show.
    Failed { file_name: String, message: String },
    /// A document is loaded.
    Ready {
        source: SourceDocument,
        canonical: Arc<CanonicalRepresentation>,
        cursor: PageCursor,
    },
}

impl Preview {
    /// Displayable content, when a document is loaded.
    pub fn content(&self) -> Option<PreviewContent<'_>> {
        match self {
            Preview::Ready {
                canonical, cursor, ..
            } => Some(project(canonical, *cursor)),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Preview::Loading { .. })
    }
}
