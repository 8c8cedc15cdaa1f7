//! Loaded-document types: the source description and its canonical form.

use crate::format::SourceKind;
use image::RgbaImage;
use serde::Serialize;

/// Immutable description of the file that was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDocument {
    pub file_name: String,
    pub kind: SourceKind,
    pub byte_size: u64,
}

impl SourceDocument {
    pub fn new(file_name: impl Into<String>, kind: SourceKind, byte_size: u64) -> Self {
        Self {
            file_name: file_name.into(),
            kind,
            byte_size,
        }
    }

    /// File name with a trailing `.svg` / `.ai` / `.pdf` removed (any case).
    ///
    /// Only a recognised extension is stripped, so `archive.tar.svg` becomes
    /// `archive.tar` and the export names stay predictable.
    pub fn base_name(&self) -> &str {
        let name = self.file_name.as_str();
        match name.rsplit_once('.') {
            Some((stem, ext))
                if ["svg", "ai", "pdf"]
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known)) =>
            {
                stem
            }
            _ => name,
        }
    }

    /// Size formatted the way the file-information panel shows it.
    pub fn display_size(&self) -> String {
        format!("{:.2} KB", self.byte_size as f64 / 1024.0)
    }
}

/// One rendered page of a paginated document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSurface {
    /// 1-indexed page number within the source document.
    pub page_num: usize,
    pub image: RgbaImage,
}

impl PageSurface {
    pub fn new(page_num: usize, image: RgbaImage) -> Self {
        Self { page_num, image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Single source of truth for the loaded document.
///
/// Exactly one variant exists per load; a new load replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalRepresentation {
    /// Raw SVG markup (SVG and AI sources).
    MarkupText(String),
    /// Rendered pages of a PDF source, in page order.
    PageSurfaces {
        pages: Vec<PageSurface>,
        /// Page count reported by the decoder, before the page limit applied.
        total_pages: usize,
    },
}

impl CanonicalRepresentation {
    pub fn markup(&self) -> Option<&str> {
        match self {
            CanonicalRepresentation::MarkupText(text) => Some(text),
            CanonicalRepresentation::PageSurfaces { .. } => None,
        }
    }

    pub fn pages(&self) -> &[PageSurface] {
        match self {
            CanonicalRepresentation::MarkupText(_) => &[],
            CanonicalRepresentation::PageSurfaces { pages, .. } => pages,
        }
    }

    /// Number of navigable pages: surfaces for a PDF, one for markup.
    pub fn page_count(&self) -> usize {
        match self {
            CanonicalRepresentation::MarkupText(_) => 1,
            CanonicalRepresentation::PageSurfaces { pages, .. } => pages.len(),
        }
    }

    pub fn is_paginated(&self) -> bool {
        matches!(self, CanonicalRepresentation::PageSurfaces { .. })
    }
}
