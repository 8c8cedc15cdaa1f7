//! Format identifiers for inputs and exports.
//!
//! Inputs are classified purely by file extension; the byte content is only
//! inspected later by the ingestion stage. Export formats carry their own
//! extension and MIME type so naming and saving never need a lookup table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The declared kind of a loaded source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// SVG markup.
    Svg,
    /// Pseudo-AI: treated as SVG markup text.
    Ai,
    /// Paginated document, rasterised page by page.
    Pdf,
}

impl SourceKind {
    /// Classify a file name by its extension (case-insensitive).
    ///
    /// Returns `None` for anything outside `svg`, `ai`, `pdf`, including
    /// names with no extension at all.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "svg" => Some(SourceKind::Svg),
            "ai" => Some(SourceKind::Ai),
            "pdf" => Some(SourceKind::Pdf),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Svg => "svg",
            SourceKind::Ai => "ai",
            SourceKind::Pdf => "pdf",
        }
    }

    /// `true` for kinds whose canonical form is markup text.
    pub fn is_markup(self) -> bool {
        matches!(self, SourceKind::Svg | SourceKind::Ai)
    }

    /// The export format sharing this kind's identifier.
    pub fn as_export_format(self) -> ExportFormat {
        match self {
            SourceKind::Svg => ExportFormat::Svg,
            SourceKind::Ai => ExportFormat::Ai,
            SourceKind::Pdf => ExportFormat::Pdf,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.extension())
    }
}

/// A target format the pipeline can export to.
///
/// Variant order is the canonical display and export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Svg,
    Ai,
    Pdf,
    Png,
    Jpg,
}

impl ExportFormat {
    /// Every export format, in canonical order.
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Svg,
        ExportFormat::Ai,
        ExportFormat::Pdf,
        ExportFormat::Png,
        ExportFormat::Jpg,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Svg => "svg",
            ExportFormat::Ai => "ai",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }

    /// MIME type of a successful export in this format.
    ///
    /// AI exports are SVG markup under an `.ai` name, so they share the SVG
    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Svg | ExportFormat::Ai => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Jpg => "image/jpeg",
        }
    }

    /// Formats offered for a source of the given kind (everything but itself).
    pub fn available_for(source: SourceKind) -> Vec<ExportFormat> {
        let own = source.as_export_format();
        Self::ALL.into_iter().filter(|f| *f != own).collect()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.extension())
    }
}

/// Error returned when parsing an unknown format identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFormat(pub String);

impl fmt::Display for UnknownFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown format '{}' (expected svg, ai, pdf, png or jpg)",
            self.0
        )
    }
}

impl std::error::Error for UnknownFormat {}

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(ExportFormat::Svg),
            "ai" => Ok(ExportFormat::Ai),
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}
