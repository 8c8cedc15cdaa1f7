//! Error types for the edgequake-vecconv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Session-level**: ingestion or a session operation
//!   could not proceed (unsupported extension, corrupt markup, undecodable
//!   PDF, no document loaded). Returned as `Err(ConvertError)` from the
//!   [`crate::session::Session`] methods.
//!
//! * [`ExportError`] — **Per-format**: a single export failed (SVG requested
//!   from a PDF source, an encoder rejected the surface, the sink could not
//!   write) but every other selected format is unaffected. Stored inside
//!   [`crate::output::ExportOutcome`] so one bad format never aborts the rest.

use crate::format::ExportFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why a paginated document could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeFailureKind {
    /// Header, trailer or xref is broken, or a page failed to render.
    MalformedContainer,
    /// The document is encrypted and the password is missing or wrong.
    AccessRestricted,
    /// The input or a rendered page exceeds the configured size limits.
    Oversized,
}

impl fmt::Display for DecodeFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DecodeFailureKind::MalformedContainer => "malformed container",
            DecodeFailureKind::AccessRestricted => "access restricted",
            DecodeFailureKind::Oversized => "oversized",
        })
    }
}

/// All session-level errors returned by the edgequake-vecconv library.
///
/// Per-format export failures use [`ExportError`] and are stored in
/// [`crate::output::ExportOutcome`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Extension is not one of svg, ai, pdf. Session state is untouched.
    #[error("Unsupported file '{file_name}'\nPlease select a vector file (SVG, AI, or PDF).")]
    UnsupportedFormat { file_name: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Markup input is not text or lacks an `<svg …>…</svg>` root.
    #[error("'{file_name}' is not valid vector markup: {detail}")]
    CorruptMarkup { file_name: String, detail: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The decoder rejected the document or one of its pages.
    #[error("Could not decode '{file_name}' ({kind}): {detail}")]
    DecodeFailure {
        file_name: String,
        kind: DecodeFailureKind,
        detail: String,
    },

    /// No paginated-document decoder is available in this session.
    #[error(
        "PDF decoder unavailable: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib to enable PDF input.\n"
    )]
    DecoderUnavailable(String),

    // ── Session errors ────────────────────────────────────────────────────
    /// The operation needs a successfully loaded document.
    #[error("No document is loaded")]
    NoDocument,

    /// Export was requested with an empty selection.
    #[error("No export format selected")]
    NothingSelected,

    /// A format equal to the source's own format was toggled.
    #[error("'{format}' is the source format and cannot be selected for export")]
    SourceFormatSelected { format: ExportFormat },

    /// A newer load started while this one was in flight; its result was dropped.
    #[error("Load of '{file_name}' was superseded by a newer load (generation {generation})")]
    Superseded { file_name: String, generation: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// `true` for errors raised before ingestion touched any session state.
    pub fn leaves_state_unchanged(&self) -> bool {
        matches!(
            self,
            ConvertError::UnsupportedFormat { .. }
                | ConvertError::FileNotFound { .. }
                | ConvertError::PermissionDenied { .. }
                | ConvertError::Superseded { .. }
        )
    }
}

/// A non-fatal error for a single export format.
///
/// Stored alongside the other outcomes in [`crate::output::ExportReport`].
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ExportError {
    /// The format cannot be produced from the current canonical representation.
    #[error("{format} export not available: {reason}")]
    FormatUnavailable { format: ExportFormat, reason: String },

    /// The offscreen surface or the byte encoder failed.
    #[error("{format} encoding failed: {detail}")]
    EncodeFailure { format: ExportFormat, detail: String },

    /// The sink could not store the encoded bytes.
    #[error("Saving '{file_name}' failed: {detail}")]
    SaveFailed {
        format: ExportFormat,
        file_name: String,
        detail: String,
    },
}

impl ExportError {
    pub fn format(&self) -> ExportFormat {
        match self {
            ExportError::FormatUnavailable { format, .. }
            | ExportError::EncodeFailure { format, .. }
            | ExportError::SaveFailed { format, .. } => *format,
        }
    }
}
