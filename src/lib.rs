//! # edgequake-vecconv
//!
//! Convert vector graphics between SVG, AI, PDF, PNG and JPG.
//!
//! ## Why this crate?
//!
//! Designers hand over logos and diagrams in whatever format their tool
//! produced: SVG markup, an `.ai` file that is really SVG, or a multi-page
//! PDF. Downstream consumers want a PNG for the web, a JPG for a slide, a
//! PDF for print. This crate loads one file, keeps a single canonical copy
//! of it in memory, previews it, and re-encodes it into any combination of
//! target formats in one pass.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file (svg / ai / pdf)
//!  │
//!  ├─ 1. Ingest   classify by extension, validate markup or render up to
//!  │              5 PDF pages via pdfium (spawn_blocking, page by page)
//!  ├─ 2. Preview  markup as-is, or the rendered page under the cursor
//!  └─ 3. Export   one concurrent task per selected format:
//!                 svg/ai verbatim · pdf one-page · png · jpg on white
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_vecconv::{ConverterConfig, ExportFormat, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::new(ConverterConfig::default());
//!     session.load_path("shape.svg").await?;
//!     session.toggle_format(ExportFormat::Png)?;
//!     session.toggle_format(ExportFormat::Jpg)?;
//!
//!     let report = session.export_to_dir("out").await?;
//!     for saved in report.saved() {
//!         println!("{} → {}", saved.format, saved.location);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! PDF input needs a decoder. [`PdfiumDecoder`] binds to `libpdfium` from
//! `PDFIUM_LIB_PATH` or the system library:
//!
//! ```rust,no_run
//! use edgequake_vecconv::{ConverterConfig, PdfiumDecoder, Session};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), edgequake_vecconv::ConvertError> {
//! let decoder = Arc::new(PdfiumDecoder::from_env()?);
//! let session = Session::with_decoder(ConverterConfig::default(), decoder);
//! session.load_path("report.pdf").await?;
//! session.go_to_page(3)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `vecconv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-vecconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod decoder;
pub mod document;
pub mod error;
pub mod export;
pub mod format;
pub mod output;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod selection;
pub mod session;
pub mod sink;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConverterConfig, ConverterConfigBuilder};
pub use decoder::{DecodeError, PaginatedDecoder, PdfiumDecoder, PdfiumLibrary, RenderRequest};
pub use document::{CanonicalRepresentation, PageSurface, SourceDocument};
pub use error::{ConvertError, DecodeFailureKind, ExportError};
pub use export::{encode_export, export_file_name};
pub use format::{ExportFormat, SourceKind, UnknownFormat};
pub use output::{DocumentInfo, EncodedExport, ExportOutcome, ExportReport, SavedExport};
pub use preview::{PageCursor, Preview, PreviewContent};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use selection::ExportSelection;
pub use session::{Session, SessionState};
pub use sink::{DirectorySink, ExportSink, MemorySink, SavedBlob};
