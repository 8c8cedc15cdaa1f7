//! Progress-callback trait for ingestion and export events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConverterConfigBuilder::progress_callback`] to drive a
//! loading indicator while a PDF is being rasterised and to surface per-format
//! export results and notices to the user.
//!
//! # Example
//!
//! ```rust
//! use edgequake_vecconv::{ConversionProgressCallback, ConverterConfig, ExportFormat};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     saved: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_export_saved(&self, format: ExportFormat, file_name: &str, byte_len: usize) {
//!         self.saved.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{format}: {file_name} ({byte_len} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     saved: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConverterConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::format::{ExportFormat, SourceKind};
use std::sync::Arc;

/// Called by the pipeline as it ingests a file and exports formats.
///
/// Implementations must be `Send + Sync`: page rendering and exports run on
/// blocking worker threads, and exports of different formats run
/// concurrently. All methods have default no-op implementations so callers
/// only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when ingestion starts; a front-end shows its loading indicator.
    fn on_ingest_start(&self, file_name: &str, kind: SourceKind) {
        let _ = (file_name, kind);
    }

    /// Called after each PDF page has been rendered.
    ///
    /// # Arguments
    /// * `page_num`   — 1-indexed page number
    /// * `page_limit` — pages that will be rendered at most
    fn on_page_rendered(&self, page_num: usize, page_limit: usize) {
        let _ = (page_num, page_limit);
    }

    /// Called once ingestion has finished, successfully or not.
    fn on_ingest_complete(&self, file_name: &str, success: bool) {
        let _ = (file_name, success);
    }

    /// Called when a format has been encoded and handed to the sink.
    fn on_export_saved(&self, format: ExportFormat, file_name: &str, byte_len: usize) {
        let _ = (format, file_name, byte_len);
    }

    /// Called when a single format failed; other formats continue.
    fn on_export_failed(&self, format: ExportFormat, error: &str) {
        let _ = (format, error);
    }

    /// A user-visible notice that is not an error (AI approximation, PDF fallback).
    fn on_notice(&self, format: ExportFormat, message: &str) {
        let _ = (format, message);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConverterConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
