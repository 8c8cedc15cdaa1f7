//! The conversion session: one loaded document, its preview, and exports.
//!
//! A session moves through `Empty → Ingesting → Ready | Failed`. Any new load
//! restarts at `Ingesting` and discards everything from the previous
//! document (canonical representation, selection, cursor) before the new
//! content is installed, so a preview never mixes two documents.
//!
//! ## Stale loads
//!
//! Each load takes a fresh generation number. PDF rendering checks it after
//! every page and stops once a newer load has started; whatever a stale load
//! produces is dropped and the caller gets [`ConvertError::Superseded`].
//!
//! ## Exports
//!
//! [`Session::export`] snapshots the document (`Arc`) and cursor, then runs
//! one blocking task per selected format. Each task draws on its own surface
//! and saves independently, so one format failing never stops the others.

use crate::config::ConverterConfig;
use crate::decoder::PaginatedDecoder;
use crate::document::{CanonicalRepresentation, SourceDocument};
use crate::error::{ConvertError, ExportError};
use crate::export::encode_export;
use crate::format::{ExportFormat, SourceKind};
use crate::output::{DocumentInfo, ExportOutcome, ExportReport, SavedExport};
use crate::pipeline::{input, render};
use crate::preview::{PageCursor, Preview};
use crate::selection::ExportSelection;
use crate::sink::{DirectorySink, ExportSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Empty,
    Ingesting,
    Ready,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionState::Empty => "empty",
            SessionState::Ingesting => "ingesting",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        })
    }
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    /// Name of the file being ingested or that last failed.
    pending: Option<String>,
    last_error: Option<String>,
    source: Option<SourceDocument>,
    canonical: Option<Arc<CanonicalRepresentation>>,
    selection: ExportSelection,
    cursor: PageCursor,
}

impl Inner {
    fn empty() -> Self {
        Self {
            state: SessionState::Empty,
            pending: None,
            last_error: None,
            source: None,
            canonical: None,
            selection: ExportSelection::default(),
            cursor: PageCursor::default(),
        }
    }

    fn ready(&self) -> Result<(&SourceDocument, &Arc<CanonicalRepresentation>), ConvertError> {
        match (self.state, &self.source, &self.canonical) {
            (SessionState::Ready, Some(source), Some(canonical)) => Ok((source, canonical)),
            _ => Err(ConvertError::NoDocument),
        }
    }
}

/// A single-document conversion session.
///
/// All methods take `&self`; the session can be shared behind an `Arc`
/// between a UI task and export tasks.
pub struct Session {
    config: Arc<ConverterConfig>,
    decoder: Option<Arc<dyn PaginatedDecoder>>,
    generation: Arc<AtomicU64>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("has_decoder", &self.decoder.is_some())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .field("state", &self.lock().state)
            .finish()
    }
}

impl Session {
    /// A session without a PDF decoder; PDF loads fail with `DecoderUnavailable`.
    pub fn new(config: ConverterConfig) -> Self {
        Self {
            config: Arc::new(config),
            decoder: None,
            generation: Arc::new(AtomicU64::new(0)),
            inner: Mutex::new(Inner::empty()),
        }
    }

    /// A session that decodes PDFs with `decoder`.
    pub fn with_decoder(config: ConverterConfig, decoder: Arc<dyn PaginatedDecoder>) -> Self {
        Self {
            decoder: Some(decoder),
            ..Self::new(config)
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn has_decoder(&self) -> bool {
        self.decoder.is_some()
    }

    // ── Ingestion ───────────────────────────────────────────────────────────

    /// Load a file from its name and bytes, replacing any current document.
    ///
    /// # Errors
    /// - `UnsupportedFormat` for an extension other than svg/ai/pdf; the
    ///   session is left exactly as it was.
    /// - `CorruptMarkup`, `DecodeFailure`, `DecoderUnavailable`: the session
    ///   moves to `Failed`.
    /// - `Superseded` when another load started before this one finished; the
    ///   newer load owns the session state.
    pub async fn load(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<SourceDocument, ConvertError> {
        let source = input::classify(file_name, bytes.len() as u64)?;
        let start = Instant::now();

        // The generation is claimed under the same lock as the reset, so a
        // reset can never land after a newer load's.
        let generation = {
            let mut inner = self.lock();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *inner = Inner::empty();
            inner.state = SessionState::Ingesting;
            inner.pending = Some(source.file_name.clone());
            generation
        };
        info!(
            "Loading '{}' ({}, {}) [generation {}]",
            source.file_name,
            source.kind,
            source.display_size(),
            generation
        );
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_ingest_start(&source.file_name, source.kind);
        }

        let result = self.ingest(&source, bytes, generation).await;

        let mut inner = self.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            drop(inner);
            warn!(
                "Discarding stale load of '{}' (generation {})",
                source.file_name, generation
            );
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_ingest_complete(file_name, false);
            }
            return Err(ConvertError::Superseded {
                file_name: source.file_name,
                generation,
            });
        }

        let success = result.is_ok();
        let outcome = match result {
            Ok(canonical) => {
                info!(
                    "Loaded '{}': {} page(s) in {}ms",
                    source.file_name,
                    canonical.page_count(),
                    start.elapsed().as_millis()
                );
                inner.cursor = PageCursor::new(canonical.page_count());
                inner.selection = ExportSelection::for_source(source.kind);
                inner.canonical = Some(Arc::new(canonical));
                inner.source = Some(source.clone());
                inner.pending = None;
                inner.state = SessionState::Ready;
                Ok(source)
            }
            Err(e) => {
                warn!("Load of '{}' failed: {}", source.file_name, e);
                inner.last_error = Some(e.to_string());
                inner.state = SessionState::Failed;
                Err(e)
            }
        };
        drop(inner);

        if let Some(ref cb) = self.config.progress_callback {
            cb.on_ingest_complete(file_name, success);
        }
        outcome
    }

    /// Read `path` and load it.
    ///
    /// The extension is checked before the file is read, so an unsupported
    /// file is rejected without I/O.
    pub async fn load_path(&self, path: impl AsRef<Path>) -> Result<SourceDocument, ConvertError> {
        let path = path.as_ref();
        input::classify(&input::file_name_of(path), 0)?;
        let file = input::read_local(path).await?;
        self.load(&file.file_name, file.bytes).await
    }

    async fn ingest(
        &self,
        source: &SourceDocument,
        bytes: Vec<u8>,
        generation: u64,
    ) -> Result<CanonicalRepresentation, ConvertError> {
        match source.kind {
            SourceKind::Svg | SourceKind::Ai => {
                let markup = input::decode_markup(source, bytes)?;
                Ok(CanonicalRepresentation::MarkupText(markup))
            }
            SourceKind::Pdf => {
                let decoder = self.decoder.clone().ok_or_else(|| {
                    ConvertError::DecoderUnavailable(
                        "this session was created without a PDF decoder".to_string(),
                    )
                })?;
                input::check_input_size(source, self.config.max_input_bytes)?;

                let current = Arc::clone(&self.generation);
                let rendered =
                    render::render_pages(decoder, source, bytes, &self.config, move || {
                        current.load(Ordering::SeqCst) == generation
                    })
                    .await?;

                if rendered.superseded {
                    return Err(ConvertError::Superseded {
                        file_name: source.file_name.clone(),
                        generation,
                    });
                }
                Ok(CanonicalRepresentation::PageSurfaces {
                    pages: rendered.pages,
                    total_pages: rendered.total_pages,
                })
            }
        }
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Generation number of the most recently started load.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The loaded document, when `Ready`.
    pub fn source(&self) -> Option<SourceDocument> {
        let inner = self.lock();
        inner.ready().ok().map(|(source, _)| source.clone())
    }

    /// Shared handle to the canonical representation, when `Ready`.
    pub fn canonical(&self) -> Option<Arc<CanonicalRepresentation>> {
        let inner = self.lock();
        inner.ready().ok().map(|(_, canonical)| Arc::clone(canonical))
    }

    /// Message of the last failed load, while `Failed`.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// What the preview area should show right now.
    pub fn preview(&self) -> Preview {
        let inner = self.lock();
        match inner.state {
            SessionState::Empty => Preview::Empty,
            SessionState::Ingesting => Preview::Loading {
                file_name: inner.pending.clone().unwrap_or_default(),
            },
            SessionState::Failed => Preview::Failed {
                file_name: inner.pending.clone().unwrap_or_default(),
                message: inner.last_error.clone().unwrap_or_default(),
            },
            SessionState::Ready => match inner.ready() {
                Ok((source, canonical)) => Preview::Ready {
                    source: source.clone(),
                    canonical: Arc::clone(canonical),
                    cursor: inner.cursor,
                },
                Err(_) => Preview::Empty,
            },
        }
    }

    /// File-information summary of the loaded document.
    pub fn info(&self) -> Option<DocumentInfo> {
        let inner = self.lock();
        let (source, canonical) = inner.ready().ok()?;
        let paginated = match canonical.as_ref() {
            CanonicalRepresentation::PageSurfaces { pages, total_pages } => {
                Some((pages.len(), *total_pages))
            }
            CanonicalRepresentation::MarkupText(_) => None,
        };
        Some(DocumentInfo {
            file_name: source.file_name.clone(),
            kind: source.kind,
            byte_size: source.byte_size,
            display_size: source.display_size(),
            rendered_pages: paginated.map(|(rendered, _)| rendered).unwrap_or(0),
            total_pages: paginated.map(|(_, total)| total),
            current_page: paginated.map(|_| inner.cursor.page_num()),
            available_formats: ExportFormat::available_for(source.kind),
        })
    }

    // ── Selection ───────────────────────────────────────────────────────────

    /// Formats offered for the loaded document; empty when nothing is loaded.
    pub fn available_formats(&self) -> Vec<ExportFormat> {
        self.source()
            .map(|s| ExportFormat::available_for(s.kind))
            .unwrap_or_default()
    }

    /// Flip `format` in or out of the selection; returns whether it is now selected.
    pub fn toggle_format(&self, format: ExportFormat) -> Result<bool, ConvertError> {
        let mut inner = self.lock();
        inner.ready()?;
        let selected = inner.selection.toggle(format)?;
        debug!("Toggled {} → {}", format, if selected { "on" } else { "off" });
        Ok(selected)
    }

    /// Ensure `format` is selected, leaving it selected if it already was.
    pub fn select_format(&self, format: ExportFormat) -> Result<(), ConvertError> {
        let mut inner = self.lock();
        inner.ready()?;
        if !inner.selection.contains(format) {
            inner.selection.toggle(format)?;
        }
        Ok(())
    }

    /// Selected formats in canonical order.
    pub fn selected_formats(&self) -> Vec<ExportFormat> {
        self.lock().selection.to_vec()
    }

    // ── Navigation ──────────────────────────────────────────────────────────

    /// Move to the next page; returns the 1-based page now shown.
    pub fn next_page(&self) -> Result<usize, ConvertError> {
        self.navigate(|cursor| {
            cursor.next();
        })
    }

    /// Move to the previous page; returns the 1-based page now shown.
    pub fn previous_page(&self) -> Result<usize, ConvertError> {
        self.navigate(|cursor| {
            cursor.previous();
        })
    }

    /// Jump to a 1-based page, clamped to the rendered pages.
    pub fn go_to_page(&self, page_num: usize) -> Result<usize, ConvertError> {
        self.navigate(|cursor| {
            cursor.go_to(page_num);
        })
    }

    fn navigate(&self, step: impl FnOnce(&mut PageCursor)) -> Result<usize, ConvertError> {
        let mut inner = self.lock();
        inner.ready()?;
        step(&mut inner.cursor);
        Ok(inner.cursor.page_num())
    }

    // ── Export ──────────────────────────────────────────────────────────────

    /// Encode and save every selected format concurrently.
    ///
    /// Returns one outcome per selected format, in canonical order. Only
    /// session-level problems are errors: `NoDocument` when nothing is loaded,
    /// `NothingSelected` for an empty selection.
    pub async fn export(&self, sink: Arc<dyn ExportSink>) -> Result<ExportReport, ConvertError> {
        let (source, canonical, cursor, formats) = {
            let inner = self.lock();
            let (source, canonical) = inner.ready()?;
            if inner.selection.is_empty() {
                return Err(ConvertError::NothingSelected);
            }
            (
                source.clone(),
                Arc::clone(canonical),
                inner.cursor,
                inner.selection.to_vec(),
            )
        };

        let start = Instant::now();
        info!(
            "Exporting '{}' as {} format(s)",
            source.file_name,
            formats.len()
        );

        let tasks = formats.iter().map(|&format| {
            let source = source.clone();
            let canonical = Arc::clone(&canonical);
            let config = Arc::clone(&self.config);
            let sink = Arc::clone(&sink);
            async move {
                let result = tokio::task::spawn_blocking(move || {
                    export_one(&source, &canonical, cursor, format, &config, sink.as_ref())
                })
                .await
                .unwrap_or_else(|e| {
                    Err(ExportError::EncodeFailure {
                        format,
                        detail: format!("export task panicked: {e}"),
                    })
                });
                ExportOutcome { format, result }
            }
        });

        let report = ExportReport {
            outcomes: futures::future::join_all(tasks).await,
        };

        info!(
            "Export finished: {} saved, {} failed in {}ms",
            report.saved_count(),
            report.failed_count(),
            start.elapsed().as_millis()
        );
        Ok(report)
    }

    /// [`Session::export`] into a directory.
    pub async fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<ExportReport, ConvertError> {
        self.export(Arc::new(DirectorySink::new(dir.as_ref())))
            .await
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Encode one format and hand it to the sink. Runs on a blocking thread.
fn export_one(
    source: &SourceDocument,
    canonical: &CanonicalRepresentation,
    cursor: PageCursor,
    format: ExportFormat,
    config: &ConverterConfig,
    sink: &dyn ExportSink,
) -> Result<SavedExport, ExportError> {
    let progress = config.progress_callback.as_ref();

    let encoded = match encode_export(source, canonical, cursor, format, config) {
        Ok(encoded) => encoded,
        Err(e) => {
            warn!("{}", e);
            if let Some(cb) = progress {
                cb.on_export_failed(format, &e.to_string());
            }
            return Err(e);
        }
    };

    let location = match sink.save(&encoded.file_name, encoded.mime_type, &encoded.bytes) {
        Ok(location) => location,
        Err(e) => {
            let err = ExportError::SaveFailed {
                format,
                file_name: encoded.file_name,
                detail: e.to_string(),
            };
            warn!("{}", err);
            if let Some(cb) = progress {
                cb.on_export_failed(format, &err.to_string());
            }
            return Err(err);
        }
    };

    if let Some(cb) = progress {
        if let Some(ref notice) = encoded.notice {
            cb.on_notice(format, notice);
        }
        cb.on_export_saved(format, &encoded.file_name, encoded.bytes.len());
    }

    Ok(SavedExport {
        format,
        file_name: encoded.file_name,
        mime_type: encoded.mime_type.to_string(),
        byte_len: encoded.bytes.len(),
        location,
        notice: encoded.notice,
    })
}
