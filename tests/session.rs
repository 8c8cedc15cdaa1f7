//! Integration tests for the conversion session.
//!
//! PDF input goes through a scripted in-process decoder, so these run
//! without pdfium. See `e2e.rs` for tests against the real library.

use edgequake_vecconv::{
    CanonicalRepresentation, ConversionProgressCallback, ConvertError, ConverterConfig,
    DecodeError, DecodeFailureKind, ExportError, ExportFormat, ExportSink, MemorySink,
    PageSurface, PaginatedDecoder, Preview, PreviewContent, RenderRequest, Session, SessionState,
};
use image::{Rgba, RgbaImage};
use std::io;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SHAPE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="60" height="40" viewBox="0 0 60 40">
  <circle cx="20" cy="20" r="15" fill="#3366ff"/>
</svg>
"##;

const ICON_AI: &str = r##"<?xml version="1.0"?>
<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20">
  <rect width="10" height="10" fill="#00aa00"/>
</svg>"##;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Decoder that produces `pages` solid-colour surfaces; page `n` has red = n × 10.
struct ScriptedDecoder {
    pages: usize,
    delay: Duration,
    failure: Option<DecodeError>,
    rendered: AtomicUsize,
}

impl ScriptedDecoder {
    fn new(pages: usize) -> Self {
        Self {
            pages,
            delay: Duration::ZERO,
            failure: None,
            rendered: AtomicUsize::new(0),
        }
    }

    fn slow(pages: usize, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(pages)
        }
    }

    fn failing(failure: DecodeError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(1)
        }
    }

    fn rendered(&self) -> usize {
        self.rendered.load(Ordering::SeqCst)
    }
}

impl PaginatedDecoder for ScriptedDecoder {
    fn render_pages(
        &self,
        _bytes: &[u8],
        request: &RenderRequest,
        on_page: &mut dyn FnMut(PageSurface) -> ControlFlow<()>,
    ) -> Result<usize, DecodeError> {
        if let Some(ref failure) = self.failure {
            return Err(failure.clone());
        }
        for page in 1..=self.pages.min(request.page_limit) {
            std::thread::sleep(self.delay);
            let image = RgbaImage::from_pixel(20, 30, Rgba([(page * 10) as u8, 0, 0, 255]));
            self.rendered.fetch_add(1, Ordering::SeqCst);
            if on_page(PageSurface::new(page, image)).is_break() {
                break;
            }
        }
        Ok(self.pages)
    }
}

fn pdf_session(decoder: ScriptedDecoder) -> (Session, Arc<ScriptedDecoder>) {
    let decoder = Arc::new(decoder);
    let session = Session::with_decoder(ConverterConfig::default(), decoder.clone());
    (session, decoder)
}

fn fake_pdf() -> Vec<u8> {
    b"%PDF-1.7\n%scripted\n".to_vec()
}

/// Sink that refuses one extension.
struct FlakySink {
    inner: MemorySink,
    reject_extension: &'static str,
}

impl ExportSink for FlakySink {
    fn save(&self, file_name: &str, mime_type: &str, bytes: &[u8]) -> io::Result<String> {
        if file_name.ends_with(self.reject_extension) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.save(file_name, mime_type, bytes)
    }
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_ingest_start(&self, file_name: &str, _kind: edgequake_vecconv::SourceKind) {
        self.events.lock().unwrap().push(format!("start {file_name}"));
    }
    fn on_page_rendered(&self, page_num: usize, _page_limit: usize) {
        self.events.lock().unwrap().push(format!("page {page_num}"));
    }
    fn on_ingest_complete(&self, file_name: &str, success: bool) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {file_name} {success}"));
    }
    fn on_export_saved(&self, format: ExportFormat, _file_name: &str, _byte_len: usize) {
        self.events.lock().unwrap().push(format!("saved {format}"));
    }
    fn on_export_failed(&self, format: ExportFormat, _error: &str) {
        self.events.lock().unwrap().push(format!("failed {format}"));
    }
    fn on_notice(&self, format: ExportFormat, _message: &str) {
        self.events.lock().unwrap().push(format!("notice {format}"));
    }
}

// ── Ingestion ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn svg_ingest_keeps_text_verbatim() {
    let session = Session::new(ConverterConfig::default());
    let source = session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();

    assert_eq!(source.base_name(), "shape");
    assert_eq!(session.state(), SessionState::Ready);
    let canonical = session.canonical().unwrap();
    assert_eq!(canonical.markup(), Some(SHAPE_SVG));

    let preview = session.preview();
    assert!(matches!(preview.content(), Some(PreviewContent::Markup(m)) if m == SHAPE_SVG));
    assert_eq!(
        session.available_formats(),
        vec![
            ExportFormat::Ai,
            ExportFormat::Pdf,
            ExportFormat::Png,
            ExportFormat::Jpg
        ]
    );
}

#[tokio::test]
async fn unsupported_extension_leaves_fresh_session_empty() {
    let session = Session::new(ConverterConfig::default());
    let err = session
        .load("notes.txt", b"just text".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, ConvertError::UnsupportedFormat { .. }));
    assert!(err.leaves_state_unchanged());
    assert_eq!(session.state(), SessionState::Empty);
    assert!(matches!(session.preview(), Preview::Empty));
    assert!(session.selected_formats().is_empty());
}

#[tokio::test]
async fn seven_page_pdf_keeps_first_five() {
    let (session, _) = pdf_session(ScriptedDecoder::new(7));
    session.load("report.pdf", fake_pdf()).await.unwrap();

    let canonical = session.canonical().unwrap();
    let nums: Vec<usize> = canonical.pages().iter().map(|p| p.page_num).collect();
    assert_eq!(nums, vec![1, 2, 3, 4, 5]);
    assert!(matches!(
        canonical.as_ref(),
        CanonicalRepresentation::PageSurfaces { total_pages: 7, .. }
    ));

    let info = session.info().unwrap();
    assert_eq!(info.rendered_pages, 5);
    assert_eq!(info.total_pages, Some(7));
    assert_eq!(info.current_page, Some(1));
    assert!(!info.available_formats.contains(&ExportFormat::Pdf));
}

#[tokio::test]
async fn short_pdf_renders_every_page() {
    let (session, _) = pdf_session(ScriptedDecoder::new(2));
    session.load("two.pdf", fake_pdf()).await.unwrap();
    assert_eq!(session.canonical().unwrap().page_count(), 2);
}

#[tokio::test]
async fn navigation_clamps_at_both_ends() {
    let (session, _) = pdf_session(ScriptedDecoder::new(3));
    session.load("doc.pdf", fake_pdf()).await.unwrap();

    assert_eq!(session.previous_page().unwrap(), 1);
    assert_eq!(session.next_page().unwrap(), 2);
    assert_eq!(session.next_page().unwrap(), 3);
    assert_eq!(session.next_page().unwrap(), 3);
    assert_eq!(session.go_to_page(1).unwrap(), 1);

    match session.preview().content() {
        Some(PreviewContent::Page {
            position,
            page_count,
            has_previous,
            has_next,
            ..
        }) => {
            assert_eq!((position, page_count), (1, 3));
            assert!(!has_previous);
            assert!(has_next);
        }
        other => panic!("expected a page preview, got {other:?}"),
    }
}

#[tokio::test]
async fn encrypted_pdf_is_access_restricted() {
    let (session, _) = pdf_session(ScriptedDecoder::failing(DecodeError::AccessRestricted(
        "password required".into(),
    )));
    let err = session.load("locked.pdf", fake_pdf()).await.unwrap_err();
    assert!(matches!(
        err,
        ConvertError::DecodeFailure {
            kind: DecodeFailureKind::AccessRestricted,
            ..
        }
    ));
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.last_error().unwrap().contains("access restricted"));
}

#[tokio::test]
async fn oversized_pdf_is_rejected_before_decoding() {
    let decoder = Arc::new(ScriptedDecoder::new(1));
    let config = ConverterConfig::builder().max_input_bytes(4).build().unwrap();
    let session = Session::with_decoder(config, decoder.clone());

    let err = session.load("big.pdf", fake_pdf()).await.unwrap_err();
    assert!(matches!(
        err,
        ConvertError::DecodeFailure {
            kind: DecodeFailureKind::Oversized,
            ..
        }
    ));
    assert_eq!(decoder.rendered(), 0);
}

#[tokio::test]
async fn load_path_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Logo.SVG");
    std::fs::write(&path, SHAPE_SVG).unwrap();

    let session = Session::new(ConverterConfig::default());
    let source = session.load_path(&path).await.unwrap();
    assert_eq!(source.file_name, "Logo.SVG");
    assert_eq!(source.base_name(), "Logo");

    let err = session
        .load_path(dir.path().join("missing.svg"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::FileNotFound { .. }));
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stale_decode_is_discarded() {
    let decoder = Arc::new(ScriptedDecoder::slow(5, Duration::from_millis(100)));
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConverterConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let session = Arc::new(Session::with_decoder(config, decoder.clone()));

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.load("slow.pdf", fake_pdf()).await })
    };

    while decoder.rendered() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(session.preview().is_loading());

    session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    let stale = first.await.unwrap();

    assert!(matches!(stale, Err(ConvertError::Superseded { generation: 1, .. })));
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.source().unwrap().file_name, "shape.svg");
    assert!(!session.canonical().unwrap().is_paginated());
    assert!(decoder.rendered() < 5, "render loop should stop early");

    // Every start gets a matching completion, including the superseded one.
    let events = recorder.events();
    let starts = events.iter().filter(|e| e.starts_with("start ")).count();
    let completes = events.iter().filter(|e| e.starts_with("complete ")).count();
    assert_eq!((starts, completes), (2, 2));
    assert!(events.contains(&"complete shape.svg true".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("complete slow.pdf false"));
}

// ── Selection ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_twice_restores_selection() {
    let session = Session::new(ConverterConfig::default());
    session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    session.toggle_format(ExportFormat::Png).unwrap();
    let before = session.selected_formats();

    assert!(session.toggle_format(ExportFormat::Jpg).unwrap());
    assert!(!session.toggle_format(ExportFormat::Jpg).unwrap());
    assert_eq!(session.selected_formats(), before);

    assert!(matches!(
        session.toggle_format(ExportFormat::Svg),
        Err(ConvertError::SourceFormatSelected {
            format: ExportFormat::Svg
        })
    ));
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn shape_svg_to_png_and_jpg() {
    let session = Session::new(ConverterConfig::default());
    session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    session.toggle_format(ExportFormat::Jpg).unwrap();
    session.toggle_format(ExportFormat::Png).unwrap();

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();

    assert!(report.all_succeeded());
    let order: Vec<ExportFormat> = report.outcomes.iter().map(|o| o.format).collect();
    assert_eq!(order, vec![ExportFormat::Png, ExportFormat::Jpg]);
    assert_eq!(sink.file_names(), vec!["shape.jpg", "shape.png"]);

    let png = sink.get("shape.png").unwrap();
    assert_eq!(png.mime_type, "image/png");
    let img = image::load_from_memory(&png.bytes).unwrap();
    assert_eq!((img.width(), img.height()), (120, 80));

    let jpg = sink.get("shape.jpg").unwrap();
    assert_eq!(jpg.mime_type, "image/jpeg");
    let img = image::load_from_memory(&jpg.bytes).unwrap().to_rgb8();
    // Uncovered corner comes out white, not black.
    assert!(img.get_pixel(118, 2).0.iter().all(|&c| c > 240));
}

#[tokio::test]
async fn svg_round_trip_is_byte_identical() {
    let session = Session::new(ConverterConfig::default());
    session.load("icon.ai", ICON_AI.into()).await.unwrap();
    session.toggle_format(ExportFormat::Svg).unwrap();

    let sink = Arc::new(MemorySink::new());
    session.export(sink.clone()).await.unwrap();
    let svg = sink.get("icon.svg").unwrap();
    assert_eq!(svg.bytes, ICON_AI.as_bytes());
    assert_eq!(svg.mime_type, "image/svg+xml");
}

#[tokio::test]
async fn repeated_exports_produce_identical_bytes() {
    let session = Session::new(ConverterConfig::default());
    session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    for format in [ExportFormat::Pdf, ExportFormat::Png, ExportFormat::Jpg] {
        session.toggle_format(format).unwrap();
    }

    let first = Arc::new(MemorySink::new());
    let second = Arc::new(MemorySink::new());
    session.export(first.clone()).await.unwrap();
    session.export(second.clone()).await.unwrap();

    for name in first.file_names() {
        assert_eq!(
            first.get(&name).unwrap().bytes,
            second.get(&name).unwrap().bytes,
            "{name} differs between exports"
        );
    }
}

#[tokio::test]
async fn icon_ai_to_pdf() {
    let session = Session::new(ConverterConfig::default());
    session.load("icon.ai", ICON_AI.into()).await.unwrap();
    session.toggle_format(ExportFormat::Pdf).unwrap();

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();
    assert!(report.all_succeeded());

    let pdf = sink.get("icon.pdf").unwrap();
    assert_eq!(pdf.mime_type, "application/pdf");
    assert!(pdf.bytes.starts_with(b"%PDF-"));
    let text = String::from_utf8_lossy(&pdf.bytes);
    assert!(text.contains("/Count 1"));
    // Natural size 40×20: the embedded image keeps the 2:1 aspect ratio.
    assert!(text.contains("/Width 40"));
    assert!(text.contains("/Height 20"));
}

#[tokio::test]
async fn sizeless_markup_exports_as_fallback_landscape_page() {
    let session = Session::new(ConverterConfig::default());
    let markup = r#"<svg xmlns="http://www.w3.org/2000/svg"><circle cx="5" cy="5" r="5"/></svg>"#;
    session.load("dot.svg", markup.into()).await.unwrap();
    session.toggle_format(ExportFormat::Pdf).unwrap();

    let sink = Arc::new(MemorySink::new());
    assert!(session.export(sink.clone()).await.unwrap().all_succeeded());

    let pdf = sink.get("dot.pdf").unwrap();
    let text = String::from_utf8_lossy(&pdf.bytes);
    assert!(text.contains("/Width 800"));
    assert!(text.contains("/Height 600"));
    // 800×600 CSS px at 0.75 pt each, wider than tall.
    assert!(text.contains("/MediaBox [0 0 600 450]"));
}

#[tokio::test]
async fn too_wide_for_a_pdf_page_falls_back_to_png() {
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConverterConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let session = Session::new(config);
    // 20000 px → 15000 pt, past the longest page side PDF readers accept.
    let banner = r##"<svg xmlns="http://www.w3.org/2000/svg" width="20000" height="100">
  <rect width="100" height="100" fill="#ff0000"/>
</svg>"##;
    session.load("banner.svg", banner.into()).await.unwrap();
    session.toggle_format(ExportFormat::Pdf).unwrap();

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();
    assert!(report.all_succeeded());

    let saved = report.get(ExportFormat::Pdf).unwrap().result.as_ref().unwrap();
    assert_eq!(saved.file_name, "banner.png");
    assert_eq!(saved.mime_type, "image/png");
    let notice = saved.notice.as_deref().unwrap();
    assert!(notice.contains("PDF encoding failed"), "{notice}");

    assert_eq!(sink.file_names(), vec!["banner.png"]);
    let blob = sink.get("banner.png").unwrap();
    assert_eq!(blob.mime_type, "image/png");
    let img = image::load_from_memory(&blob.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (20_000, 100));
    assert_eq!(img.get_pixel(10, 10).0, [255, 0, 0, 255]);
    // Drawn on the white PDF page background.
    assert_eq!(img.get_pixel(19_000, 50).0, [255, 255, 255, 255]);

    assert!(recorder.events().contains(&"notice pdf".to_string()));
}

#[tokio::test]
async fn oversized_markup_fails_export_without_aborting() {
    let session = Session::new(ConverterConfig::default());
    let huge = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100000" height="100000"><rect width="10" height="10"/></svg>"#;
    session.load("huge.svg", huge.into()).await.unwrap();
    session.toggle_format(ExportFormat::Png).unwrap();
    session.toggle_format(ExportFormat::Ai).unwrap();

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();
    assert!(matches!(
        report.get(ExportFormat::Png).unwrap().result,
        Err(ExportError::EncodeFailure {
            format: ExportFormat::Png,
            ..
        })
    ));
    assert!(report.get(ExportFormat::Ai).unwrap().is_success());
    assert_eq!(sink.file_names(), vec!["huge.ai"]);
    assert_eq!(session.state(), SessionState::Ready);

    // A smaller cap refuses what the default allows.
    let capped = Session::new(
        ConverterConfig::builder()
            .max_raster_pixels(1_000)
            .build()
            .unwrap(),
    );
    capped.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    capped.toggle_format(ExportFormat::Jpg).unwrap();
    let report = capped.export(Arc::new(MemorySink::new())).await.unwrap();
    assert_eq!(report.failed_count(), 1);
}

#[tokio::test]
async fn page_three_exports_with_page_suffix() {
    let (session, _) = pdf_session(ScriptedDecoder::new(7));
    session.load("report.pdf", fake_pdf()).await.unwrap();
    assert_eq!(session.go_to_page(3).unwrap(), 3);
    session.toggle_format(ExportFormat::Png).unwrap();

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();
    assert!(report.all_succeeded());
    assert_eq!(sink.file_names(), vec!["report_page3.png"]);

    let img = image::load_from_memory(&sink.get("report_page3.png").unwrap().bytes)
        .unwrap()
        .to_rgba8();
    assert_eq!(img.dimensions(), (20, 30));
    assert_eq!(img.get_pixel(0, 0).0, [30, 0, 0, 255]);
}

#[tokio::test]
async fn one_failing_format_does_not_block_others() {
    let (session, _) = pdf_session(ScriptedDecoder::new(2));
    session.load("report.pdf", fake_pdf()).await.unwrap();
    for format in [ExportFormat::Svg, ExportFormat::Png, ExportFormat::Jpg] {
        session.toggle_format(format).unwrap();
    }

    let sink = Arc::new(MemorySink::new());
    let report = session.export(sink.clone()).await.unwrap();

    assert_eq!(report.saved_count(), 2);
    assert!(matches!(
        report.get(ExportFormat::Svg).unwrap().result,
        Err(ExportError::FormatUnavailable { .. })
    ));
    assert_eq!(
        sink.file_names(),
        vec!["report_page1.jpg", "report_page1.png"]
    );
}

#[tokio::test]
async fn sink_failure_is_reported_per_format() {
    let session = Session::new(ConverterConfig::default());
    session.load("shape.svg", SHAPE_SVG.into()).await.unwrap();
    session.toggle_format(ExportFormat::Png).unwrap();
    session.toggle_format(ExportFormat::Jpg).unwrap();

    let sink = Arc::new(FlakySink {
        inner: MemorySink::new(),
        reject_extension: ".jpg",
    });
    let report = session.export(sink.clone()).await.unwrap();

    assert!(report.get(ExportFormat::Png).unwrap().is_success());
    match report.get(ExportFormat::Jpg).unwrap().result {
        Err(ExportError::SaveFailed { ref file_name, .. }) => assert_eq!(file_name, "shape.jpg"),
        ref other => panic!("expected SaveFailed, got {other:?}"),
    }
    assert_eq!(sink.inner.file_names(), vec!["shape.png"]);
}

#[tokio::test]
async fn progress_callback_sees_ingest_and_exports() {
    let recorder = Arc::new(RecordingCallback::default());
    let config = ConverterConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let session = Session::with_decoder(config, Arc::new(ScriptedDecoder::new(2)));

    session.load("doc.pdf", fake_pdf()).await.unwrap();
    session.toggle_format(ExportFormat::Ai).unwrap();
    session.toggle_format(ExportFormat::Png).unwrap();
    session.export(Arc::new(MemorySink::new())).await.unwrap();

    let events = recorder.events();
    assert_eq!(
        &events[..4],
        &["start doc.pdf", "page 1", "page 2", "complete doc.pdf true"]
    );
    assert!(events.contains(&"failed ai".to_string()));
    assert!(events.contains(&"saved png".to_string()));

    let session = Session::new(
        ConverterConfig::builder()
            .progress_callback(recorder.clone())
            .build()
            .unwrap(),
    );
    session.load("icon.ai", ICON_AI.into()).await.unwrap();
    session.toggle_format(ExportFormat::Svg).unwrap();
    session.export(Arc::new(MemorySink::new())).await.unwrap();
    assert!(!recorder.events().contains(&"notice svg".to_string()));
}
