//! CLI binary for edgequake-vecconv.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConverterConfig`, drives one `Session`, and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use edgequake_vecconv::{
    ConversionProgressCallback, ConverterConfig, DocumentInfo, ExportFormat, ExportReport,
    PdfiumDecoder, PdfiumLibrary, ProgressCallback, Session, SourceKind,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while the file loads, then one line per exported format.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Loading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn line(&self, text: String) {
        self.bar.suspend(|| eprintln!("{text}"));
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_ingest_start(&self, file_name: &str, kind: SourceKind) {
        self.bar.set_message(format!("{file_name} ({kind})"));
    }

    fn on_page_rendered(&self, page_num: usize, page_limit: usize) {
        self.bar.set_prefix("Rendering");
        self.bar
            .set_message(format!("page {page_num} (up to {page_limit})"));
    }

    fn on_ingest_complete(&self, file_name: &str, success: bool) {
        self.bar.finish_and_clear();
        if success {
            self.line(format!("{} Loaded {}", green("✔"), bold(file_name)));
        } else {
            self.line(format!("{} Could not load {}", red("✘"), bold(file_name)));
        }
    }

    fn on_export_saved(&self, format: ExportFormat, file_name: &str, byte_len: usize) {
        self.line(format!(
            "  {} {:<4} {}  {}",
            green("✓"),
            format,
            file_name,
            dim(&format!("{byte_len} bytes")),
        ));
    }

    fn on_export_failed(&self, format: ExportFormat, error: &str) {
        self.line(format!("  {} {:<4} {}", red("✗"), format, red(error)));
    }

    fn on_notice(&self, format: ExportFormat, message: &str) {
        self.line(format!("  {} {:<4} {}", yellow("⚠"), format, yellow(message)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # SVG to PNG and JPG in the current directory
  vecconv shape.svg --to png,jpg

  # Third page of a PDF as PNG into ./out
  vecconv report.pdf --to png --page 3 -o out

  # Pseudo-AI file to a one-page PDF
  vecconv icon.ai --to pdf

  # Encrypted PDF
  vecconv locked.pdf --to jpg --password hunter2

  # Inspect a file without exporting
  vecconv --inspect-only --json report.pdf

FORMATS:
  Input    svg, ai (SVG markup), pdf (first 5 pages rendered)
  Output   svg, ai   markup sources only; ai is SVG markup under .ai
           pdf       one page, white background
           png       2x for markup, transparent background
           jpg       2x for markup, on white, quality 90

  Paginated sources export the page under --page as {name}_page{n}.{ext}.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium (file or directory) for PDF input
  RUST_LOG          Override the log filter (e.g. RUST_LOG=debug)
  VECCONV_*         Every flag, e.g. VECCONV_OUTPUT_DIR, VECCONV_JPEG_QUALITY
"#;

/// Convert SVG, AI and PDF files to SVG, AI, PDF, PNG and JPG.
#[derive(Parser, Debug)]
#[command(
    name = "vecconv",
    version,
    about = "Convert SVG, AI and PDF files to SVG, AI, PDF, PNG and JPG",
    long_about = "Load one vector file (SVG, pseudo-AI, or PDF), optionally pick a page, \
and export it to any combination of SVG, AI, PDF, PNG and JPG. PDF input is rendered \
through pdfium; the first five pages are available.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Input file (.svg, .ai or .pdf).
    input: PathBuf,

    /// Target formats, comma separated: svg, ai, pdf, png, jpg.
    #[arg(
        short,
        long,
        env = "VECCONV_TO",
        value_delimiter = ',',
        required_unless_present = "inspect_only"
    )]
    to: Vec<ExportFormat>,

    /// Directory to write exports into.
    #[arg(short, long, env = "VECCONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Page to export from a PDF (1-based, clamped to the rendered pages).
    #[arg(long, env = "VECCONV_PAGE", value_parser = clap::value_parser!(u32).range(1..))]
    page: Option<u32>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "VECCONV_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (file or directory). Defaults to the system library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// JPEG quality (1–100).
    #[arg(long, env = "VECCONV_JPEG_QUALITY", default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Upscaling applied when rasterising markup to PNG/JPG.
    #[arg(long, env = "VECCONV_RASTER_SCALE", default_value_t = 2.0)]
    raster_scale: f32,

    /// Magnification used when rendering PDF pages.
    #[arg(long, env = "VECCONV_RENDER_SCALE", default_value_t = 1.5)]
    render_scale: f32,

    /// Number of leading PDF pages to render (1–50).
    #[arg(long, env = "VECCONV_PAGE_LIMIT", default_value_t = 5)]
    page_limit: usize,

    /// Print file information only, no export.
    #[arg(long)]
    inspect_only: bool,

    /// Output structured JSON instead of text.
    #[arg(long, env = "VECCONV_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "VECCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "VECCONV_QUIET")]
    quiet: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "VECCONV_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the spinner active, INFO logs would just fight it for the line.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let start = Instant::now();

    // ── Build config and session ─────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let session = build_session(&cli, config)?;

    // ── Load ─────────────────────────────────────────────────────────────
    session
        .load_path(&cli.input)
        .await
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    if let Some(page) = cli.page {
        let shown = session.go_to_page(page as usize)?;
        if shown != page as usize && !cli.quiet {
            eprintln!(
                "{} page {} is not available; using page {}",
                yellow("⚠"),
                page,
                shown
            );
        }
    }

    let info = session
        .info()
        .context("Session has no document after a successful load")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize file info")?
            );
        } else {
            print_info(&info);
        }
        return Ok(());
    }

    // ── Export ───────────────────────────────────────────────────────────
    for &format in &cli.to {
        session
            .select_format(format)
            .with_context(|| format!("Cannot export {} as {}", info.file_name, format))?;
    }

    let report = session
        .export_to_dir(&cli.output_dir)
        .await
        .context("Export failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet && !show_progress {
        print_report(&report);
    }

    if !cli.quiet && !cli.json {
        eprintln!(
            "{}  {}/{} formats  {}ms  →  {}",
            if report.all_succeeded() {
                green("✔")
            } else {
                red("✘")
            },
            report.saved_count(),
            report.outcomes.len(),
            start.elapsed().as_millis(),
            bold(&cli.output_dir.display().to_string()),
        );
    }

    if !report.all_succeeded() {
        bail!(
            "{} of {} exports failed",
            report.failed_count(),
            report.outcomes.len()
        );
    }
    Ok(())
}

/// Map CLI args to `ConverterConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConverterConfig> {
    let mut builder = ConverterConfig::builder()
        .page_limit(cli.page_limit)
        .render_scale(cli.render_scale)
        .raster_scale(cli.raster_scale)
        .jpeg_quality(cli.jpeg_quality);

    if let Some(ref password) = cli.password {
        builder = builder.password(password.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// PDF input gets a pdfium-backed decoder; other inputs need none.
fn build_session(cli: &Cli, config: ConverterConfig) -> Result<Session> {
    let name = cli.input.file_name().map(|n| n.to_string_lossy().into_owned());
    let is_pdf = name.as_deref().and_then(SourceKind::from_file_name) == Some(SourceKind::Pdf);
    if !is_pdf {
        return Ok(Session::new(config));
    }

    let library = match cli.pdfium_lib {
        Some(ref path) => PdfiumLibrary::Path(path.clone()),
        None => PdfiumLibrary::System,
    };
    let decoder = PdfiumDecoder::bind(library).context("Failed to load the PDF engine")?;
    Ok(Session::with_decoder(config, Arc::new(decoder)))
}

fn print_info(info: &DocumentInfo) {
    println!("File:         {}", info.file_name);
    println!("Type:         {}", info.kind);
    println!("Size:         {}", info.display_size);
    if let Some(total) = info.total_pages {
        println!("Pages:        {} ({} rendered)", total, info.rendered_pages);
    }
    if let Some(page) = info.current_page {
        println!("Current page: {}", page);
    }
    let formats: Vec<String> = info
        .available_formats
        .iter()
        .map(ToString::to_string)
        .collect();
    println!("Exports:      {}", formats.join(", "));
}

fn print_report(report: &ExportReport) {
    for outcome in &report.outcomes {
        match outcome.result {
            Ok(ref saved) => {
                eprintln!(
                    "  {} {:<4} {}  {}",
                    green("✓"),
                    outcome.format,
                    saved.location,
                    dim(&format!("{} bytes", saved.byte_len))
                );
                if let Some(ref notice) = saved.notice {
                    eprintln!("  {} {:<4} {}", yellow("⚠"), outcome.format, notice);
                }
            }
            Err(ref e) => eprintln!("  {} {:<4} {}", red("✗"), outcome.format, red(&e.to_string())),
        }
    }
}
