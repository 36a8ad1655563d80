//! CLI binary for firstlast-pdf.
//!
//! Maps flags to `ExtractionConfig`, runs a `Session` over the given files,
//! and writes each result into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use firstlast_pdf::{
    batch, format_file_size, BatchError, BatchProgressCallback, Extractor, ExtractionConfig,
    FileCandidate, NoopProgressCallback, OutputKind, PageGeometry, PdfiumRenderer,
    ProcessingResult, Session,
};
use indicatif::{ProgressBar, ProgressStyle};
use pdfium_provision::{DownloadProgress, Provisioner};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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

const SPINNER_TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Percentage bar with the current file name, one log line per finished file.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS);
        bar.set_style(style);
        bar.set_prefix("Extracting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }
}

impl BatchProgressCallback for CliProgress {
    fn on_file_start(&self, _index: usize, _total: usize, name: &str, percent: f64) {
        self.bar.set_position(percent.round() as u64);
        self.bar.set_message(format!("Processing {name}…"));
    }

    fn on_file_complete(&self, index: usize, total: usize, name: &str, output_len: usize) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format_file_size(output_len as u64)),
        ));
    }

    fn on_file_error(&self, index: usize, total: usize, name: &str, error: &str) {
        self.bar.println(format!(
            "  {} {:>3}/{:<3} {}  {}",
            red("✗"),
            index + 1,
            total,
            name,
            red(error),
        ));
        self.bar.abandon();
    }

    fn on_batch_complete(&self, _total_files: usize) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract first and last page of one file into ./out
  firstlast report.pdf -o out

  # Several files, sharper rasters, higher JPEG quality
  firstlast a.pdf b.pdf c.pdf --scale 2.0 --quality 0.9

  # Reproduce the A4 layout of the browser tool
  firstlast --geometry legacy-a4 --divisor 4 scan.pdf

  # Page count and page sizes only
  firstlast --inspect-only report.pdf

  # Machine-readable summary
  firstlast --json a.pdf b.pdf > summary.json

Files with fewer than two pages are copied unchanged. Output files are named
<name>_first_last_pages.pdf.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH          Path to an existing libpdfium (skips auto-download)
  FIRSTLAST_PDFIUM_CACHE   Override the pdfium download cache directory
  RUST_LOG                 Log filter (e.g. firstlast_pdf=debug)
"#;

/// Extract the first and last page of PDF files into new two-page PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "firstlast",
    version,
    about = "Extract the first and last page of PDF files into new two-page PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF files to process, in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the output files.
    #[arg(short, long, env = "FIRSTLAST_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Render scale relative to native page size (0.25–8.0).
    #[arg(long, env = "FIRSTLAST_SCALE", default_value_t = 1.5)]
    scale: f32,

    /// JPEG quality (0.05–1.0).
    #[arg(long, env = "FIRSTLAST_QUALITY", default_value_t = 0.8)]
    quality: f32,

    /// Output page layout.
    #[arg(long, env = "FIRSTLAST_GEOMETRY", value_enum, default_value = "native")]
    geometry: GeometryArg,

    /// Pixel-to-millimetre divisor for --geometry legacy-a4.
    #[arg(long, env = "FIRSTLAST_DIVISOR", default_value_t = PageGeometry::LEGACY_DIVISOR)]
    divisor: f32,

    /// Largest accepted input file in MiB.
    #[arg(long, env = "FIRSTLAST_MAX_SIZE_MB", default_value_t = 20)]
    max_size_mb: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "FIRSTLAST_PASSWORD")]
    password: Option<String>,

    /// Print page count and page sizes only.
    #[arg(long)]
    inspect_only: bool,

    /// Print a JSON summary instead of text.
    #[arg(long, env = "FIRSTLAST_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "FIRSTLAST_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FIRSTLAST_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FIRSTLAST_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum GeometryArg {
    Native,
    LegacyA4,
}

#[derive(Serialize)]
struct Summary<'a> {
    results: Vec<ResultLine<'a>>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ResultLine<'a> {
    input: &'a str,
    input_size: u64,
    output: PathBuf,
    output_size: usize,
    kind: OutputKind,
    source_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
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

    let config = build_config(&cli)?;

    // ── Select files ─────────────────────────────────────────────────────
    let mut candidates = Vec::with_capacity(cli.inputs.len());
    for path in &cli.inputs {
        candidates.push(
            FileCandidate::from_path(path)
                .await
                .with_context(|| format!("Cannot open {}", path.display()))?,
        );
    }

    let mut session = Session::new(config.max_file_size);
    for rejected in session.select(candidates) {
        eprintln!("{} {}", yellow("⚠"), rejected);
    }
    if session.selected().is_empty() {
        anyhow::bail!("No valid PDF files to process");
    }

    if !cli.quiet && !cli.json {
        eprintln!("{}", bold(&format!("{} file(s) selected", session.selected().len())));
        for file in session.selected() {
            eprintln!("  {}  {}", file.name, dim(&format_file_size(file.size)));
        }
    }

    // ── Initialise the PDF engine ────────────────────────────────────────
    let renderer = tokio::task::block_in_place(|| init_renderer(cli.quiet))?;
    let extractor = Extractor::new(Arc::new(renderer), config);

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        return inspect(&cli, &session, &extractor).await;
    }

    // ── Run batch ────────────────────────────────────────────────────────
    let outcome = if show_progress {
        let progress = CliProgress::new();
        session.process(&extractor, &progress).await.map(|_| ())
    } else {
        session.process(&extractor, &NoopProgressCallback).await.map(|_| ())
    };

    // Results produced before a failure are still written.
    let written = match batch::write_outputs(&cli.output_dir, session.results()) {
        Ok(paths) => paths,
        Err(write_err) => return Err(write_failure(outcome.err(), write_err)),
    };

    if cli.json {
        let summary = Summary {
            results: session
                .results()
                .iter()
                .zip(written.iter())
                .map(|(r, path)| result_line(r, path.clone()))
                .collect(),
            error: outcome.as_ref().err().map(|e| e.to_string()),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        for (result, path) in session.results().iter().zip(written.iter()) {
            print_result(result, path);
        }
    }

    outcome.context("Processing stopped")?;
    Ok(())
}

/// Error for a failed output write, keeping the batch failure that preceded it.
fn write_failure(batch_err: Option<BatchError>, write_err: BatchError) -> anyhow::Error {
    match batch_err {
        Some(batch_err) => anyhow::Error::new(batch_err).context(format!(
            "Processing stopped, and writing the completed results also failed: {write_err}"
        )),
        None => anyhow::Error::new(write_err).context("Failed to write output"),
    }
}

fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let geometry = match cli.geometry {
        GeometryArg::Native => PageGeometry::Native,
        GeometryArg::LegacyA4 => PageGeometry::LegacyA4 {
            divisor: cli.divisor,
        },
    };

    let mut builder = ExtractionConfig::builder()
        .render_scale(cli.scale)
        .jpeg_quality(cli.quality)
        .page_geometry(geometry)
        .max_file_size(cli.max_size_mb.saturating_mul(1024 * 1024));
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Bind pdfium, showing a download bar the first time it is fetched.
fn init_renderer(quiet: bool) -> Result<PdfiumRenderer> {
    let provisioner = Provisioner::from_env();
    if quiet || provisioner.cached_library().is_some() {
        return PdfiumRenderer::initialize(&provisioner, None)
            .context("Failed to initialise the PDF engine");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER_TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let on_progress: DownloadProgress<'_> = &move |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            if bar.length() != Some(t) {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    };
    let renderer = PdfiumRenderer::initialize(&provisioner, Some(on_progress))
        .context("Failed to initialise the PDF engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(renderer)
}

async fn inspect(cli: &Cli, session: &Session, extractor: &Extractor) -> Result<()> {
    let mut infos = Vec::new();
    for file in session.selected() {
        let input = file.load().await?;
        let info = extractor
            .inspect(&input)
            .await
            .with_context(|| format!("Failed to inspect {}", file.name))?;
        infos.push((file.name.as_str(), info));
    }

    if cli.json {
        let map: serde_json::Map<String, serde_json::Value> = infos
            .into_iter()
            .map(|(name, info)| -> serde_json::Result<(String, serde_json::Value)> {
                Ok((name.to_string(), serde_json::to_value(info)?))
            })
            .collect::<serde_json::Result<_>>()
            .context("Failed to serialise metadata")?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    let fmt_size = |s: Option<(f32, f32)>| {
        s.map(|(w, h)| format!("{w:.1} × {h:.1} pt"))
            .unwrap_or_else(|| "-".to_string())
    };
    for (name, info) in infos {
        println!("File:         {}", name);
        println!("Pages:        {}", info.page_count);
        println!("First page:   {}", fmt_size(info.first_page_size));
        println!("Last page:    {}", fmt_size(info.last_page_size));
        println!();
    }
    Ok(())
}

fn result_line(result: &ProcessingResult, output: PathBuf) -> ResultLine<'_> {
    ResultLine {
        input: &result.input_name,
        input_size: result.input_size,
        output,
        output_size: result.output.len(),
        kind: result.output.kind,
        source_pages: result.output.source_page_count,
    }
}

fn print_result(result: &ProcessingResult, path: &std::path::Path) {
    let note = match result.output.kind {
        OutputKind::Passthrough => " (fewer than two pages, copied unchanged)",
        OutputKind::Composed => "",
    };
    println!("{}  {}{}", green("✔"), bold(&path.display().to_string()), dim(note));
    println!(
        "   Size: {}   Original: {} ({})",
        format_file_size(result.output.len() as u64),
        format_file_size(result.input_size),
        result.input_name
    );
}
