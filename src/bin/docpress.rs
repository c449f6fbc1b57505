//! CLI binary for docpress.
//!
//! A thin shim over the library crate that maps CLI flags
//! to a `ConversionRequest` + `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docpress::{convert, ConversionConfig, ConversionRequest, EngineSelection, PageSize};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion
  docpress report.html -o report.pdf

  # Map logical image names to real files
  docpress report.html -o report.pdf \
      --image chart.png=/data/renders/chart-v2.png \
      --image logo.png=assets/logo.png

  # Force the built-in composer (no wkhtmltopdf required)
  docpress report.html -o report.pdf --engine fallback

  # A5 pages with narrow margins
  docpress report.html -o report.pdf --page-size a5 --margin 10

  # Custom page size in millimetres
  docpress report.html -o report.pdf --page-size 100x150

  # Machine-readable result
  docpress report.html -o report.pdf --json

ENGINES:
  auto      wkhtmltopdf when installed, built-in composer otherwise (default)
  primary   wkhtmltopdf only; fails if it is missing or errors
  fallback  built-in composer only

ENVIRONMENT VARIABLES:
  DOCPRESS_WKHTMLTOPDF   Path to the wkhtmltopdf binary
  RUST_LOG               Tracing filter (overrides -v/-q)
"#;

/// Convert HTML documents with named images into PDF files.
#[derive(Parser, Debug)]
#[command(
    name = "docpress",
    version,
    about = "Convert HTML documents with named images into PDF files",
    long_about = "Convert an HTML document, plus a map of logical image names to real files, \
into a single PDF. Uses wkhtmltopdf for full-fidelity rendering when available and falls \
back to a built-in composer otherwise, so a conversion always produces a document.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the HTML source document.
    input: PathBuf,

    /// Write the PDF to this path.
    #[arg(short, long)]
    output: PathBuf,

    /// Map a logical image name to a file: --image name=path (repeatable).
    #[arg(long = "image", value_name = "NAME=PATH", value_parser = parse_image_mapping)]
    images: Vec<(String, PathBuf)>,

    /// Engine policy: auto, primary, fallback.
    #[arg(long, value_enum, default_value = "auto")]
    engine: EngineArg,

    /// Page size: a4, a5, letter, or WIDTHxHEIGHT in millimetres.
    #[arg(long, default_value = "a4", value_parser = parse_page_size)]
    page_size: PageSize,

    /// Uniform page margin in millimetres.
    #[arg(long, default_value_t = 18.0)]
    margin: f32,

    /// Base font size in points (fallback composer only).
    #[arg(long, default_value_t = 11.0)]
    font_size: f32,

    /// Path to the wkhtmltopdf binary.
    #[arg(long, env = "DOCPRESS_WKHTMLTOPDF")]
    wkhtmltopdf: Option<PathBuf>,

    /// Extra argument passed verbatim to wkhtmltopdf (repeatable).
    #[arg(long = "wkhtmltopdf-arg", value_name = "ARG")]
    wkhtmltopdf_args: Vec<String>,

    /// Output the conversion result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Auto,
    Primary,
    Fallback,
}

impl From<EngineArg> for EngineSelection {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => EngineSelection::Auto,
            EngineArg::Primary => EngineSelection::PrimaryOnly,
            EngineArg::Fallback => EngineSelection::FallbackOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request and config ─────────────────────────────────────────
    let mut request = ConversionRequest::new(&cli.input, &cli.output);
    for (name, path) in &cli.images {
        request = request.with_image(name.clone(), path.clone());
    }

    let config = build_config(&cli)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&request, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}",
            green("✔"),
            bold(&output.path().display().to_string()),
            dim(&format!(
                "{} engine, {} bytes, {}ms",
                output.engine_used, output.stats.output_bytes, output.stats.total_duration_ms
            )),
        );
        if output.stats.images_resolved > 0 {
            eprintln!(
                "   {} image references rewritten ({} mapped)",
                output.stats.references_rewritten, output.stats.images_resolved
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .page_size(cli.page_size)
        .margin_mm(cli.margin)
        .base_font_size(cli.font_size)
        .engines(cli.engine.into());

    if let Some(ref path) = cli.wkhtmltopdf {
        builder = builder.wkhtmltopdf_path(path);
    }
    for arg in &cli.wkhtmltopdf_args {
        builder = builder.wkhtmltopdf_arg(arg);
    }

    builder.build().context("Invalid configuration")
}

/// Parse one `--image NAME=PATH` mapping.
fn parse_image_mapping(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=PATH, got '{s}'")),
    }
}

/// Parse `--page-size` into `PageSize`.
fn parse_page_size(s: &str) -> Result<PageSize, String> {
    match s.to_lowercase().as_str() {
        "a4" => Ok(PageSize::A4),
        "a5" => Ok(PageSize::A5),
        "letter" => Ok(PageSize::Letter),
        custom => {
            let (w, h) = custom
                .split_once('x')
                .ok_or_else(|| format!("expected a4, a5, letter, or WIDTHxHEIGHT, got '{s}'"))?;
            let w: f32 = w.trim().parse().map_err(|_| format!("invalid width: '{w}'"))?;
            let h: f32 = h.trim().parse().map_err(|_| format!("invalid height: '{h}'"))?;
            if w <= 0.0 || h <= 0.0 {
                return Err(format!("page dimensions must be positive, got {w}x{h}"));
            }
            Ok(PageSize::Custom(w, h))
        }
    }
}
