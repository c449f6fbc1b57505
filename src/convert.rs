//! Conversion entry points: the state machine that strings the pipeline
//! stages together.
//!
//! ## Lifecycle of one request
//!
//! Resolve inputs, create a scoped workspace, rewrite image references,
//! stage the HTML, then walk the configured engines in priority order.
//! Engines render into the workspace, never at the destination; the staged
//! PDF is published to the output path with a temp-file-plus-rename only
//! after an engine succeeded, so a failed conversion leaves nothing behind.
//! The workspace is removed on every exit path by dropping it.
//!
//! Engine work (an external process or CPU-bound composition) runs under
//! [`tokio::task::spawn_blocking`] so the async caller's runtime threads
//! are never blocked.

use crate::config::ConversionConfig;
use crate::error::{DocPressError, EngineError};
use crate::pipeline::{render, resolve, rewrite, workspace::Workspace};
use crate::request::{ConversionOutput, ConversionRequest, ConversionStats, EngineKind};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert one HTML document (plus named images) to a PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` once any engine produced a PDF at the request's
/// `output_path`; `output.engine_used` says which one.
///
/// # Errors
/// Returns `Err(DocPressError)` only for fatal conditions:
/// - HTML source missing or unreadable
/// - an image map entry naming a missing file
/// - workspace creation or output staging failure
/// - every configured engine failed ([`DocPressError::AllEnginesFailed`])
///
/// On error no file exists at `output_path` that this call created.
pub async fn convert(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DocPressError> {
    let total_start = Instant::now();
    info!("Starting conversion: {}", request.html_path.display());

    // ── Step 1: Resolve inputs ───────────────────────────────────────────
    resolve::resolve_html(&request.html_path)?;
    let resolved = resolve::resolve_images(&request.images)?;
    let images_resolved = resolved.len();

    // ── Step 2: Create scoped workspace ──────────────────────────────────
    let workspace = Workspace::create()?;

    // ── Step 3: Rewrite image references and stage HTML ──────────────────
    let html = read_html(&request.html_path)?;
    let (rewritten, references_rewritten) = rewrite::rewrite_image_refs(&html, &resolved);
    debug!(
        "Rewrote {}/{} mapped image references",
        references_rewritten, images_resolved
    );
    let staged_html = workspace.stage_html(&request.html_path, &rewritten)?;
    let staged_pdf = workspace.staged_pdf();

    // ── Step 4: Walk engines in priority order ───────────────────────────
    let render_start = Instant::now();
    let engines = render::engines_for(config);
    let engine_config = config.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        run_engines(engines, &staged_html, &staged_pdf, &engine_config)
    })
    .await
    .map_err(|e| DocPressError::Internal(format!("render task panicked: {e}")))?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let engine_used = match outcome {
        Ok(kind) => kind,
        Err((primary, fallback)) => {
            return Err(DocPressError::AllEnginesFailed { primary, fallback });
        }
    };

    // ── Step 5: Publish the staged PDF atomically ────────────────────────
    let staged_pdf = workspace.staged_pdf();
    let output_bytes = std::fs::metadata(&staged_pdf).map(|m| m.len()).unwrap_or(0);
    publish(&staged_pdf, &request.output_path)?;

    let stats = ConversionStats {
        images_resolved,
        references_rewritten,
        render_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        output_bytes,
    };

    info!(
        "Conversion complete: {} via {} engine, {} bytes, {}ms total",
        request.output_path.display(),
        engine_used,
        output_bytes,
        stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_path: request.output_path.clone(),
        engine_used,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, DocPressError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DocPressError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(request, config))
}

/// Try each engine once, first success wins.
///
/// Failures are collected per slot rather than logged away, so the caller
/// can report the primary's and the fallback's fate independently.
fn run_engines(
    engines: Vec<Box<dyn render::PdfEngine>>,
    html_path: &Path,
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<EngineKind, (Option<EngineError>, Option<EngineError>)> {
    let mut primary: Option<EngineError> = None;
    let mut fallback: Option<EngineError> = None;

    for engine in engines {
        if !engine.is_available() {
            warn!("Engine '{}' is not available, skipping", engine.name());
            record(
                engine.kind(),
                EngineError::new(engine.name(), "engine not available"),
                &mut primary,
                &mut fallback,
            );
            continue;
        }

        info!("Rendering with '{}' engine", engine.name());
        match engine.render(html_path, output_path, config) {
            Ok(()) => return Ok(engine.kind()),
            Err(e) => {
                warn!("Engine '{}' failed: {}", engine.name(), e.detail);
                record(engine.kind(), e, &mut primary, &mut fallback);
            }
        }
    }

    Err((primary, fallback))
}

fn record(
    kind: EngineKind,
    err: EngineError,
    primary: &mut Option<EngineError>,
    fallback: &mut Option<EngineError>,
) {
    match kind {
        EngineKind::Primary => *primary = Some(err),
        EngineKind::Fallback => *fallback = Some(err),
    }
}

fn read_html(path: &Path) -> Result<String, DocPressError> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocPressError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocPressError::HtmlNotFound {
            path: path.to_path_buf(),
        },
    })
}

/// Move the staged PDF to its destination.
///
/// Copies into a sibling temp file first and renames over it; the staged
/// file may sit on a different filesystem, so a direct rename is not an
/// option, and the rename step keeps readers from ever seeing a partial
/// PDF at `output_path`.
fn publish(staged: &Path, output_path: &Path) -> Result<(), DocPressError> {
    let write_err = |source: std::io::Error| DocPressError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let tmp_path = output_path.with_extension("pdf.tmp");
    std::fs::copy(staged, &tmp_path).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp_path, output_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }

    debug!("Published PDF: {}", output_path.display());
    Ok(())
}
