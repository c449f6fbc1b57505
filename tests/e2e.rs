//! End-to-end integration tests for docpress.
//!
//! Everything here runs against real files in per-test temp directories.
//! Tests that need the external wkhtmltopdf binary skip themselves when it
//! is not installed, so the suite passes on machines with and without it.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use docpress::{
    convert, convert_sync, handle_create_doc, ConversionConfig, ConversionRequest, DocPressError,
    EngineKind, EngineSelection,
};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ── Test helpers ─────────────────────────────────────────────────────────

/// Skip this test unless wkhtmltopdf is installed.
macro_rules! skip_unless_wkhtmltopdf {
    () => {
        if !wkhtmltopdf_installed() {
            println!("SKIP — wkhtmltopdf not installed");
            return;
        }
    };
}

fn wkhtmltopdf_installed() -> bool {
    Command::new("wkhtmltopdf")
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn fallback_config() -> ConversionConfig {
    ConversionConfig::builder()
        .engines(EngineSelection::FallbackOnly)
        .build()
        .unwrap()
}

fn write_html(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// A small but real PNG the engines can decode and embed.
fn write_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    let img = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 40]));
    img.save(&path).unwrap();
    path
}

fn assert_is_pdf(path: &Path, context: &str) {
    let bytes = std::fs::read(path)
        .unwrap_or_else(|e| panic!("[{context}] cannot read {}: {e}", path.display()));
    assert!(bytes.len() > 100, "[{context}] suspiciously small PDF");
    assert_eq!(&bytes[..4], b"%PDF", "[{context}] missing PDF magic");
}

// ── Fallback engine (always runnable) ────────────────────────────────────

#[tokio::test]
async fn fallback_converts_structured_document_with_image() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "chart-v2.png");
    let html = write_html(
        dir.path(),
        "report.html",
        r#"<h1>Quarterly Report</h1>
           <p>Revenue grew in <b>all</b> regions.</p>
           <img src="chart.png" alt="Revenue chart">
           <ul><li>North</li><li>South</li></ul>"#,
    );
    let out = dir.path().join("report.pdf");

    let request = ConversionRequest::new(&html, &out).with_image("chart.png", &png);
    let output = convert(&request, &fallback_config()).await.unwrap();

    assert_eq!(output.engine_used, EngineKind::Fallback);
    assert_eq!(output.stats.images_resolved, 1);
    assert_eq!(output.stats.references_rewritten, 1);
    assert_is_pdf(&out, "fallback with image");
}

#[tokio::test]
async fn unmatched_image_references_do_not_fail_the_conversion() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(
        dir.path(),
        "doc.html",
        r#"<p>text</p><img src="never-mapped.png">"#,
    );
    let out = dir.path().join("doc.pdf");

    let request = ConversionRequest::new(&html, &out);
    let output = convert(&request, &fallback_config()).await.unwrap();

    assert_eq!(output.stats.references_rewritten, 0);
    assert_is_pdf(&out, "unmatched refs");
}

#[tokio::test]
async fn unstructured_html_still_produces_a_document() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(
        dir.path(),
        "bare.html",
        "<div><span>no recognized block structure here</span></div>",
    );
    let out = dir.path().join("bare.pdf");

    let request = ConversionRequest::new(&html, &out);
    convert(&request, &fallback_config()).await.unwrap();
    assert_is_pdf(&out, "unstructured html");
}

#[tokio::test]
async fn repeated_conversion_overwrites_the_output() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(dir.path(), "doc.html", "<p>v1</p>");
    let out = dir.path().join("doc.pdf");
    let request = ConversionRequest::new(&html, &out);

    convert(&request, &fallback_config()).await.unwrap();
    let first = std::fs::metadata(&out).unwrap().len();

    std::fs::write(&html, "<h1>v2</h1><p>a much longer second version of the document</p>")
        .unwrap();
    convert(&request, &fallback_config()).await.unwrap();

    assert_is_pdf(&out, "overwrite");
    assert_ne!(std::fs::metadata(&out).unwrap().len(), first);
}

#[test]
fn sync_wrapper_converts_without_an_ambient_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(dir.path(), "doc.html", "<p>sync path</p>");
    let out = dir.path().join("doc.pdf");

    let request = ConversionRequest::new(&html, &out);
    let output = convert_sync(&request, &fallback_config()).unwrap();
    assert_eq!(output.engine_used, EngineKind::Fallback);
    assert_is_pdf(&out, "convert_sync");
}

// ── Failure paths ────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_image_fails_fast_and_renders_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(dir.path(), "doc.html", r#"<img src="gone.png">"#);
    let out = dir.path().join("doc.pdf");

    let request =
        ConversionRequest::new(&html, &out).with_image("gone.png", dir.path().join("gone.png"));
    let err = convert(&request, &fallback_config()).await.unwrap_err();

    match err {
        DocPressError::ImageNotFound { name, .. } => assert_eq!(name, "gone.png"),
        other => panic!("expected ImageNotFound, got {other:?}"),
    }
    assert!(!out.exists(), "failed conversion must leave no output");
}

#[tokio::test]
async fn exhausted_engines_report_both_slots() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(dir.path(), "doc.html", "<p>hi</p>");
    let out = dir.path().join("doc.pdf");

    let config = ConversionConfig::builder()
        .engines(EngineSelection::PrimaryOnly)
        .wkhtmltopdf_path("/definitely/not/wkhtmltopdf")
        .build()
        .unwrap();
    let request = ConversionRequest::new(&html, &out);
    let err = convert(&request, &config).await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("All rendering engines failed"), "{message}");
    assert!(message.contains("not attempted"), "{message}");
    assert!(!out.exists());
}

// ── Tool façade ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_doc_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "logo.png");
    let html = write_html(
        dir.path(),
        "page.html",
        r#"<h2>Hello</h2><img src="logo.png">"#,
    );
    let out = dir.path().join("page.pdf");

    let response = handle_create_doc(
        serde_json::json!({
            "text_file": html,
            "images": { "logo.png": png },
            "output_pdf": out,
        }),
        &fallback_config(),
    )
    .await;

    assert!(response.success, "message: {}", response.message);
    assert_eq!(response.engine, Some(EngineKind::Fallback));
    assert_is_pdf(&out, "create_doc");

    // the envelope itself must serialize cleanly for the host
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["engine"], "fallback");
}

#[tokio::test]
async fn create_doc_reports_bad_arguments_without_panicking() {
    let response = handle_create_doc(serde_json::json!("not an object"), &fallback_config()).await;
    assert!(!response.success);
    assert!(response.message.contains("Invalid arguments"));
}

// ── Primary engine (requires wkhtmltopdf) ────────────────────────────────

#[tokio::test]
async fn primary_engine_renders_when_installed() {
    skip_unless_wkhtmltopdf!();

    let dir = tempfile::tempdir().unwrap();
    let png = write_png(dir.path(), "chart.png");
    let html = write_html(
        dir.path(),
        "report.html",
        r#"<h1>Report</h1><img src="chart.png"><p>body</p>"#,
    );
    let out = dir.path().join("report.pdf");

    let request = ConversionRequest::new(&html, &out).with_image("chart.png", &png);
    let output = convert(&request, &ConversionConfig::default()).await.unwrap();

    assert_eq!(output.engine_used, EngineKind::Primary);
    assert_is_pdf(&out, "primary engine");
}

#[tokio::test]
async fn broken_primary_falls_back_automatically() {
    let dir = tempfile::tempdir().unwrap();
    let html = write_html(dir.path(), "doc.html", "<p>resilient</p>");
    let out = dir.path().join("doc.pdf");

    // Auto policy with a binary that cannot exist: the primary slot fails
    // availability, the composer must still deliver.
    let config = ConversionConfig::builder()
        .engines(EngineSelection::Auto)
        .wkhtmltopdf_path("/definitely/not/wkhtmltopdf")
        .build()
        .unwrap();
    let request = ConversionRequest::new(&html, &out);
    let output = convert(&request, &config).await.unwrap();

    assert_eq!(output.engine_used, EngineKind::Fallback);
    assert_is_pdf(&out, "auto fallback");
}
