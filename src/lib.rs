//! # docpress
//!
//! Convert HTML documents with named images into PDF files.
//!
//! ## Why this crate?
//!
//! Programs that generate reports usually produce HTML plus a handful of
//! image files, with the HTML referring to images by logical name
//! (`<img src="chart.png">`) rather than by real path. docpress takes that
//! pair — one HTML file and a name→path image map — resolves the
//! references, and renders a single PDF. Rendering is dual-engine: the
//! external wkhtmltopdf tool-chain gives full-fidelity output when it is
//! installed, and a built-in `printpdf` composer guarantees a document
//! when it is not.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML + image map
//!  │
//!  ├─ 1. Resolve    validate HTML source and every image path
//!  ├─ 2. Rewrite    <img src="name"> → file:// URI of the real file
//!  ├─ 3. Stage      rewritten HTML into a scoped temp workspace
//!  ├─ 4. Render     wkhtmltopdf first, built-in composer on failure
//!  └─ 5. Publish    staged PDF moved atomically to the output path
//! ```
//!
//! A conversion either publishes a complete PDF or leaves nothing behind;
//! the workspace is deleted on every exit path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpress::{convert, ConversionConfig, ConversionRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConversionRequest::new("report.html", "report.pdf")
//!         .with_image("chart.png", "/data/renders/chart-v2.png");
//!     let config = ConversionConfig::default();
//!     let output = convert(&request, &config).await?;
//!     println!("wrote {} via {} engine",
//!         output.path().display(), output.engine_used);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docpress` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! docpress = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod tool;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, EngineSelection, PageSize};
pub use convert::{convert, convert_sync};
pub use error::{DocPressError, EngineError};
pub use request::{ConversionOutput, ConversionRequest, ConversionStats, EngineKind};
pub use tool::{handle_create_doc, CreateDocArgs, ToolResponse, CREATE_DOC};
