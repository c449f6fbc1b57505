//! Request and output types for a single conversion.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One HTML-to-PDF conversion job.
///
/// `images` maps a logical image name — the string HTML `<img>` tags refer
/// to — onto the file that should actually be embedded. Keys are unique by
/// construction (`BTreeMap`), and iteration order is deterministic, which
/// keeps basename-collision resolution stable across runs.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Path to the HTML source document.
    pub html_path: PathBuf,
    /// Logical image name → source file path. May be empty.
    pub images: BTreeMap<String, PathBuf>,
    /// Destination for the produced PDF.
    pub output_path: PathBuf,
}

impl ConversionRequest {
    /// Convenience constructor for a request without images.
    pub fn new(html_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            html_path: html_path.into(),
            images: BTreeMap::new(),
            output_path: output_path.into(),
        }
    }

    /// Add one logical image mapping.
    pub fn with_image(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.images.insert(name.into(), path.into());
        self
    }
}

/// Which engine actually produced the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// The external wkhtmltopdf tool-chain.
    Primary,
    /// The built-in programmatic composer.
    Fallback,
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineKind::Primary => write!(f, "primary"),
            EngineKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Where the PDF was written (the request's `output_path`).
    pub output_path: PathBuf,
    /// Which engine rendered it.
    pub engine_used: EngineKind,
    /// Timing and substitution statistics.
    pub stats: ConversionStats,
}

impl ConversionOutput {
    /// Path of the produced PDF.
    pub fn path(&self) -> &Path {
        &self.output_path
    }
}

/// Statistics about a conversion run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Number of entries in the resolved image map.
    pub images_resolved: usize,
    /// Number of `<img>` references actually rewritten.
    pub references_rewritten: usize,
    /// Wall-clock time spent inside rendering engines.
    pub render_duration_ms: u64,
    /// Total wall-clock time for the whole pipeline.
    pub total_duration_ms: u64,
    /// Size of the produced PDF in bytes.
    pub output_bytes: u64,
}
