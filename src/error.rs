//! Error types for the docpress library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DocPressError`] — **Fatal**: the conversion cannot proceed or has
//!   exhausted every rendering engine (bad input, missing image source,
//!   workspace failure). Returned as `Err(DocPressError)` from the
//!   top-level `convert*` functions.
//!
//! * [`EngineError`] — **Non-fatal**: a single rendering engine failed.
//!   A primary-engine error triggers the fallback engine instead of
//!   aborting the request; only when the fallback also fails do the
//!   collected `EngineError`s escalate into
//!   [`DocPressError::AllEnginesFailed`].
//!
//! The separation keeps the fallback policy out of the error types
//! themselves: engines report what broke, the conversion engine decides
//! whether that is fatal.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the docpress library.
///
/// Engine-level failures use [`EngineError`] and are aggregated into
/// [`DocPressError::AllEnginesFailed`] only once no engine remains.
#[derive(Debug, Error)]
pub enum DocPressError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The HTML source file was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    HtmlNotFound { path: PathBuf },

    /// Process does not have read permission on the HTML source.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// A declared image source does not exist or is not a regular file.
    ///
    /// Raised by the resolver before any renderer runs — there is nothing
    /// sensible to fall back to when the request itself names a missing file.
    #[error("Image source not found for '{name}': '{path}'\nEvery entry in the image map must point at an existing file.")]
    ImageNotFound { name: String, path: PathBuf },

    // ── Workspace errors ──────────────────────────────────────────────────
    /// The scoped temporary workspace could not be created or written.
    #[error("Temporary workspace failure: {detail}")]
    Workspace { detail: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// Every configured engine was attempted once and all of them failed.
    ///
    /// Carries each engine's own error so the caller can tell whether the
    /// primary was absent, crashed, or produced nothing, independently of
    /// why the fallback broke.
    #[error("All rendering engines failed.\nprimary:  {}\nfallback: {}",
        format_engine_error(.primary), format_engine_error(.fallback))]
    AllEnginesFailed {
        primary: Option<EngineError>,
        fallback: Option<EngineError>,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage the finished PDF at the requested output path.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_engine_error(e: &Option<EngineError>) -> String {
    match e {
        Some(err) => err.to_string(),
        None => "not attempted".to_string(),
    }
}

/// A non-fatal error from a single rendering engine.
///
/// Stored by the conversion engine while it still has fallbacks to try;
/// surfaced inside [`DocPressError::AllEnginesFailed`] otherwise.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
#[error("[{engine}] {detail}")]
pub struct EngineError {
    /// Engine name, e.g. `"wkhtmltopdf"` or `"composer"`.
    pub engine: String,
    /// Human-readable failure description (exit status, stderr, etc.).
    pub detail: String,
}

impl EngineError {
    pub fn new(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_not_found_names_key_and_path() {
        let e = DocPressError::ImageNotFound {
            name: "logo.png".into(),
            path: PathBuf::from("/missing/logo.png"),
        };
        let msg = e.to_string();
        assert!(msg.contains("logo.png"), "got: {msg}");
        assert!(msg.contains("/missing/logo.png"), "got: {msg}");
    }

    #[test]
    fn aggregate_carries_both_engine_messages() {
        let e = DocPressError::AllEnginesFailed {
            primary: Some(EngineError::new("wkhtmltopdf", "exit status 1")),
            fallback: Some(EngineError::new("composer", "font load failed")),
        };
        let msg = e.to_string();
        assert!(msg.contains("wkhtmltopdf"));
        assert!(msg.contains("exit status 1"));
        assert!(msg.contains("composer"));
        assert!(msg.contains("font load failed"));
    }

    #[test]
    fn aggregate_marks_unattempted_engines() {
        let e = DocPressError::AllEnginesFailed {
            primary: None,
            fallback: Some(EngineError::new("composer", "boom")),
        };
        assert!(e.to_string().contains("not attempted"));
    }

    #[test]
    fn engine_error_display_includes_engine_name() {
        let e = EngineError::new("wkhtmltopdf", "binary not found in PATH");
        assert_eq!(e.to_string(), "[wkhtmltopdf] binary not found in PATH");
    }
}
