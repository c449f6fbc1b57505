//! Scoped temporary workspace for one conversion.
//!
//! ## Why a TempDir wrapper?
//!
//! The rewritten HTML and the staged PDF must live somewhere both engines
//! can reach by path, and must be gone after the request — success, engine
//! failure, or panic alike. Holding a [`tempfile::TempDir`] ties the
//! directory's lifetime to the `Workspace` value: when it is dropped on any
//! exit path, the directory and its contents are removed. No call site ever
//! does cleanup bookkeeping.

use crate::error::DocPressError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A per-request temporary directory, deleted on drop.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create an isolated workspace. Failure here is fatal to the request.
    pub fn create() -> Result<Self, DocPressError> {
        let dir = TempDir::new().map_err(|e| DocPressError::Workspace {
            detail: format!("could not create temp directory: {e}"),
        })?;
        debug!("Created workspace: {}", dir.path().display());
        Ok(Self { dir })
    }

    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write the rewritten HTML under the source document's original
    /// basename (wkhtmltopdf resolves sibling-relative assets against it).
    pub fn stage_html(&self, original: &Path, html: &str) -> Result<PathBuf, DocPressError> {
        let name = original
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("document.html"));
        let staged = self.dir.path().join(name);
        std::fs::write(&staged, html).map_err(|e| DocPressError::Workspace {
            detail: format!("could not write rewritten HTML to {}: {e}", staged.display()),
        })?;
        debug!("Staged rewritten HTML: {}", staged.display());
        Ok(staged)
    }

    /// Path where engines render before the PDF is moved to its destination.
    pub fn staged_pdf(&self) -> PathBuf {
        self.dir.path().join("output.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_removed_on_drop() {
        let ws = Workspace::create().unwrap();
        let root = ws.path().to_path_buf();
        ws.stage_html(Path::new("doc.html"), "<p>x</p>").unwrap();
        assert!(root.exists());
        drop(ws);
        assert!(!root.exists(), "workspace must be deleted on drop");
    }

    #[test]
    fn workspace_removed_even_when_scope_panics() {
        use std::sync::{Arc, Mutex};

        let seen = Arc::new(Mutex::new(None::<std::path::PathBuf>));
        let seen_inner = Arc::clone(&seen);
        let result = std::panic::catch_unwind(move || {
            let ws = Workspace::create().unwrap();
            *seen_inner.lock().unwrap() = Some(ws.path().to_path_buf());
            ws.stage_html(Path::new("doc.html"), "<p>x</p>").unwrap();
            panic!("renderer exploded");
        });
        assert!(result.is_err(), "closure should have panicked");

        let root = seen.lock().unwrap().take().unwrap();
        assert!(!root.exists(), "workspace must be deleted during unwind");
    }

    #[test]
    fn stage_html_keeps_original_basename() {
        let ws = Workspace::create().unwrap();
        let staged = ws
            .stage_html(Path::new("/somewhere/report.html"), "<h1>r</h1>")
            .unwrap();
        assert_eq!(staged.file_name().unwrap(), "report.html");
        assert_eq!(std::fs::read_to_string(&staged).unwrap(), "<h1>r</h1>");
    }

    #[test]
    fn staged_pdf_lives_inside_workspace() {
        let ws = Workspace::create().unwrap();
        assert!(ws.staged_pdf().starts_with(ws.path()));
    }
}
