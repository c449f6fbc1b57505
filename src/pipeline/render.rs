//! Rendering engines: the primary external tool-chain and engine selection.
//!
//! ## Why a trait with an ordered list?
//!
//! The fallback policy is structural, not conditional: a closed set of
//! engines implementing one capability ("render this HTML file to this PDF
//! path, fail with a typed error"), tried in priority order. The conversion
//! engine walks the list and never needs to know which engine it is talking
//! to; adding a third renderer would not touch the orchestration.
//!
//! ## Why probe availability once per process?
//!
//! Spawning `wkhtmltopdf -V` costs a fork+exec. Whether the tool-chain is
//! installed does not change over a process lifetime, so the default-binary
//! probe is a `Lazy<bool>` evaluated on first use and reused for every
//! subsequent request. An explicit binary override from config bypasses the
//! cache, since different callers may point at different binaries.

use crate::config::{ConversionConfig, EngineSelection, PageSize};
use crate::error::EngineError;
use crate::pipeline::compose::ComposerEngine;
use crate::request::EngineKind;
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// One way of turning a rewritten HTML file into a PDF.
pub trait PdfEngine: Send + Sync {
    /// Engine name used in logs and error payloads.
    fn name(&self) -> &'static str;

    /// Whether this engine is the primary or the fallback.
    fn kind(&self) -> EngineKind;

    /// Cheap availability check; an unavailable engine is skipped, which
    /// counts as a failure of that engine for fallback purposes.
    fn is_available(&self) -> bool;

    /// Render `html_path` to `output_path`. Exactly one attempt, no retries.
    fn render(
        &self,
        html_path: &Path,
        output_path: &Path,
        config: &ConversionConfig,
    ) -> Result<(), EngineError>;
}

/// Engines to attempt for this config, in priority order.
pub fn engines_for(config: &ConversionConfig) -> Vec<Box<dyn PdfEngine>> {
    match config.engines {
        EngineSelection::Auto => vec![
            Box::new(WkhtmltopdfEngine::new(config.wkhtmltopdf_path.clone())),
            Box::new(ComposerEngine),
        ],
        EngineSelection::PrimaryOnly => vec![Box::new(WkhtmltopdfEngine::new(
            config.wkhtmltopdf_path.clone(),
        ))],
        EngineSelection::FallbackOnly => vec![Box::new(ComposerEngine)],
    }
}

// ── Primary engine: wkhtmltopdf ──────────────────────────────────────────

const DEFAULT_BINARY: &str = "wkhtmltopdf";

/// Process-wide probe of the default binary, evaluated once.
static WKHTMLTOPDF_ON_PATH: Lazy<bool> = Lazy::new(|| {
    let available = probe(Path::new(DEFAULT_BINARY));
    if available {
        info!("wkhtmltopdf found on PATH");
    } else {
        warn!("wkhtmltopdf not found on PATH; conversions will use the fallback composer");
    }
    available
});

/// Run `<binary> -V` and report whether it exits successfully.
fn probe(binary: &Path) -> bool {
    Command::new(binary)
        .arg("-V")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// The external WYSIWYG HTML-to-PDF tool-chain.
pub struct WkhtmltopdfEngine {
    binary: Option<PathBuf>,
}

impl WkhtmltopdfEngine {
    pub fn new(binary: Option<PathBuf>) -> Self {
        Self { binary }
    }

    fn binary(&self) -> &Path {
        self.binary
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_BINARY))
    }
}

impl PdfEngine for WkhtmltopdfEngine {
    fn name(&self) -> &'static str {
        "wkhtmltopdf"
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Primary
    }

    fn is_available(&self) -> bool {
        match self.binary {
            Some(ref custom) => probe(custom),
            None => *WKHTMLTOPDF_ON_PATH,
        }
    }

    fn render(
        &self,
        html_path: &Path,
        output_path: &Path,
        config: &ConversionConfig,
    ) -> Result<(), EngineError> {
        let margin = format!("{}mm", config.margin_mm);
        let mut cmd = Command::new(self.binary());
        cmd.arg("--quiet")
            .arg("--enable-local-file-access")
            .args(["--margin-top", &margin])
            .args(["--margin-bottom", &margin])
            .args(["--margin-left", &margin])
            .args(["--margin-right", &margin]);

        match config.page_size {
            PageSize::A4 => {
                cmd.args(["--page-size", "A4"]);
            }
            PageSize::A5 => {
                cmd.args(["--page-size", "A5"]);
            }
            PageSize::Letter => {
                cmd.args(["--page-size", "Letter"]);
            }
            PageSize::Custom(w, h) => {
                cmd.args(["--page-width", &format!("{w}mm")])
                    .args(["--page-height", &format!("{h}mm")]);
            }
        }

        cmd.args(&config.wkhtmltopdf_args);
        cmd.arg(html_path).arg(output_path);

        debug!("Invoking {:?}", cmd);
        let output = cmd
            .output()
            .map_err(|e| EngineError::new(self.name(), format!("failed to spawn: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::new(
                self.name(),
                format!("{}: {}", output.status, stderr.trim()),
            ));
        }

        // wkhtmltopdf can exit 0 yet write nothing when the input is empty
        let size = std::fs::metadata(output_path).map(|m| m.len()).unwrap_or(0);
        if size == 0 {
            return Err(EngineError::new(
                self.name(),
                "exited successfully but produced no output file",
            ));
        }

        debug!(
            "wkhtmltopdf wrote {} bytes to {}",
            size,
            output_path.display()
        );
        Ok(())
    }
}
