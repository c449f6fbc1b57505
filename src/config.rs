//! Configuration types for HTML-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across requests and to diff two runs to
//! understand why their outputs differ.

use crate::error::DocPressError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for an HTML-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use docpress::{ConversionConfig, PageSize};
///
/// let config = ConversionConfig::builder()
///     .page_size(PageSize::A4)
///     .margin_mm(20.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Target page size. Default: [`PageSize::A4`].
    pub page_size: PageSize,

    /// Uniform page margin in millimetres. Default: 18.0.
    ///
    /// Applied by the fallback composer; the primary engine receives it as
    /// `--margin-*` flags so both engines paginate comparably.
    pub margin_mm: f32,

    /// Base font size in points used by the fallback composer. Default: 11.0.
    pub base_font_size: f32,

    /// Which engines to attempt, and in what order. Default: [`EngineSelection::Auto`].
    pub engines: EngineSelection,

    /// Override for the wkhtmltopdf binary. Default: `"wkhtmltopdf"` from PATH.
    ///
    /// When unset, availability is probed once per process and cached;
    /// an explicit override is probed per request since it may differ
    /// between callers.
    pub wkhtmltopdf_path: Option<PathBuf>,

    /// Extra arguments passed verbatim to wkhtmltopdf, e.g. `--grayscale`.
    pub wkhtmltopdf_args: Vec<String>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::default(),
            margin_mm: 18.0,
            base_font_size: 11.0,
            engines: EngineSelection::default(),
            wkhtmltopdf_path: None,
            wkhtmltopdf_args: Vec::new(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.page_size = size;
        self
    }

    pub fn margin_mm(mut self, mm: f32) -> Self {
        self.config.margin_mm = mm.max(0.0);
        self
    }

    pub fn base_font_size(mut self, pt: f32) -> Self {
        self.config.base_font_size = pt.clamp(6.0, 72.0);
        self
    }

    pub fn engines(mut self, selection: EngineSelection) -> Self {
        self.config.engines = selection;
        self
    }

    pub fn wkhtmltopdf_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.wkhtmltopdf_path = Some(path.into());
        self
    }

    pub fn wkhtmltopdf_arg(mut self, arg: impl Into<String>) -> Self {
        self.config.wkhtmltopdf_args.push(arg.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, DocPressError> {
        let c = &self.config;
        let (w, h) = c.page_size.dimensions_mm();
        if w <= 0.0 || h <= 0.0 {
            return Err(DocPressError::InvalidConfig(format!(
                "Page dimensions must be positive, got {w}x{h} mm"
            )));
        }
        if c.margin_mm * 2.0 >= w.min(h) {
            return Err(DocPressError::InvalidConfig(format!(
                "Margin {} mm leaves no content area on a {w}x{h} mm page",
                c.margin_mm
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Target page size for the produced PDF.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 148 × 210 mm.
    A5,
    /// 215.9 × 279.4 mm.
    Letter,
    /// Custom width × height in millimetres.
    Custom(f32, f32),
}

impl PageSize {
    /// Page dimensions as (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Custom(w, h) => (*w, *h),
        }
    }
}

/// Which rendering engines a conversion may attempt.
///
/// `Auto` is the production policy: the higher-fidelity external engine
/// first, the built-in composer as the guaranteed fallback. The forced
/// variants exist for diagnosis and for tests that must not depend on
/// whether wkhtmltopdf is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineSelection {
    /// Primary first, fallback on primary failure or absence (default).
    #[default]
    Auto,
    /// Only the wkhtmltopdf engine; its failure is final.
    PrimaryOnly,
    /// Only the built-in composer.
    FallbackOnly,
}
