//! Fallback engine: programmatic PDF composition, always available.
//!
//! ## Why a second, cruder renderer?
//!
//! wkhtmltopdf is an external tool-chain that may simply not be installed.
//! The composer is pure Rust on top of `printpdf`, so a conversion can
//! always produce *a* document. It does not share the primary engine's
//! rendering semantics: instead of laying out HTML faithfully it re-flows
//! the document through its own much smaller model — headings, paragraphs,
//! lists and images — which covers the structure the tool's callers
//! actually generate.
//!
//! Degradation policy, in order:
//! 1. recognized blocks are flowed with naive wrapping and pagination;
//! 2. an image that is missing or will not decode becomes an italic
//!    placeholder line instead of failing the render;
//! 3. if no blocks can be recognized at all, the whole document is
//!    tag-stripped and emitted as plain paragraphs, so the output is never
//!    an empty PDF.

use crate::config::ConversionConfig;
use crate::error::EngineError;
use crate::pipeline::render::PdfEngine;
use crate::request::EngineKind;
use once_cell::sync::Lazy;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use regex::Regex;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ENGINE_NAME: &str = "composer";
const PT_TO_MM: f32 = 0.352_778;
/// Images are placed at their pixel size assuming a 96 dpi source.
const IMAGE_DPI: f32 = 96.0;

/// The built-in programmatic PDF composer.
pub struct ComposerEngine;

impl PdfEngine for ComposerEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Fallback
    }

    fn is_available(&self) -> bool {
        true
    }

    fn render(
        &self,
        html_path: &Path,
        output_path: &Path,
        config: &ConversionConfig,
    ) -> Result<(), EngineError> {
        let html = std::fs::read_to_string(html_path)
            .map_err(|e| EngineError::new(ENGINE_NAME, format!("reading HTML: {e}")))?;

        let mut blocks = parse_blocks(&html);
        if blocks.is_empty() {
            warn!("No structural blocks recognized; falling back to tag-stripped text");
            blocks = plain_text_blocks(&html);
        }

        compose(&blocks, output_path, config)
    }
}

// ── Block model ──────────────────────────────────────────────────────────

/// One unit of content the composer knows how to flow.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem {
        ordered: bool,
        index: usize,
        text: String,
    },
    Image { src: String, alt: String },
}

// One alternation per recognized block kind; (?is) makes `.` span lines and
// tags case-insensitive. The regex crate has no backreferences, so ol and ul
// get separate branches.
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>|<p[^>]*>(.*?)</p\s*>|<ol[^>]*>(.*?)</ol\s*>|<ul[^>]*>(.*?)</ul\s*>|<img\b[^>]*>",
    )
    .unwrap()
});

static RE_LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li\s*>").unwrap());

static RE_ATTR_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*["']([^"']*)["']"#).unwrap());

static RE_ATTR_ALT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\balt\s*=\s*["']([^"']*)["']"#).unwrap());

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Scan HTML into the composer's block model, in document order.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    let mut blocks = Vec::new();

    for caps in RE_BLOCK.captures_iter(html) {
        if let (Some(level), Some(body)) = (caps.get(1), caps.get(2)) {
            let text = inline_text(body.as_str());
            if !text.is_empty() {
                blocks.push(Block::Heading {
                    level: level.as_str().parse().unwrap_or(1),
                    text,
                });
            }
        } else if let Some(body) = caps.get(3) {
            // a paragraph may wrap an image; keep both
            for img in RE_BLOCK
                .captures_iter(body.as_str())
                .filter(|c| c.get(1).is_none() && c.get(3).is_none())
            {
                if let Some(block) = image_block(&img[0]) {
                    blocks.push(block);
                }
            }
            let text = inline_text(body.as_str());
            if !text.is_empty() {
                blocks.push(Block::Paragraph(text));
            }
        } else if let Some(body) = caps.get(4) {
            push_list_items(body.as_str(), true, &mut blocks);
        } else if let Some(body) = caps.get(5) {
            push_list_items(body.as_str(), false, &mut blocks);
        } else if let Some(block) = image_block(&caps[0]) {
            blocks.push(block);
        }
    }

    blocks
}

fn push_list_items(body: &str, ordered: bool, blocks: &mut Vec<Block>) {
    for (i, item) in RE_LIST_ITEM.captures_iter(body).enumerate() {
        let text = inline_text(&item[1]);
        if !text.is_empty() {
            blocks.push(Block::ListItem {
                ordered,
                index: i + 1,
                text,
            });
        }
    }
}

fn image_block(tag: &str) -> Option<Block> {
    let src = RE_ATTR_SRC.captures(tag)?[1].to_string();
    let alt = RE_ATTR_ALT
        .captures(tag)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    Some(Block::Image { src, alt })
}

/// Strip nested tags, decode entities, collapse whitespace.
fn inline_text(fragment: &str) -> String {
    let stripped = RE_TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
}

/// Last resort: the whole document as tag-stripped paragraphs.
fn plain_text_blocks(html: &str) -> Vec<Block> {
    let text = RE_TAG.replace_all(html, " ");
    let decoded = decode_entities(&text);
    decoded
        .split("\n\n")
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|p| !p.is_empty())
        .map(Block::Paragraph)
        .collect()
}

// ── PDF composition ──────────────────────────────────────────────────────

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

/// Page cursor: y descends from the top margin; crossing the bottom margin
/// starts a fresh page.
struct Cursor<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y_mm: f32,
    page_w: f32,
    page_h: f32,
    margin: f32,
}

impl Cursor<'_> {
    fn content_width(&self) -> f32 {
        self.page_w - 2.0 * self.margin
    }

    fn content_height(&self) -> f32 {
        self.page_h - 2.0 * self.margin
    }

    fn ensure_room(&mut self, needed_mm: f32) {
        let needed = needed_mm.min(self.content_height());
        if self.y_mm - needed < self.margin {
            let (page, layer) = self
                .doc
                .add_page(Mm(self.page_w), Mm(self.page_h), "content");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y_mm = self.page_h - self.margin;
        }
    }

    fn text_line(&mut self, text: &str, size_pt: f32, font: &IndirectFontRef, indent_mm: f32) {
        let lh = line_height_mm(size_pt);
        self.ensure_room(lh);
        self.y_mm -= lh;
        self.layer.use_text(
            text,
            size_pt,
            Mm(self.margin + indent_mm),
            Mm(self.y_mm),
            font,
        );
    }

    fn gap(&mut self, mm: f32) {
        self.y_mm -= mm;
    }
}

fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * 1.4 * PT_TO_MM
}

/// Rough monospace-ish estimate: Helvetica averages about half the point
/// size per glyph, which errs on the short side and never overflows.
fn chars_per_line(width_mm: f32, size_pt: f32) -> usize {
    ((width_mm / (size_pt * 0.5 * PT_TO_MM)) as usize).max(1)
}

fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn compose(
    blocks: &[Block],
    output_path: &Path,
    config: &ConversionConfig,
) -> Result<(), EngineError> {
    let (page_w, page_h) = config.page_size.dimensions_mm();
    let (doc, page1, layer1) = PdfDocument::new("docpress", Mm(page_w), Mm(page_h), "content");

    let fonts = Fonts {
        regular: builtin(&doc, BuiltinFont::Helvetica)?,
        bold: builtin(&doc, BuiltinFont::HelveticaBold)?,
        italic: builtin(&doc, BuiltinFont::HelveticaOblique)?,
    };

    let mut cursor = Cursor {
        layer: doc.get_page(page1).get_layer(layer1),
        doc: &doc,
        y_mm: page_h - config.margin_mm,
        page_w,
        page_h,
        margin: config.margin_mm,
    };

    let base = config.base_font_size;
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = match level {
                    1 => base * 2.0,
                    2 => base * 1.5,
                    _ => base * 1.25,
                };
                cursor.gap(line_height_mm(size) * 0.5);
                flow_text(&mut cursor, text, size, &fonts.bold, 0.0);
                cursor.gap(line_height_mm(size) * 0.3);
            }
            Block::Paragraph(text) => {
                flow_text(&mut cursor, text, base, &fonts.regular, 0.0);
                cursor.gap(line_height_mm(base) * 0.5);
            }
            Block::ListItem {
                ordered,
                index,
                text,
            } => {
                let marked = if *ordered {
                    format!("{index}. {text}")
                } else {
                    format!("\u{2022} {text}")
                };
                flow_text(&mut cursor, &marked, base, &fonts.regular, 5.0);
            }
            Block::Image { src, alt } => {
                place_image(&mut cursor, src, alt, base, &fonts.italic);
            }
        }
    }

    // Never emit a zero-page shell
    if blocks.is_empty() {
        cursor.text_line(
            "No content could be extracted from the HTML",
            base,
            &fonts.regular,
            0.0,
        );
    }

    let file = File::create(output_path)
        .map_err(|e| EngineError::new(ENGINE_NAME, format!("creating output: {e}")))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| EngineError::new(ENGINE_NAME, format!("saving PDF: {e:?}")))?;

    debug!("Composer wrote {}", output_path.display());
    Ok(())
}

fn builtin(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, EngineError> {
    doc.add_builtin_font(font)
        .map_err(|e| EngineError::new(ENGINE_NAME, format!("loading builtin font: {e:?}")))
}

fn flow_text(
    cursor: &mut Cursor<'_>,
    text: &str,
    size_pt: f32,
    font: &IndirectFontRef,
    indent_mm: f32,
) {
    let width = cursor.content_width() - indent_mm;
    for line in wrap(text, chars_per_line(width, size_pt)) {
        cursor.text_line(&line, size_pt, font, indent_mm);
    }
}

/// Embed an image at the cursor, or degrade to a placeholder line.
fn place_image(
    cursor: &mut Cursor<'_>,
    src: &str,
    alt: &str,
    base_pt: f32,
    italic: &IndirectFontRef,
) {
    let path = local_path(src);

    if !path.is_file() {
        warn!("Image file not found at compose time: {}", path.display());
        cursor.text_line(
            &format!("[image not found: {src}]"),
            base_pt,
            italic,
            0.0,
        );
        return;
    }

    // Decode with printpdf's own image codec so the embedded object and the
    // codec version always agree.
    let decoded = match printpdf::image_crate::open(&path) {
        Ok(img) => img,
        Err(e) => {
            warn!("Image exists but will not decode: {}: {e}", path.display());
            cursor.text_line(
                &format!("[image could not be loaded: {src}]"),
                base_pt,
                italic,
                0.0,
            );
            return;
        }
    };

    use printpdf::image_crate::GenericImageView;
    let (px_w, px_h) = decoded.dimensions();
    let (px_w, px_h) = (px_w as f32, px_h as f32);
    let natural_w_mm = px_w * 25.4 / IMAGE_DPI;
    let natural_h_mm = px_h * 25.4 / IMAGE_DPI;

    // Fit within the content box, never upscale
    let scale = (cursor.content_width() / natural_w_mm)
        .min(cursor.content_height() / natural_h_mm)
        .min(1.0);
    let h_mm = natural_h_mm * scale;

    cursor.ensure_room(h_mm);
    cursor.y_mm -= h_mm;

    let pdf_image = Image::from_dynamic_image(&decoded);
    pdf_image.add_to_layer(
        cursor.layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(cursor.margin)),
            translate_y: Some(Mm(cursor.y_mm)),
            scale_x: Some(scale),
            scale_y: Some(scale),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );

    if !alt.is_empty() {
        cursor.text_line(alt, base_pt * 0.9, italic, 0.0);
    }
    cursor.gap(line_height_mm(base_pt) * 0.5);
}

/// Accept both plain paths and the rewriter's `file://` URIs.
fn local_path(src: &str) -> PathBuf {
    PathBuf::from(src.strip_prefix("file://").unwrap_or(src))
}
