//! HTML rewriting: point image references at their resolved sources.
//!
//! ## Why rewrite at all?
//!
//! The HTML author refers to images by logical name (`<img src="logo.png">`),
//! but neither engine knows where `logo.png` actually lives — the request's
//! image map does. Rewriting each matching `src` to a `file://` URI of the
//! canonical path lets wkhtmltopdf dereference it directly and lets the
//! composer find the bytes to embed, without copying image files around.
//!
//! Matching policy: the literal `src` string is checked against the map
//! first; only when that misses is the reference's basename compared. An
//! exact key therefore always wins over a basename collision, and the
//! basename fallback scans keys in `BTreeMap` order, so collisions resolve
//! deterministically. References that match nothing are left untouched —
//! unresolved images are not errors, rendering proceeds best-effort.

use crate::pipeline::resolve::ResolvedImageMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::Path;
use tracing::{debug, info};

/// `<img … src="…">` with either quote style. The tag prefix up to and
/// including the `=` is captured so the replacement can re-emit it verbatim.
static RE_IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\bsrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Rewrite matching image references to `file://` URIs of resolved paths.
///
/// Returns the rewritten HTML and the number of references replaced.
pub fn rewrite_image_refs(html: &str, images: &ResolvedImageMap) -> (String, usize) {
    if images.is_empty() {
        return (html.to_string(), 0);
    }

    let mut replaced = 0usize;
    let rewritten = RE_IMG_SRC.replace_all(html, |caps: &Captures| {
        let prefix = &caps[1];
        let (src, quote) = match (caps.get(2), caps.get(3)) {
            (Some(m), _) => (m.as_str(), '"'),
            (_, Some(m)) => (m.as_str(), '\''),
            _ => unreachable!("regex requires one quoted group"),
        };

        match lookup(src, images) {
            Some(path) => {
                replaced += 1;
                debug!("Rewrote image reference: {} -> {}", src, path.display());
                format!("{prefix}{quote}{}{quote}", file_uri(path))
            }
            None => caps[0].to_string(),
        }
    });

    if replaced == 0 && !images.is_empty() {
        info!("No image references matched the image map; HTML left as-is");
    }

    (rewritten.into_owned(), replaced)
}

/// Find the map entry for one `src` value: literal key first, basename second.
fn lookup<'a>(src: &str, images: &'a ResolvedImageMap) -> Option<&'a Path> {
    if let Some(path) = images.get(src) {
        return Some(path.as_path());
    }
    let basename = Path::new(src).file_name()?.to_str()?;
    images.get(basename).map(|p| p.as_path())
}

/// Format an absolute path as a `file://` URI both engines can dereference.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn map(entries: &[(&str, &str)]) -> ResolvedImageMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), PathBuf::from(v)))
            .collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn rewrites_matching_double_quoted_src() {
        let images = map(&[("logo.png", "/abs/logo.png")]);
        let (out, n) = rewrite_image_refs(r#"<img src="logo.png" alt="x">"#, &images);
        assert_eq!(n, 1);
        assert_eq!(out, r#"<img src="file:///abs/logo.png" alt="x">"#);
    }

    #[test]
    fn rewrites_single_quoted_src_keeping_quote_style() {
        let images = map(&[("logo.png", "/abs/logo.png")]);
        let (out, n) = rewrite_image_refs("<img src='logo.png'>", &images);
        assert_eq!(n, 1);
        assert_eq!(out, "<img src='file:///abs/logo.png'>");
    }

    #[test]
    fn unmatched_references_pass_through_untouched() {
        let images = map(&[("logo.png", "/abs/logo.png")]);
        let html = r#"<img src="other.png"><img src="https://example.com/x.png">"#;
        let (out, n) = rewrite_image_refs(html, &images);
        assert_eq!(n, 0);
        assert_eq!(out, html);
    }

    #[test]
    fn basename_fallback_matches_relative_references() {
        let images = map(&[("logo.png", "/abs/logo.png")]);
        let (out, n) = rewrite_image_refs(r#"<img src="assets/img/logo.png">"#, &images);
        assert_eq!(n, 1);
        assert!(out.contains("file:///abs/logo.png"));
    }

    #[test]
    fn literal_key_beats_basename_collision() {
        let images = map(&[
            ("assets/logo.png", "/exact/logo.png"),
            ("logo.png", "/basename/logo.png"),
        ]);
        let (out, n) = rewrite_image_refs(r#"<img src="assets/logo.png">"#, &images);
        assert_eq!(n, 1);
        assert!(out.contains("/exact/logo.png"), "got: {out}");
    }

    #[test]
    fn rewrites_multiple_tags_and_other_attributes_survive() {
        let images = map(&[("a.png", "/p/a.png"), ("b.png", "/p/b.png")]);
        let html = r#"<p>x</p><img class="w" src="a.png"><img src="b.png" width="4">"#;
        let (out, n) = rewrite_image_refs(html, &images);
        assert_eq!(n, 2);
        assert!(out.contains(r#"class="w" src="file:///p/a.png""#));
        assert!(out.contains(r#"src="file:///p/b.png" width="4""#));
    }

    #[test]
    fn rewriting_is_idempotent_across_runs() {
        let images = map(&[("logo.png", "/abs/logo.png")]);
        let html = r#"<img src="logo.png">"#;
        let (first, _) = rewrite_image_refs(html, &images);
        let (second, _) = rewrite_image_refs(html, &images);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_map_short_circuits() {
        let (out, n) = rewrite_image_refs(r#"<img src="x.png">"#, &ResolvedImageMap::new());
        assert_eq!(n, 0);
        assert_eq!(out, r#"<img src="x.png">"#);
    }

    #[test]
    fn matching_is_case_sensitive_on_names() {
        let images = map(&[("Logo.png", "/abs/Logo.png")]);
        let (out, n) = rewrite_image_refs(r#"<img src="logo.png">"#, &images);
        assert_eq!(n, 0);
        assert_eq!(out, r#"<img src="logo.png">"#);
    }
}
