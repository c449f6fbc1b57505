//! Resource resolution: validate the request's inputs before any work starts.
//!
//! The resolver runs first so that a request naming a missing file fails
//! fast with a typed error instead of surfacing later as a renderer quirk
//! (wkhtmltopdf silently renders a broken-image box; the composer would
//! only notice at embed time). Every image source must exist as a regular
//! file; the HTML source must exist and be openable.

use crate::error::DocPressError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical image name → absolute, canonicalized source path.
///
/// Derived from [`crate::ConversionRequest::images`]; immutable once built,
/// 1:1 with the request's keys.
pub type ResolvedImageMap = BTreeMap<String, PathBuf>;

/// Validate the HTML source path, checking existence and read permission.
pub fn resolve_html(path: &Path) -> Result<(), DocPressError> {
    if !path.exists() {
        return Err(DocPressError::HtmlNotFound {
            path: path.to_path_buf(),
        });
    }
    match std::fs::File::open(path) {
        Ok(_) => {
            debug!("Resolved HTML source: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(DocPressError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(DocPressError::HtmlNotFound {
            path: path.to_path_buf(),
        }),
    }
}

/// Resolve every image map entry to an absolute, canonicalized path.
///
/// Fails with [`DocPressError::ImageNotFound`] naming the first logical key
/// whose source is missing or not a regular file. No side effects beyond
/// filesystem reads.
pub fn resolve_images(
    images: &BTreeMap<String, PathBuf>,
) -> Result<ResolvedImageMap, DocPressError> {
    let mut resolved = ResolvedImageMap::new();
    for (name, path) in images {
        if !path.is_file() {
            return Err(DocPressError::ImageNotFound {
                name: name.clone(),
                path: path.clone(),
            });
        }
        let canonical = path
            .canonicalize()
            .map_err(|_| DocPressError::ImageNotFound {
                name: name.clone(),
                path: path.clone(),
            })?;
        debug!("Resolved image '{}' -> {}", name, canonical.display());
        resolved.insert(name.clone(), canonical);
    }
    Ok(resolved)
}
