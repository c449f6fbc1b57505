//! Conversion pipeline stages.
//!
//! Each stage is a standalone module with no knowledge of its neighbors;
//! [`crate::convert`] is the only place that strings them together:
//!
//! 1. [`resolve`] — validate the HTML source and image map up front
//! 2. [`rewrite`] — point image references at their resolved paths
//! 3. [`workspace`] — scoped temp directory for staged files
//! 4. [`render`] — engine trait, selection order, and the primary engine
//! 5. [`compose`] — the always-available fallback renderer

pub mod compose;
pub mod render;
pub mod resolve;
pub mod rewrite;
pub mod workspace;
