//! Tool façade: a JSON-argument front door for embedding hosts.
//!
//! Hosts that drive docpress with loosely-typed JSON (agent tool calls,
//! RPC bridges) go through [`handle_create_doc`] instead of building a
//! [`ConversionRequest`] by hand. The façade owns argument-shape
//! validation and never panics on malformed input: every failure comes
//! back as a `success: false` response with a message, so the host can
//! relay it verbatim.

use crate::config::ConversionConfig;
use crate::convert::convert;
use crate::request::{ConversionRequest, ConversionStats, EngineKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Name of the document-creation tool as exposed to hosts.
pub const CREATE_DOC: &str = "create_doc";

/// Arguments accepted by [`handle_create_doc`].
///
/// `images` is optional and defaults to empty; the other two fields are
/// required. Unknown fields are rejected so a misspelled argument fails
/// loudly instead of being silently dropped.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDocArgs {
    /// Path to the HTML source document.
    pub text_file: PathBuf,
    /// Logical image name → source file path.
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
    /// Destination for the produced PDF.
    pub output_pdf: PathBuf,
}

/// Envelope returned to the host for every tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    /// Human-readable outcome, suitable for relaying verbatim.
    pub message: String,
    /// Absolute or as-requested path of the produced PDF, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_pdf: Option<String>,
    /// Which engine produced the PDF, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineKind>,
    /// Timing and substitution statistics, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ConversionStats>,
}

impl ToolResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            output_pdf: None,
            engine: None,
            stats: None,
        }
    }
}

/// Handle one `create_doc` invocation with raw JSON arguments.
///
/// Shape errors (missing or mistyped fields) and conversion errors both
/// produce a failure response; this function itself never errors.
pub async fn handle_create_doc(args: Value, config: &ConversionConfig) -> ToolResponse {
    let args: CreateDocArgs = match serde_json::from_value(args) {
        Ok(a) => a,
        Err(e) => {
            warn!("Rejected malformed {CREATE_DOC} arguments: {e}");
            return ToolResponse::failure(format!("Invalid arguments: {e}"));
        }
    };

    let request = ConversionRequest {
        html_path: args.text_file,
        images: args.images,
        output_path: args.output_pdf,
    };

    match convert(&request, config).await {
        Ok(output) => {
            info!("{CREATE_DOC} produced {}", output.output_path.display());
            ToolResponse {
                success: true,
                message: format!(
                    "PDF created at {} ({} engine)",
                    output.output_path.display(),
                    output.engine_used
                ),
                output_pdf: Some(output.output_path.display().to_string()),
                engine: Some(output.engine_used),
                stats: Some(output.stats),
            }
        }
        Err(e) => ToolResponse::failure(e.to_string()),
    }
}
