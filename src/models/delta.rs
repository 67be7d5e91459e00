//! Per-chunk streaming result model
//!
//! One `DeltaResult` is emitted to the client after every upstream text
//! delta. Optional fields are omitted (not null) when absent — the client
//! distinguishes "no artifact yet" from "empty artifact" by key presence.

use serde::{Deserialize, Serialize};

/// The per-chunk output record of the stream reducer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaResult {
    /// Full accumulated response text so far
    pub full_response: String,

    /// The raw chunk appended this step
    pub next_part: String,

    /// Artifact text ready to apply: set when a full artifact closes or when
    /// at least one patch was newly applied this step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_artifact: Option<String>,

    /// In-progress full-artifact content, present whenever a full-artifact
    /// tag has opened, complete or not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_artifact: Option<String>,

    /// In-progress or complete purpose text, if the purpose tag has opened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_purpose: Option<String>,
}
