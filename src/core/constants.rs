//! Wire grammar constants
//!
//! This module defines the literal tag strings of the artifact wire grammar
//! emitted by the model, plus SSE protocol constants used when parsing
//! upstream provider streams. The artifact tags must match the model
//! prompting byte-for-byte.

/// Artifact tag literals
pub mod tag {
    /// Closing tag for a full artifact
    pub const FULL_CLOSE: &str = "</grist_artifact_full>";

    /// Closing tag for a targeted update block
    pub const UPDATE_CLOSE: &str = "</grist_artifact_update>";

    /// Closing tag for the artifact purpose summary
    pub const PURPOSE_CLOSE: &str = "</grist_artifact_purpose>";
}

/// Upstream SSE protocol constants
pub mod sse {
    /// Prefix of an SSE data line
    pub const DATA_PREFIX: &str = "data: ";

    /// OpenAI-style end-of-stream sentinel
    pub const DONE: &str = "[DONE]";

    /// Anthropic text delta event type
    pub const CONTENT_BLOCK_DELTA: &str = "content_block_delta";

    /// Anthropic end-of-message event type
    pub const MESSAGE_STOP: &str = "message_stop";

    /// Anthropic error event type
    pub const ERROR: &str = "error";
}
