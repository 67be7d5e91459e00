//! Streaming artifact reducer
//!
//! Drives the tag extractor and patch applier across a sequence of incoming
//! text deltas. One `StreamState` exists per streaming session and is
//! discarded when the stream ends; nothing is shared between sessions.

use crate::extraction::extractor::extract_artifact_regions;
use crate::extraction::patch::{apply_patches, PatchError, PatchInstruction};
use crate::models::delta::DeltaResult;
use futures::stream::Stream;
use futures::StreamExt;
use std::pin::Pin;
use tracing::{error, warn};

/// Per-session reducer state
///
/// `applied` is the replay list: every successful patch application replays
/// the full list against the original base artifact rather than patching
/// incrementally, so a session's artifact is always a deterministic function
/// of (base, applied). `retired` holds instructions whose locator was never
/// found; they are remembered so re-scans do not retry them on every delta,
/// but they never participate in replay.
#[derive(Debug)]
pub struct StreamState {
    accumulated_text: String,
    base_artifact: String,
    applied: Vec<PatchInstruction>,
    retired: Vec<PatchInstruction>,
}

impl StreamState {
    pub fn new(base_artifact: impl Into<String>) -> Self {
        Self {
            accumulated_text: String::new(),
            base_artifact: base_artifact.into(),
            applied: Vec::new(),
            retired: Vec::new(),
        }
    }

    /// Process one incoming chunk and produce the result record for it
    pub fn step(&mut self, chunk: &str) -> DeltaResult {
        self.accumulated_text.push_str(chunk);

        let mut finished_artifact = None;
        let mut pending_artifact = None;
        let mut artifact_purpose = None;

        if let Some(regions) = extract_artifact_regions(&self.accumulated_text) {
            if let Some(full) = &regions.full_artifact {
                // The in-progress content is always surfaced so the client
                // can render code while it is still being written.
                pending_artifact = Some(full.content.clone());
                if full.is_complete {
                    finished_artifact = Some(full.content.clone());
                }
            }

            if let Some(purpose) = &regions.purpose {
                artifact_purpose = Some(purpose.content.clone());
            }

            // A complete full replacement takes precedence over patch
            // application for this step.
            if finished_artifact.is_none() {
                let mut fresh: Vec<PatchInstruction> = Vec::new();
                for update in &regions.updates {
                    if update.is_complete
                        && !self.is_known(update)
                        && !fresh.iter().any(|seen| seen.same_instruction(update))
                    {
                        fresh.push(update.clone());
                    }
                }

                if !fresh.is_empty() {
                    finished_artifact = self.apply_fresh(fresh);
                }
            }
        }

        DeltaResult {
            full_response: self.accumulated_text.clone(),
            next_part: chunk.to_string(),
            finished_artifact,
            pending_artifact,
            artifact_purpose,
        }
    }

    /// Whether an identical instruction was already applied or retired
    fn is_known(&self, candidate: &PatchInstruction) -> bool {
        self.applied
            .iter()
            .chain(self.retired.iter())
            .any(|known| known.same_instruction(candidate))
    }

    /// Replay the applied list extended with fresh instructions
    ///
    /// On success the whole replay list becomes the new applied list. On
    /// failure the prefix that applied cleanly is recorded, the failing
    /// instruction is retired, and any fresh instructions after it are left
    /// unknown so the next step retries them.
    fn apply_fresh(&mut self, fresh: Vec<PatchInstruction>) -> Option<String> {
        let mut replay = self.applied.clone();
        replay.extend(fresh);

        match apply_patches(&self.base_artifact, &replay) {
            Ok(artifact) => {
                self.applied = replay;
                Some(artifact)
            }
            Err(PatchError::LocatorNotFound { index, locator, .. }) => {
                warn!(
                    "patch locator not found, keeping prior artifact state: {:?}",
                    locator
                );
                let failing = replay.remove(index);
                replay.truncate(index);
                self.applied = replay;
                self.retired.push(failing);
                None
            }
        }
    }
}

/// Adapt an upstream text-delta stream into a `DeltaResult` stream
///
/// One result record is yielded per upstream delta, in arrival order. An
/// upstream error is propagated as the final item and ends the stream; the
/// session state is dropped with the stream.
pub fn reduce_artifact_stream<S, E>(
    chunks: S,
    base_artifact: String,
) -> Pin<Box<dyn Stream<Item = Result<DeltaResult, E>> + Send>>
where
    S: Stream<Item = Result<String, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut state = StreamState::new(base_artifact);
        tokio::pin!(chunks);

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => yield Ok(state.step(&chunk)),
                Err(e) => {
                    error!("upstream stream failed: {}", e);
                    yield Err(e);
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}
