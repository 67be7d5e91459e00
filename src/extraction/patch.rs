//! Exact-match patch application
//!
//! Applies an ordered list of literal text replacements to a base artifact.
//! Each instruction's locator must match the document as it exists after the
//! previous instructions have been applied, so application order matters.

use thiserror::Error;

/// One parsed `<grist_artifact_update>` block
///
/// Two instructions are the same instruction iff both `locator` and
/// `replacement` are identical strings; `is_complete` is not part of that
/// identity, it only records whether both sub-tags were fully delimited when
/// the block was scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInstruction {
    /// Literal text expected to exist verbatim in the artifact
    pub locator: String,

    /// Literal text substituted in the locator's place
    pub replacement: String,

    /// Whether both sub-tags were closed when this block was scanned
    pub is_complete: bool,
}

impl PatchInstruction {
    /// Structural identity used for de-duplication across re-scans
    pub fn same_instruction(&self, other: &PatchInstruction) -> bool {
        self.locator == other.locator && self.replacement == other.replacement
    }
}

/// Error types for patch application
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("old text not found in artifact (instruction {index}): {locator:?}")]
    LocatorNotFound {
        /// Position of the failing instruction in the input list
        index: usize,
        locator: String,
        /// Artifact text produced by the instructions before the failure
        partial: String,
    },
}

/// Apply patch instructions in order against a base artifact
///
/// Instructions with `is_complete = false` are skipped. A complete
/// instruction replaces the first occurrence of its locator in the cumulative
/// text; if the locator is absent the whole application fails with
/// `LocatorNotFound`, carrying the text accumulated before the failing
/// instruction so the caller can keep the last good state.
pub fn apply_patches(
    base: &str,
    instructions: &[PatchInstruction],
) -> Result<String, PatchError> {
    let mut text = base.to_string();

    for (index, instruction) in instructions.iter().enumerate() {
        if !instruction.is_complete {
            continue;
        }

        match text.find(&instruction.locator) {
            Some(position) => {
                text.replace_range(
                    position..position + instruction.locator.len(),
                    &instruction.replacement,
                );
            }
            None => {
                return Err(PatchError::LocatorNotFound {
                    index,
                    locator: instruction.locator.clone(),
                    partial: text,
                });
            }
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(locator: &str, replacement: &str) -> PatchInstruction {
        PatchInstruction {
            locator: locator.to_string(),
            replacement: replacement.to_string(),
            is_complete: true,
        }
    }

    #[test]
    fn test_single_replacement() {
        let result = apply_patches("function f(){return 1;}", &[complete("return 1;", "return 2;")]);
        assert_eq!(result.unwrap(), "function f(){return 2;}");
    }

    #[test]
    fn test_order_dependence() {
        // Second instruction's locator only exists after the first applied.
        let forward = apply_patches("ABC", &[complete("A", "X"), complete("X", "Y")]);
        assert_eq!(forward.unwrap(), "YBC");

        let reversed = apply_patches("ABC", &[complete("X", "Y"), complete("A", "X")]);
        match reversed {
            Err(PatchError::LocatorNotFound { index, locator, partial }) => {
                assert_eq!(index, 0);
                assert_eq!(locator, "X");
                assert_eq!(partial, "ABC");
            }
            other => panic!("expected LocatorNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_first_occurrence_only() {
        let result = apply_patches("aa", &[complete("a", "b")]);
        assert_eq!(result.unwrap(), "ba");
    }

    #[test]
    fn test_incomplete_instructions_are_skipped() {
        let incomplete = PatchInstruction {
            locator: "not present anywhere".to_string(),
            replacement: "x".to_string(),
            is_complete: false,
        };
        let result = apply_patches("abc", &[incomplete, complete("b", "B")]);
        assert_eq!(result.unwrap(), "aBc");
    }

    #[test]
    fn test_failure_carries_prior_progress() {
        let result = apply_patches(
            "abc",
            &[complete("a", "A"), complete("zzz", "Z"), complete("c", "C")],
        );
        match result {
            Err(PatchError::LocatorNotFound { index, partial, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(partial, "Abc");
            }
            other => panic!("expected LocatorNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_instruction_list_returns_base() {
        let result = apply_patches("unchanged", &[]);
        assert_eq!(result.unwrap(), "unchanged");
    }
}
