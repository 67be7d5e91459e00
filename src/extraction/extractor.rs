//! Incremental artifact tag extraction
//!
//! Scans the accumulated response text for artifact tag regions. The scan is
//! a pure function of the buffer: it is re-run in full after every delta,
//! and a region that was complete in a shorter buffer yields byte-identical
//! content in any longer buffer. Content of a still-open region grows
//! monotonically until its closing tag appears.

use crate::core::constants::tag;
use crate::extraction::patch::PatchInstruction;
use regex::Regex;
use std::sync::LazyLock;

// Opening tags may carry attributes (identifier=, type=, title=); only the
// tag name matters for extraction. The `\z` alternative lets a still-open
// region capture to end-of-buffer.
static FULL_ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<grist_artifact_full[^>]*>(.*?)(?:</grist_artifact_full>|\z)")
        .expect("valid regex")
});

static PURPOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<grist_artifact_purpose[^>]*>(.*?)(?:</grist_artifact_purpose>|\z)")
        .expect("valid regex")
});

static COMPLETE_UPDATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<grist_artifact_update[^>]*>(.*?)</grist_artifact_update>")
        .expect("valid regex")
});

static UPDATE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<grist_artifact_update[^>]*>").expect("valid regex"));

// Locator/replacement sub-tags. The strict forms are used inside complete
// update blocks, the lenient forms (which tolerate a missing closing tag)
// inside a trailing still-open block. The `instruction`/`update_description`
// spellings are a legacy protocol variant accepted with identical
// exact-replace semantics.
static OLD_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<old_text>(.*?)</old_text>").expect("valid regex"));

static NEW_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<new_text>(.*?)</new_text>").expect("valid regex"));

static LEGACY_OLD_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<instruction>(.*?)</instruction>").expect("valid regex"));

static LEGACY_NEW_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<update_description>(.*?)</update_description>").expect("valid regex")
});

static OLD_TEXT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<old_text>(.*?)(?:</old_text>|\z)").expect("valid regex"));

static NEW_TEXT_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<new_text>(.*?)(?:</new_text>|\z)").expect("valid regex"));

/// A detected full-artifact or purpose span within the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRegion {
    /// Text between the opening tag's `>` and the closing tag, or
    /// end-of-buffer while the region is still open
    pub content: String,

    /// True iff the closing tag appears anywhere in the buffer
    pub is_complete: bool,
}

/// All artifact regions found in one scan of the buffer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRegions {
    /// First full-artifact region, if any tag has opened
    pub full_artifact: Option<ArtifactRegion>,

    /// All complete update blocks in order of appearance, plus at most one
    /// trailing still-open block
    pub updates: Vec<PatchInstruction>,

    /// First purpose region, if any tag has opened
    pub purpose: Option<ArtifactRegion>,
}

/// Scan the accumulated buffer for artifact tag regions
///
/// Returns `None` when the buffer contains none of the recognized opening
/// tags — callers must treat this distinctly from regions that exist but are
/// empty. Calling this twice on the same buffer yields identical output.
pub fn extract_artifact_regions(buffer: &str) -> Option<ExtractedRegions> {
    let mut regions = ExtractedRegions::default();
    let mut found_any = false;

    if let Some(captures) = FULL_ARTIFACT_RE.captures(buffer) {
        regions.full_artifact = Some(ArtifactRegion {
            content: captures[1].to_string(),
            is_complete: buffer.contains(tag::FULL_CLOSE),
        });
        found_any = true;
    }

    let mut last_complete_end = 0;
    for captures in COMPLETE_UPDATE_RE.captures_iter(buffer) {
        let whole = captures.get(0).expect("match exists");
        regions.updates.push(parse_update_content(&captures[1], true));
        last_complete_end = whole.end();
        found_any = true;
    }

    // A further opening tag after the last complete block, with no closing
    // tag yet, is reported as one additional in-progress instruction.
    if let Some(open) = UPDATE_OPEN_RE.find_at(buffer, last_complete_end) {
        if !buffer[open.start()..].contains(tag::UPDATE_CLOSE) {
            regions
                .updates
                .push(parse_update_content(&buffer[open.end()..], false));
            found_any = true;
        }
    }

    if let Some(captures) = PURPOSE_RE.captures(buffer) {
        regions.purpose = Some(ArtifactRegion {
            content: captures[1].to_string(),
            is_complete: buffer.contains(tag::PURPOSE_CLOSE),
        });
        found_any = true;
    }

    found_any.then_some(regions)
}

/// Decompose an update block's content into locator and replacement
///
/// A missing sub-tag yields an empty string rather than an error — the
/// producer is a probabilistic model and partial structure is the normal
/// case mid-stream.
fn parse_update_content(content: &str, is_complete: bool) -> PatchInstruction {
    let (old_re, new_re, legacy_old_re, legacy_new_re) = if is_complete {
        (&OLD_TEXT_RE, &NEW_TEXT_RE, &LEGACY_OLD_TEXT_RE, &LEGACY_NEW_TEXT_RE)
    } else {
        // Inside a still-open block the sub-tags may be unterminated too.
        (&OLD_TEXT_OPEN_RE, &NEW_TEXT_OPEN_RE, &LEGACY_OLD_TEXT_RE, &LEGACY_NEW_TEXT_RE)
    };

    let locator = capture_text(old_re, content)
        .or_else(|| capture_text(legacy_old_re, content))
        .unwrap_or_default();
    let replacement = capture_text(new_re, content)
        .or_else(|| capture_text(legacy_new_re, content))
        .unwrap_or_default();

    PatchInstruction {
        locator,
        replacement,
        is_complete,
    }
}

fn capture_text(re: &LazyLock<Regex>, content: &str) -> Option<String> {
    re.captures(content).map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_full_artifact() {
        let text = "<grist_artifact_full>X</grist_artifact_full>";
        let regions = extract_artifact_regions(text).unwrap();
        let full = regions.full_artifact.unwrap();
        assert!(full.is_complete);
        assert_eq!(full.content, "X");
    }

    #[test]
    fn test_incomplete_full_artifact() {
        let text = "<grist_artifact_full>X";
        let regions = extract_artifact_regions(text).unwrap();
        let full = regions.full_artifact.unwrap();
        assert!(!full.is_complete);
        assert_eq!(full.content, "X");
    }

    #[test]
    fn test_attributes_are_ignored() {
        let text = concat!(
            "<grist_artifact_full identifier=\"record-cards\" ",
            "type=\"application/vnd.ant.react\" title=\"Component\">\n",
            "import React from 'react';\n",
            "export default () => <div>Test</div>;\n",
            "</grist_artifact_full>"
        );
        let regions = extract_artifact_regions(text).unwrap();
        let full = regions.full_artifact.unwrap();
        assert!(full.is_complete);
        assert!(full.content.contains("export default () => <div>Test</div>"));
        assert!(!full.content.contains("identifier"));
    }

    #[test]
    fn test_no_tags_returns_absent() {
        assert!(extract_artifact_regions("plain text, no tags").is_none());
        assert!(extract_artifact_regions("").is_none());
    }

    #[test]
    fn test_idempotent_on_stable_input() {
        let text = "<grist_artifact_purpose>a chart</grist_artifact_purpose>\n\
                    <grist_artifact_full>code";
        assert_eq!(
            extract_artifact_regions(text),
            extract_artifact_regions(text)
        );
    }

    #[test]
    fn test_monotonic_prefix_while_open() {
        let shorter = "<grist_artifact_full>const a";
        let longer = "<grist_artifact_full>const a = 1;";
        let first = extract_artifact_regions(shorter).unwrap().full_artifact.unwrap();
        let second = extract_artifact_regions(longer).unwrap().full_artifact.unwrap();
        assert!(second.content.starts_with(&first.content));
    }

    #[test]
    fn test_complete_content_is_stable_across_extension() {
        let closed = "<grist_artifact_full>done</grist_artifact_full>";
        let extended = format!("{closed} trailing commentary from the model");
        let first = extract_artifact_regions(closed).unwrap().full_artifact.unwrap();
        let second = extract_artifact_regions(&extended).unwrap().full_artifact.unwrap();
        assert_eq!(first.content, second.content);
        assert!(second.is_complete);
    }

    #[test]
    fn test_purpose_and_full_artifact_independence() {
        let text = "<grist_artifact_purpose>displays profiles</grist_artifact_purpose>\n\
                    <grist_artifact_full identifier=\"profile\">import React";
        let regions = extract_artifact_regions(text).unwrap();
        let purpose = regions.purpose.unwrap();
        assert!(purpose.is_complete);
        assert_eq!(purpose.content, "displays profiles");
        let full = regions.full_artifact.unwrap();
        assert!(!full.is_complete);
        assert_eq!(full.content, "import React");
    }

    #[test]
    fn test_complete_update_block() {
        let text = "<grist_artifact_update>\
                    <old_text>return 1;</old_text>\
                    <new_text>return 2;</new_text>\
                    </grist_artifact_update>";
        let regions = extract_artifact_regions(text).unwrap();
        assert_eq!(regions.updates.len(), 1);
        let update = &regions.updates[0];
        assert!(update.is_complete);
        assert_eq!(update.locator, "return 1;");
        assert_eq!(update.replacement, "return 2;");
    }

    #[test]
    fn test_multiple_updates_in_order() {
        let text = "<grist_artifact_update><old_text>a</old_text><new_text>A</new_text></grist_artifact_update>\
                    between\
                    <grist_artifact_update><old_text>b</old_text><new_text>B</new_text></grist_artifact_update>";
        let regions = extract_artifact_regions(text).unwrap();
        assert_eq!(regions.updates.len(), 2);
        assert_eq!(regions.updates[0].locator, "a");
        assert_eq!(regions.updates[1].locator, "b");
        assert!(regions.updates.iter().all(|u| u.is_complete));
    }

    #[test]
    fn test_trailing_open_update_after_complete_ones() {
        let text = "<grist_artifact_update><old_text>a</old_text><new_text>A</new_text></grist_artifact_update>\
                    <grist_artifact_update><old_text>b</old_text><new_";
        let regions = extract_artifact_regions(text).unwrap();
        assert_eq!(regions.updates.len(), 2);
        assert!(regions.updates[0].is_complete);
        let open = &regions.updates[1];
        assert!(!open.is_complete);
        assert_eq!(open.locator, "b");
        assert_eq!(open.replacement, "");
    }

    #[test]
    fn test_missing_subtags_yield_empty_strings() {
        let text = "<grist_artifact_update>no nested tags here</grist_artifact_update>";
        let regions = extract_artifact_regions(text).unwrap();
        let update = &regions.updates[0];
        assert!(update.is_complete);
        assert_eq!(update.locator, "");
        assert_eq!(update.replacement, "");
    }

    #[test]
    fn test_legacy_subtag_spelling() {
        let text = "<grist_artifact_update>\
                    <instruction>old line</instruction>\
                    <update_description>new line</update_description>\
                    </grist_artifact_update>";
        let regions = extract_artifact_regions(text).unwrap();
        let update = &regions.updates[0];
        assert_eq!(update.locator, "old line");
        assert_eq!(update.replacement, "new line");
    }

    #[test]
    fn test_canonical_subtags_win_over_legacy() {
        let text = "<grist_artifact_update>\
                    <old_text>canonical</old_text>\
                    <instruction>legacy</instruction>\
                    <new_text>kept</new_text>\
                    </grist_artifact_update>";
        let regions = extract_artifact_regions(text).unwrap();
        assert_eq!(regions.updates[0].locator, "canonical");
        assert_eq!(regions.updates[0].replacement, "kept");
    }

    #[test]
    fn test_mixed_complete_full_and_open_update() {
        let text = "Here's a component:\n\
                    <grist_artifact_full identifier=\"record-cards\">code</grist_artifact_full>\n\
                    And here's an update:\n\
                    <grist_artifact_update identifier=\"update-component\">still being generated";
        let regions = extract_artifact_regions(text).unwrap();
        assert!(regions.full_artifact.unwrap().is_complete);
        assert_eq!(regions.updates.len(), 1);
        assert!(!regions.updates[0].is_complete);
    }

    #[test]
    fn test_first_full_artifact_occurrence_wins() {
        let text = "<grist_artifact_full>first</grist_artifact_full>\
                    <grist_artifact_full>second</grist_artifact_full>";
        let regions = extract_artifact_regions(text).unwrap();
        assert_eq!(regions.full_artifact.unwrap().content, "first");
    }
}
