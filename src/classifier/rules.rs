//! Pattern rules for recognizing pairing-violation error strings.
//!
//! Each known vendor phrasing is one [`OrphanRule`] in an ordered table, so a
//! new wording is a new table row rather than another branch in extraction
//! logic. Matching is substring-based and case-insensitive to tolerate drift
//! (trailing colons, quoted ids, location suffixes).

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::ParsedOrphanError;

/// A recognizer for one family of pairing-violation phrasings.
#[derive(Debug)]
struct OrphanRule {
    regex: Regex,
    /// A human-readable description of what this rule detects.
    description: &'static str,
}

impl OrphanRule {
    fn new(pattern: &str, description: &'static str) -> Self {
        Self {
            regex: Regex::new(pattern).expect("Invalid orphan rule pattern"),
            description,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// The known violation families, in the order the vendor introduced them.
fn rules() -> &'static [OrphanRule] {
    static RULES: OnceLock<Vec<OrphanRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        vec![
            OrphanRule::new(
                r"(?i)unexpected\s+tool_use_id\s+found\s+in\s+tool_result\s+blocks?",
                "Unexpected tool_use_id in tool_result blocks",
            ),
            OrphanRule::new(
                r"(?i)tool_result\s+(?:blocks?\s+)?must\s+have\s+(?:a\s+)?corresponding\s+tool_use",
                "tool_result without corresponding tool_use",
            ),
            OrphanRule::new(
                r"(?i)tool_result\s+blocks?\s+references\s+tool_use_id\s+.*not\s+found\s+in\s+conversation",
                "tool_result references unknown tool_use_id",
            ),
        ]
    })
}

/// Id quoted after a `tool_use_id` token, e.g. `tool_use_id "toolu_abc123"`.
fn quoted_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)tool_use_id\s*[:=]?\s*"([^"]+)""#).expect("Invalid quoted id pattern")
    })
}

/// Bare id trailing the message after a colon, e.g. `blocks: toolu_abc123`.
fn trailing_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":\s*([A-Za-z0-9][A-Za-z0-9_\-]*)\s*\.?\s*$").expect("Invalid trailing id pattern")
    })
}

/// Location fragment some backends append, e.g. `messages.5.content.2`.
fn location_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"messages\.(\d+)\.content\.(\d+)").expect("Invalid location pattern")
    })
}

/// Returns true iff `message` is a vendor rejection for broken tool-use /
/// tool-result pairing.
///
/// Absent and empty input never match. Matching is case-insensitive and
/// tolerant of surrounding text.
pub fn is_orphan_tool_result_error(message: Option<&str>) -> bool {
    matched_rule(message).is_some()
}

/// Finds the first rule matching the message, if any.
fn matched_rule(message: Option<&str>) -> Option<&'static OrphanRule> {
    match message {
        Some(text) if !text.is_empty() => rules().iter().find(|rule| rule.matches(text)),
        _ => None,
    }
}

/// Extracts the structured pieces of a pairing-violation error string.
///
/// Returns `None` for non-matching input and for matches that carry no
/// extractable tool_use_id (the "must have a corresponding tool_use" family
/// names no id by construction). Extraction does not depend on which family
/// matched: any of them may carry a quoted or trailing id and an optional
/// `messages.<N>.content.<M>` location fragment.
pub fn parse_orphan_tool_result_error(message: Option<&str>) -> Option<ParsedOrphanError> {
    let text = message?;
    let rule = matched_rule(Some(text))?;
    debug!(rule = rule.description, "Classified pairing-violation error");

    let tool_use_id = extract_tool_use_id(text)?;
    let mut parsed = ParsedOrphanError::new(tool_use_id);

    if let Some(caps) = location_regex().captures(text) {
        // Both captures are digit-only and bounded, so parse cannot fail in
        // practice; out-of-range values simply leave the location absent.
        if let (Ok(msg_idx), Ok(content_idx)) = (caps[1].parse(), caps[2].parse()) {
            parsed = parsed.with_location(msg_idx, content_idx);
        }
    }

    Some(parsed)
}

/// Pulls the offending id out of the error text, quoted form first.
fn extract_tool_use_id(text: &str) -> Option<String> {
    if let Some(caps) = quoted_id_regex().captures(text) {
        return Some(caps[1].to_string());
    }
    trailing_id_regex()
        .captures(text)
        .map(|caps| caps[1].to_string())
}
