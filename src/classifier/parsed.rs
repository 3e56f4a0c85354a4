//! Structured view of a classified pairing-violation error.

use serde::Serialize;

/// The extractable pieces of a pairing-violation error string.
///
/// `tool_use_id` is always present (errors with no extractable id parse to
/// `None` instead of producing a partial value). The indices come from the
/// optional `messages.<N>.content.<M>` location fragment some backends append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedOrphanError {
    /// The tool_use_id the backend complained about, verbatim.
    pub tool_use_id: String,
    /// Index of the offending message within the request, if reported.
    pub message_index: Option<usize>,
    /// Index of the offending block within that message, if reported.
    pub content_index: Option<usize>,
}

impl ParsedOrphanError {
    /// Creates a parsed error carrying only an id.
    pub fn new(tool_use_id: impl Into<String>) -> Self {
        Self {
            tool_use_id: tool_use_id.into(),
            message_index: None,
            content_index: None,
        }
    }

    /// Attaches the location fragment indices.
    pub fn with_location(mut self, message_index: usize, content_index: usize) -> Self {
        self.message_index = Some(message_index);
        self.content_index = Some(content_index);
        self
    }

    /// Returns true if the backend reported where in the request the
    /// violation sits.
    pub fn has_location(&self) -> bool {
        self.message_index.is_some() && self.content_index.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_has_no_location() {
        let parsed = ParsedOrphanError::new("toolu_abc123");
        assert_eq!(parsed.tool_use_id, "toolu_abc123");
        assert!(!parsed.has_location());
    }

    #[test]
    fn test_with_location() {
        let parsed = ParsedOrphanError::new("toolu_abc123").with_location(5, 2);
        assert!(parsed.has_location());
        assert_eq!(parsed.message_index, Some(5));
        assert_eq!(parsed.content_index, Some(2));
    }
}
