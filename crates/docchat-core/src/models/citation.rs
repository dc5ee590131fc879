use serde::{Deserialize, Serialize};

use super::PassageMatch;

/// Number of characters kept in a citation preview
pub const PREVIEW_CHARS: usize = 200;

/// Appended to a preview only when the passage was cut
pub const TRUNCATION_MARKER: &str = "...";

/// Client-facing view of a retrieved passage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub source: Option<String>,
    pub content_preview: String,
}

impl SourceCitation {
    pub fn from_passage(passage: &PassageMatch) -> Self {
        Self {
            source: passage.metadata.citation_source().map(str::to_string),
            content_preview: preview(&passage.content),
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `content`, marked when truncated
pub fn preview(content: &str) -> String {
    match content.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PassageMetadata;
    use proptest::prelude::*;

    #[test]
    fn test_short_content_is_verbatim() {
        assert_eq!(preview("Refunds within 30 days."), "Refunds within 30 days.");
        assert_eq!(preview(""), "");
    }

    #[test]
    fn test_exact_length_is_not_marked() {
        let content = "a".repeat(PREVIEW_CHARS);
        assert_eq!(preview(&content), content);
    }

    #[test]
    fn test_long_content_is_cut_and_marked() {
        let content = "b".repeat(PREVIEW_CHARS + 1);
        let p = preview(&content);
        assert_eq!(p, format!("{}...", "b".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_cut_respects_char_boundaries() {
        let content = "é".repeat(PREVIEW_CHARS + 10);
        let p = preview(&content);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + TRUNCATION_MARKER.len());
        assert!(p.starts_with(&"é".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_from_passage_without_source_is_null() {
        let passage = PassageMatch::new("text", PassageMetadata::default(), 0.1);
        let citation = SourceCitation::from_passage(&passage);
        assert_eq!(citation.source, None);
        assert_eq!(serde_json::to_value(&citation).unwrap()["source"], serde_json::Value::Null);
    }

    proptest! {
        #[test]
        fn prop_preview_truncation_rule(content in "\\PC{0,400}") {
            let p = preview(&content);
            let len = content.chars().count();
            if len > PREVIEW_CHARS {
                let head: String = content.chars().take(PREVIEW_CHARS).collect();
                prop_assert_eq!(p, format!("{}{}", head, TRUNCATION_MARKER));
            } else {
                prop_assert_eq!(p, content);
            }
        }
    }
}
