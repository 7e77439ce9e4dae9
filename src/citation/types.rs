//! Citation records attached to review items.

use serde::{Deserialize, Serialize};

use super::segments::SpanBounds;
use super::spans::ResolvedSpan;

/// A span in a knowledge-base document plus the text it denotes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Document the span indexes into
    pub doc_id: String,
    /// Start character offset (inclusive)
    pub span_start: usize,
    /// End character offset (exclusive)
    pub span_end: usize,
    /// Text captured when the span was resolved
    pub citation_text: String,
    /// Supplementary chunks, carried for display only
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl Citation {
    /// Create a citation from a freshly resolved span
    pub fn from_resolved(doc_id: impl Into<String>, span: ResolvedSpan) -> Self {
        Self {
            doc_id: doc_id.into(),
            span_start: span.span_start,
            span_end: span.span_end,
            citation_text: span.citation_text,
            chunks: Vec::new(),
        }
    }

    pub fn bounds(&self) -> SpanBounds {
        SpanBounds::new(self.span_start, self.span_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_resolved() {
        let span = ResolvedSpan {
            span_start: 4,
            span_end: 9,
            citation_text: "quick".to_string(),
        };
        let citation = Citation::from_resolved("doc-a", span);
        assert_eq!(citation.doc_id, "doc-a");
        assert_eq!(citation.bounds(), SpanBounds::new(4, 9));
        assert!(citation.chunks.is_empty());
    }

    #[test]
    fn test_chunks_default_when_missing() {
        let citation: Citation = serde_json::from_str(
            r#"{"doc_id":"d","span_start":0,"span_end":3,"citation_text":"abc"}"#,
        )
        .unwrap();
        assert!(citation.chunks.is_empty());

        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["chunks"], serde_json::json!([]));
    }
}
