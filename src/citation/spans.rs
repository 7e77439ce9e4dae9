//! Span resolution for citation snippets
//!
//! Locates a snippet inside a document and returns the exact character span
//! it refers to, tolerating whitespace that was collapsed, re-wrapped, or
//! re-indented relative to the source.
//!
//! # Resolution order
//!
//! - **Exact first**: the leftmost literal occurrence wins, no ranking
//! - **Normalized second**: both sides whitespace-normalized, leftmost match,
//!   offsets mapped back through the index map
//! - **Honest failure**: `None` when neither matches, never a guessed span
//!
//! All offsets are character offsets into the document.

use serde::{Deserialize, Serialize};

use super::normalize::{normalize_whitespace, normalize_with_map};

/// A snippet resolved to a span in a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSpan {
    /// Start character offset (inclusive)
    pub span_start: usize,
    /// End character offset (exclusive)
    pub span_end: usize,
    /// The document text covered by the span
    pub citation_text: String,
}

/// Which matching pass produced a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    /// Literal substring match
    Exact,
    /// Match after whitespace normalization
    Normalized,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Normalized => "normalized",
        }
    }
}

/// Resolve `snippet` to a span in `document`.
///
/// Returns `None` for an empty document, an empty or whitespace-only
/// snippet, or a snippet found by neither pass.
pub fn resolve_span(document: &str, snippet: &str) -> Option<ResolvedSpan> {
    resolve_span_with_method(document, snippet).map(|(span, _)| span)
}

/// Same as [`resolve_span`], also reporting which pass matched
pub fn resolve_span_with_method(document: &str, snippet: &str) -> Option<(ResolvedSpan, MatchMethod)> {
    if document.is_empty() || snippet.is_empty() {
        return None;
    }

    if let Some(byte_start) = document.find(snippet) {
        let span_start = char_offset(document, byte_start);
        let span = ResolvedSpan {
            span_start,
            span_end: span_start + snippet.chars().count(),
            citation_text: snippet.to_string(),
        };
        return Some((span, MatchMethod::Exact));
    }

    let wanted = normalize_whitespace(snippet);
    if wanted.is_empty() {
        return None;
    }

    let normalized = normalize_with_map(document);
    let byte_start = normalized.text.find(&wanted)?;
    let norm_start = char_offset(&normalized.text, byte_start);
    let norm_end = norm_start + wanted.chars().count();

    let (span_start, span_end) =
        normalized.source_range(norm_start, norm_end, document.chars().count())?;

    let span = ResolvedSpan {
        span_start,
        span_end,
        citation_text: char_slice(document, span_start, span_end).to_string(),
    };
    Some((span, MatchMethod::Normalized))
}

/// Convert a byte index (on a char boundary) into a character offset
pub fn char_offset(text: &str, byte_index: usize) -> usize {
    text[..byte_index.min(text.len())].chars().count()
}

/// Convert a character offset into a byte index, clamped to the text length
pub fn byte_offset(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Slice `text` by character offsets `[start, end)`, clamped to the text
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start_byte = byte_offset(text, start);
    let end_byte = byte_offset(text, end.max(start));
    &text[start_byte..end_byte]
}

/// Line and column position (1-indexed for editor compatibility)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Convert a character offset to a line/column position
pub fn offset_to_line_col(document: &str, offset: usize) -> LineCol {
    let prefix = char_slice(document, 0, offset);

    let line = prefix.matches('\n').count() + 1;
    let line_start = prefix.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let col = prefix[line_start..].chars().count() + 1;

    LineCol { line, col }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_returns_snippet() {
        let doc = "Hello world, this is a test.";
        let (span, method) = resolve_span_with_method(doc, "this is").unwrap();
        assert_eq!(method, MatchMethod::Exact);
        assert_eq!((span.span_start, span.span_end), (13, 20));
        assert_eq!(span.citation_text, "this is");
    }

    #[test]
    fn test_exact_match_is_leftmost() {
        let span = resolve_span("foo bar foo baz foo", "foo").unwrap();
        assert_eq!((span.span_start, span.span_end), (0, 3));
    }

    #[test]
    fn test_exact_match_takes_precedence_over_normalized() {
        // The normalized pass would find "a b" at offset 0 first
        let doc = "a  b then a b";
        let span = resolve_span(doc, "a b").unwrap();
        assert_eq!(span.span_start, 10);
    }

    #[test]
    fn test_normalized_match_maps_back() {
        let doc = "Intro.\n\nThe quick   brown\n    fox jumps.";
        let (span, method) = resolve_span_with_method(doc, "quick brown fox").unwrap();
        assert_eq!(method, MatchMethod::Normalized);
        assert_eq!(span.citation_text, "quick   brown\n    fox");
        assert_eq!(char_slice(doc, span.span_start, span.span_end), span.citation_text);
    }

    #[test]
    fn test_snippet_whitespace_is_trimmed() {
        let doc = "alpha\nbeta gamma";
        let span = resolve_span(doc, "  alpha   beta \n").unwrap();
        assert_eq!(span.citation_text, "alpha\nbeta");
        assert_eq!((span.span_start, span.span_end), (0, 10));
    }

    #[test]
    fn test_match_at_document_end_uses_full_length() {
        let doc = "one two\n  three\n\n";
        let span = resolve_span(doc, "two three").unwrap();
        assert_eq!(span.span_start, 4);
        assert_eq!(span.span_end, doc.chars().count());
    }

    #[test]
    fn test_not_found_cases() {
        let doc = "some document text";
        assert!(resolve_span(doc, "").is_none());
        assert!(resolve_span(doc, "   ").is_none());
        assert!(resolve_span(doc, "text not present").is_none());
        assert!(resolve_span("", "anything").is_none());
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert!(resolve_span("Hello World", "hello world").is_none());
    }

    #[test]
    fn test_offsets_are_char_based() {
        let doc = "café — naïve  text";
        let span = resolve_span(doc, "naïve text").unwrap();
        assert_eq!(span.span_start, 7);
        assert_eq!(span.citation_text, "naïve  text");
        assert_eq!(span.span_end, doc.chars().count());
    }

    #[test]
    fn test_char_slice_clamps() {
        assert_eq!(char_slice("abc", 1, 10), "bc");
        assert_eq!(char_slice("abc", 5, 10), "");
        assert_eq!(char_slice("abc", 2, 1), "");
    }

    #[test]
    fn test_offset_to_line_col() {
        let doc = "line1\nline2\nline3";

        assert_eq!(offset_to_line_col(doc, 0), LineCol { line: 1, col: 1 });
        assert_eq!(offset_to_line_col(doc, 6), LineCol { line: 2, col: 1 });
        assert_eq!(offset_to_line_col(doc, 8), LineCol { line: 2, col: 3 });
    }
}
