//! Span Resolution Integration Tests
//!
//! Tests for exact and whitespace-tolerant matching, the normalization
//! index map, and offset handling on non-ASCII documents.

use proptest::prelude::*;
use sieve::citation::{
    char_slice, normalize_whitespace, normalize_with_map, resolve_span, resolve_span_with_method,
    MatchMethod,
};

#[test]
fn test_exact_match_is_leftmost() {
    let doc = "alpha beta alpha beta";
    let span = resolve_span(doc, "alpha beta").unwrap();

    assert_eq!(span.span_start, 0);
    assert_eq!(span.span_end, 10);
    assert_eq!(span.citation_text, "alpha beta");
}

#[test]
fn test_normalized_match_returns_document_text() {
    let doc = "Returns:\n  items must be\n\tunused within 30 days.";
    let (span, method) = resolve_span_with_method(doc, "items must be unused").unwrap();

    assert_eq!(method, MatchMethod::Normalized);
    assert_eq!(span.citation_text, "items must be\n\tunused");
    assert_eq!(char_slice(doc, span.span_start, span.span_end), span.citation_text);
}

#[test]
fn test_snippet_with_extra_whitespace() {
    let doc = "one two three";
    let span = resolve_span(doc, "  two \n three ").unwrap();

    assert_eq!(span.span_start, 4);
    assert_eq!(span.span_end, 13);
    assert_eq!(span.citation_text, "two three");
}

#[test]
fn test_match_at_document_end() {
    // Trailing whitespace in the document is not part of the span
    let doc = "keep   the receipt  \n";
    let span = resolve_span(doc, "the receipt").unwrap();
    assert_eq!(span.citation_text, "the receipt");

    // Normalized match running to the end of the normalized text
    let doc = "keep   the\nreceipt";
    let span = resolve_span(doc, "the receipt").unwrap();
    assert_eq!(span.span_end, doc.chars().count());
    assert_eq!(span.citation_text, "the\nreceipt");
}

#[test]
fn test_not_found_cases() {
    let doc = "Some document text.";

    assert!(resolve_span(doc, "").is_none());
    assert!(resolve_span(doc, "   ").is_none());
    assert!(resolve_span(doc, "text not present").is_none());
    assert!(resolve_span("", "anything").is_none());
}

#[test]
fn test_case_sensitive() {
    assert!(resolve_span("Refund Policy", "refund policy").is_none());
}

#[test]
fn test_offsets_are_characters() {
    let doc = "Café —  crème brûlée";
    let span = resolve_span(doc, "crème brûlée").unwrap();

    assert_eq!(span.span_start, 8);
    assert_eq!(span.span_end, 20);

    let span = resolve_span(doc, "— crème").unwrap();
    assert_eq!(span.span_start, 5);
    assert_eq!(span.citation_text, "—  crème");
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-cé]{1,4}", 1..12)
}

fn whitespace() -> impl Strategy<Value = String> {
    "[ \t\n]{1,3}"
}

/// Words joined by arbitrary whitespace runs
fn spaced_document() -> impl Strategy<Value = (Vec<String>, String)> {
    words().prop_flat_map(|words| {
        let n = words.len();
        (
            Just(words),
            prop::collection::vec(whitespace(), n),
            whitespace(),
        )
            .prop_map(|(words, gaps, lead)| {
                let mut doc = lead;
                for (word, gap) in words.iter().zip(gaps) {
                    doc.push_str(word);
                    doc.push_str(&gap);
                }
                (words, doc)
            })
    })
}

proptest! {
    #[test]
    fn prop_normalization_is_idempotent(text in "[a-c \t\n\u{a0}é]{0,40}") {
        let once = normalize_with_map(&text).text;
        let twice = normalize_with_map(&once).text;
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once, normalize_whitespace(&text));
    }

    #[test]
    fn prop_index_map_points_into_source(text in "[a-c \t\n\u{a0}é]{0,40}") {
        let normalized = normalize_with_map(&text);
        let source: Vec<char> = text.chars().collect();

        prop_assert_eq!(normalized.text.chars().count(), normalized.index_map.len());
        prop_assert!(normalized.index_map.windows(2).all(|w| w[0] < w[1]));

        for (ch, &offset) in normalized.text.chars().zip(&normalized.index_map) {
            let original = source[offset];
            if ch == ' ' {
                // Space stands for the start of a whitespace run
                prop_assert!(original.is_whitespace());
                prop_assert!(offset > 0 && !source[offset - 1].is_whitespace());
            } else {
                prop_assert_eq!(ch, original);
            }
        }
    }

    #[test]
    fn prop_exact_match_precedence(doc in "[a-c ]{1,30}", start in 0usize..30, len in 1usize..10) {
        let chars: Vec<char> = doc.chars().collect();
        let start = start % chars.len();
        let end = (start + len).min(chars.len());
        let snippet: String = chars[start..end].iter().collect();

        let span = resolve_span(&doc, &snippet).unwrap();
        let leftmost = doc.find(&snippet).unwrap();
        prop_assert_eq!(span.span_start, doc[..leftmost].chars().count());
        prop_assert_eq!(&span.citation_text, &snippet);
    }

    #[test]
    fn prop_normalized_round_trip(
        (words, doc) in spaced_document(),
        range in (0usize..12, 1usize..12),
        gap in "[ \t\n]{1,4}",
    ) {
        let start = range.0 % words.len();
        let end = (start + range.1).min(words.len());
        let snippet = words[start..end].join(&gap);

        let span = resolve_span(&doc, &snippet).unwrap();
        let sliced = char_slice(&doc, span.span_start, span.span_end);

        prop_assert_eq!(sliced, span.citation_text.as_str());
        prop_assert_eq!(normalize_whitespace(sliced), normalize_whitespace(&snippet));
    }
}
