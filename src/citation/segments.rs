//! Partition a document into runs that share one set of active citations.
//!
//! Spans may overlap. A character belongs to every citation whose span
//! contains it; picking a display winner is left to the renderer.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Half-open character span `[span_start, span_end)` into one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanBounds {
    pub span_start: usize,
    pub span_end: usize,
}

impl SpanBounds {
    pub fn new(span_start: usize, span_end: usize) -> Self {
        Self {
            span_start,
            span_end,
        }
    }

    /// Non-empty and inside a document of `len` characters
    pub fn is_valid_for(&self, len: usize) -> bool {
        self.span_start < self.span_end && self.span_end <= len
    }
}

/// A maximal run of text with a fixed set of active citations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Start character offset of the run
    pub start: usize,
    /// End character offset of the run (exclusive)
    pub end: usize,
    pub text: String,
    /// Positions in the input span list active over this run, ascending
    pub citation_indices: Vec<usize>,
}

impl Segment {
    pub fn is_highlighted(&self) -> bool {
        !self.citation_indices.is_empty()
    }
}

// Start sorts before End at the same position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    Start,
    End,
}

/// Build the ordered segment list for `content` and `spans`.
///
/// Spans that are empty or fall outside the document are skipped. The
/// segments cover the whole document in order; with no usable spans the
/// result is a single unhighlighted segment (empty text for an empty
/// document).
pub fn build_segments(content: &str, spans: &[SpanBounds]) -> Vec<Segment> {
    // Byte index of every char boundary, plus the end
    let boundaries: Vec<usize> = content
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()))
        .collect();
    let len = boundaries.len() - 1;

    let mut events: Vec<(usize, EventKind, usize)> = spans
        .iter()
        .enumerate()
        .filter(|(_, span)| span.is_valid_for(len))
        .flat_map(|(i, span)| {
            [
                (span.span_start, EventKind::Start, i),
                (span.span_end, EventKind::End, i),
            ]
        })
        .collect();

    if events.is_empty() {
        return vec![Segment {
            start: 0,
            end: len,
            text: content.to_string(),
            citation_indices: Vec::new(),
        }];
    }

    events.sort_by_key(|&(at, kind, _)| (at, kind));

    let slice = |start: usize, end: usize| content[boundaries[start]..boundaries[end]].to_string();

    let mut segments = Vec::new();
    let mut active = BTreeSet::new();
    let mut pos = 0;

    for (at, kind, index) in events {
        if at > pos {
            segments.push(Segment {
                start: pos,
                end: at,
                text: slice(pos, at),
                citation_indices: active.iter().copied().collect(),
            });
        }
        match kind {
            EventKind::Start => {
                active.insert(index);
            }
            EventKind::End => {
                active.remove(&index);
            }
        }
        pos = at;
    }

    if pos < len {
        segments.push(Segment {
            start: pos,
            end: len,
            text: slice(pos, len),
            citation_indices: active.iter().copied().collect(),
        });
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[Segment]) -> Vec<(&str, Vec<usize>)> {
        segments
            .iter()
            .map(|s| (s.text.as_str(), s.citation_indices.clone()))
            .collect()
    }

    #[test]
    fn test_overlapping_spans() {
        let segments = build_segments(
            "abcdefghij",
            &[SpanBounds::new(0, 5), SpanBounds::new(3, 8)],
        );
        assert_eq!(
            texts(&segments),
            vec![
                ("abc", vec![0]),
                ("de", vec![0, 1]),
                ("fgh", vec![1]),
                ("ij", vec![]),
            ]
        );
        assert_eq!((segments[1].start, segments[1].end), (3, 5));
    }

    #[test]
    fn test_no_spans_is_single_segment() {
        let segments = build_segments("plain text", &[]);
        assert_eq!(texts(&segments), vec![("plain text", vec![])]);
    }

    #[test]
    fn test_empty_document() {
        let segments = build_segments("", &[SpanBounds::new(0, 3)]);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "");
        assert!(!segments[0].is_highlighted());
    }

    #[test]
    fn test_invalid_spans_are_skipped() {
        let segments = build_segments(
            "abcdef",
            &[
                SpanBounds::new(2, 2),
                SpanBounds::new(4, 99),
                SpanBounds::new(5, 3),
                SpanBounds::new(1, 3),
            ],
        );
        assert_eq!(
            texts(&segments),
            vec![("a", vec![]), ("bc", vec![3]), ("def", vec![])]
        );
    }

    #[test]
    fn test_adjacent_spans_split_at_boundary() {
        let segments = build_segments(
            "aaabbb",
            &[SpanBounds::new(3, 6), SpanBounds::new(0, 3)],
        );
        assert_eq!(texts(&segments), vec![("aaa", vec![1]), ("bbb", vec![0])]);
    }

    #[test]
    fn test_identical_and_nested_spans() {
        let segments = build_segments(
            "0123456789",
            &[
                SpanBounds::new(2, 8),
                SpanBounds::new(2, 8),
                SpanBounds::new(4, 6),
            ],
        );
        assert_eq!(
            texts(&segments),
            vec![
                ("01", vec![]),
                ("23", vec![0, 1]),
                ("45", vec![0, 1, 2]),
                ("67", vec![0, 1]),
                ("89", vec![]),
            ]
        );
    }

    #[test]
    fn test_multibyte_content() {
        let segments = build_segments("naïve café", &[SpanBounds::new(2, 7)]);
        assert_eq!(
            texts(&segments),
            vec![("na", vec![]), ("ïve c", vec![0]), ("afé", vec![])]
        );
    }
}
