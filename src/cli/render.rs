//! Plain-terminal rendering of highlighted documents.
//!
//! A highlighted run is wrapped as `[N:text]` where `N` is the 1-based label
//! of its first active citation; `[*N:text]` marks a run that contains the
//! focused citation.

use crate::citation::{citation_color, offset_to_line_col, Citation, Segment};

/// Render `segments` inline, marking runs that include `focused`
pub fn render_segments(segments: &[Segment], focused: Option<usize>) -> String {
    let mut out = String::new();

    for segment in segments {
        let Some(&primary) = segment.citation_indices.first() else {
            out.push_str(&segment.text);
            continue;
        };

        let active = focused.is_some_and(|f| segment.citation_indices.contains(&f));
        out.push('[');
        if active {
            out.push('*');
        }
        out.push_str(&(primary + 1).to_string());
        out.push(':');
        out.push_str(&segment.text);
        out.push(']');
    }

    out
}

/// One legend line per citation in `doc_id`: label, color, position, text
pub fn render_legend(citations: &[Citation], doc_id: &str, document: &str) -> Vec<String> {
    citations
        .iter()
        .enumerate()
        .filter(|(_, citation)| citation.doc_id == doc_id)
        .map(|(i, citation)| {
            let color = citation_color(i);
            let pos = offset_to_line_col(document, citation.span_start);
            format!(
                "  [{}] {:<8} {} line {}, col {} ({}-{}): \"{}\"",
                i + 1,
                color.name,
                color.hex,
                pos.line,
                pos.col,
                citation.span_start,
                citation.span_end,
                citation.citation_text
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::{build_segments, SpanBounds};

    #[test]
    fn test_render_overlap() {
        let doc = "The quick brown fox";
        let segments = build_segments(doc, &[SpanBounds::new(4, 15), SpanBounds::new(10, 19)]);

        assert_eq!(
            render_segments(&segments, None),
            "The [1:quick ][1:brown][2: fox]"
        );
        assert_eq!(
            render_segments(&segments, Some(1)),
            "The [1:quick ][*1:brown][*2: fox]"
        );
    }

    #[test]
    fn test_render_plain() {
        let segments = build_segments("no citations", &[]);
        assert_eq!(render_segments(&segments, Some(0)), "no citations");
    }

    #[test]
    fn test_legend_skips_other_docs() {
        let citations = vec![
            Citation {
                doc_id: "other".to_string(),
                span_start: 0,
                span_end: 1,
                citation_text: "x".to_string(),
                chunks: vec![],
            },
            Citation {
                doc_id: "doc".to_string(),
                span_start: 6,
                span_end: 10,
                citation_text: "line".to_string(),
                chunks: vec![],
            },
        ];

        let legend = render_legend(&citations, "doc", "first\nline two");
        assert_eq!(legend.len(), 1);
        assert!(legend[0].starts_with("  [2] cyan"));
        assert!(legend[0].contains("line 2, col 1"));
    }
}
