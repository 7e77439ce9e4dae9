//! Text addressing for citations
//!
//! Resolves snippets to exact character spans in knowledge-base documents
//! and partitions documents into highlightable runs.
//!
//! # Design Principles
//!
//! - **Pure functions**: no I/O, no shared state, safe to call from any thread
//! - **Character offsets**: spans count Unicode scalar values, not bytes
//! - **Honest failure**: a snippet that cannot be located yields `None`,
//!   never a zero-length or shifted span
//!
//! # Example
//!
//! ```
//! use sieve::citation::{build_segments, resolve_span, SpanBounds};
//!
//! let doc = "The quick   brown\nfox jumps.";
//! let span = resolve_span(doc, "quick brown fox").unwrap();
//! assert_eq!(span.citation_text, "quick   brown\nfox");
//!
//! let segments = build_segments(doc, &[SpanBounds::new(span.span_start, span.span_end)]);
//! assert_eq!(segments.len(), 3);
//! ```

pub mod colors;
pub mod normalize;
pub mod segments;
pub mod spans;
pub mod types;

pub use colors::{citation_color, CitationColor, CITATION_COLORS};
pub use normalize::{normalize_whitespace, normalize_with_map, Normalized};
pub use segments::{build_segments, Segment, SpanBounds};
pub use spans::{
    char_slice, offset_to_line_col, resolve_span, resolve_span_with_method, LineCol, MatchMethod,
    ResolvedSpan,
};
pub use types::Citation;
