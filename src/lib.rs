//! sieve - review tool for synthetic query/citation datasets
//!
//! Generated datasets pair a query with citations: spans of knowledge-base
//! documents that ground the answer. sieve loads such a dataset, shows each
//! citation highlighted in its source document, and records the reviewer's
//! decisions and edits.
//!
//! # Modules
//!
//! - `citation`: span resolution, whitespace normalization, segment building
//! - `review`: knowledge base, review items, the review file and session
//! - `adapters`: external services (query rewriting, dataset upload)
//! - `config`: configuration discovery
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Start a review
//! sieve --kb kb/ --output out/output.jsonl load
//!
//! # Inspect and decide
//! sieve show 0 --citation 1
//! sieve accept 0
//!
//! # Publish accepted items
//! sieve upload --dataset support-queries
//! ```

pub mod adapters;
pub mod citation;
pub mod cli;
pub mod config;
pub mod review;

// Re-export main types at crate root for convenience
pub use citation::{build_segments, resolve_span, Citation, ResolvedSpan, Segment, SpanBounds};
pub use review::{
    ItemPatch, KnowledgeBase, LoadMode, ReviewError, ReviewFilters, ReviewItem, ReviewSession,
    ReviewStatus,
};
