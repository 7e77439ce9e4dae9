//! Typed failures surfaced by the review session.

use std::path::PathBuf;

use thiserror::Error;

/// Failures a reviewer can act on
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Document not found: {doc_id}")]
    DocumentNotFound { doc_id: String },

    #[error("Could not find selected text in document {doc_id}")]
    SpanNotFound { doc_id: String },

    #[error("Index out of range: {index} (have {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Citation index out of range: {index} (item has {len} citations)")]
    CitationIndexOutOfRange { index: usize, len: usize },

    #[error("No accepted items to upload")]
    NoAcceptedItems,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("A previous review exists at {} ({count} items); resume or start fresh", path.display())]
    ExistingReview { path: PathBuf, count: usize },
}
