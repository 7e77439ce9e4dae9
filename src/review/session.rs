//! The review session: knowledge base, items and their review file.
//!
//! Every mutation writes the whole item list back to the review file
//! before returning, so a crash never loses an accepted decision.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::adapters::{DatasetUploader, QueryRewriter, UploadReceipt};
use crate::citation::{build_segments, resolve_span_with_method, Citation, ResolvedSpan, Segment};
use crate::config::ResolvedConfig;

use super::error::ReviewError;
use super::filters::{next_pending, FilterOptions, ReviewStats};
use super::item::{ItemPatch, ReviewItem, ReviewStatus};
use super::kb::KnowledgeBase;
use super::store::{ItemSource, LoadMode, LoadOutcome, ReviewFile};

/// Result of [`ReviewSession::open`]
#[derive(Debug)]
pub enum OpenOutcome {
    Ready {
        session: ReviewSession,
        source: ItemSource,
    },
    /// A previous review exists and the caller must pick resume or reset
    ExistingReview { path: PathBuf, count: usize },
}

/// Snapshot of what the session holds
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub active: bool,
    pub item_count: usize,
    pub doc_ids: Vec<String>,
    pub review_path: PathBuf,
}

#[derive(Debug)]
pub struct ReviewSession {
    kb: KnowledgeBase,
    items: Vec<ReviewItem>,
    file: ReviewFile,
}

impl ReviewSession {
    /// Load the knowledge base and the items for `output`
    #[instrument(skip_all, fields(kb = %kb_dir.display(), output = %output.display(), ?mode))]
    pub async fn open(
        kb_dir: &Path,
        output: &Path,
        mode: LoadMode,
        config: &ResolvedConfig,
    ) -> Result<OpenOutcome> {
        let kb = KnowledgeBase::load(kb_dir).await?;
        let file = ReviewFile::new(output, &config.review_file_name);

        match file.open(mode).await? {
            LoadOutcome::ExistingReview { path, count } => {
                Ok(OpenOutcome::ExistingReview { path, count })
            }
            LoadOutcome::Loaded { items, source } => {
                if items.is_empty() {
                    anyhow::bail!("No items found in {}", output.display());
                }
                info!(items = items.len(), docs = kb.len(), ?source, "Review session ready");
                Ok(OpenOutcome::Ready {
                    session: Self::new(kb, items, file),
                    source,
                })
            }
        }
    }

    pub fn new(kb: KnowledgeBase, items: Vec<ReviewItem>, file: ReviewFile) -> Self {
        Self { kb, items, file }
    }

    pub fn kb(&self) -> &KnowledgeBase {
        &self.kb
    }

    pub fn items(&self) -> &[ReviewItem] {
        &self.items
    }

    pub fn review_path(&self) -> &Path {
        self.file.review_path()
    }

    pub fn item(&self, index: usize) -> Result<&ReviewItem> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or_else(|| ReviewError::IndexOutOfRange { index, len }.into())
    }

    fn document(&self, doc_id: &str) -> Result<&str> {
        self.kb.get(doc_id).ok_or_else(|| {
            ReviewError::DocumentNotFound {
                doc_id: doc_id.to_string(),
            }
            .into()
        })
    }

    /// Locate `selected_text` in document `doc_id`
    pub fn compute_span(&self, doc_id: &str, selected_text: &str) -> Result<ResolvedSpan> {
        let document = self.document(doc_id)?;

        let (span, method) = resolve_span_with_method(document, selected_text).ok_or_else(|| {
            ReviewError::SpanNotFound {
                doc_id: doc_id.to_string(),
            }
        })?;

        debug!(
            doc_id,
            start = span.span_start,
            end = span.span_end,
            method = method.as_str(),
            "Resolved span"
        );
        Ok(span)
    }

    /// Apply `patch` to item `index` and persist
    pub async fn update_item(&mut self, index: usize, patch: ItemPatch) -> Result<&ReviewItem> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(index)
            .ok_or(ReviewError::IndexOutOfRange { index, len })?;
        let previous = item.clone();
        item.apply(patch);

        // Memory must match the review file, so undo the patch if the write fails
        if let Err(e) = self.file.write(&self.items).await {
            self.items[index] = previous;
            return Err(e.context("Failed to persist review"));
        }

        Ok(&self.items[index])
    }

    /// Next pending item after `after`, wrapping around
    pub fn next_pending(&self, after: Option<usize>) -> Option<usize> {
        let all: Vec<usize> = (0..self.items.len()).collect();
        next_pending(&self.items, &all, after)
    }

    pub async fn accept(&mut self, index: usize) -> Result<&ReviewItem> {
        self.update_item(index, ItemPatch::status(ReviewStatus::Accepted)).await
    }

    pub async fn reject(&mut self, index: usize) -> Result<&ReviewItem> {
        self.update_item(index, ItemPatch::status(ReviewStatus::Rejected)).await
    }

    /// Back to pending
    pub async fn reset(&mut self, index: usize) -> Result<&ReviewItem> {
        self.update_item(index, ItemPatch::status(ReviewStatus::Pending)).await
    }

    pub async fn set_notes(&mut self, index: usize, notes: impl Into<String>) -> Result<&ReviewItem> {
        let patch = ItemPatch {
            reviewer_notes: Some(notes.into()),
            ..Default::default()
        };
        self.update_item(index, patch).await
    }

    pub async fn add_citation(&mut self, index: usize, citation: Citation) -> Result<&ReviewItem> {
        let mut citations = self.item(index)?.citations.clone();
        citations.push(citation);
        self.update_item(index, ItemPatch::citations(citations)).await
    }

    /// Resolve `selected_text` in `doc_id` and cite it; nothing changes on failure
    pub async fn add_citation_from_selection(
        &mut self,
        index: usize,
        doc_id: &str,
        selected_text: &str,
    ) -> Result<&ReviewItem> {
        self.item(index)?;
        let span = self.compute_span(doc_id, selected_text)?;
        self.add_citation(index, Citation::from_resolved(doc_id, span)).await
    }

    pub async fn remove_citation(&mut self, index: usize, citation_index: usize) -> Result<&ReviewItem> {
        let mut citations = self.item(index)?.citations.clone();
        if citation_index >= citations.len() {
            return Err(ReviewError::CitationIndexOutOfRange {
                index: citation_index,
                len: citations.len(),
            }
            .into());
        }
        citations.remove(citation_index);
        self.update_item(index, ItemPatch::citations(citations)).await
    }

    /// Replace the query, remembering the first generated one
    pub async fn rewrite_query(&mut self, index: usize, new_query: impl Into<String>) -> Result<&ReviewItem> {
        let new_query = new_query.into();
        if new_query.trim().is_empty() {
            return Err(ReviewError::InvalidArgument("query must not be empty".to_string()).into());
        }
        let patch = self.item(index)?.rewrite_patch(new_query);
        self.update_item(index, patch).await
    }

    /// Ask `rewriter` for a new query following `instruction`, then apply it
    pub async fn rewrite_with(
        &mut self,
        rewriter: &dyn QueryRewriter,
        index: usize,
        instruction: &str,
    ) -> Result<&ReviewItem> {
        if instruction.trim().is_empty() {
            return Err(ReviewError::InvalidArgument("instruction must not be empty".to_string()).into());
        }

        let item = self.item(index)?;
        let rewritten = rewriter
            .rewrite(&item.query, instruction, &item.citations)
            .await
            .with_context(|| format!("{} rewrite failed", rewriter.name()))?;

        info!(index, rewriter = rewriter.name(), "Query rewritten");
        self.rewrite_query(index, rewritten.trim()).await
    }

    /// Upload accepted items as dataset `name`
    pub async fn upload_accepted(
        &self,
        uploader: &dyn DatasetUploader,
        name: &str,
        description: Option<&str>,
    ) -> Result<UploadReceipt> {
        if name.trim().is_empty() {
            return Err(ReviewError::InvalidArgument("dataset name must not be empty".to_string()).into());
        }

        let accepted: Vec<&ReviewItem> = self
            .items
            .iter()
            .filter(|item| item.status == ReviewStatus::Accepted)
            .collect();
        if accepted.is_empty() {
            return Err(ReviewError::NoAcceptedItems.into());
        }

        let description = match description {
            Some(text) => text.to_string(),
            None => format!("SIEVE review - {} items", accepted.len()),
        };

        let receipt = uploader
            .upload(name, &description, &accepted)
            .await
            .with_context(|| format!("{} upload failed", uploader.name()))?;

        info!(dataset = name, count = receipt.count, url = %receipt.url, "Uploaded dataset");
        Ok(receipt)
    }

    /// Segments of `doc_id` highlighted with item `index`'s citations.
    ///
    /// Citation indices on the returned segments are positions in the
    /// item's full citation list.
    pub fn segments_for(&self, index: usize, doc_id: &str) -> Result<Vec<Segment>> {
        let item = self.item(index)?;
        let document = self.document(doc_id)?;

        let (positions, spans): (Vec<usize>, Vec<_>) = item
            .citations
            .iter()
            .enumerate()
            .filter(|(_, citation)| citation.doc_id == doc_id)
            .map(|(position, citation)| (position, citation.bounds()))
            .unzip();

        let mut segments = build_segments(document, &spans);
        for segment in &mut segments {
            for local in &mut segment.citation_indices {
                *local = positions[*local];
            }
        }

        Ok(segments)
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::compute(&self.items)
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::collect(&self.items, self.kb.doc_ids())
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            active: true,
            item_count: self.items.len(),
            doc_ids: self.kb.doc_ids().into_iter().map(str::to_string).collect(),
            review_path: self.file.review_path().to_path_buf(),
        }
    }

    /// Raw review file contents
    pub async fn export(&self) -> Result<String> {
        self.file.export().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = "Refunds are issued within 30 days.\nShipping   takes five days.";

    fn session(temp: &TempDir) -> ReviewSession {
        let kb = KnowledgeBase::from_docs([("policy".to_string(), DOC.to_string())]);
        let item = ReviewItem::from_output_record(
            0,
            &serde_json::json!({
                "query": "How long do refunds take?",
                "citations": [
                    {"doc_id": "policy", "span_start": 0, "span_end": 7, "citation_text": "Refunds"}
                ]
            }),
        );
        let file = ReviewFile::new(temp.path().join("output.jsonl"), "review.jsonl");
        ReviewSession::new(kb, vec![item], file)
    }

    #[test]
    fn test_compute_span_normalized() {
        let temp = TempDir::new().unwrap();
        let session = session(&temp);

        let span = session.compute_span("policy", "Shipping takes").unwrap();
        assert_eq!(span.citation_text, "Shipping   takes");
        assert_eq!(span.span_start, 35);
    }

    #[test]
    fn test_compute_span_errors_are_typed() {
        let temp = TempDir::new().unwrap();
        let session = session(&temp);

        let err = session.compute_span("missing", "Refunds").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::DocumentNotFound { .. })
        ));

        let err = session.compute_span("policy", "not present").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::SpanNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_persists() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        session.accept(0).await.unwrap();

        let written = std::fs::read_to_string(temp.path().join("review.jsonl")).unwrap();
        let item: ReviewItem = serde_json::from_str(written.lines().next().unwrap()).unwrap();
        assert_eq!(item.status, ReviewStatus::Accepted);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_item_unchanged() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let kb = KnowledgeBase::from_docs([("policy".to_string(), DOC.to_string())]);
        let item = ReviewItem::from_output_record(0, &serde_json::json!({"query": "q"}));
        let file = ReviewFile::new(blocker.join("output.jsonl"), "review.jsonl");
        let mut session = ReviewSession::new(kb, vec![item.clone()], file);

        assert!(session.accept(0).await.is_err());
        assert!(session.set_notes(0, "lost").await.is_err());
        assert_eq!(session.items()[0], item);
        assert_eq!(session.items()[0].status, ReviewStatus::Pending);
    }

    #[tokio::test]
    async fn test_next_pending_wraps() {
        let temp = TempDir::new().unwrap();
        let kb = KnowledgeBase::from_docs([("policy".to_string(), DOC.to_string())]);
        let items = (0..3)
            .map(|i| ReviewItem::from_output_record(i, &serde_json::json!({"query": "q"})))
            .collect();
        let file = ReviewFile::new(temp.path().join("output.jsonl"), "review.jsonl");
        let mut session = ReviewSession::new(kb, items, file);

        session.accept(1).await.unwrap();
        assert_eq!(session.next_pending(Some(0)), Some(2));
        assert_eq!(session.next_pending(Some(2)), Some(0));

        session.reject(0).await.unwrap();
        session.accept(2).await.unwrap();
        assert_eq!(session.next_pending(Some(2)), None);
    }

    #[tokio::test]
    async fn test_remove_citation_out_of_range() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        let err = session.remove_citation(0, 5).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReviewError>(),
            Some(ReviewError::CitationIndexOutOfRange { index: 5, len: 1 })
        ));
        assert_eq!(session.items()[0].citations.len(), 1);
        assert!(!session.items()[0].citations_modified);
    }

    #[test]
    fn test_segments_for_maps_item_positions() {
        let temp = TempDir::new().unwrap();
        let kb = KnowledgeBase::from_docs([
            ("a".to_string(), "alpha beta".to_string()),
            ("b".to_string(), "gamma delta".to_string()),
        ]);
        let mut item = ReviewItem::from_output_record(0, &serde_json::json!({"query": "q"}));
        item.citations = vec![
            Citation::from_resolved("a", crate::citation::resolve_span("alpha beta", "alpha").unwrap()),
            Citation::from_resolved("b", crate::citation::resolve_span("gamma delta", "delta").unwrap()),
        ];
        let file = ReviewFile::new(temp.path().join("output.jsonl"), "review.jsonl");
        let session = ReviewSession::new(kb, vec![item], file);

        let segments = session.segments_for(0, "b").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "gamma ");
        assert!(segments[0].citation_indices.is_empty());
        assert_eq!(segments[1].citation_indices, vec![1]);
    }
}
