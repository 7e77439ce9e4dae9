//! Adapter interfaces for external services.
//!
//! The review session talks to an LLM for query rewrites and to a dataset
//! service for uploads. Both sit behind traits so tests can swap them out.

pub mod anthropic;
pub mod langsmith;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::review::ReviewItem;

pub use anthropic::AnthropicRewriter;
pub use langsmith::LangSmithUploader;

/// Rewrites a query following a reviewer instruction
#[async_trait]
pub trait QueryRewriter: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Return the rewritten query, grounded in `citations`
    async fn rewrite(&self, query: &str, instruction: &str, citations: &[Citation]) -> Result<String>;
}

/// Result of a dataset upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Where the dataset can be viewed
    pub url: String,
    /// Number of examples uploaded
    pub count: usize,
}

/// Publishes accepted items as input/output examples
#[async_trait]
pub trait DatasetUploader: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Create dataset `name` holding one example per item
    async fn upload(&self, name: &str, description: &str, items: &[&ReviewItem]) -> Result<UploadReceipt>;
}
