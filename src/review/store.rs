//! Review file persistence.
//!
//! Items live in `review.jsonl` next to the generated output file, one JSON
//! object per line. Every write replaces the whole file atomically: the
//! items go to a temp file in the same directory, which is then renamed
//! over the review file.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::fs;
use tracing::{debug, info};

use super::item::ReviewItem;

/// Default review file name
pub const REVIEW_FILE_NAME: &str = "review.jsonl";

/// How to treat an existing review file when opening
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Report an existing review instead of loading it
    #[default]
    Detect,
    /// Continue an existing review, seeding one if none exists
    Resume,
    /// Discard any existing review and seed from the output file
    Reset,
}

/// Where loaded items came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    ReviewFile,
    Output,
}

/// Result of opening a review
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        items: Vec<ReviewItem>,
        source: ItemSource,
    },
    /// Detect mode found a previous review; nothing was loaded
    ExistingReview { path: PathBuf, count: usize },
}

/// Generated output file and the review file derived from it
#[derive(Debug, Clone)]
pub struct ReviewFile {
    output_path: PathBuf,
    review_path: PathBuf,
}

impl ReviewFile {
    /// Review file `file_name` placed in the output file's directory
    pub fn new(output_path: impl Into<PathBuf>, file_name: &str) -> Self {
        let output_path = output_path.into();
        let review_path = output_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(file_name);

        Self {
            output_path,
            review_path,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn review_path(&self) -> &Path {
        &self.review_path
    }

    /// Load items according to `mode`
    pub async fn open(&self, mode: LoadMode) -> Result<LoadOutcome> {
        let exists = self.review_path.exists();

        match mode {
            LoadMode::Detect if exists => {
                let count = self.read_review().await?.len();
                info!(path = %self.review_path.display(), count, "Found existing review");
                Ok(LoadOutcome::ExistingReview {
                    path: self.review_path.clone(),
                    count,
                })
            }
            LoadMode::Resume if exists => {
                let items = self.read_review().await?;
                info!(count = items.len(), "Resumed review");
                Ok(LoadOutcome::Loaded {
                    items,
                    source: ItemSource::ReviewFile,
                })
            }
            _ => {
                let items = self.seed_from_output().await?;
                self.write(&items).await?;
                info!(count = items.len(), path = %self.review_path.display(), "Started review from output");
                Ok(LoadOutcome::Loaded {
                    items,
                    source: ItemSource::Output,
                })
            }
        }
    }

    /// Read all items from the review file
    pub async fn read_review(&self) -> Result<Vec<ReviewItem>> {
        let content = fs::read_to_string(&self.review_path)
            .await
            .with_context(|| format!("Failed to read review file: {}", self.review_path.display()))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse review item: {}", line))
            })
            .collect()
    }

    /// Build fresh items from the generated output file
    pub async fn seed_from_output(&self) -> Result<Vec<ReviewItem>> {
        let content = fs::read_to_string(&self.output_path)
            .await
            .with_context(|| format!("Failed to read output file: {}", self.output_path.display()))?;

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| -> Result<ReviewItem> {
                let raw: Value = serde_json::from_str(line)
                    .with_context(|| format!("Failed to parse output line {}: {}", index + 1, line))?;
                Ok(ReviewItem::from_output_record(index, &raw))
            })
            .collect()
    }

    /// Atomically replace the review file with `items`
    pub async fn write(&self, items: &[ReviewItem]) -> Result<()> {
        let mut body = String::new();
        for item in items {
            body.push_str(&serde_json::to_string(item).context("Failed to serialize review item")?);
            body.push('\n');
        }

        let path = self.review_path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, body.as_bytes()))
            .await
            .context("Review file writer task failed")??;

        debug!(count = items.len(), path = %self.review_path.display(), "Wrote review file");
        Ok(())
    }

    /// Raw review file contents
    pub async fn export(&self) -> Result<String> {
        fs::read_to_string(&self.review_path)
            .await
            .with_context(|| format!("Failed to read review file: {}", self.review_path.display()))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".review.tmp.")
        .suffix(".jsonl")
        .tempfile_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;

    temp.write_all(bytes).context("Failed to write review items")?;
    temp.as_file().sync_all().context("Failed to sync review file")?;

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace review file: {}", path.display()))?;

    Ok(())
}
