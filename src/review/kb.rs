//! Knowledge-base documents loaded from a folder of markdown files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, info};

/// Documents keyed by `doc_id` (file stem), front matter stripped
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    root: Option<PathBuf>,
    docs: BTreeMap<String, String>,
}

impl KnowledgeBase {
    /// Build an in-memory knowledge base (no backing folder)
    pub fn from_docs(docs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            root: None,
            docs: docs.into_iter().collect(),
        }
    }

    /// Load every `*.md` file directly inside `dir`
    pub async fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Knowledge base folder not found: {}", dir.display());
        }

        let dir_str = dir
            .to_str()
            .with_context(|| format!("Knowledge base path is not valid UTF-8: {}", dir.display()))?;
        let pattern = format!(
            "{}{}*.md",
            glob::Pattern::escape(dir_str),
            std::path::MAIN_SEPARATOR
        );

        let mut docs = BTreeMap::new();

        for entry in glob::glob(&pattern).context("Invalid knowledge base glob pattern")? {
            let path = entry.context("Failed to read knowledge base entry")?;
            if !path.is_file() {
                continue;
            }

            let Some(doc_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read document: {}", path.display()))?;

            debug!(doc_id, bytes = raw.len(), "Loaded document");
            docs.insert(doc_id.to_string(), strip_front_matter(&raw).to_string());
        }

        info!(count = docs.len(), path = %dir.display(), "Loaded knowledge base");

        Ok(Self {
            root: Some(dir.to_path_buf()),
            docs,
        })
    }

    /// Folder the documents were loaded from
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Full text of a document
    pub fn get(&self, doc_id: &str) -> Option<&str> {
        self.docs.get(doc_id).map(String::as_str)
    }

    /// All document IDs, sorted
    pub fn doc_ids(&self) -> Vec<&str> {
        self.docs.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Remove a leading `---` delimited front-matter block.
///
/// The closing delimiter line and its newline are removed too. Text without
/// a complete block is returned unchanged.
pub fn strip_front_matter(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix("---") else {
        return raw;
    };
    let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
        return raw;
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return &rest[offset + line.len()..];
        }
        offset += line.len();
    }

    raw
}
