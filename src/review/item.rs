//! Review items and their wire format.
//!
//! One item per line of `review.jsonl`. Items are seeded from the generated
//! output file the first time a review starts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::citation::Citation;

/// Reviewer verdict for an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::Pending => write!(f, "pending"),
            ReviewStatus::Accepted => write!(f, "accepted"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Classification metadata: known fields plus an open extension map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub has_typos: bool,
    /// Any other classification keys, kept as-is
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

const KNOWN_CLASSIFICATION_KEYS: [&str; 5] = ["category", "language", "tone", "style", "has_typos"];

impl Classification {
    /// Build from a raw output record.
    ///
    /// Known fields come from the top level of the record; a nested
    /// `classification` object overrides them, and its remaining keys go to
    /// the extension map.
    pub fn from_raw(raw: &Value) -> Self {
        let nested = raw.get("classification").and_then(Value::as_object);

        let text_field = |key: &str| {
            nested
                .and_then(|n| n.get(key))
                .and_then(Value::as_str)
                .or_else(|| raw.get(key).and_then(Value::as_str))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let has_typos = nested
            .and_then(|n| n.get("has_typos"))
            .and_then(Value::as_bool)
            .or_else(|| raw.get("has_typos").and_then(Value::as_bool))
            .unwrap_or(false);

        let extra = nested
            .map(|n| {
                n.iter()
                    .filter(|(k, _)| !KNOWN_CLASSIFICATION_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            category: text_field("category"),
            language: text_field("language"),
            tone: text_field("tone"),
            style: text_field("style"),
            has_typos,
            extra,
        }
    }
}

/// A generated query under review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// Position in the output file
    pub index: usize,
    pub query: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub classification: Classification,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub reviewer_notes: String,
    #[serde(default)]
    pub citations_modified: bool,
    #[serde(default)]
    pub query_modified: bool,
    /// Query as generated, set on the first rewrite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

impl ReviewItem {
    /// Seed an item from one generated output record
    pub fn from_output_record(index: usize, raw: &Value) -> Self {
        let query = ["query", "question"]
            .iter()
            .filter_map(|key| raw.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();

        let citations = raw
            .get("citations")
            .and_then(Value::as_array)
            .map(|list| list.iter().map(citation_from_raw).collect())
            .unwrap_or_default();

        Self {
            index,
            query,
            citations,
            classification: Classification::from_raw(raw),
            status: ReviewStatus::Pending,
            reviewer_notes: String::new(),
            citations_modified: false,
            query_modified: false,
            original_query: None,
        }
    }

    /// Distinct document IDs cited by this item, in citation order
    pub fn doc_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for citation in &self.citations {
            if !ids.contains(&citation.doc_id.as_str()) {
                ids.push(&citation.doc_id);
            }
        }
        ids
    }

    /// Whether the reviewer changed the query or the citations
    pub fn is_modified(&self) -> bool {
        self.citations_modified || self.query_modified
    }

    /// Overwrite the fields present in `patch`
    pub fn apply(&mut self, patch: ItemPatch) {
        if let Some(query) = patch.query {
            self.query = query;
        }
        if let Some(citations) = patch.citations {
            self.citations = citations;
        }
        if let Some(classification) = patch.classification {
            self.classification = classification;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(notes) = patch.reviewer_notes {
            self.reviewer_notes = notes;
        }
        if let Some(flag) = patch.citations_modified {
            self.citations_modified = flag;
        }
        if let Some(flag) = patch.query_modified {
            self.query_modified = flag;
        }
        if let Some(original) = patch.original_query {
            self.original_query = Some(original);
        }
    }

    /// Patch replacing the query while keeping the first generated query
    pub fn rewrite_patch(&self, new_query: impl Into<String>) -> ItemPatch {
        let original = if self.query_modified {
            self.original_query.clone()
        } else {
            Some(self.query.clone())
        };

        ItemPatch {
            query: Some(new_query.into()),
            query_modified: Some(true),
            original_query: original,
            ..Default::default()
        }
    }
}

fn citation_from_raw(raw: &Value) -> Citation {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    // Absent offsets default to 0; present ones must be non-negative integers
    let offset = |key: &str| match raw.get(key) {
        None | Some(Value::Null) => Some(0),
        Some(value) => value.as_u64().map(|n| n as usize),
    };

    let (span_start, span_end) = match (offset("span_start"), offset("span_end")) {
        (Some(start), Some(end)) => (start, end),
        (start, _) => {
            // Collapsed to an empty span so segment building skips it
            let start = start.unwrap_or(0);
            let null = Value::Null;
            warn!(
                span_start = %raw.get("span_start").unwrap_or(&null),
                span_end = %raw.get("span_end").unwrap_or(&null),
                "Citation has malformed offsets"
            );
            (start, start)
        }
    };

    Citation {
        doc_id: text("doc_id"),
        span_start,
        span_end,
        citation_text: text("citation_text"),
        chunks: raw
            .get("chunks")
            .and_then(Value::as_array)
            .map(|chunks| {
                chunks
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Partial update of a review item; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations_modified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_modified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_query: Option<String>,
}

impl ItemPatch {
    pub fn status(status: ReviewStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn citations(citations: Vec<Citation>) -> Self {
        Self {
            citations: Some(citations),
            citations_modified: Some(true),
            ..Default::default()
        }
    }
}
