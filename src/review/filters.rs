//! Filtering, statistics, and navigation over review items.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::item::{ReviewItem, ReviewStatus};

/// Status filter; `All` disables status filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Accepted,
    Rejected,
}

impl StatusFilter {
    fn matches(&self, status: ReviewStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == ReviewStatus::Pending,
            StatusFilter::Accepted => status == ReviewStatus::Accepted,
            StatusFilter::Rejected => status == ReviewStatus::Rejected,
        }
    }
}

/// Active filters; an empty list means "any"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFilters {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub doc_ids: Vec<String>,
    #[serde(default)]
    pub has_typos: Option<bool>,
    #[serde(default)]
    pub modified_only: bool,
    /// Case-insensitive substring of the query
    #[serde(default)]
    pub search: String,
}

impl ReviewFilters {
    /// Whether `item` passes every active filter
    pub fn matches(&self, item: &ReviewItem) -> bool {
        let classification = &item.classification;

        if !self.status.matches(item.status) {
            return false;
        }
        if !self.categories.is_empty()
            && !self
                .categories
                .iter()
                .any(|c| c == classification.category.as_deref().unwrap_or(""))
        {
            return false;
        }
        if !self.languages.is_empty()
            && !self
                .languages
                .iter()
                .any(|l| l == classification.language.as_deref().unwrap_or(""))
        {
            return false;
        }
        if !self.doc_ids.is_empty() {
            let cited = item.doc_ids();
            if !self.doc_ids.iter().any(|d| cited.contains(&d.as_str())) {
                return false;
            }
        }
        if let Some(has_typos) = self.has_typos {
            if classification.has_typos != has_typos {
                return false;
            }
        }
        if self.modified_only && !item.is_modified() {
            return false;
        }
        if !self.search.is_empty()
            && !item.query.to_lowercase().contains(&self.search.to_lowercase())
        {
            return false;
        }

        true
    }
}

/// Positions of the items passing `filters`, in item order
pub fn filtered_indices(items: &[ReviewItem], filters: &ReviewFilters) -> Vec<usize> {
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| filters.matches(item))
        .map(|(i, _)| i)
        .collect()
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
}

impl ReviewStats {
    pub fn compute(items: &[ReviewItem]) -> Self {
        let count = |status: ReviewStatus| items.iter().filter(|i| i.status == status).count();
        Self {
            total: items.len(),
            accepted: count(ReviewStatus::Accepted),
            rejected: count(ReviewStatus::Rejected),
            pending: count(ReviewStatus::Pending),
        }
    }
}

/// Values available for filtering
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub languages: Vec<String>,
    pub doc_ids: Vec<String>,
}

impl FilterOptions {
    /// Sorted distinct categories and languages, plus the given doc IDs sorted
    pub fn collect<'a>(items: &[ReviewItem], doc_ids: impl IntoIterator<Item = &'a str>) -> Self {
        let mut categories = BTreeSet::new();
        let mut languages = BTreeSet::new();

        for item in items {
            if let Some(category) = item.classification.category.as_deref().filter(|c| !c.is_empty()) {
                categories.insert(category.to_string());
            }
            if let Some(language) = item.classification.language.as_deref().filter(|l| !l.is_empty()) {
                languages.insert(language.to_string());
            }
        }

        let mut doc_ids: Vec<String> = doc_ids.into_iter().map(str::to_string).collect();
        doc_ids.sort();

        Self {
            categories: categories.into_iter().collect(),
            languages: languages.into_iter().collect(),
            doc_ids,
        }
    }
}

/// Next filtered item after `selected`; the first one when nothing is
/// selected or the selection is filtered out. Stays put at the end.
pub fn next_index(filtered: &[usize], selected: Option<usize>) -> Option<usize> {
    let first = filtered.first().copied()?;
    let Some(pos) = selected.and_then(|s| filtered.iter().position(|&i| i == s)) else {
        return Some(first);
    };
    Some(filtered.get(pos + 1).copied().unwrap_or(filtered[pos]))
}

/// Previous filtered item before `selected`; stays put at the start
pub fn prev_index(filtered: &[usize], selected: Option<usize>) -> Option<usize> {
    let first = filtered.first().copied()?;
    let Some(pos) = selected.and_then(|s| filtered.iter().position(|&i| i == s)) else {
        return Some(first);
    };
    Some(if pos > 0 { filtered[pos - 1] } else { filtered[pos] })
}

/// Next pending item after `selected`, wrapping around to the start
pub fn next_pending(items: &[ReviewItem], filtered: &[usize], selected: Option<usize>) -> Option<usize> {
    if filtered.is_empty() {
        return None;
    }

    let start = selected
        .and_then(|s| filtered.iter().position(|&i| i == s))
        .map(|pos| pos + 1)
        .unwrap_or(0);

    let is_pending = |&&i: &&usize| items.get(i).is_some_and(|item| item.status == ReviewStatus::Pending);

    filtered[start..]
        .iter()
        .find(is_pending)
        .or_else(|| filtered[..start].iter().find(is_pending))
        .copied()
}
