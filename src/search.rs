//! Query engine.
//!
//! # Scoring
//!
//! Every indexed item is tested against the lower-cased query. Checks are
//! independent and their points add up:
//!
//! | Field | Condition | Points |
//! |-------|-----------|--------|
//! | title | contains query (starts with it) | 5 (10) |
//! | doc number | contains query | 15 |
//! | pull request number | its digits appear in the query | 12 |
//! | category | contains query | 3 |
//! | content | contains query | 1 |
//! | author | contains query | 4 |
//! | draft status | query contains `draft` | 8 |
//!
//! Items with no firing check are dropped. The rest are sorted by score
//! descending with a stable sort, so equal scores keep index order
//! (published before drafts), then truncated to the limit.

use crate::index::SearchIndex;
use crate::models::{Item, ItemStatus, PublishedRecord, ScoredItem};

/// Default maximum number of results.
pub const DEFAULT_LIMIT: usize = 10;

/// Points awarded per field.
pub mod weights {
    pub const TITLE_PREFIX: u32 = 10;
    pub const TITLE: u32 = 5;
    pub const DOC_NUMBER: u32 = 15;
    pub const REQUEST_NUMBER: u32 = 12;
    pub const CATEGORY: u32 = 3;
    pub const CONTENT: u32 = 1;
    pub const AUTHOR: u32 = 4;
    pub const DRAFT_KEYWORD: u32 = 8;
}

/// Rank the index against `query`, returning at most `limit` items.
pub fn search(index: &SearchIndex, query: &str, limit: usize) -> Vec<ScoredItem> {
    if query.is_empty() {
        return Vec::new();
    }

    let lower_query = query.to_lowercase();

    let mut results: Vec<ScoredItem> = index
        .items()
        .iter()
        .filter_map(|item| {
            score_item(item, &lower_query).map(|score| ScoredItem {
                item: item.clone(),
                score,
            })
        })
        .collect();

    let matched = results.len();

    // `sort_by` is stable; ties keep index order.
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results.truncate(limit);

    tracing::debug!(
        query,
        indexed = index.len(),
        matched,
        shown = results.len(),
        "search complete"
    );
    results
}

/// Score one item against an already lower-cased query.
///
/// Returns `None` when no check fired. A zero-point match cannot occur
/// since every check carries a positive weight.
pub fn score_item(item: &Item, lower_query: &str) -> Option<u32> {
    let mut score = 0;
    let mut matched = false;

    if let Some(title) = field_match(Some(item.title.as_str()), lower_query) {
        score += if title.starts_with(lower_query) {
            weights::TITLE_PREFIX
        } else {
            weights::TITLE
        };
        matched = true;
    }

    if field_match(Some(item.doc_number.as_str()), lower_query).is_some() {
        score += weights::DOC_NUMBER;
        matched = true;
    }

    if let Some(number) = item.source_request_number {
        if lower_query.contains(&number.to_string()) {
            score += weights::REQUEST_NUMBER;
            matched = true;
        }
    }

    if field_match(Some(item.category.as_str()), lower_query).is_some() {
        score += weights::CATEGORY;
        matched = true;
    }

    if field_match(Some(item.content.as_str()), lower_query).is_some() {
        score += weights::CONTENT;
        matched = true;
    }

    if field_match(item.author.as_deref(), lower_query).is_some() {
        score += weights::AUTHOR;
        matched = true;
    }

    if item.status == ItemStatus::Draft && lower_query.contains("draft") {
        score += weights::DRAFT_KEYWORD;
        matched = true;
    }

    matched.then_some(score)
}

/// Null-safe, case-insensitive containment.
///
/// Returns the lower-cased field on a match so callers can run further
/// checks without lower-casing twice. Empty fields never match.
pub fn field_match(field: Option<&str>, lower_query: &str) -> Option<String> {
    let field = field.filter(|f| !f.is_empty())?;
    let lower = field.to_lowercase();
    lower.contains(lower_query).then_some(lower)
}

/// Degraded search over the published feed only.
///
/// A record matches when any field contains the query as a plain,
/// case-insensitive substring. Results keep feed order and carry score 0.
#[derive(Debug, Clone, Default)]
pub struct BasicSearch {
    records: Vec<PublishedRecord>,
}

impl BasicSearch {
    pub fn new(records: Vec<PublishedRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredItem> {
        if query.is_empty() {
            return Vec::new();
        }
        let lower_query = query.to_lowercase();

        self.records
            .iter()
            .filter(|r| {
                [&r.title, &r.hipnum, &r.category, &r.content, &r.url]
                    .iter()
                    .any(|f| f.to_lowercase().contains(&lower_query))
            })
            .filter_map(crate::index::published_item)
            .take(limit)
            .map(|item| ScoredItem { item, score: 0 })
            .collect()
    }
}
