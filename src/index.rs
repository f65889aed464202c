//! Index construction.
//!
//! Published items come first, drafts are appended, each group in feed
//! order. Nothing is re-sorted: the query engine's stable sort relies on
//! this order to prefer published proposals on equal scores.

use crate::models::{DraftRequest, Item, ItemStatus, PublishedRecord};
use crate::normalize::normalize_drafts;

/// The immutable, searchable collection built once per session.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    items: Vec<Item>,
    published: usize,
}

impl SearchIndex {
    /// Build from already-normalized drafts.
    pub fn build(published: &[PublishedRecord], drafts: Vec<Item>) -> Self {
        let mut items: Vec<Item> = published.iter().filter_map(published_item).collect();
        let published_count = items.len();
        items.extend(drafts);

        tracing::info!(
            total = items.len(),
            published = published_count,
            drafts = items.len() - published_count,
            "search index built"
        );

        Self {
            items,
            published: published_count,
        }
    }

    /// Normalize raw draft requests and build.
    pub fn from_sources(published: &[PublishedRecord], drafts: &[DraftRequest]) -> Self {
        Self::build(published, normalize_drafts(drafts))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn published_count(&self) -> usize {
        self.published
    }

    pub fn draft_count(&self) -> usize {
        self.items.len() - self.published
    }
}

/// Map a published feed record to an item.
///
/// Records without a number are dropped; every item needs a display id.
pub fn published_item(record: &PublishedRecord) -> Option<Item> {
    let number = record.hipnum.trim();
    if number.is_empty() {
        tracing::warn!(title = %record.title, "published record has no number, skipping");
        return None;
    }

    Some(Item {
        title: record.title.clone(),
        doc_number: number.to_string(),
        category: record.category.clone(),
        content: record.content.clone(),
        url: record.url.clone(),
        kind: format!("HIP-{}", number),
        status: ItemStatus::Published,
        author: None,
        source_request_number: None,
        file_path: None,
        extracted_doc_number: None,
    })
}
