//! Core data models used throughout hip-search.
//!
//! Raw records arrive from the two feeds ([`PublishedRecord`],
//! [`DraftRequest`]) and are normalized into the single searchable
//! [`Item`] shape held by the index.

use serde::{Deserialize, Deserializer, Serialize};

/// Origin of an indexed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Published,
    Draft,
}

/// Unified searchable record.
///
/// Built once during session initialization and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub title: String,
    /// Canonical display identifier. Never empty.
    pub doc_number: String,
    pub category: String,
    /// Free-text blob used for generic substring matching.
    pub content: String,
    pub url: String,
    /// `HIP-<number>` for published items, `Draft HIP` for drafts.
    pub kind: String,
    pub status: ItemStatus,
    pub author: Option<String>,
    /// Pull request number; present only for drafts.
    pub source_request_number: Option<u64>,
    pub file_path: Option<String>,
    /// Set only when a number was parsed from the proposal file name.
    pub extracted_doc_number: Option<String>,
}

/// An item paired with the score it earned for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    #[serde(flatten)]
    pub item: Item,
    pub score: u32,
}

/// A record from the published feed (`search.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishedRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub hipnum: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// A pull request from the draft feed (`_data/draft_hips.json`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub number: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// `null` for deleted accounts.
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: RequestAuthor,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    /// Head commit of the pull request, used to fetch file contents.
    #[serde(default)]
    pub head_ref_oid: Option<String>,
    #[serde(default)]
    pub files: FileConnection,
}

impl DraftRequest {
    /// Paths of all changed files, in feed order.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.edges.iter().map(|e| e.node.path.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestAuthor {
    #[serde(default)]
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConnection {
    #[serde(default)]
    pub edges: Vec<FileEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileEdge {
    pub node: FileNode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileNode {
    pub path: String,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept `"42"`, `42`, or `null` for the published number field.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}
