//! Draft normalization.
//!
//! Maps raw pull requests from the draft feed into [`Item`]s with the same
//! shape as published proposals.
//!
//! For each request, in feed order:
//!
//! 1. Skip it if an item was already emitted for the same number.
//! 2. Keep changed files that look like proposal documents
//!    (see [`is_proposal_file`]).
//! 3. Skip the request if none remain.
//! 4. The first remaining file is authoritative.
//! 5. Parse `hip-<digits>.md` from its path into `extracted_doc_number`.
//! 6. Emit one draft item.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::SearchError;
use crate::models::{DraftRequest, Item, ItemStatus};

/// Category assigned to every draft item.
pub const DRAFT_CATEGORY: &str = "draft";
/// Kind label assigned to every draft item.
pub const DRAFT_KIND: &str = "Draft HIP";

static DOC_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hip-(\d+)\.md").expect("static regex"));

/// Normalize draft requests into searchable items.
pub fn normalize_drafts(requests: &[DraftRequest]) -> Vec<Item> {
    let mut seen: HashSet<u64> = HashSet::new();
    let mut items = Vec::new();

    for req in requests {
        if seen.contains(&req.number) {
            tracing::debug!(number = req.number, "skipping duplicate draft request");
            continue;
        }

        match normalize_request(req) {
            Ok(item) => {
                seen.insert(req.number);
                items.push(item);
            }
            Err(e) => tracing::debug!("{}", e),
        }
    }

    tracing::info!(
        requests = requests.len(),
        drafts = items.len(),
        "processed draft requests"
    );
    items
}

/// Normalize a single request, or explain why it is not a draft proposal.
pub fn normalize_request(req: &DraftRequest) -> Result<Item, SearchError> {
    let file_path = req
        .file_paths()
        .find(|p| is_proposal_file(p))
        .ok_or_else(|| SearchError::MalformedDraftRecord {
            number: req.number,
            reason: "no proposal markdown file changed".to_string(),
        })?;

    let extracted = extract_doc_number(file_path);
    let doc_number = extracted
        .clone()
        .unwrap_or_else(|| synthetic_doc_number(req.number));

    let title = match req.title.as_deref() {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => format!(
            "Draft HIP {}",
            extracted.clone().unwrap_or_else(|| req.number.to_string())
        ),
    };

    let login = req.author.login.as_str();
    let content = format!(
        "{} {} draft pr pull request {}",
        req.title.as_deref().unwrap_or(""),
        login,
        extracted.as_deref().unwrap_or("")
    );

    Ok(Item {
        title,
        doc_number,
        category: DRAFT_CATEGORY.to_string(),
        content,
        url: req.url.clone(),
        kind: DRAFT_KIND.to_string(),
        status: ItemStatus::Draft,
        author: (!login.is_empty()).then(|| login.to_string()),
        source_request_number: Some(req.number),
        file_path: Some(file_path.to_string()),
        extracted_doc_number: extracted,
    })
}

/// A changed file counts as a proposal when it is markdown, lives under a
/// `HIP/` directory or is named `hip-*`, and is not a template.
pub fn is_proposal_file(path: &str) -> bool {
    path.ends_with(".md")
        && !path.contains("template")
        && (path.contains("HIP/") || path.contains("hip-"))
}

/// Parse the canonical number out of a `hip-<digits>.md` file name.
pub fn extract_doc_number(path: &str) -> Option<String> {
    DOC_NUMBER_RE
        .captures(path)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Display identifier for a draft whose file name carries no number.
pub fn synthetic_doc_number(request_number: u64) -> String {
    format!("Draft-{}", request_number)
}
