//! Draft enrichment from proposal file contents.
//!
//! The draft feed only lists which files a pull request touches. To show
//! a proper table of drafts (title, authors, council approval) each
//! candidate file is fetched at the pull request's head commit and its
//! front matter parsed. Among a request's files, the one with the longest
//! title wins.

use anyhow::{bail, Result};
use chrono::Utc;
use reqwest::Url;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::Config;
use crate::loader::{Loader, SourcePlan, SourceStatus};
use crate::metadata::{parse_authors, parse_front_matter, Author, Metadata};
use crate::models::DraftRequest;

/// A draft pull request with metadata read from its proposal file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftProposal {
    pub number: u64,
    pub url: String,
    pub title: String,
    pub authors: Vec<Author>,
    pub needs_council_approval: bool,
    pub category: String,
    /// Lower-cased `type` header, `core` when absent.
    pub kind: String,
    pub file_path: String,
}

impl DraftProposal {
    fn from_metadata(req: &DraftRequest, file_path: &str, meta: &Metadata) -> Self {
        Self {
            number: req.number,
            url: req.url.clone(),
            title: meta.title().unwrap_or_default().to_string(),
            authors: meta.get("author").map(parse_authors).unwrap_or_default(),
            needs_council_approval: meta.needs_council_approval(),
            category: meta.get("category").unwrap_or_default().to_string(),
            kind: meta.get("type").unwrap_or("core").to_lowercase(),
            file_path: file_path.to_string(),
        }
    }

    /// Comma-separated author names, or `Unknown`.
    pub fn author_names(&self) -> String {
        if self.authors.is_empty() {
            return "Unknown".to_string();
        }
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// `hips drafts`: load the draft feed, enrich it, and print a table (or
/// JSON).
pub async fn list_drafts(config: &Config, json: bool) -> Result<()> {
    let plan = SourcePlan::from_config(&config.sources)?;
    let loader = Loader::http(Duration::from_secs(config.sources.timeout_secs))?;

    let (requests, status) = loader
        .load_drafts(
            &cache_busted(&plan.draft_primary),
            &cache_busted(&plan.draft_fallback),
        )
        .await;
    if let SourceStatus::Unavailable { reason } = status {
        bail!("draft feed unavailable: {}", reason);
    }

    let proposals = enrich_drafts(&loader, &config.sources.raw_content_base, &requests).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&proposals)?);
    } else {
        for line in table_lines(&proposals) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Header plus one row per proposal.
pub fn table_lines(proposals: &[DraftProposal]) -> Vec<String> {
    if proposals.is_empty() {
        return vec!["No draft HIPs found".to_string()];
    }
    let mut lines = vec![format!(
        "{:<9} {:<8} {:<50} {:<30} {}",
        "PR", "COUNCIL", "TITLE", "AUTHORS", "TYPE"
    )];
    for p in proposals {
        lines.push(format!(
            "{:<9} {:<8} {:<50} {:<30} {}",
            format!("PR-{}", p.number),
            if p.needs_council_approval { "Yes" } else { "No" },
            p.title,
            p.author_names(),
            p.kind
        ));
    }
    lines
}

/// Files worth fetching: markdown named `hip-*` that is not a template.
pub fn candidate_files(req: &DraftRequest) -> Vec<&str> {
    req.file_paths()
        .filter(|p| p.ends_with(".md") && p.contains("/hip-") && !p.contains("/template"))
        .collect()
}

/// `<raw_base>/<commit>/<path>`.
pub fn raw_file_url(raw_base: &str, commit: &str, path: &str) -> Option<Url> {
    let url = format!("{}/{}/{}", raw_base.trim_end_matches('/'), commit, path);
    Url::parse(&url).ok()
}

/// Append `t=<millis>` so intermediaries never serve a stale feed.
pub fn cache_busted(url: &Url) -> Url {
    if !matches!(url.scheme(), "http" | "https") {
        return url.clone();
    }
    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .append_pair("t", &Utc::now().timestamp_millis().to_string());
    busted
}

/// Enrich every request, skipping duplicates and requests without a
/// readable proposal file.
pub async fn enrich_drafts(
    loader: &Loader,
    raw_base: &str,
    requests: &[DraftRequest],
) -> Vec<DraftProposal> {
    let mut seen = HashSet::new();
    let mut proposals = Vec::new();

    for req in requests {
        if seen.contains(&req.number) {
            tracing::debug!(number = req.number, "skipping duplicate PR");
            continue;
        }
        if let Some(proposal) = enrich_request(loader, raw_base, req).await {
            seen.insert(req.number);
            proposals.push(proposal);
        }
    }

    tracing::info!(found = proposals.len(), "draft enrichment complete");
    proposals
}

/// Fetch the candidate files of one request and keep the best.
pub async fn enrich_request(
    loader: &Loader,
    raw_base: &str,
    req: &DraftRequest,
) -> Option<DraftProposal> {
    let files = candidate_files(req);
    if files.is_empty() {
        tracing::debug!(number = req.number, "PR has no HIP files, skipping");
        return None;
    }
    let Some(commit) = req.head_ref_oid.as_deref() else {
        tracing::warn!(number = req.number, "PR has no head commit, skipping");
        return None;
    };

    let mut best: Option<DraftProposal> = None;
    for path in files {
        let Some(url) = raw_file_url(raw_base, commit, path) else {
            tracing::warn!(raw_base, path, "cannot build file URL");
            continue;
        };
        let content = match loader.fetch_text(&url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(%url, "failed to fetch file content: {:#}", e);
                continue;
            }
        };

        let meta = parse_front_matter(&content);
        let Some(title) = meta.title() else {
            tracing::debug!(path, "skipping file without a title");
            continue;
        };

        let better = best
            .as_ref()
            .map_or(true, |b| title.chars().count() > b.title.chars().count());
        if better {
            best = Some(DraftProposal::from_metadata(req, path, &meta));
        }
    }

    if best.is_none() {
        tracing::debug!(number = req.number, "no valid metadata in PR");
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::testing::MemoryFetcher;
    use std::sync::Arc;

    const RAW: &str = "https://raw.example.org/org/hips";

    fn request(number: u64, head: Option<&str>, paths: &[&str]) -> DraftRequest {
        let edges: Vec<String> = paths
            .iter()
            .map(|p| format!(r#"{{"node": {{"path": "{}"}}}}"#, p))
            .collect();
        let head = head
            .map(|h| format!(r#""{}""#, h))
            .unwrap_or_else(|| "null".to_string());
        serde_json::from_str(&format!(
            r#"{{"number": {}, "title": "PR {}", "author": {{"login": "x"}}, "url": "https://github.com/org/hips/pull/{}", "headRefOid": {}, "files": {{"edges": [{}]}}}}"#,
            number,
            number,
            number,
            head,
            edges.join(",")
        ))
        .unwrap()
    }

    #[test]
    fn test_table_lines() {
        assert_eq!(table_lines(&[]), vec!["No draft HIPs found"]);

        let proposal = DraftProposal {
            number: 12,
            url: "https://github.com/org/hips/pull/12".to_string(),
            title: "Fees".to_string(),
            authors: parse_authors("Alice <@alice>"),
            needs_council_approval: true,
            category: "Service".to_string(),
            kind: "standards track".to_string(),
            file_path: "HIP/hip-12.md".to_string(),
        };
        let lines = table_lines(&[proposal]);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("PR-12     Yes      Fees"));
        assert!(lines[1].contains("Alice"));
        assert!(lines[1].ends_with("standards track"));
    }

    #[test]
    fn test_candidate_files() {
        let req = request(
            1,
            Some("abc"),
            &["HIP/hip-1.md", "HIP/template/hip-x.md", "hip-2.md", "HIP/hip-3.txt"],
        );
        assert_eq!(candidate_files(&req), vec!["HIP/hip-1.md"]);
    }

    #[test]
    fn test_raw_file_url() {
        let url = raw_file_url("https://raw.example.org/org/hips/", "abc", "HIP/hip-1.md").unwrap();
        assert_eq!(url.as_str(), "https://raw.example.org/org/hips/abc/HIP/hip-1.md");
    }

    #[test]
    fn test_cache_busted_only_for_http() {
        let url = Url::parse("https://hips.example.org/_data/draft_hips.json").unwrap();
        let busted = cache_busted(&url);
        assert!(busted.query().unwrap().starts_with("t="));

        let file = Url::parse("file:///tmp/draft_hips.json").unwrap();
        assert_eq!(cache_busted(&file), file);
    }

    #[tokio::test]
    async fn test_longest_title_wins() {
        let fetcher = MemoryFetcher::default()
            .with(
                &format!("{}/abc/HIP/hip-1.md", RAW),
                "---\ntitle: Short\nauthor: Alice <@alice>\n---\n",
            )
            .with(
                &format!("{}/abc/HIP/hip-2.md", RAW),
                "---\ntitle: A much longer title\ntype: Standards Track\ncategory: Service\n---\n",
            )
            .with(&format!("{}/abc/HIP/hip-3.md", RAW), "no front matter");
        let loader = Loader::new(Arc::new(fetcher));

        let req = request(5, Some("abc"), &["HIP/hip-1.md", "HIP/hip-2.md", "HIP/hip-3.md"]);
        let proposal = enrich_request(&loader, RAW, &req).await.unwrap();
        assert_eq!(proposal.title, "A much longer title");
        assert_eq!(proposal.file_path, "HIP/hip-2.md");
        assert!(proposal.needs_council_approval);
        assert_eq!(proposal.kind, "standards track");
        assert_eq!(proposal.category, "Service");
        assert_eq!(proposal.author_names(), "Unknown");
    }

    #[tokio::test]
    async fn test_requests_without_valid_files_skipped() {
        let fetcher = MemoryFetcher::default().with(
            &format!("{}/def/HIP/hip-9.md", RAW),
            "---\ntitle: Nine\nauthor: Bob (bob@example.org), Carol\n---\n",
        );
        let loader = Loader::new(Arc::new(fetcher));

        let requests = vec![
            request(7, Some("abc"), &["README.md"]),
            request(8, None, &["HIP/hip-8.md"]),
            request(9, Some("def"), &["HIP/hip-9.md"]),
            request(9, Some("def"), &["HIP/hip-9.md"]),
        ];
        let proposals = enrich_drafts(&loader, RAW, &requests).await;
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].number, 9);
        assert_eq!(proposals[0].author_names(), "Bob, Carol");
        assert_eq!(proposals[0].kind, "core");
        assert!(!proposals[0].needs_council_approval);
    }
}
