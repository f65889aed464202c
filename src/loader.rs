//! Feed loading.
//!
//! Fetches the published feed and the draft feed concurrently. Neither
//! failure is fatal: an unavailable feed becomes an empty collection and
//! is reported in the [`LoadReport`]. The draft feed gets one retry at a
//! fallback location before giving up.
//!
//! All locations are URLs resolved against the page the search box lives
//! on. `http`/`https` URLs are fetched over the network; `file` URLs are
//! read from disk, which lets a built site directory stand in for the
//! live site.
//!
//! # Location resolution
//!
//! | Feed | Location |
//! |------|----------|
//! | published | `published_url` joined onto the page URL |
//! | drafts (primary) | `<page path without trailing slash>/_data/draft_hips.json`, or `draft_url` |
//! | drafts (fallback) | `draft_fallback_path` joined onto the page URL |

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::error::SearchError;
use crate::models::{DraftRequest, PublishedRecord};

/// File name of the draft feed under the page's `_data/` directory.
pub const DRAFT_FEED_PATH: &str = "_data/draft_hips.json";

// ═══════════════════════════════════════════════════════════════════════
// Fetch seam
// ═══════════════════════════════════════════════════════════════════════

/// Retrieves the raw body at a location.
///
/// [`HttpFetcher`] is the production implementation; tests substitute an
/// in-memory one.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Fetches `http`/`https` with `reqwest` and reads `file` URLs from disk.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hip-search/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &Url) -> Result<String> {
        match url.scheme() {
            "http" | "https" => {
                let resp = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .with_context(|| format!("request to {} failed", url))?;
                let status = resp.status();
                if !status.is_success() {
                    bail!(
                        "HTTP {} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("")
                    );
                }
                Ok(resp.text().await?)
            }
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow!("not a local file URL: {}", url))?;
                tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))
            }
            other => bail!("unsupported URL scheme '{}'", other),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Source plan
// ═══════════════════════════════════════════════════════════════════════

/// Resolved locations of both feeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePlan {
    pub published: Url,
    pub draft_primary: Url,
    pub draft_fallback: Url,
}

impl SourcePlan {
    /// Resolve all feed locations against `page_url`.
    ///
    /// Fails when the page URL cannot act as a base. This is the one
    /// failure that prevents loading from starting.
    pub fn new(
        page_url: &str,
        published_url: &str,
        draft_url: Option<&str>,
        draft_fallback_path: &str,
    ) -> Result<Self, SearchError> {
        let page = Url::parse(page_url).map_err(|e| {
            SearchError::InitializationFailure(format!("invalid page URL '{}': {}", page_url, e))
        })?;
        if page.cannot_be_a_base() {
            return Err(SearchError::InitializationFailure(format!(
                "page URL '{}' cannot resolve relative locations",
                page_url
            )));
        }

        let published = resolve(published_url, &page)?;
        let draft_primary = match draft_url {
            Some(raw) => resolve(raw, &page)?,
            None => derive_draft_url(&page),
        };
        let draft_fallback = resolve(draft_fallback_path, &page)?;

        Ok(Self {
            published,
            draft_primary,
            draft_fallback,
        })
    }

    pub fn from_config(config: &SourcesConfig) -> Result<Self, SearchError> {
        Self::new(
            &config.page_url,
            &config.published_url,
            config.draft_url.as_deref(),
            &config.draft_fallback_path,
        )
    }
}

/// Parse `raw` as an absolute URL, or join it onto `base`.
pub fn resolve(raw: &str, base: &Url) -> Result<Url, SearchError> {
    Url::parse(raw).or_else(|_| base.join(raw)).map_err(|e| {
        SearchError::InitializationFailure(format!("cannot resolve '{}': {}", raw, e))
    })
}

/// `<page path minus one trailing slash>/_data/draft_hips.json` on the
/// page's origin.
pub fn derive_draft_url(page: &Url) -> Url {
    let path = page.path();
    let base = path.strip_suffix('/').unwrap_or(path);
    let mut url = page.clone();
    url.set_path(&format!("{}/{}", base, DRAFT_FEED_PATH));
    url.set_query(None);
    url.set_fragment(None);
    url
}

// ═══════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════

/// Outcome of loading one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded { location: String, count: usize },
    Unavailable { reason: String },
}

impl SourceStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SourceStatus::Loaded { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub published: SourceStatus,
    pub drafts: SourceStatus,
}

/// Raw records from both feeds, plus how each load went.
#[derive(Debug, Clone)]
pub struct LoadedSources {
    pub published: Vec<PublishedRecord>,
    pub drafts: Vec<DraftRequest>,
    pub report: LoadReport,
}

pub struct Loader {
    fetcher: Arc<dyn Fetch>,
}

impl Loader {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self { fetcher }
    }

    /// Loader backed by [`HttpFetcher`].
    pub fn http(timeout: Duration) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpFetcher::new(timeout)?)))
    }

    pub async fn fetch_text(&self, url: &Url) -> Result<String> {
        self.fetcher.fetch_text(url).await
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let body = self.fetch_text(url).await?;
        serde_json::from_str(&body).with_context(|| format!("invalid JSON from {}", url))
    }

    /// Fetch a JSON array and decode each element on its own. Elements
    /// that do not decode are passed to `skip` and dropped; only an
    /// unreadable body or a non-array fails the whole feed.
    pub async fn fetch_records<T: DeserializeOwned>(
        &self,
        url: &Url,
        skip: impl Fn(&Value, serde_json::Error),
    ) -> Result<Vec<T>> {
        let values: Vec<Value> = self.fetch_json(url).await?;
        Ok(values
            .into_iter()
            .filter_map(|value| match T::deserialize(&value) {
                Ok(record) => Some(record),
                Err(e) => {
                    skip(&value, e);
                    None
                }
            })
            .collect())
    }

    async fn fetch_published(&self, url: &Url) -> Result<Vec<PublishedRecord>> {
        self.fetch_records(url, |value, e| {
            let title = value.get("title").and_then(Value::as_str).unwrap_or("?");
            tracing::warn!(title, "skipping malformed published record: {}", e);
        })
        .await
    }

    async fn fetch_drafts(&self, url: &Url) -> Result<Vec<DraftRequest>> {
        self.fetch_records(url, |value, e| {
            let err = SearchError::MalformedDraftRecord {
                number: value.get("number").and_then(Value::as_u64).unwrap_or(0),
                reason: e.to_string(),
            };
            tracing::debug!("{}", err);
        })
        .await
    }

    /// Load both feeds concurrently. Always completes; failures show up as
    /// empty collections and [`SourceStatus::Unavailable`].
    pub async fn load_all(&self, plan: &SourcePlan) -> LoadedSources {
        let ((published, published_status), (drafts, drafts_status)) = tokio::join!(
            self.load_published(&plan.published),
            self.load_drafts(&plan.draft_primary, &plan.draft_fallback),
        );

        LoadedSources {
            published,
            drafts,
            report: LoadReport {
                published: published_status,
                drafts: drafts_status,
            },
        }
    }

    pub async fn load_published(&self, url: &Url) -> (Vec<PublishedRecord>, SourceStatus) {
        match self.fetch_published(url).await {
            Ok(records) => {
                tracing::info!(count = records.len(), %url, "loaded published HIPs");
                let status = SourceStatus::Loaded {
                    location: url.to_string(),
                    count: records.len(),
                };
                (records, status)
            }
            Err(e) => {
                let err = unavailable("published", url, &e);
                tracing::error!("{}", err);
                (Vec::new(), SourceStatus::Unavailable { reason: err.to_string() })
            }
        }
    }

    /// Load the draft feed from `primary`, retrying once at `fallback`.
    pub async fn load_drafts(
        &self,
        primary: &Url,
        fallback: &Url,
    ) -> (Vec<DraftRequest>, SourceStatus) {
        tracing::debug!(%primary, "loading draft HIPs");
        let primary_err = match self.fetch_drafts(primary).await {
            Ok(requests) => {
                tracing::info!(count = requests.len(), %primary, "loaded draft requests");
                let status = SourceStatus::Loaded {
                    location: primary.to_string(),
                    count: requests.len(),
                };
                return (requests, status);
            }
            Err(e) => unavailable("drafts", primary, &e),
        };
        tracing::warn!("{}", primary_err);

        tracing::info!(%fallback, "trying alternative draft location");
        match self.fetch_drafts(fallback).await {
            Ok(requests) => {
                tracing::info!(
                    count = requests.len(),
                    %fallback,
                    "loaded draft requests from alternative location"
                );
                let status = SourceStatus::Loaded {
                    location: fallback.to_string(),
                    count: requests.len(),
                };
                (requests, status)
            }
            Err(e) => {
                let err = unavailable("drafts", fallback, &e);
                tracing::error!("{}", err);
                (
                    Vec::new(),
                    SourceStatus::Unavailable {
                        reason: format!("{}; {}", primary_err, err),
                    },
                )
            }
        }
    }
}

fn unavailable(source_name: &'static str, url: &Url, err: &anyhow::Error) -> SearchError {
    SearchError::SourceUnavailable {
        source_name,
        location: url.to_string(),
        reason: format!("{:#}", err),
    }
}
