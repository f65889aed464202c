//! Search session.
//!
//! A [`HipSearch`] is the per-page instance: constructed without I/O,
//! initialized once (load → normalize → index), queried synchronously,
//! and torn down explicitly.
//!
//! # Lifecycle
//!
//! ```text
//! new() ──▶ Uninitialized ──init()──▶ Enhanced
//!                  │                     │
//!                  │   (start failed)    │
//!                  └──────────────▶ Basic / Disabled
//!                                        │
//!                        teardown() ◀────┘
//! ```
//!
//! Concurrent `init()` calls share one load sequence. Queries issued
//! before it finishes are ignored with a warning; no partially built
//! index is ever visible.

use reqwest::Url;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::loader::{Fetch, HttpFetcher, LoadReport, Loader, SourcePlan, SourceStatus};
use crate::models::ScoredItem;
use crate::present::{render, Presenter};
use crate::search::{search, BasicSearch};

/// Options a host passes when creating a session.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub published_url: String,
    pub draft_url: Option<String>,
    pub draft_fallback_path: String,
    /// Location of the page hosting the search box.
    pub page_url: String,
    pub no_results_text: String,
    pub limit: usize,
    /// Register the basic published-only search as the fallback when
    /// initialization fails.
    pub fallback_to_basic: bool,
    pub timeout: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&Config::minimal())
    }
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            published_url: config.sources.published_url.clone(),
            draft_url: config.sources.draft_url.clone(),
            draft_fallback_path: config.sources.draft_fallback_path.clone(),
            page_url: config.sources.page_url.clone(),
            no_results_text: config.search.no_results_text.clone(),
            limit: config.search.limit.max(1),
            fallback_to_basic: config.search.fallback_to_basic,
            timeout: Duration::from_secs(config.sources.timeout_secs),
        }
    }
}

/// Which engine is answering queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Uninitialized,
    Enhanced,
    Basic,
    Disabled,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Uninitialized => "uninitialized",
            SearchMode::Enhanced => "enhanced",
            SearchMode::Basic => "basic",
            SearchMode::Disabled => "disabled",
        }
    }
}

enum Engine {
    Enhanced(SearchIndex),
    Basic(BasicSearch),
    Disabled,
}

struct Ready {
    engine: Engine,
    report: Option<LoadReport>,
}

impl Ready {
    fn mode(&self) -> SearchMode {
        match self.engine {
            Engine::Enhanced(_) => SearchMode::Enhanced,
            Engine::Basic(_) => SearchMode::Basic,
            Engine::Disabled => SearchMode::Disabled,
        }
    }
}

pub struct HipSearch {
    options: SearchOptions,
    fetcher: Option<Arc<dyn Fetch>>,
    state: OnceCell<Ready>,
}

impl HipSearch {
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            fetcher: None,
            state: OnceCell::new(),
        }
    }

    /// Use `fetcher` instead of building an HTTP client at init time.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Load both feeds and build the index. Runs at most once per session;
    /// later and concurrent calls wait for the first and return its mode.
    pub async fn init(&self) -> SearchMode {
        self.state.get_or_init(|| self.initialize()).await.mode()
    }

    /// Drop the index. The session can be initialized again afterwards.
    pub fn teardown(&mut self) {
        if self.state.take().is_some() {
            tracing::info!("search session torn down");
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.state
            .get()
            .map(Ready::mode)
            .unwrap_or(SearchMode::Uninitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized()
    }

    /// How each feed loaded, once initialization has finished.
    pub fn report(&self) -> Option<&LoadReport> {
        self.state.get().and_then(|r| r.report.as_ref())
    }

    /// The enhanced index, when that engine is active.
    pub fn index(&self) -> Option<&SearchIndex> {
        match self.state.get().map(|r| &r.engine) {
            Some(Engine::Enhanced(index)) => Some(index),
            _ => None,
        }
    }

    /// Number of searchable entries in the active engine.
    pub fn len(&self) -> usize {
        match self.state.get().map(|r| &r.engine) {
            Some(Engine::Enhanced(index)) => index.len(),
            Some(Engine::Basic(basic)) => basic.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rank `query` with the configured limit.
    pub fn search(&self, query: &str) -> Vec<ScoredItem> {
        self.search_limited(query, self.options.limit)
    }

    pub fn search_limited(&self, query: &str, limit: usize) -> Vec<ScoredItem> {
        let Some(ready) = self.state.get() else {
            if !query.is_empty() {
                tracing::warn!(
                    "{}",
                    SearchError::QueryOnUninitializedIndex {
                        query: query.to_string()
                    }
                );
            }
            return Vec::new();
        };

        match &ready.engine {
            Engine::Enhanced(index) => search(index, query, limit),
            Engine::Basic(basic) => basic.search(query, limit),
            Engine::Disabled => Vec::new(),
        }
    }

    /// React to a new value in the search box.
    ///
    /// Always clears the presenter. An empty query stops there; otherwise
    /// the results, or the no-results text, are rendered. Input arriving
    /// before initialization only clears.
    pub fn handle_input(&self, query: &str, presenter: &mut dyn Presenter) {
        presenter.clear();
        if query.is_empty() {
            return;
        }
        if !self.is_initialized() {
            tracing::warn!(
                "{}",
                SearchError::QueryOnUninitializedIndex {
                    query: query.to_string()
                }
            );
            return;
        }
        let results = self.search(query);
        render(presenter, &results, &self.options.no_results_text);
    }

    async fn initialize(&self) -> Ready {
        tracing::info!("initializing HIP search");
        match self.load_enhanced().await {
            Ok((index, report)) => {
                tracing::info!(
                    total = index.len(),
                    published = index.published_count(),
                    drafts = index.draft_count(),
                    "enhanced search initialized"
                );
                Ready {
                    engine: Engine::Enhanced(index),
                    report: Some(report),
                }
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.fall_back().await
            }
        }
    }

    async fn load_enhanced(&self) -> Result<(SearchIndex, LoadReport), SearchError> {
        let plan = SourcePlan::new(
            &self.options.page_url,
            &self.options.published_url,
            self.options.draft_url.as_deref(),
            &self.options.draft_fallback_path,
        )?;
        let loader = self.loader()?;
        let loaded = loader.load_all(&plan).await;
        let index = SearchIndex::from_sources(&loaded.published, &loaded.drafts);
        Ok((index, loaded.report))
    }

    async fn fall_back(&self) -> Ready {
        let disabled = Ready {
            engine: Engine::Disabled,
            report: None,
        };

        if !self.options.fallback_to_basic {
            tracing::warn!("no fallback registered, search disabled");
            return disabled;
        }

        tracing::info!("falling back to basic search");
        let url = match self.basic_url() {
            Some(url) => url,
            None => {
                tracing::error!(
                    url = %self.options.published_url,
                    "published feed location unusable, search disabled"
                );
                return disabled;
            }
        };
        let loader = match self.loader() {
            Ok(loader) => loader,
            Err(e) => {
                tracing::error!("{}", e);
                return disabled;
            }
        };

        let (records, status) = loader.load_published(&url).await;
        Ready {
            engine: Engine::Basic(BasicSearch::new(records)),
            report: Some(LoadReport {
                published: status,
                drafts: SourceStatus::Unavailable {
                    reason: "not loaded in basic search mode".to_string(),
                },
            }),
        }
    }

    /// The published feed as an absolute URL, or resolved against the
    /// page when that still works.
    fn basic_url(&self) -> Option<Url> {
        Url::parse(&self.options.published_url)
            .ok()
            .or_else(|| {
                Url::parse(&self.options.page_url)
                    .and_then(|page| page.join(&self.options.published_url))
                    .ok()
            })
    }

    fn loader(&self) -> Result<Loader, SearchError> {
        match &self.fetcher {
            Some(fetcher) => Ok(Loader::new(fetcher.clone())),
            None => HttpFetcher::new(self.options.timeout)
                .map(|f| Loader::new(Arc::new(f)))
                .map_err(|e| SearchError::InitializationFailure(format!("{:#}", e))),
        }
    }
}

impl Default for HipSearch {
    fn default() -> Self {
        Self::new(SearchOptions::default())
    }
}
