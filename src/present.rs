//! Presentation boundary.
//!
//! The query engine hands ranked results to a [`Presenter`]; nothing in
//! the engine knows how results are drawn. [`ResultView`] holds the
//! display rules every presenter shares.

use reqwest::Url;
use serde::Serialize;
use std::io::Write;

use crate::models::{ItemStatus, ScoredItem};

/// Receives rendered search output.
pub trait Presenter {
    /// Remove any previously shown results.
    fn clear(&mut self);
    /// Show the configured no-results text.
    fn show_no_results(&mut self, text: &str);
    /// Append one result.
    fn show_result(&mut self, view: &ResultView);
}

/// Display-ready form of a ranked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub display_type: &'static str,
    pub display_title: String,
    pub icon: &'static str,
    /// The item URL when it is `http`/`https`, `#` otherwise.
    pub href: String,
}

impl ResultView {
    pub fn from_result(result: &ScoredItem) -> Self {
        let item = &result.item;
        let display_type = match item.status {
            ItemStatus::Draft => "Draft HIP",
            ItemStatus::Published => "HIP",
        };
        let display_title = match (item.status, &item.extracted_doc_number) {
            (ItemStatus::Draft, None) => format!("Draft HIP: {}", item.title),
            _ => format!("HIP-{}: {}", item.doc_number, item.title),
        };
        let icon = if item.url.contains("github.com") {
            "📝"
        } else {
            "📄"
        };

        Self {
            display_type,
            display_title,
            icon,
            href: sanitize_url(&item.url),
        }
    }
}

/// Only absolute `http`/`https` URLs pass; anything else becomes `#`.
pub fn sanitize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed.to_string(),
        Ok(_) => "#".to_string(),
        Err(_) => {
            tracing::warn!(url, "invalid URL provided");
            "#".to_string()
        }
    }
}

/// Clear `presenter`, then show `results` or the no-results text.
pub fn render(presenter: &mut dyn Presenter, results: &[ScoredItem], no_results_text: &str) {
    presenter.clear();
    if results.is_empty() {
        presenter.show_no_results(no_results_text);
        return;
    }
    for result in results {
        presenter.show_result(&ResultView::from_result(result));
    }
}

/// Writes one line per result to any [`Write`] sink.
pub struct TerminalPresenter<W: Write> {
    out: W,
    show_links: bool,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_links: true,
        }
    }

    pub fn without_links(mut self) -> Self {
        self.show_links = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            tracing::warn!("failed to write result: {}", e);
        }
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn clear(&mut self) {}

    fn show_no_results(&mut self, text: &str) {
        self.write_line(text);
    }

    fn show_result(&mut self, view: &ResultView) {
        let line = if self.show_links {
            format!(
                "{} {}: {}\n    {}",
                view.icon, view.display_type, view.display_title, view.href
            )
        } else {
            format!("{} {}: {}", view.icon, view.display_type, view.display_title)
        };
        self.write_line(&line);
    }
}
