//! Proposal front matter.
//!
//! Proposal files start with a YAML-ish header:
//!
//! ```text
//! ---
//! hip: 1001
//! title: Fee schedule updates
//! author: Alice <@alice>, Bob (bob@example.org)
//! type: Standards Track
//! needs-council-approval: Yes
//! ---
//! ```
//!
//! Only flat `key: value` lines are understood. Keys are lower-cased;
//! values keep everything after the first colon.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static FRONT_MATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^---[ \t]*\r?\n([\s\S]*?)\r?\n---").expect("static regex"));

static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^<(]+)(?:[<(]([^>)]+)[>)])?").expect("static regex"));

/// Parsed front-matter entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.get("title").map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the proposal has to go through a council vote.
    pub fn needs_council_approval(&self) -> bool {
        let flagged = [
            "needs-council-approval",
            "needs-tsc-approval",
            "needs_council_approval",
        ]
        .iter()
        .any(|key| {
            self.get(key)
                .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        });

        flagged
            || self
                .get("type")
                .is_some_and(|t| t.eq_ignore_ascii_case("standards track"))
    }
}

/// Extract the front-matter block at the start of `content`.
///
/// Returns empty metadata when the file has no header.
pub fn parse_front_matter(content: &str) -> Metadata {
    let Some(block) = FRONT_MATTER_RE.captures(content).and_then(|c| c.get(1)) else {
        tracing::debug!("no front matter found");
        return Metadata::default();
    };

    let mut entries = BTreeMap::new();
    for line in block.as_str().lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if !key.is_empty() && !value.is_empty() {
            entries.insert(key, value.to_string());
        }
    }

    Metadata { entries }
}

/// How to reach an author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Contact {
    GitHub(String),
    Email(String),
}

impl Contact {
    pub fn href(&self) -> String {
        match self {
            Contact::GitHub(user) => format!("https://github.com/{}", user),
            Contact::Email(addr) => format!("mailto:{}", addr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub contact: Option<Contact>,
}

/// Split an `author` header into names with optional contact details.
///
/// Entries are comma separated. Contact info in `<…>` or `(…)` starting
/// with `@` is a GitHub handle; anything else containing `@` is an e-mail
/// address.
pub fn parse_authors(raw: &str) -> Vec<Author> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match AUTHOR_RE.captures(entry) {
            Some(caps) => {
                let name = caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                let contact = caps
                    .get(2)
                    .map(|m| m.as_str().trim())
                    .and_then(classify_contact);
                Author { name, contact }
            }
            None => Author {
                name: entry.to_string(),
                contact: None,
            },
        })
        .collect()
}

fn classify_contact(info: &str) -> Option<Contact> {
    if let Some(user) = info.strip_prefix('@') {
        Some(Contact::GitHub(user.to_string()))
    } else if info.contains('@') {
        Some(Contact::Email(info.to_string()))
    } else {
        None
    }
}
