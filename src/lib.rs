//! # HIP Search
//!
//! Search and enrichment for a site publishing improvement proposals
//! (HIPs). Published proposals come from the site's search feed; draft
//! proposals come from a feed of open pull requests. Both are merged
//! into one in-memory index and ranked with weighted field matching.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Published  │──▶│  Normalize  │──▶│  Index   │
//! │  + Drafts   │   │  + Dedup    │   │ (memory) │
//! └─────────────┘   └─────────────┘   └────┬─────┘
//!                                          │
//!                      ┌───────────────────┤
//!                      ▼                   ▼
//!                 ┌──────────┐       ┌──────────┐
//!                 │   CLI    │       │   HTTP   │
//!                 │  (hips)  │       │ /search  │
//!                 └──────────┘       └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! hips search "fee schedule"    # rank published + draft HIPs
//! hips drafts                   # open drafts with their front matter
//! hips sources                  # check both feeds
//! hips validate HIP/hip-0.md    # check a draft's header
//! hips serve                    # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Feed records and indexed items |
//! | [`error`] | Error taxonomy |
//! | [`loader`] | Concurrent feed loading with draft fallback |
//! | [`normalize`] | Draft pull requests to indexable items |
//! | [`index`] | Merged in-memory index |
//! | [`search`] | Weighted scoring and basic fallback search |
//! | [`session`] | Search lifecycle: init, query, teardown |
//! | [`present`] | Result display rules and presenters |
//! | [`metadata`] | Front matter and author parsing |
//! | [`enrich`] | Draft enrichment from proposal files |
//! | [`status`] | Lifecycle status descriptions |
//! | [`validate`] | Remote header validation |
//! | [`sources`] | Feed health listing |
//! | [`server`] | HTTP search server |
//! | [`logging`] | Tracing setup |

pub mod config;
pub mod enrich;
pub mod error;
pub mod index;
pub mod loader;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod normalize;
pub mod present;
pub mod search;
pub mod server;
pub mod session;
pub mod sources;
pub mod status;
pub mod validate;
