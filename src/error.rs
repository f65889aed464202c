//! Failure taxonomy for loading, normalizing, and querying.
//!
//! None of these are fatal to a session: loaders degrade to empty
//! collections, bad draft records are skipped, and queries against an
//! unbuilt index return nothing. They exist so that every degradation is
//! logged with a stable, matchable message.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// A feed could not be fetched or decoded.
    #[error("source unavailable: {source_name} ({location}): {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        location: String,
        reason: String,
    },

    /// A draft request carried no usable proposal file.
    #[error("draft request #{number} skipped: {reason}")]
    MalformedDraftRecord { number: u64, reason: String },

    /// The load sequence could not be started at all.
    #[error("search initialization failed: {0}")]
    InitializationFailure(String),

    /// A query arrived before the index was built.
    #[error("query {query:?} ignored: search index is not initialized")]
    QueryOnUninitializedIndex { query: String },
}
