//! Error types for the store crate.
//!
//! Two families live here:
//! - `StoreError` for everything the document store can fail at
//! - `AggregationError` for a movie whose interactions cannot be folded into stats

use crate::types::{MovieId, UserId};
use thiserror::Error;

/// Errors raised while reading or writing documents
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error occurred while reading or writing a snapshot file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot contents were not valid JSON for the expected shape
    #[error("Snapshot format error: {0}")]
    FormatError(#[from] serde_json::Error),

    /// A second review document for the same (user, movie) pair
    #[error("Review for user {user_id} on movie {movie_id} already exists")]
    DuplicateReview { user_id: UserId, movie_id: MovieId },

    /// The backing store refused or lost the write
    #[error("Write rejected for {collection} document {id}: {reason}")]
    WriteRejected {
        collection: &'static str,
        id: String,
        reason: String,
    },

    /// A persisted movie whose interactions no longer aggregate
    #[error("Corrupt movie document {movie_id}: {source}")]
    Corrupt {
        movie_id: MovieId,
        #[source]
        source: AggregationError,
    },
}

/// Errors raised by the stats aggregator.
///
/// Any of these aborts the write that triggered the recomputation, so
/// stats are never persisted out of step with interactions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// An interaction carries a rating the 0-5 scale cannot hold
    #[error("Rating {rating} from user {user_id} is outside 0-5")]
    RatingOutOfRange { user_id: UserId, rating: u8 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
