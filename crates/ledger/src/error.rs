//! Engine error taxonomy.
//!
//! Each failure the engine names has its own variant. `kind()` folds them
//! into the six categories callers branch on.

use serde::Serialize;
use std::fmt;
use store::{AggregationError, MovieId, ReviewId, StoreError, UserId};
use thiserror::Error;

/// Coarse error category, one per caller-visible outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Malformed or missing input
    Validation,
    /// A referenced movie, review or user does not exist
    NotFound,
    /// The action collides with current state
    Conflict,
    /// Ownership violation
    Forbidden,
    /// The catalog lookup failed
    Upstream,
    /// Aggregation or storage failure
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("User {user_id} has already reviewed movie {movie_id}")]
    DuplicateReview { user_id: UserId, movie_id: MovieId },

    #[error("Movie {0} not found")]
    MovieNotFound(MovieId),

    #[error("Review {0} not found")]
    ReviewNotFound(ReviewId),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("User {user_id} does not own review {review_id}")]
    Forbidden { review_id: ReviewId, user_id: UserId },

    #[error("Users cannot react to their own review")]
    SelfInteraction,

    #[error("Comment text is empty")]
    EmptyComment,

    #[error("Comment is {len} characters, the limit is {max}")]
    CommentTooLong { len: usize, max: usize },

    #[error("Users cannot follow themselves")]
    SelfFollow,

    #[error("User {follower} already follows user {target}")]
    AlreadyFollowing { follower: UserId, target: UserId },

    #[error("User {follower} does not follow user {target}")]
    NotFollowing { follower: UserId, target: UserId },

    #[error("Catalog lookup failed: {0}")]
    Upstream(String),

    #[error("Stats aggregation failed for movie {movie_id}: {source}")]
    Aggregation {
        movie_id: MovieId,
        #[source]
        source: AggregationError,
    },

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) | EngineError::EmptyComment | EngineError::CommentTooLong { .. } => {
                ErrorKind::Validation
            }
            EngineError::MovieNotFound(_)
            | EngineError::ReviewNotFound(_)
            | EngineError::UserNotFound(_) => ErrorKind::NotFound,
            EngineError::DuplicateReview { .. }
            | EngineError::SelfInteraction
            | EngineError::SelfFollow
            | EngineError::AlreadyFollowing { .. }
            | EngineError::NotFollowing { .. } => ErrorKind::Conflict,
            EngineError::Forbidden { .. } => ErrorKind::Forbidden,
            EngineError::Upstream(_) => ErrorKind::Upstream,
            EngineError::Aggregation { .. } | EngineError::Storage(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation(message.into())
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateReview { user_id, movie_id } => {
                EngineError::DuplicateReview { user_id, movie_id }
            }
            other => EngineError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
