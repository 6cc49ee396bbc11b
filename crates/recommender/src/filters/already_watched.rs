//! Drops movies the viewer marked watched.
//!
//! Only the `watched` flag counts. A movie that is merely rated, bookmarked
//! or favourited stays eligible.

use crate::candidate::Candidate;
use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::Result;
use tracing::trace;

pub struct AlreadyWatchedFilter;

impl Filter for AlreadyWatchedFilter {
    fn name(&self) -> &str {
        "AlreadyWatchedFilter"
    }

    fn apply(
        &self,
        mut candidates: Vec<Candidate>,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        let before = candidates.len();
        candidates.retain(|c| !context.watched_movies.contains(&c.movie_id));
        trace!(
            user_id = context.user_id,
            removed = before - candidates.len(),
            "Watched movies dropped"
        );
        Ok(candidates)
    }
}
