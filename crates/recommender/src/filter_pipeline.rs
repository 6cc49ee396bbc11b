//! The FilterPipeline runs a chain of filters.
//!
//! Filters are added with the builder pattern and applied in insertion
//! order.

use crate::candidate::Candidate;
use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::{Context, Result};

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyWatchedFilter)
///     .add_filter(MinimumRatingFilter::new(6.0))
///     .add_filter(GenrePreferenceFilter::new(3));
///
/// let kept = pipeline.apply(candidates, &context)?;
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern)
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the candidates.
    ///
    /// Logs each filter's input and output count at debug level. The first
    /// failing filter aborts the run.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        let mut current = candidates;
        for filter in &self.filters {
            tracing::debug!(
                "Applying filter: {} (input count: {})",
                filter.name(),
                current.len()
            );
            current = filter
                .apply(current, context)
                .with_context(|| format!("filter {} failed", filter.name()))?;
            tracing::debug!(
                "Filter applied: {} (output count: {})",
                filter.name(),
                current.len()
            );
        }
        Ok(current)
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::AlreadyWatchedFilter;
    use chrono::Utc;
    use store::{CatalogMovie, Movie};

    fn candidate(id: u32) -> Candidate {
        Candidate::from_movie(&Movie::new(
            CatalogMovie::new(id, format!("Movie {id}")),
            Utc::now(),
        ))
    }

    struct Failing;

    impl Filter for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn apply(&self, _: Vec<Candidate>, _: &ViewerContext) -> Result<Vec<Candidate>> {
            anyhow::bail!("boom")
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        assert!(pipeline.is_empty());

        let filtered = pipeline
            .apply(vec![candidate(1), candidate(2)], &ViewerContext::new(1))
            .unwrap();
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_single_filter() {
        let mut context = ViewerContext::new(1);
        context.watched_movies.insert(1);

        let pipeline = FilterPipeline::new().add_filter(AlreadyWatchedFilter);

        let filtered = pipeline
            .apply(vec![candidate(1), candidate(2)], &context)
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].movie_id, 2);
    }

    #[test]
    fn test_failing_filter_names_itself() {
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyWatchedFilter)
            .add_filter(Failing);
        assert_eq!(pipeline.len(), 2);

        let err = pipeline
            .apply(vec![candidate(1)], &ViewerContext::new(1))
            .unwrap_err();
        assert!(err.to_string().contains("Failing"));
    }
}
