//! Filter to enforce a minimum aggregated user rating.

use crate::candidate::Candidate;
use crate::context::ViewerContext;
use crate::traits::Filter;
use anyhow::{Result, ensure};

/// Keeps candidates whose `stats.average_rating` is at least the threshold.
///
/// The comparison is inclusive. A threshold above the 0-5 rating scale keeps
/// nothing; that is a configuration choice, not an error.
pub struct MinimumRatingFilter {
    min_average: f32,
}

impl MinimumRatingFilter {
    pub fn new(min_average: f32) -> Self {
        Self { min_average }
    }

    pub fn min_average(&self) -> f32 {
        self.min_average
    }
}

impl Filter for MinimumRatingFilter {
    fn name(&self) -> &str {
        "MinimumRatingFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        _context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        ensure!(
            !self.min_average.is_nan(),
            "minimum average rating is not a number"
        );

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| candidate.average_rating >= self.min_average)
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates() -> Vec<Candidate> {
        vec![
            Candidate::test(1, &["Action"], 4.5),
            Candidate::test(2, &["Drama"], 2.0),
            Candidate::test(3, &["Action"], 3.5),
            Candidate::test(4, &["Action"], 0.0),
        ]
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let filter = MinimumRatingFilter::new(3.5);
        let kept: Vec<u32> = filter
            .apply(candidates(), &ViewerContext::new(1))
            .unwrap()
            .iter()
            .map(|c| c.movie_id)
            .collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn test_threshold_above_scale_keeps_nothing() {
        let filter = MinimumRatingFilter::new(6.0);
        let kept = filter.apply(candidates(), &ViewerContext::new(1)).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn test_nan_threshold_is_rejected() {
        let filter = MinimumRatingFilter::new(f32::NAN);
        assert!(filter.apply(candidates(), &ViewerContext::new(1)).is_err());
    }
}
