//! Deterministic ordering of candidates.
//!
//! Sort key, in order:
//! 1. aggregated average rating, descending
//! 2. catalog popularity, descending
//! 3. genre affinity rank, ascending (no affinity sorts last)
//! 4. movie id, ascending
//!
//! The last key makes the order total, so pagination is stable across calls.

use crate::candidate::Candidate;
use rayon::prelude::*;
use std::cmp::Ordering;

pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.average_rating
        .total_cmp(&a.average_rating)
        .then_with(|| b.popularity.total_cmp(&a.popularity))
        .then_with(|| {
            let a_rank = a.affinity_rank().unwrap_or(usize::MAX);
            let b_rank = b.affinity_rank().unwrap_or(usize::MAX);
            a_rank.cmp(&b_rank)
        })
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Sort candidates best first
pub fn rank(candidates: &mut [Candidate]) {
    candidates.par_sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(candidates: &[Candidate]) -> Vec<u32> {
        candidates.iter().map(|c| c.movie_id).collect()
    }

    #[test]
    fn test_rating_then_popularity() {
        let mut low = Candidate::test(1, &[], 3.0);
        low.popularity = 900.0;
        let mut popular = Candidate::test(2, &[], 4.0);
        popular.popularity = 50.0;
        let mut obscure = Candidate::test(3, &[], 4.0);
        obscure.popularity = 5.0;

        let mut candidates = vec![low, obscure, popular];
        rank(&mut candidates);
        assert_eq!(ids(&candidates), vec![2, 3, 1]);
    }

    #[test]
    fn test_affinity_breaks_remaining_ties() {
        let mut drama = Candidate::test(1, &["Drama"], 4.0);
        drama.affinity = Some((1, "Drama".into()));
        let mut action = Candidate::test(2, &["Action"], 4.0);
        action.affinity = Some((0, "Action".into()));
        let plain = Candidate::test(3, &["Action"], 4.0);

        let mut candidates = vec![plain, drama, action];
        rank(&mut candidates);
        assert_eq!(ids(&candidates), vec![2, 1, 3]);
    }

    #[test]
    fn test_id_makes_order_total() {
        let mut candidates: Vec<Candidate> =
            [9, 4, 7, 1].iter().map(|id| Candidate::test(*id, &[], 2.5)).collect();
        rank(&mut candidates);
        assert_eq!(ids(&candidates), vec![1, 4, 7, 9]);
    }
}
