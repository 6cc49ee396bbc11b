//! Filter to keep only movies matching the viewer's favourite genres.

use crate::candidate::Candidate;
use crate::context::{ViewerContext, genre_ranks};
use crate::traits::Filter;
use anyhow::Result;

/// Keeps candidates sharing at least one genre with the viewer's top N.
///
/// ## Algorithm
/// 1. Take the viewer's top N genres from the ViewerContext
/// 2. For each candidate, find its best-ranked matching genre
/// 3. Keep candidates with a match and record it as their affinity
pub struct GenrePreferenceFilter {
    top_n_genres: usize,
}

impl GenrePreferenceFilter {
    pub fn new(top_n_genres: usize) -> Self {
        Self { top_n_genres }
    }
}

impl Filter for GenrePreferenceFilter {
    fn name(&self) -> &str {
        "GenrePreferenceFilter"
    }

    fn apply(
        &self,
        candidates: Vec<Candidate>,
        context: &ViewerContext,
    ) -> Result<Vec<Candidate>> {
        let top_genres = context.top_genres(self.top_n_genres);
        let ranks = genre_ranks(&top_genres);

        let filtered: Vec<Candidate> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                let (rank, genre) = candidate
                    .genres
                    .iter()
                    .filter_map(|genre| ranks.get(genre.as_str()).map(|rank| (*rank, genre)))
                    .min_by_key(|(rank, _)| *rank)?;
                candidate.affinity = Some((rank, genre.clone()));
                Some(candidate)
            })
            .collect();
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ViewerContext {
        // Action x3, Drama x2, Comedy x1, Horror x1
        let mut context = ViewerContext::new(1);
        let history: [&[&str]; 4] = [
            &["Action", "Drama"],
            &["Action", "Comedy"],
            &["Action", "Drama"],
            &["Horror"],
        ];
        for (id, genres) in history.iter().enumerate() {
            let genres: Vec<String> = genres.iter().map(|g| g.to_string()).collect();
            context.record_watched(id as u32 + 100, &genres);
        }
        context
    }

    #[test]
    fn test_keeps_only_top_genres() {
        let candidates = vec![
            Candidate::test(1, &["Horror"], 4.0),
            Candidate::test(2, &["Comedy", "Romance"], 4.0),
            Candidate::test(3, &["Western"], 4.0),
            Candidate::test(4, &[], 4.0),
        ];

        let kept = GenrePreferenceFilter::new(3)
            .apply(candidates, &context())
            .unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].movie_id, 2);
    }

    #[test]
    fn test_affinity_uses_best_ranked_genre() {
        let candidates = vec![Candidate::test(1, &["Comedy", "Drama", "Action"], 4.0)];

        let kept = GenrePreferenceFilter::new(3)
            .apply(candidates, &context())
            .unwrap();
        assert_eq!(kept[0].affinity, Some((0, "Action".to_string())));
    }

    #[test]
    fn test_no_history_keeps_nothing() {
        let kept = GenrePreferenceFilter::new(3)
            .apply(vec![Candidate::test(1, &["Action"], 4.0)], &ViewerContext::new(1))
            .unwrap();
        assert!(kept.is_empty());
    }
}
