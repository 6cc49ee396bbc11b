//! Stats aggregation for movie documents.
//!
//! A movie's stats are a pure function of its interaction records:
//! - `average_rating`: mean of the non-zero ratings, 0 when there are none
//! - `total_ratings`: how many records carry a rating
//! - `total_reviews`: records with non-blank inline review text
//! - `total_watched` / `total_watchlist` / `total_favorites`: raw flag counts
//!
//! There is no incremental path. Every write recomputes from the full map,
//! so stats cannot drift from the records they describe.

use crate::error::{AggregationError, StoreError};
use crate::types::{InteractionRecord, Movie, MovieStats, UserId};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Highest rating an interaction record can hold
pub const MAX_RATING: u8 = 5;

/// Recompute a movie's stats from its interaction records
pub fn aggregate(
    interactions: &BTreeMap<UserId, InteractionRecord>,
) -> Result<MovieStats, AggregationError> {
    let mut stats = MovieStats::default();
    let mut rating_sum: u64 = 0;

    for (&user_id, record) in interactions {
        if record.rating > MAX_RATING {
            return Err(AggregationError::RatingOutOfRange {
                user_id,
                rating: record.rating,
            });
        }
        if record.is_rated() {
            stats.total_ratings += 1;
            rating_sum += u64::from(record.rating);
        }
        if record.has_review() {
            stats.total_reviews += 1;
        }
        if record.watched {
            stats.total_watched += 1;
        }
        if record.watchlist {
            stats.total_watchlist += 1;
        }
        if record.favorite {
            stats.total_favorites += 1;
        }
    }

    stats.average_rating = if stats.total_ratings > 0 {
        rating_sum as f32 / stats.total_ratings as f32
    } else {
        0.0
    };

    Ok(stats)
}

/// Recompute stats for a batch of movies in parallel.
///
/// Used when loading persisted documents: every movie is brought back in
/// line with its interactions, and the first movie that cannot be
/// aggregated fails the whole batch.
pub fn recompute_all(movies: &mut [Movie]) -> Result<(), StoreError> {
    movies.par_iter_mut().try_for_each(|movie| {
        let movie_id = movie.id();
        movie
            .recompute_stats()
            .map(|_| ())
            .map_err(|source| StoreError::Corrupt { movie_id, source })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CatalogMovie, InteractionUpdate};
    use chrono::Utc;

    fn record(rating: u8, review: &str) -> InteractionRecord {
        let mut record = InteractionRecord::new(Utc::now());
        record.rating = rating;
        record.review = review.to_string();
        record
    }

    #[test]
    fn test_empty_interactions() {
        let stats = aggregate(&BTreeMap::new()).unwrap();
        assert_eq!(stats, MovieStats::default());
        assert_eq!(stats.average_rating, 0.0);
    }

    #[test]
    fn test_average_ignores_unset_ratings() {
        let mut interactions = BTreeMap::new();
        interactions.insert(1, record(5, ""));
        interactions.insert(2, record(0, ""));
        interactions.insert(3, record(2, ""));

        let stats = aggregate(&interactions).unwrap();
        assert_eq!(stats.total_ratings, 2);
        assert!((stats.average_rating - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_blank_reviews_are_not_counted() {
        let mut interactions = BTreeMap::new();
        interactions.insert(1, record(4, "A tense, well-paced thriller"));
        interactions.insert(2, record(3, "   "));
        interactions.insert(3, record(0, ""));

        let stats = aggregate(&interactions).unwrap();
        assert_eq!(stats.total_reviews, 1);
    }

    #[test]
    fn test_flag_counts_are_independent() {
        let mut both = InteractionRecord::new(Utc::now());
        both.watched = true;
        both.watchlist = true;
        let mut favorite = InteractionRecord::new(Utc::now());
        favorite.favorite = true;
        favorite.watched = true;

        let mut interactions = BTreeMap::new();
        interactions.insert(1, both);
        interactions.insert(2, favorite);

        let stats = aggregate(&interactions).unwrap();
        assert_eq!(stats.total_watched, 2);
        assert_eq!(stats.total_watchlist, 1);
        assert_eq!(stats.total_favorites, 1);
    }

    #[test]
    fn test_out_of_range_rating_fails() {
        let mut interactions = BTreeMap::new();
        interactions.insert(7, record(9, ""));

        let err = aggregate(&interactions).unwrap_err();
        assert_eq!(
            err,
            AggregationError::RatingOutOfRange {
                user_id: 7,
                rating: 9
            }
        );
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(10, "Heat"), now);
        movie
            .apply_interaction(1, &InteractionUpdate::new().with_rating(4), now)
            .unwrap();
        movie
            .apply_interaction(2, &InteractionUpdate::new().with_rating(5), now)
            .unwrap();

        let first = *movie.stats();
        let second = *movie.recompute_stats().unwrap();
        assert_eq!(first, second);
        assert!((second.average_rating - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejected_write_leaves_movie_untouched() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(10, "Heat"), now);
        movie
            .apply_interaction(1, &InteractionUpdate::new().with_rating(4), now)
            .unwrap();
        let before = movie.clone();

        let result = movie.apply_interaction(2, &InteractionUpdate::new().with_rating(6), now);

        assert!(result.is_err());
        assert_eq!(movie.interactions(), before.interactions());
        assert_eq!(movie.stats(), before.stats());
    }

    #[test]
    fn test_recompute_all_reports_corrupt_movie() {
        let now = Utc::now();
        let good = Movie::new(CatalogMovie::new(1, "Good"), now);
        let corrupt: Movie = serde_json::from_value(serde_json::json!({
            "catalog": { "id": 2, "title": "Corrupt" },
            "interactions": { "5": { "rating": 8, "created_at": now } },
            "created_at": now,
            "updated_at": now
        }))
        .unwrap();

        let mut movies = vec![good, corrupt];
        let err = recompute_all(&mut movies).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { movie_id: 2, .. }));
    }
}
