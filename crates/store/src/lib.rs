//! # Store Crate
//!
//! Documents, the stats aggregator, and the document-store seam for the
//! ReelDeal engine.
//!
//! ## Main Components
//!
//! - **types**: Core documents (Movie, InteractionRecord, Review, User)
//! - **stats**: Recompute a movie's stats from its interaction records
//! - **store**: The `DocumentStore` trait and the in-memory `MemoryStore`
//! - **snapshot**: Load and save every document as one JSON file
//! - **page**: 1-based pagination over ordered results
//! - **fault**: A store wrapper that rejects chosen writes
//! - **error**: Error types for the store
//!
//! ## Example Usage
//!
//! ```ignore
//! use store::{DocumentStore, MemoryStore, Snapshot};
//! use std::path::Path;
//!
//! let store = MemoryStore::from_snapshot(Snapshot::load(Path::new("reeldeal.json"))?);
//! let movie = store.find_movie(550).await?.unwrap();
//!
//! println!("{} has {} ratings", movie.catalog.title, movie.stats().total_ratings);
//! ```

// Public modules
pub mod error;
pub mod fault;
pub mod page;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{AggregationError, Result, StoreError};
pub use fault::FaultyStore;
pub use page::{Page, PageRequest};
pub use snapshot::Snapshot;
pub use store::{DocumentStore, MemoryStore};
pub use types::{
    // Type aliases
    MovieId,
    ReviewId,
    UserId,
    // Documents
    CatalogMovie,
    InteractionRecord,
    InteractionUpdate,
    Movie,
    MovieStats,
    Review,
    User,
    UserStats,
    // Review parts
    Comment,
    Reaction,
    ReactionKind,
    ReactionSummary,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn test_new_movie_is_empty() {
        let movie = Movie::new(CatalogMovie::new(1, "Toy Story"), Utc::now());

        assert_eq!(movie.id(), 1);
        assert!(movie.interactions().is_empty());
        assert_eq!(*movie.stats(), MovieStats::default());
    }

    #[test]
    fn test_refresh_catalog_keeps_interactions() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(1, "Toy Story"), now);
        movie
            .apply_interaction(9, &InteractionUpdate::new().with_rating(4), now)
            .unwrap();

        let later = now + Duration::minutes(5);
        let fresh = CatalogMovie::new(999, "Toy Story (Remastered)").with_genres(["Animation"]);
        movie.refresh_catalog(fresh, later);

        assert_eq!(movie.id(), 1);
        assert_eq!(movie.catalog.title, "Toy Story (Remastered)");
        assert_eq!(movie.interaction(9).unwrap().rating, 4);
        assert_eq!(movie.stats().total_ratings, 1);
        assert_eq!(movie.updated_at, later);
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(1, "Toy Story"), now);
        movie
            .apply_interaction(
                9,
                &InteractionUpdate::new()
                    .with_rating(5)
                    .with_review("Pixar at its best")
                    .with_favorite(true),
                now,
            )
            .unwrap();

        let record = movie
            .apply_interaction(9, &InteractionUpdate::new().with_watchlist(true), now)
            .unwrap();

        assert_eq!(record.rating, 5);
        assert_eq!(record.review, "Pixar at its best");
        assert!(record.favorite);
        assert!(record.watchlist);
        assert_eq!(movie.interactions().len(), 1);
    }

    #[test]
    fn test_watched_date_follows_watched_flag() {
        let now = Utc::now();
        let later = now + Duration::days(1);
        let mut record = InteractionRecord::new(now);

        record.apply(&InteractionUpdate::new().with_watched(true), now);
        assert_eq!(record.watched_date, Some(now));

        // Already watched: date is not bumped
        record.apply(&InteractionUpdate::new().with_watched(true), later);
        assert_eq!(record.watched_date, Some(now));

        record.apply(&InteractionUpdate::new().with_watched(false), later);
        assert_eq!(record.watched_date, None);

        let explicit = now - Duration::days(30);
        record.apply(
            &InteractionUpdate::new()
                .with_watched(true)
                .with_watched_date(explicit),
            later,
        );
        assert_eq!(record.watched_date, Some(explicit));
    }

    #[test]
    fn test_watched_movie_is_off_the_watchlist() {
        let mut record = InteractionRecord::new(Utc::now());
        record.watchlist = true;
        assert!(record.on_watchlist());

        record.watched = true;
        assert!(!record.on_watchlist());
    }

    #[test]
    fn test_clear_review_keeps_rating() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(1, "Toy Story"), now);
        movie
            .apply_interaction(
                3,
                &InteractionUpdate::new().with_rating(4).with_review("To infinity"),
                now,
            )
            .unwrap();
        assert_eq!(movie.stats().total_reviews, 1);

        assert!(movie.clear_review(3, now).unwrap());
        assert!(!movie.clear_review(3, now).unwrap());
        assert!(!movie.clear_review(42, now).unwrap());

        assert_eq!(movie.interaction(3).unwrap().rating, 4);
        assert_eq!(movie.stats().total_reviews, 0);
        assert_eq!(movie.stats().total_ratings, 1);
    }

    #[test]
    fn test_toggle_like_then_dislike() {
        let now = Utc::now();
        let mut review = Review::new(1, 10, 4, "Better than the sequel", now);

        let liked = review.toggle(ReactionKind::Like, 2, now);
        assert_eq!(liked.like_count, 1);
        assert!(liked.user_has_liked);

        let disliked = review.toggle(ReactionKind::Dislike, 2, now);
        assert_eq!(disliked.like_count, 0);
        assert_eq!(disliked.dislike_count, 1);
        assert!(!disliked.user_has_liked);
        assert!(disliked.user_has_disliked);

        let cleared = review.toggle(ReactionKind::Dislike, 2, now);
        assert_eq!(cleared.dislike_count, 0);
        assert!(!cleared.user_has_disliked);
    }

    #[test]
    fn test_double_toggle_is_identity() {
        let now = Utc::now();
        let mut review = Review::new(1, 10, 4, "Better than the sequel", now);
        review.toggle(ReactionKind::Like, 3, now);
        let before = review.reactions_for(Some(3));

        review.toggle(ReactionKind::Like, 4, now);
        review.toggle(ReactionKind::Like, 4, now);

        assert_eq!(review.reactions_for(Some(3)), before);
        assert!(!review.has_user_liked(4));
    }

    #[test]
    fn test_reactions_without_viewer() {
        let now = Utc::now();
        let mut review = Review::new(1, 10, 4, "Better than the sequel", now);
        review.toggle(ReactionKind::Like, 2, now);

        let summary = review.reactions_for(None);
        assert_eq!(summary.like_count, 1);
        assert!(!summary.user_has_liked);
        assert!(!summary.user_has_disliked);
    }
}
