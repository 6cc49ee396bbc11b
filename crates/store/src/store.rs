//! The document store collaborator.
//!
//! `DocumentStore` is the only view the engine has of persistence: find,
//! upsert and delete over the movie, review and user collections, keyed
//! by their ids. Each call is one per-document read or write; nothing
//! here spans documents atomically.
//!
//! `MemoryStore` keeps every collection in memory and can be filled from
//! or dumped to a `Snapshot`.

use crate::error::{Result, StoreError};
use crate::snapshot::Snapshot;
use crate::types::{Movie, MovieId, Review, ReviewId, User, UserId};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

/// Per-document access to the backing store.
///
/// Writes replace the whole document. Callers read, modify and upsert;
/// the store does no row-level locking.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>>;

    async fn upsert_movie(&self, movie: Movie) -> Result<()>;

    /// All movies, ordered by id
    async fn list_movies(&self) -> Result<Vec<Movie>>;

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>>;

    /// The review a user wrote for a movie, if any
    async fn find_review_by(&self, user_id: UserId, movie_id: MovieId) -> Result<Option<Review>>;

    /// Fails with `DuplicateReview` if another review already holds the
    /// same (user, movie) pair
    async fn upsert_review(&self, review: Review) -> Result<()>;

    /// Returns `false` when no such review existed
    async fn delete_review(&self, id: ReviewId) -> Result<bool>;

    async fn list_reviews(&self) -> Result<Vec<Review>>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    async fn upsert_user(&self, user: User) -> Result<()>;
}

#[derive(Debug, Default)]
struct Collections {
    movies: BTreeMap<MovieId, Movie>,
    reviews: HashMap<ReviewId, Review>,
    users: BTreeMap<UserId, User>,
}

/// In-memory document store.
///
/// Every call takes the lock once, so each read or write is atomic on its
/// own, and nothing more.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted documents
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let collections = Collections {
            movies: snapshot.movies.into_iter().map(|m| (m.id(), m)).collect(),
            reviews: snapshot.reviews.into_iter().map(|r| (r.id, r)).collect(),
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
        };
        Self {
            inner: RwLock::new(collections),
        }
    }

    /// Copy every document out, in a stable order
    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        let mut reviews: Vec<Review> = inner.reviews.values().cloned().collect();
        reviews.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        Snapshot {
            movies: inner.movies.values().cloned().collect(),
            reviews,
            users: inner.users.values().cloned().collect(),
        }
    }

    /// Document counts as (movies, reviews, users)
    pub async fn counts(&self) -> (usize, usize, usize) {
        let inner = self.inner.read().await;
        (inner.movies.len(), inner.reviews.len(), inner.users.len())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        Ok(self.inner.read().await.movies.get(&id).cloned())
    }

    async fn upsert_movie(&self, movie: Movie) -> Result<()> {
        self.inner.write().await.movies.insert(movie.id(), movie);
        Ok(())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>> {
        Ok(self.inner.read().await.movies.values().cloned().collect())
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>> {
        Ok(self.inner.read().await.reviews.get(&id).cloned())
    }

    async fn find_review_by(&self, user_id: UserId, movie_id: MovieId) -> Result<Option<Review>> {
        Ok(self
            .inner
            .read()
            .await
            .reviews
            .values()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
            .cloned())
    }

    async fn upsert_review(&self, review: Review) -> Result<()> {
        let mut inner = self.inner.write().await;
        let clash = inner.reviews.values().any(|existing| {
            existing.id != review.id
                && existing.user_id == review.user_id
                && existing.movie_id == review.movie_id
        });
        if clash {
            return Err(StoreError::DuplicateReview {
                user_id: review.user_id,
                movie_id: review.movie_id,
            });
        }
        inner.reviews.insert(review.id, review);
        Ok(())
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        Ok(self.inner.write().await.reviews.remove(&id).is_some())
    }

    async fn list_reviews(&self) -> Result<Vec<Review>> {
        Ok(self.inner.read().await.reviews.values().cloned().collect())
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn upsert_user(&self, user: User) -> Result<()> {
        self.inner.write().await.users.insert(user.id, user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogMovie;
    use chrono::Utc;

    #[tokio::test]
    async fn test_empty_store() {
        let store = MemoryStore::new();

        assert!(store.find_movie(1).await.unwrap().is_none());
        assert!(store.find_user(1).await.unwrap().is_none());
        assert!(store.list_reviews().await.unwrap().is_empty());
        assert_eq!(store.counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_movies_are_listed_by_id() {
        let store = MemoryStore::new();
        let now = Utc::now();
        for id in [30, 10, 20] {
            store
                .upsert_movie(Movie::new(CatalogMovie::new(id, format!("Movie {id}")), now))
                .await
                .unwrap();
        }

        let ids: Vec<MovieId> = store
            .list_movies()
            .await
            .unwrap()
            .iter()
            .map(Movie::id)
            .collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_second_review_for_same_pair_is_rejected() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = Review::new(1, 550, 5, "Still holds up after all these years", now);
        let second = Review::new(1, 550, 2, "Changed my mind about this one", now);

        store.upsert_review(first.clone()).await.unwrap();
        let err = store.upsert_review(second).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::DuplicateReview {
                user_id: 1,
                movie_id: 550
            }
        ));
        // Re-saving the same document is an update, not a duplicate
        store.upsert_review(first).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_review() {
        let store = MemoryStore::new();
        let review = Review::new(1, 550, 4, "Great ending, slow middle act", Utc::now());
        let id = review.id;
        store.upsert_review(review).await.unwrap();

        assert!(store.delete_review(id).await.unwrap());
        assert!(!store.delete_review(id).await.unwrap());
        assert!(store.find_review_by(1, 550).await.unwrap().is_none());
    }
}
