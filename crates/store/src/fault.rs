//! A `DocumentStore` wrapper that fails chosen writes.
//!
//! Multi-document operations write one document at a time, so a write can
//! fail halfway through. `FaultyStore` makes that happen on demand: it
//! counts every write passing through and rejects the ones it was told to.

use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::types::{Movie, MovieId, Review, ReviewId, User, UserId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps a store and rejects writes by ordinal or by collection
pub struct FaultyStore<S> {
    inner: S,
    writes: AtomicUsize,
    fail_ordinals: Mutex<HashSet<usize>>,
    fail_collections: Mutex<HashSet<&'static str>>,
}

impl<S: DocumentStore> FaultyStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            writes: AtomicUsize::new(0),
            fail_ordinals: Mutex::new(HashSet::new()),
            fail_collections: Mutex::new(HashSet::new()),
        }
    }

    /// Reject the `n`th write from now on (1-based, counted across collections)
    pub fn fail_nth_write(&self, n: usize) {
        let target = self.writes.load(Ordering::SeqCst) + n;
        if let Ok(mut ordinals) = self.fail_ordinals.lock() {
            ordinals.insert(target);
        }
    }

    /// Reject every write to `collection` ("movies", "reviews" or "users")
    pub fn fail_collection(&self, collection: &'static str) {
        if let Ok(mut collections) = self.fail_collections.lock() {
            collections.insert(collection);
        }
    }

    /// Stop injecting faults
    pub fn heal(&self) {
        if let Ok(mut ordinals) = self.fail_ordinals.lock() {
            ordinals.clear();
        }
        if let Ok(mut collections) = self.fail_collections.lock() {
            collections.clear();
        }
    }

    /// Writes attempted so far, including rejected ones
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, collection: &'static str, id: String) -> Result<()> {
        let ordinal = self.writes.fetch_add(1, Ordering::SeqCst) + 1;

        let by_ordinal = self
            .fail_ordinals
            .lock()
            .map(|ordinals| ordinals.contains(&ordinal))
            .unwrap_or(false);
        let by_collection = self
            .fail_collections
            .lock()
            .map(|collections| collections.contains(collection))
            .unwrap_or(false);

        if by_ordinal || by_collection {
            return Err(StoreError::WriteRejected {
                collection,
                id,
                reason: format!("injected fault on write #{ordinal}"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for FaultyStore<S> {
    async fn find_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        self.inner.find_movie(id).await
    }

    async fn upsert_movie(&self, movie: Movie) -> Result<()> {
        self.check("movies", movie.id().to_string())?;
        self.inner.upsert_movie(movie).await
    }

    async fn list_movies(&self) -> Result<Vec<Movie>> {
        self.inner.list_movies().await
    }

    async fn find_review(&self, id: ReviewId) -> Result<Option<Review>> {
        self.inner.find_review(id).await
    }

    async fn find_review_by(&self, user_id: UserId, movie_id: MovieId) -> Result<Option<Review>> {
        self.inner.find_review_by(user_id, movie_id).await
    }

    async fn upsert_review(&self, review: Review) -> Result<()> {
        self.check("reviews", review.id.to_string())?;
        self.inner.upsert_review(review).await
    }

    async fn delete_review(&self, id: ReviewId) -> Result<bool> {
        self.check("reviews", id.to_string())?;
        self.inner.delete_review(id).await
    }

    async fn list_reviews(&self) -> Result<Vec<Review>> {
        self.inner.list_reviews().await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn upsert_user(&self, user: User) -> Result<()> {
        self.check("users", user.id.to_string())?;
        self.inner.upsert_user(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    #[tokio::test]
    async fn test_nth_write_is_rejected() {
        let store = FaultyStore::new(MemoryStore::new());
        let now = Utc::now();
        store.fail_nth_write(2);

        store.upsert_user(User::new(1, "ada", now)).await.unwrap();
        let err = store.upsert_user(User::new(2, "grace", now)).await.unwrap_err();
        store.upsert_user(User::new(3, "linus", now)).await.unwrap();

        assert!(matches!(err, StoreError::WriteRejected { collection: "users", .. }));
        assert!(store.find_user(2).await.unwrap().is_none());
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_collection_faults_until_healed() {
        let store = FaultyStore::new(MemoryStore::new());
        let now = Utc::now();
        store.fail_collection("reviews");

        let review = Review::new(1, 2, 3, "Fine for a rainy afternoon", now);
        assert!(store.upsert_review(review.clone()).await.is_err());

        store.heal();
        store.upsert_review(review).await.unwrap();
        assert_eq!(store.inner().counts().await, (0, 1, 0));
    }
}
