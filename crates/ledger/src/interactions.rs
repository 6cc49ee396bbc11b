//! Interaction store accessor.
//!
//! Reads and writes the per-user interaction records inside movie
//! documents. Every write goes through `Movie::apply_interaction`, which
//! recomputes stats before the document is handed back to the store.
//!
//! Concurrent writers to the same movie each read, modify and upsert the
//! whole document. Two simultaneous writes can therefore race and the
//! later upsert wins, possibly carrying stats computed from a slightly
//! stale map. The next write to that movie recomputes from scratch and
//! heals it.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::sync::Arc;
use store::{
    CatalogMovie, DocumentStore, InteractionRecord, InteractionUpdate, Movie, MovieId, MovieStats,
    UserId,
};
use tracing::{debug, instrument};

/// A movie as it appears on one user's list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMovie {
    pub movie: CatalogMovie,
    pub stats: MovieStats,
    pub interaction: InteractionRecord,
}

#[derive(Clone)]
pub struct InteractionAccessor {
    store: Arc<dyn DocumentStore>,
}

impl InteractionAccessor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create or update one user's record on a movie.
    ///
    /// Absent record: created with the supplied fields, defaults elsewhere.
    /// Present record: each supplied field overwrites its value. Stats are
    /// recomputed before the write; if that fails nothing is written.
    #[instrument(skip(self, update))]
    pub async fn upsert_interaction(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        update: &InteractionUpdate,
    ) -> Result<InteractionRecord> {
        let mut movie = self
            .store
            .find_movie(movie_id)
            .await?
            .ok_or(EngineError::MovieNotFound(movie_id))?;

        let record = Self::apply(&mut movie, user_id, update, Utc::now())?;
        self.store.upsert_movie(movie).await?;

        debug!(movie_id, user_id, rating = record.rating, "Interaction saved");
        Ok(record)
    }

    /// Apply an update to a movie already in hand, without writing it
    pub(crate) fn apply(
        movie: &mut Movie,
        user_id: UserId,
        update: &InteractionUpdate,
        now: DateTime<Utc>,
    ) -> Result<InteractionRecord> {
        let movie_id = movie.id();
        movie
            .apply_interaction(user_id, update, now)
            .map_err(|source| EngineError::Aggregation { movie_id, source })
    }

    pub async fn interaction(
        &self,
        movie_id: MovieId,
        user_id: UserId,
    ) -> Result<Option<InteractionRecord>> {
        let movie = self
            .store
            .find_movie(movie_id)
            .await?
            .ok_or(EngineError::MovieNotFound(movie_id))?;
        Ok(movie.interaction(user_id).cloned())
    }

    /// Movies the user bookmarked and has not watched yet, newest first
    pub async fn watchlist(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        let mut movies = self.collect(user_id, InteractionRecord::on_watchlist).await?;
        movies.sort_by_key(|m| (Reverse(m.interaction.created_at), m.movie.id));
        Ok(movies)
    }

    /// Watched movies, most recently watched first; undated ones last
    pub async fn watched_movies(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        let mut movies = self.collect(user_id, |r| r.watched).await?;
        movies.sort_by_key(|m| (Reverse(m.interaction.watched_date), m.movie.id));
        Ok(movies)
    }

    pub async fn favorites(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        let mut movies = self.collect(user_id, |r| r.favorite).await?;
        movies.sort_by_key(|m| (Reverse(m.interaction.created_at), m.movie.id));
        Ok(movies)
    }

    /// How many movies the user has marked watched
    pub async fn watched_count(&self, user_id: UserId) -> Result<usize> {
        Ok(self
            .store
            .list_movies()
            .await?
            .iter()
            .filter(|m| m.interaction(user_id).is_some_and(|r| r.watched))
            .count())
    }

    async fn collect(
        &self,
        user_id: UserId,
        keep: impl Fn(&InteractionRecord) -> bool,
    ) -> Result<Vec<UserMovie>> {
        let movies = self.store.list_movies().await?;
        Ok(movies
            .into_iter()
            .filter_map(|movie| {
                let record = movie.interaction(user_id).filter(|r| keep(r))?.clone();
                Some(UserMovie {
                    stats: *movie.stats(),
                    movie: movie.catalog,
                    interaction: record,
                })
            })
            .collect())
    }
}
