//! Build a ViewerContext from the movie documents.
//!
//! The context holds what the engine knows about one user before it looks
//! at candidates:
//! - the set of movies they marked watched
//! - a genre histogram over those movies
//!
//! The histogram keeps genres in the order they were first seen, walking
//! watched movies by watch date (undated first, then by movie id). Equal
//! counts therefore rank by who came first.

use std::collections::{HashMap, HashSet};
use store::{Movie, MovieId, UserId};

/// What the engine knows about the viewer
#[derive(Debug, Clone, Default)]
pub struct ViewerContext {
    pub user_id: UserId,
    pub watched_movies: HashSet<MovieId>,
    /// (genre, count) in first-seen order
    genre_counts: Vec<(String, usize)>,
}

impl ViewerContext {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn has_history(&self) -> bool {
        !self.watched_movies.is_empty()
    }

    /// Count one more watched movie with these genres
    pub fn record_watched<'a>(
        &mut self,
        movie_id: MovieId,
        genres: impl IntoIterator<Item = &'a String>,
    ) {
        if !self.watched_movies.insert(movie_id) {
            return;
        }
        for genre in genres {
            match self.genre_counts.iter_mut().find(|(g, _)| g == genre) {
                Some((_, count)) => *count += 1,
                None => self.genre_counts.push((genre.clone(), 1)),
            }
        }
    }

    pub fn genre_count(&self, genre: &str) -> usize {
        self.genre_counts
            .iter()
            .find(|(g, _)| g == genre)
            .map_or(0, |(_, count)| *count)
    }

    /// The `n` most frequent genres, ties kept in first-seen order
    pub fn top_genres(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<&(String, usize)> = self.genre_counts.iter().collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.into_iter().take(n).map(|(g, _)| g.clone()).collect()
    }
}

/// Gather the viewer's watched movies and genre histogram
pub fn build_viewer_context(user_id: UserId, movies: &[Movie]) -> ViewerContext {
    let mut watched: Vec<(&Movie, _)> = movies
        .iter()
        .filter_map(|movie| {
            let record = movie.interaction(user_id).filter(|r| r.watched)?;
            Some((movie, record.watched_date))
        })
        .collect();
    watched.sort_by_key(|(movie, date)| (*date, movie.id()));

    let mut context = ViewerContext::new(user_id);
    for (movie, _) in watched {
        context.record_watched(movie.id(), &movie.catalog.genres);
    }
    context
}

/// Per-genre rank lookup for the chosen top genres (0 = most loved)
pub(crate) fn genre_ranks(top_genres: &[String]) -> HashMap<&str, usize> {
    top_genres
        .iter()
        .enumerate()
        .map(|(rank, genre)| (genre.as_str(), rank))
        .collect()
}
