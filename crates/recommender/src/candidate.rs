//! Candidate movies flowing through the filter pipeline.

use chrono::NaiveDate;
use rayon::prelude::*;
use store::{Movie, MovieId};

/// A movie being considered for recommendation.
///
/// Carries a flat copy of the catalog fields the response needs, so the
/// pipeline never goes back to the movie documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub overview: Option<String>,
    /// Catalog vote average (0-10)
    pub vote_average: f32,
    /// Aggregated user rating (0-5)
    pub average_rating: f32,
    pub popularity: f32,
    /// Best-ranked top genre this movie carries, set by the genre filter.
    /// `(rank, genre)` with rank 0 the viewer's favourite.
    pub affinity: Option<(usize, String)>,
}

impl Candidate {
    pub fn from_movie(movie: &Movie) -> Self {
        let catalog = &movie.catalog;
        Self {
            movie_id: catalog.id,
            title: catalog.title.clone(),
            genres: catalog.genres.clone(),
            poster_path: catalog.poster_path.clone(),
            release_date: catalog.release_date,
            overview: catalog.overview.clone(),
            vote_average: catalog.vote_average,
            average_rating: movie.stats().average_rating,
            popularity: catalog.popularity,
            affinity: None,
        }
    }

    pub fn affinity_rank(&self) -> Option<usize> {
        self.affinity.as_ref().map(|(rank, _)| *rank)
    }
}

#[cfg(test)]
impl Candidate {
    /// Bare candidate for filter and ranking tests
    pub(crate) fn test(movie_id: MovieId, genres: &[&str], average_rating: f32) -> Self {
        Self {
            movie_id,
            title: format!("Movie {movie_id}"),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            poster_path: None,
            release_date: None,
            overview: None,
            vote_average: 0.0,
            average_rating,
            popularity: 0.0,
            affinity: None,
        }
    }
}

/// One candidate per movie document, built in parallel
pub fn candidates_from(movies: &[Movie]) -> Vec<Candidate> {
    movies.par_iter().map(Candidate::from_movie).collect()
}
