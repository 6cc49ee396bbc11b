//! The recommendation engine.
//!
//! `Recommender::recommend` reads movie documents (it never writes them) and
//! returns one page of ranked suggestions:
//!
//! - A viewer with no watched movies gets the fallback list: every movie,
//!   best rated first, each labelled as a popular pick.
//! - Otherwise candidates run through the filter pipeline (not watched,
//!   rated at least `min_average_rating`, sharing a top genre), are ranked,
//!   and are labelled with the favourite genre they matched.

use crate::candidate::{Candidate, candidates_from};
use crate::context::{ViewerContext, build_viewer_context};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::{AlreadyWatchedFilter, GenrePreferenceFilter, MinimumRatingFilter};
use crate::ranking;
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use store::{Movie, MovieId, Page, PageRequest, UserId};
use tracing::{info, instrument};

pub const FALLBACK_REASON: &str = "Popular movie you might enjoy";

pub fn genre_reason(genre: &str) -> String {
    format!("Based on your love for {genre} movies")
}

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Inclusive floor on a candidate's aggregated average rating
    pub min_average_rating: f32,
    /// How many favourite genres a candidate may match
    pub top_genres: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            min_average_rating: 6.0,
            top_genres: 3,
        }
    }
}

// =============================================================================
// Response
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedMovie {
    pub id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub overview: Option<String>,
    pub vote_average: f32,
    pub average_rating: f32,
    pub popularity: f32,
    pub match_reason: String,
}

impl RecommendedMovie {
    fn new(candidate: Candidate, match_reason: String) -> Self {
        Self {
            id: candidate.movie_id,
            title: candidate.title,
            genres: candidate.genres,
            poster_path: candidate.poster_path,
            release_date: candidate.release_date,
            overview: candidate.overview,
            vote_average: candidate.vote_average,
            average_rating: candidate.average_rating,
            popularity: candidate.popularity,
            match_reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub movies: Vec<RecommendedMovie>,
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
    /// The genres candidates were matched against; empty on the fallback path
    pub top_genres: Vec<String>,
}

impl RecommendationPage {
    pub fn is_personalized(&self) -> bool {
        !self.top_genres.is_empty()
    }

    fn from_page(page: Page<RecommendedMovie>, top_genres: Vec<String>) -> Self {
        Self {
            movies: page.items,
            page: page.page,
            total_pages: page.total_pages,
            total_results: page.total_results,
            top_genres,
        }
    }
}

// =============================================================================
// Engine
// =============================================================================

pub struct Recommender {
    config: RecommenderConfig,
    pipeline: FilterPipeline,
}

impl Recommender {
    pub fn new(config: RecommenderConfig) -> Self {
        let pipeline = FilterPipeline::new()
            .add_filter(AlreadyWatchedFilter)
            .add_filter(MinimumRatingFilter::new(config.min_average_rating))
            .add_filter(GenrePreferenceFilter::new(config.top_genres));

        Self { config, pipeline }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    #[instrument(skip(self, movies), fields(catalog_size = movies.len()))]
    pub fn recommend(
        &self,
        user_id: UserId,
        movies: &[Movie],
        page: PageRequest,
    ) -> Result<RecommendationPage> {
        let start = Instant::now();
        let context = build_viewer_context(user_id, movies);

        let result = if context.has_history() {
            self.personalized(&context, movies, page)?
        } else {
            Self::fallback(movies, page)
        };

        info!(
            "Recommended {} of {} movies for user {} in {:?} (personalized: {})",
            result.movies.len(),
            result.total_results,
            user_id,
            start.elapsed(),
            result.is_personalized()
        );
        Ok(result)
    }

    fn personalized(
        &self,
        context: &ViewerContext,
        movies: &[Movie],
        page: PageRequest,
    ) -> Result<RecommendationPage> {
        let top_genres = context.top_genres(self.config.top_genres);

        let mut candidates = self.pipeline.apply(candidates_from(movies), context)?;
        ranking::rank(&mut candidates);

        // Every result credits the viewer's dominant genre
        let reason = match top_genres.first() {
            Some(genre) => genre_reason(genre),
            None => FALLBACK_REASON.to_string(),
        };
        let page = Page::slice(candidates, page)
            .map(|candidate| RecommendedMovie::new(candidate, reason.clone()));
        Ok(RecommendationPage::from_page(page, top_genres))
    }

    fn fallback(movies: &[Movie], page: PageRequest) -> RecommendationPage {
        let mut candidates = candidates_from(movies);
        ranking::rank(&mut candidates);

        let page = Page::slice(candidates, page)
            .map(|candidate| RecommendedMovie::new(candidate, FALLBACK_REASON.to_string()));
        RecommendationPage::from_page(page, Vec::new())
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}
