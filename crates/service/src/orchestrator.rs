//! # ReelDeal Orchestrator
//!
//! `ReelDeal` wires the components behind one entry point:
//! - the catalog client and the document store it was built with
//! - the interaction accessor, review ledger and social graph
//! - the recommendation engine
//!
//! Flows that touch more than one component live here: registering a
//! movie from the catalog, the rate action with its catalog fallback and
//! best-effort review sync, movie details, and recommendations (run on a
//! blocking thread since ranking is CPU bound).

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use catalog::CatalogClient;
use ledger::{
    CommentAdded, EngineError, InteractionAccessor, ProfileStats, ReconcileReport, ReviewDraft,
    ReviewEdit, ReviewLedger, ReviewSort, ReviewView, SocialGraph, UserMovie, UserSummary,
    validation,
};
use recommender::{RecommendationPage, Recommender};
use store::{
    CatalogMovie, DocumentStore, InteractionRecord, InteractionUpdate, Movie, MovieId, MovieStats,
    Page, PageRequest, ReactionSummary, ReviewId, User, UserId, UserStats,
};

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};

// =============================================================================
// Results
// =============================================================================

/// Where a movie's metadata came from on a rate action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetadataSource {
    Catalog,
    /// The lookup failed and the caller's fallback created the movie
    Fallback,
    /// The lookup failed but the movie was already stored; its metadata is kept
    Stored,
}

/// What happened to the linked Review after a rate action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReviewSync {
    /// The update had no review text or no rating
    Skipped,
    Created(ReviewId),
    Updated(ReviewId),
    /// The interaction write stands; the review write did not happen
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateOutcome {
    pub interaction: InteractionRecord,
    pub stats: MovieStats,
    pub metadata: MetadataSource,
    pub review: ReviewSync,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetails {
    pub movie: CatalogMovie,
    pub stats: MovieStats,
    /// The viewer's own record, when a viewer is given and has one
    pub viewer_interaction: Option<InteractionRecord>,
    pub recent_reviews: Vec<ReviewView>,
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Clone)]
pub struct ReelDeal {
    store: Arc<dyn DocumentStore>,
    catalog: Arc<dyn CatalogClient>,
    interactions: InteractionAccessor,
    reviews: ReviewLedger,
    social: SocialGraph,
    profile: ProfileStats,
    recommender: Arc<Recommender>,
    config: ServiceConfig,
}

impl ReelDeal {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn CatalogClient>,
        config: ServiceConfig,
    ) -> Self {
        info!(catalog = catalog.name(), "Creating ReelDeal service");
        Self {
            interactions: InteractionAccessor::new(store.clone()),
            reviews: ReviewLedger::new(store.clone()),
            social: SocialGraph::new(store.clone()),
            profile: ProfileStats::new(store.clone()),
            recommender: Arc::new(Recommender::new(config.recommender_config())),
            store,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Build a page request, filling in the configured default size
    pub fn page(&self, page: Option<usize>, size: Option<usize>) -> Result<PageRequest> {
        let size = size.unwrap_or(self.config.default_page_size);
        if size > self.config.max_page_size {
            return Err(EngineError::Validation(format!(
                "page size must be at most {}, got {size}",
                self.config.max_page_size
            ))
            .into());
        }
        Ok(validation::page(page.unwrap_or(1), size)?)
    }

    // -------------------------------------------------------------------------
    // Movies
    // -------------------------------------------------------------------------

    /// Create the movie if unseen, otherwise refresh its catalog fields.
    /// Interactions and stats are kept either way.
    #[instrument(skip(self, catalog), fields(movie_id = catalog.id))]
    pub async fn register_movie(&self, catalog: CatalogMovie) -> Result<Movie> {
        let now = Utc::now();
        let movie = match self.store.find_movie(catalog.id).await? {
            Some(mut movie) => {
                movie.refresh_catalog(catalog, now);
                movie
            }
            None => {
                info!("Registering new movie");
                Movie::new(catalog, now)
            }
        };
        self.store.upsert_movie(movie.clone()).await?;
        Ok(movie)
    }

    /// Catalog metadata, stats, the viewer's record and the latest reviews.
    ///
    /// A failed lookup falls back to the stored copy when there is one.
    #[instrument(skip(self))]
    pub async fn movie_details(
        &self,
        movie_id: MovieId,
        viewer: Option<UserId>,
    ) -> Result<MovieDetails> {
        let movie = match self.catalog.fetch_catalog_movie(movie_id).await {
            Ok(catalog) => self.register_movie(catalog).await?,
            Err(err) => match self.store.find_movie(movie_id).await? {
                Some(movie) => {
                    warn!(error = %err, "Catalog lookup failed, serving stored metadata");
                    movie
                }
                None => return Err(EngineError::Upstream(err.to_string()).into()),
            },
        };

        let viewer_interaction = viewer.and_then(|id| movie.interaction(id).cloned());
        let recent_reviews = self.reviews.latest_for_movie(movie_id, viewer).await?;
        Ok(MovieDetails {
            stats: *movie.stats(),
            movie: movie.catalog,
            viewer_interaction,
            recent_reviews,
        })
    }

    /// Rate, bookmark, watch or favourite a movie.
    ///
    /// ## Algorithm
    /// 1. Validate the update (non-empty, rating 1-5, inline review length)
    /// 2. Look the movie up; on failure use `fallback` if it has a title.
    ///    A movie that is already stored keeps its metadata instead.
    /// 3. Register the movie, then upsert the interaction record
    /// 4. If the update carries review text and a rating, create or update
    ///    the user's Review. A failure here is logged and reported in the
    ///    outcome; the interaction write stands.
    #[instrument(skip(self, update, fallback))]
    pub async fn rate_movie(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        update: InteractionUpdate,
        fallback: Option<CatalogMovie>,
    ) -> Result<RateOutcome> {
        if update.is_empty() {
            return Err(EngineError::Validation(
                "at least one of rating, review, watched, watchlist, favorite or watched date is required"
                    .to_string(),
            )
            .into());
        }
        if let Some(rating) = update.rating {
            validation::rating(rating)?;
        }
        if let Some(review) = &update.review {
            validation::inline_review(review)?;
        }

        let (catalog, metadata) = self.resolve_metadata(movie_id, fallback).await?;
        if let Some(catalog) = catalog {
            self.register_movie(catalog).await?;
        }
        let interaction = self
            .interactions
            .upsert_interaction(movie_id, user_id, &update)
            .await?;
        let stats = self
            .store
            .find_movie(movie_id)
            .await?
            .map(|movie| *movie.stats())
            .ok_or(EngineError::MovieNotFound(movie_id))?;

        let review = self.sync_review(movie_id, user_id, &update).await;
        Ok(RateOutcome {
            interaction,
            stats,
            metadata,
            review,
        })
    }

    async fn resolve_metadata(
        &self,
        movie_id: MovieId,
        fallback: Option<CatalogMovie>,
    ) -> Result<(Option<CatalogMovie>, MetadataSource)> {
        let err = match self.catalog.fetch_catalog_movie(movie_id).await {
            Ok(catalog) => return Ok((Some(catalog), MetadataSource::Catalog)),
            Err(err) => err,
        };

        match fallback {
            Some(mut fallback) if !fallback.title.trim().is_empty() => {
                if self.store.find_movie(movie_id).await?.is_some() {
                    warn!(movie_id, error = %err, "Catalog lookup failed, keeping stored metadata");
                    return Ok((None, MetadataSource::Stored));
                }
                warn!(movie_id, error = %err, "Catalog lookup failed, using fallback metadata");
                fallback.id = movie_id;
                Ok((Some(fallback), MetadataSource::Fallback))
            }
            Some(_) => Err(EngineError::Validation(
                "fallback movie metadata needs a title".to_string(),
            )
            .into()),
            None => Err(EngineError::Upstream(err.to_string()).into()),
        }
    }

    async fn sync_review(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        update: &InteractionUpdate,
    ) -> ReviewSync {
        let (Some(rating), Some(text)) = (
            update.rating.filter(|r| *r > 0),
            update.review.as_deref().filter(|t| !t.trim().is_empty()),
        ) else {
            return ReviewSync::Skipped;
        };

        let result = match self.store.find_review_by(user_id, movie_id).await {
            Ok(Some(existing)) => {
                let edit = ReviewEdit::new().with_rating(rating).with_text(text);
                self.reviews
                    .update_review(existing.id, user_id, edit)
                    .await
                    .map(|view| ReviewSync::Updated(view.review.id))
            }
            Ok(None) => self
                .reviews
                .create_review(user_id, movie_id, ReviewDraft::new(rating, text))
                .await
                .map(|view| ReviewSync::Created(view.review.id)),
            Err(err) => Err(err.into()),
        };

        result.unwrap_or_else(|err: EngineError| {
            warn!(movie_id, user_id, error = %err, "Review sync failed after rating was saved");
            ReviewSync::Failed(err.to_string())
        })
    }

    // -------------------------------------------------------------------------
    // Reviews
    // -------------------------------------------------------------------------

    pub async fn create_review(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        draft: ReviewDraft,
    ) -> Result<ReviewView> {
        Ok(self.reviews.create_review(user_id, movie_id, draft).await?)
    }

    pub async fn update_review(
        &self,
        review_id: ReviewId,
        requester_id: UserId,
        edit: ReviewEdit,
    ) -> Result<ReviewView> {
        Ok(self.reviews.update_review(review_id, requester_id, edit).await?)
    }

    pub async fn delete_review(&self, review_id: ReviewId, requester_id: UserId) -> Result<()> {
        Ok(self.reviews.delete_review(review_id, requester_id).await?)
    }

    pub async fn toggle_like(&self, review_id: ReviewId, user_id: UserId) -> Result<ReactionSummary> {
        Ok(self.reviews.toggle_like(review_id, user_id).await?)
    }

    pub async fn toggle_dislike(
        &self,
        review_id: ReviewId,
        user_id: UserId,
    ) -> Result<ReactionSummary> {
        Ok(self.reviews.toggle_dislike(review_id, user_id).await?)
    }

    pub async fn add_comment(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        text: &str,
    ) -> Result<CommentAdded> {
        Ok(self.reviews.add_comment(review_id, user_id, text).await?)
    }

    pub async fn review(&self, review_id: ReviewId, viewer: Option<UserId>) -> Result<ReviewView> {
        Ok(self.reviews.review(review_id, viewer).await?)
    }

    pub async fn reviews_for_movie(
        &self,
        movie_id: MovieId,
        viewer: Option<UserId>,
        page: PageRequest,
        sort: ReviewSort,
    ) -> Result<Page<ReviewView>> {
        Ok(self
            .reviews
            .reviews_for_movie(movie_id, viewer, page, sort)
            .await?)
    }

    pub async fn recent_reviews(
        &self,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<ReviewView>> {
        Ok(self.reviews.recent_reviews(viewer, page).await?)
    }

    pub async fn following_feed(&self, user_id: UserId, page: PageRequest) -> Result<Page<ReviewView>> {
        Ok(self.reviews.following_feed(user_id, page).await?)
    }

    pub async fn reviews_by_user(
        &self,
        author_id: UserId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<ReviewView>> {
        Ok(self.reviews.reviews_by_user(author_id, viewer, page).await?)
    }

    // -------------------------------------------------------------------------
    // Users and the social graph
    // -------------------------------------------------------------------------

    /// Create a user if the id is free; an existing user is returned as is
    pub async fn register_user(&self, user_id: UserId, username: &str) -> Result<User> {
        if let Some(user) = self.store.find_user(user_id).await? {
            return Ok(user);
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::Validation("username must not be empty".to_string()).into());
        }
        let user = User::new(user_id, username, Utc::now());
        self.store.upsert_user(user.clone()).await?;
        info!(user_id, username, "User registered");
        Ok(user)
    }

    pub async fn follow(&self, follower_id: UserId, target_id: UserId) -> Result<()> {
        Ok(self.social.follow(follower_id, target_id).await?)
    }

    pub async fn unfollow(&self, follower_id: UserId, target_id: UserId) -> Result<()> {
        Ok(self.social.unfollow(follower_id, target_id).await?)
    }

    pub async fn reconcile_follows(&self, user_id: UserId) -> Result<ReconcileReport> {
        Ok(self.social.reconcile_follows(user_id).await?)
    }

    pub async fn followers(&self, user_id: UserId, page: PageRequest) -> Result<Page<UserSummary>> {
        Ok(self.social.followers(user_id, page).await?)
    }

    pub async fn following(&self, user_id: UserId, page: PageRequest) -> Result<Page<UserSummary>> {
        Ok(self.social.following(user_id, page).await?)
    }

    pub async fn watchlist(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        Ok(self.interactions.watchlist(user_id).await?)
    }

    pub async fn watched_movies(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        Ok(self.interactions.watched_movies(user_id).await?)
    }

    pub async fn favorites(&self, user_id: UserId) -> Result<Vec<UserMovie>> {
        Ok(self.interactions.favorites(user_id).await?)
    }

    pub async fn profile_stats(&self, user_id: UserId) -> Result<UserStats> {
        Ok(self.profile.profile_stats(user_id).await?)
    }

    // -------------------------------------------------------------------------
    // Recommendations
    // -------------------------------------------------------------------------

    /// Ranked, paginated suggestions for a user
    #[instrument(skip(self, page), fields(page = page.page(), size = page.size()))]
    pub async fn recommend(&self, user_id: UserId, page: PageRequest) -> Result<RecommendationPage> {
        let start = Instant::now();
        let movies = self.store.list_movies().await?;

        // Ranking is CPU bound; keep it off the async workers
        let recommender = self.recommender.clone();
        let result = tokio::task::spawn_blocking(move || recommender.recommend(user_id, &movies, page))
            .await
            .context("recommendation task panicked")
            .and_then(|result| result)
            .map_err(ServiceError::Recommendation)?;

        info!(
            "Served {} recommendations to user {} in {:.2?}",
            result.movies.len(),
            user_id,
            start.elapsed()
        );
        Ok(result)
    }
}
