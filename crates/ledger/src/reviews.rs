//! Review ledger.
//!
//! A Review is the social form of a user's opinion; the interaction record
//! on the movie holds a compact copy of its rating and text. The two live
//! in different documents, so every write that touches both follows the
//! same order:
//!
//! 1. validate, and apply the interaction change to the movie in memory
//!    (an aggregation failure stops here, before anything is written)
//! 2. write the review
//! 3. write the movie; if that fails, put the previous review back
//!
//! Deletes run the other way round: the inline text is blanked first, so a
//! failed delete never leaves text on the movie for a review that is gone.

use crate::error::{EngineError, Result};
use crate::interactions::InteractionAccessor;
use crate::validation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use store::{
    Comment, DocumentStore, InteractionUpdate, Movie, MovieId, Page, PageRequest, ReactionKind,
    ReactionSummary, Review, ReviewId, UserId,
};
use tracing::{debug, error, info, instrument, warn};

/// How many reviews the movie-details view shows
pub const RECENT_REVIEWS_PER_MOVIE: usize = 5;

// =============================================================================
// Inputs and Views
// =============================================================================

/// Fields of a new review
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewDraft {
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

impl ReviewDraft {
    pub fn new(rating: u8, text: impl Into<String>) -> Self {
        Self {
            rating,
            text: text.into(),
            title: None,
            is_public: true,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn private(mut self) -> Self {
        self.is_public = false;
        self
    }
}

/// Changes to an existing review; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReviewEdit {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl ReviewEdit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    fn is_empty(&self) -> bool {
        self.rating.is_none() && self.text.is_none() && self.title.is_none() && self.is_public.is_none()
    }
}

/// A review as one viewer sees it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    pub review: Review,
    pub like_count: usize,
    pub dislike_count: usize,
    pub comment_count: usize,
    pub user_has_liked: bool,
    pub user_has_disliked: bool,
}

impl ReviewView {
    pub fn new(review: Review, viewer: Option<UserId>) -> Self {
        let reactions = review.reactions_for(viewer);
        Self {
            like_count: reactions.like_count,
            dislike_count: reactions.dislike_count,
            comment_count: review.comments().len(),
            user_has_liked: reactions.user_has_liked,
            user_has_disliked: reactions.user_has_disliked,
            review,
        }
    }
}

/// Result of `add_comment`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentAdded {
    pub comment: Comment,
    pub review: ReviewView,
}

/// Ordering for a movie's reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSort {
    /// Newest first
    #[default]
    Recent,
    /// Highest rating first, then newest
    Rating,
    /// Most liked first, then newest
    Helpful,
}

impl FromStr for ReviewSort {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "recent" => Ok(ReviewSort::Recent),
            "rating" => Ok(ReviewSort::Rating),
            "helpful" => Ok(ReviewSort::Helpful),
            other => Err(EngineError::validation(format!("unknown review sort '{other}'"))),
        }
    }
}

impl ReviewSort {
    fn sort(self, reviews: &mut [Review]) {
        match self {
            ReviewSort::Recent => reviews.sort_by_key(|r| (Reverse(r.created_at), r.id)),
            ReviewSort::Rating => {
                reviews.sort_by_key(|r| (Reverse(r.rating), Reverse(r.created_at), r.id))
            }
            ReviewSort::Helpful => {
                reviews.sort_by_key(|r| (Reverse(r.likes().len()), Reverse(r.created_at), r.id))
            }
        }
    }
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Clone)]
pub struct ReviewLedger {
    store: Arc<dyn DocumentStore>,
}

impl ReviewLedger {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Create a user's one review of a movie.
    ///
    /// The interaction record gets the rating and text. A record created
    /// here is also marked watched as of now; an existing record keeps its
    /// watch state.
    #[instrument(skip(self, draft))]
    pub async fn create_review(
        &self,
        user_id: UserId,
        movie_id: MovieId,
        draft: ReviewDraft,
    ) -> Result<ReviewView> {
        let rating = validation::rating(draft.rating)?;
        let text = validation::review_text(&draft.text)?;
        let title = validation::review_title(draft.title.as_deref())?;

        if self.store.find_review_by(user_id, movie_id).await?.is_some() {
            return Err(EngineError::DuplicateReview { user_id, movie_id });
        }
        let mut movie = self
            .store
            .find_movie(movie_id)
            .await?
            .ok_or(EngineError::MovieNotFound(movie_id))?;

        let now = Utc::now();
        let mut update = InteractionUpdate::new()
            .with_rating(rating)
            .with_review(text.clone());
        if movie.interaction(user_id).is_none() {
            update = update.with_watched(true);
        }
        InteractionAccessor::apply(&mut movie, user_id, &update, now)?;

        let mut review = Review::new(user_id, movie_id, rating, text, now);
        review.title = title;
        review.is_public = draft.is_public;

        self.store.upsert_review(review.clone()).await?;
        if let Err(err) = self.store.upsert_movie(movie).await {
            warn!(review_id = %review.id, "Movie write failed after review insert, removing review");
            if let Err(undo) = self.store.delete_review(review.id).await {
                error!(review_id = %review.id, error = %undo, "Could not remove orphaned review");
            }
            return Err(err.into());
        }

        info!(review_id = %review.id, user_id, movie_id, "Review created");
        Ok(ReviewView::new(review, Some(user_id)))
    }

    /// Edit a review; only its author may. Rating and text are copied onto
    /// the interaction record.
    #[instrument(skip(self, edit))]
    pub async fn update_review(
        &self,
        review_id: ReviewId,
        requester_id: UserId,
        edit: ReviewEdit,
    ) -> Result<ReviewView> {
        if edit.is_empty() {
            return Err(EngineError::validation("review update has no fields"));
        }
        let rating = edit.rating.map(validation::rating).transpose()?;
        let text = edit.text.as_deref().map(validation::review_text).transpose()?;
        let title = edit
            .title
            .as_deref()
            .map(|t| validation::review_title(Some(t)))
            .transpose()?;

        let previous = self.owned_review(review_id, requester_id).await?;
        let now = Utc::now();

        let mut review = previous.clone();
        if let Some(rating) = rating {
            review.rating = rating;
        }
        if let Some(text) = &text {
            review.text = text.clone();
        }
        if let Some(title) = title {
            review.title = title;
        }
        if let Some(is_public) = edit.is_public {
            review.is_public = is_public;
        }
        review.mark_edited(now);

        let mut update = InteractionUpdate::new();
        update.rating = rating;
        update.review = text;
        let movie = if update.is_empty() {
            None
        } else {
            self.projected_movie(review.movie_id, requester_id, &update, now)
                .await?
        };

        self.store.upsert_review(review.clone()).await?;
        if let Some(movie) = movie {
            if let Err(err) = self.store.upsert_movie(movie).await {
                warn!(%review_id, "Movie write failed after review edit, restoring review");
                if let Err(undo) = self.store.upsert_review(previous).await {
                    error!(%review_id, error = %undo, "Could not restore the edited review");
                }
                return Err(err.into());
            }
        }

        debug!(%review_id, "Review updated");
        Ok(ReviewView::new(review, Some(requester_id)))
    }

    /// Delete a review; only its author may. The inline text on the
    /// interaction record is blanked, everything else on it stays.
    #[instrument(skip(self))]
    pub async fn delete_review(&self, review_id: ReviewId, requester_id: UserId) -> Result<()> {
        let review = self.owned_review(review_id, requester_id).await?;
        let now = Utc::now();

        let mut previous_text = None;
        if let Some(mut movie) = self.store.find_movie(review.movie_id).await? {
            let movie_id = movie.id();
            previous_text = movie.interaction(requester_id).map(|r| r.review.clone());
            let cleared = movie
                .clear_review(requester_id, now)
                .map_err(|source| EngineError::Aggregation { movie_id, source })?;
            if cleared {
                self.store.upsert_movie(movie).await?;
            }
        }

        if let Err(err) = self.store.delete_review(review_id).await {
            if let Some(text) = previous_text.filter(|t| !t.is_empty()) {
                warn!(%review_id, "Review delete failed, restoring inline review text");
                let restore = InteractionUpdate::new().with_review(text);
                let restored = self
                    .restore_movie(review.movie_id, requester_id, &restore, now)
                    .await;
                if let Err(undo) = restored {
                    error!(%review_id, error = %undo, "Could not restore inline review text");
                }
            }
            return Err(err.into());
        }

        info!(%review_id, movie_id = review.movie_id, "Review deleted");
        Ok(())
    }

    pub async fn toggle_like(&self, review_id: ReviewId, user_id: UserId) -> Result<ReactionSummary> {
        self.toggle(review_id, user_id, ReactionKind::Like).await
    }

    pub async fn toggle_dislike(
        &self,
        review_id: ReviewId,
        user_id: UserId,
    ) -> Result<ReactionSummary> {
        self.toggle(review_id, user_id, ReactionKind::Dislike).await
    }

    #[instrument(skip(self))]
    async fn toggle(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        kind: ReactionKind,
    ) -> Result<ReactionSummary> {
        let mut review = self.find_visible(review_id, Some(user_id)).await?;
        if review.user_id == user_id {
            return Err(EngineError::SelfInteraction);
        }

        let summary = review.toggle(kind, user_id, Utc::now());
        self.store.upsert_review(review).await?;

        debug!(
            %review_id,
            likes = summary.like_count,
            dislikes = summary.dislike_count,
            "Reaction toggled"
        );
        Ok(summary)
    }

    /// Append a comment. Text is trimmed before the empty and length checks.
    #[instrument(skip(self, text))]
    pub async fn add_comment(
        &self,
        review_id: ReviewId,
        user_id: UserId,
        text: &str,
    ) -> Result<CommentAdded> {
        let text = validation::comment(text)?;
        let mut review = self.find_visible(review_id, Some(user_id)).await?;

        let comment = review.push_comment(user_id, text, Utc::now());
        self.store.upsert_review(review.clone()).await?;

        Ok(CommentAdded {
            comment,
            review: ReviewView::new(review, Some(user_id)),
        })
    }

    /// One review as `viewer` sees it. A private review looks missing to
    /// anyone but its author.
    pub async fn review(&self, review_id: ReviewId, viewer: Option<UserId>) -> Result<ReviewView> {
        let review = self.find_visible(review_id, viewer).await?;
        Ok(ReviewView::new(review, viewer))
    }

    // -------------------------------------------------------------------------
    // Read paths
    // -------------------------------------------------------------------------

    /// A movie's reviews. Private reviews are only shown to their author.
    pub async fn reviews_for_movie(
        &self,
        movie_id: MovieId,
        viewer: Option<UserId>,
        page: PageRequest,
        sort: ReviewSort,
    ) -> Result<Page<ReviewView>> {
        let mut reviews: Vec<Review> = self
            .store
            .list_reviews()
            .await?
            .into_iter()
            .filter(|r| r.movie_id == movie_id && visible_to(r, viewer))
            .collect();
        sort.sort(&mut reviews);
        Ok(Page::slice(reviews, page).map(|r| ReviewView::new(r, viewer)))
    }

    /// The newest few reviews of a movie, as movie details shows them
    pub async fn latest_for_movie(
        &self,
        movie_id: MovieId,
        viewer: Option<UserId>,
    ) -> Result<Vec<ReviewView>> {
        let page = validation::page(1, RECENT_REVIEWS_PER_MOVIE)?;
        Ok(self
            .reviews_for_movie(movie_id, viewer, page, ReviewSort::Recent)
            .await?
            .items)
    }

    /// Public reviews across all movies, newest first
    pub async fn recent_reviews(
        &self,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<ReviewView>> {
        self.newest_where(viewer, page, |r| r.is_public).await
    }

    /// Public reviews by everyone the user follows, newest first
    #[instrument(skip(self))]
    pub async fn following_feed(&self, user_id: UserId, page: PageRequest) -> Result<Page<ReviewView>> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(EngineError::UserNotFound(user_id))?;
        if user.following.is_empty() {
            return Ok(Page::empty(page));
        }

        let following: HashSet<UserId> = user.following.iter().copied().collect();
        self.newest_where(Some(user_id), page, |r| {
            r.is_public && following.contains(&r.user_id)
        })
        .await
    }

    /// One user's reviews, newest first; private ones only for that user
    pub async fn reviews_by_user(
        &self,
        author_id: UserId,
        viewer: Option<UserId>,
        page: PageRequest,
    ) -> Result<Page<ReviewView>> {
        self.newest_where(viewer, page, |r| r.user_id == author_id && visible_to(r, viewer))
            .await
    }

    /// How many reviews a user has written
    pub async fn review_count(&self, user_id: UserId) -> Result<usize> {
        Ok(self
            .store
            .list_reviews()
            .await?
            .iter()
            .filter(|r| r.user_id == user_id)
            .count())
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn newest_where(
        &self,
        viewer: Option<UserId>,
        page: PageRequest,
        keep: impl Fn(&Review) -> bool + Send,
    ) -> Result<Page<ReviewView>> {
        let mut reviews: Vec<Review> = self
            .store
            .list_reviews()
            .await?
            .into_iter()
            .filter(|r| keep(r))
            .collect();
        ReviewSort::Recent.sort(&mut reviews);
        Ok(Page::slice(reviews, page).map(|r| ReviewView::new(r, viewer)))
    }

    async fn find(&self, review_id: ReviewId) -> Result<Review> {
        self.store
            .find_review(review_id)
            .await?
            .ok_or(EngineError::ReviewNotFound(review_id))
    }

    async fn find_visible(&self, review_id: ReviewId, viewer: Option<UserId>) -> Result<Review> {
        let review = self.find(review_id).await?;
        if !visible_to(&review, viewer) {
            return Err(EngineError::ReviewNotFound(review_id));
        }
        Ok(review)
    }

    async fn owned_review(&self, review_id: ReviewId, requester_id: UserId) -> Result<Review> {
        let review = self.find(review_id).await?;
        if review.user_id != requester_id {
            return Err(EngineError::Forbidden {
                review_id,
                user_id: requester_id,
            });
        }
        Ok(review)
    }

    async fn restore_movie(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        update: &InteractionUpdate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(movie) = self.projected_movie(movie_id, user_id, update, now).await? {
            self.store.upsert_movie(movie).await?;
        }
        Ok(())
    }

    /// The review's movie with `update` applied in memory, or `None` when
    /// the movie document is missing
    async fn projected_movie(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        update: &InteractionUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<Movie>> {
        let Some(mut movie) = self.store.find_movie(movie_id).await? else {
            warn!(movie_id, "Review points at a missing movie, skipping interaction sync");
            return Ok(None);
        };
        InteractionAccessor::apply(&mut movie, user_id, update, now)?;
        Ok(Some(movie))
    }
}

fn visible_to(review: &Review, viewer: Option<UserId>) -> bool {
    review.is_public || viewer == Some(review.user_id)
}
