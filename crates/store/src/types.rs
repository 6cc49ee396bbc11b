//! Core domain types for the ReelDeal movie ledger.
//!
//! This module defines the documents the store persists:
//! - `Movie`: catalog metadata plus every user's interaction record and derived stats
//! - `Review`: the rich, social form of a user's opinion of a movie
//! - `User`: follower/following references and a denormalized stats block
//!
//! Movies guard their own invariant: `stats` is only ever written together
//! with the interaction map it was computed from.

use crate::error::AggregationError;
use crate::stats;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// =============================================================================
// Type Aliases
// =============================================================================

/// Identifier issued by the external user service
pub type UserId = u32;

/// Identifier from the external movie catalog (stable, unique)
pub type MovieId = u32;

/// Identifier of a review document
pub type ReviewId = Uuid;

// =============================================================================
// Catalog Metadata
// =============================================================================

/// Movie metadata as the catalog reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Genre names in the order the catalog lists them
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Catalog's own 0-10 vote average; unrelated to user ratings
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub popularity: f32,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
}

impl CatalogMovie {
    /// Minimal metadata: everything but id and title left empty
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            original_title: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            runtime: None,
            genres: Vec::new(),
            language: None,
            vote_average: 0.0,
            vote_count: 0,
            popularity: 0.0,
            tagline: None,
            imdb_id: None,
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_popularity(mut self, popularity: f32) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_release_date(mut self, release_date: NaiveDate) -> Self {
        self.release_date = Some(release_date);
        self
    }

    pub fn with_poster_path(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }
}

// =============================================================================
// Interaction Records
// =============================================================================

/// One user's compact opinion of one movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// 1-5, with 0 meaning "unset"
    #[serde(default)]
    pub rating: u8,
    /// Inline copy of the review text; empty when there is none
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub watched: bool,
    #[serde(default)]
    pub watchlist: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub watched_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    /// A record with every field at its default
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            rating: 0,
            review: String::new(),
            watched: false,
            watchlist: false,
            favorite: false,
            watched_date: None,
            created_at,
        }
    }

    pub fn is_rated(&self) -> bool {
        self.rating > 0
    }

    pub fn has_review(&self) -> bool {
        !self.review.trim().is_empty()
    }

    /// Watchlist membership as every read path sees it.
    ///
    /// `watched` and `watchlist` are stored independently; a watched movie
    /// has left the watchlist even when the flag was never cleared.
    pub fn on_watchlist(&self) -> bool {
        self.watchlist && !self.watched
    }

    /// Overwrite each supplied field; untouched fields keep their value.
    ///
    /// `watched_date` follows `watched`: a false -> true transition stamps
    /// `now`, a true -> false transition clears it, and an explicit date in
    /// the same update always wins.
    pub fn apply(&mut self, update: &InteractionUpdate, now: DateTime<Utc>) {
        if let Some(rating) = update.rating {
            self.rating = rating;
        }
        if let Some(review) = &update.review {
            self.review = review.clone();
        }
        if let Some(watchlist) = update.watchlist {
            self.watchlist = watchlist;
        }
        if let Some(favorite) = update.favorite {
            self.favorite = favorite;
        }
        if let Some(watched) = update.watched {
            match (self.watched, watched) {
                (false, true) => self.watched_date = Some(now),
                (true, false) => self.watched_date = None,
                _ => {}
            }
            self.watched = watched;
        }
        if let Some(date) = update.watched_date {
            self.watched_date = Some(date);
        }
    }
}

/// Partial update of an interaction record; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionUpdate {
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub watched: Option<bool>,
    #[serde(default)]
    pub watchlist: Option<bool>,
    #[serde(default)]
    pub favorite: Option<bool>,
    #[serde(default)]
    pub watched_date: Option<DateTime<Utc>>,
}

impl InteractionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field is supplied at all
    pub fn is_empty(&self) -> bool {
        self.rating.is_none()
            && self.review.is_none()
            && self.watched.is_none()
            && self.watchlist.is_none()
            && self.favorite.is_none()
            && self.watched_date.is_none()
    }

    pub fn with_rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.review = Some(review.into());
        self
    }

    pub fn with_watched(mut self, watched: bool) -> Self {
        self.watched = Some(watched);
        self
    }

    pub fn with_watchlist(mut self, watchlist: bool) -> Self {
        self.watchlist = Some(watchlist);
        self
    }

    pub fn with_favorite(mut self, favorite: bool) -> Self {
        self.favorite = Some(favorite);
        self
    }

    pub fn with_watched_date(mut self, watched_date: DateTime<Utc>) -> Self {
        self.watched_date = Some(watched_date);
        self
    }
}

// =============================================================================
// Statistics Types
// =============================================================================

/// Aggregate statistics for a movie, derived purely from its interactions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieStats {
    pub average_rating: f32,
    pub total_ratings: u32,
    pub total_reviews: u32,
    pub total_watched: u32,
    pub total_watchlist: u32,
    pub total_favorites: u32,
}

// =============================================================================
// Movie Document
// =============================================================================

/// A movie document: catalog metadata, one interaction record per user,
/// and the stats derived from those records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub catalog: CatalogMovie,
    #[serde(default)]
    interactions: BTreeMap<UserId, InteractionRecord>,
    #[serde(default)]
    stats: MovieStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// A freshly registered movie with no interactions
    pub fn new(catalog: CatalogMovie, now: DateTime<Utc>) -> Self {
        Self {
            catalog,
            interactions: BTreeMap::new(),
            stats: MovieStats::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> MovieId {
        self.catalog.id
    }

    pub fn stats(&self) -> &MovieStats {
        &self.stats
    }

    pub fn interactions(&self) -> &BTreeMap<UserId, InteractionRecord> {
        &self.interactions
    }

    pub fn interaction(&self, user_id: UserId) -> Option<&InteractionRecord> {
        self.interactions.get(&user_id)
    }

    /// Replace catalog metadata, keeping the movie id, interactions and stats
    pub fn refresh_catalog(&mut self, catalog: CatalogMovie, now: DateTime<Utc>) {
        let id = self.catalog.id;
        self.catalog = catalog;
        self.catalog.id = id;
        self.updated_at = now;
    }

    /// Create or update one user's record and recompute stats.
    ///
    /// Works on a copy of the interaction map: if aggregation fails the
    /// movie is left exactly as it was.
    pub fn apply_interaction(
        &mut self,
        user_id: UserId,
        update: &InteractionUpdate,
        now: DateTime<Utc>,
    ) -> Result<InteractionRecord, AggregationError> {
        let mut interactions = self.interactions.clone();
        let record = interactions
            .entry(user_id)
            .or_insert_with(|| InteractionRecord::new(now));
        record.apply(update, now);
        let record = record.clone();

        self.commit(interactions, now)?;
        Ok(record)
    }

    /// Blank one user's inline review text, leaving rating and flags alone.
    ///
    /// Returns `false` when there was no text to clear.
    pub fn clear_review(
        &mut self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, AggregationError> {
        match self.interactions.get(&user_id) {
            Some(record) if !record.review.is_empty() => {}
            _ => return Ok(false),
        }

        let mut interactions = self.interactions.clone();
        if let Some(record) = interactions.get_mut(&user_id) {
            record.review.clear();
        }
        self.commit(interactions, now)?;
        Ok(true)
    }

    /// Recompute stats from the current interactions
    pub fn recompute_stats(&mut self) -> Result<&MovieStats, AggregationError> {
        self.stats = stats::aggregate(&self.interactions)?;
        Ok(&self.stats)
    }

    fn commit(
        &mut self,
        interactions: BTreeMap<UserId, InteractionRecord>,
        now: DateTime<Utc>,
    ) -> Result<(), AggregationError> {
        let stats = stats::aggregate(&interactions)?;
        self.interactions = interactions;
        self.stats = stats;
        self.updated_at = now;
        Ok(())
    }
}

// =============================================================================
// Review Document
// =============================================================================

/// Which of a review's two reaction sets a toggle targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    Like,
    Dislike,
}

/// A like or dislike left on a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A comment appended to a review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Reaction counts plus one viewer's own state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub like_count: usize,
    pub dislike_count: usize,
    pub user_has_liked: bool,
    pub user_has_disliked: bool,
}

/// A user's review of a movie; at most one per (user, movie) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: u8,
    pub text: String,
    #[serde(default)]
    pub title: Option<String>,
    pub is_public: bool,
    #[serde(default)]
    likes: Vec<Reaction>,
    #[serde(default)]
    dislikes: Vec<Reaction>,
    #[serde(default)]
    comments: Vec<Comment>,
    #[serde(default)]
    pub is_edited: bool,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_flagged: bool,
    #[serde(default)]
    pub flag_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Review {
    /// A public, unedited review with a fresh id
    pub fn new(
        user_id: UserId,
        movie_id: MovieId,
        rating: u8,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            movie_id,
            rating,
            text: text.into(),
            title: None,
            is_public: true,
            likes: Vec::new(),
            dislikes: Vec::new(),
            comments: Vec::new(),
            is_edited: false,
            edited_at: None,
            is_flagged: false,
            flag_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn likes(&self) -> &[Reaction] {
        &self.likes
    }

    pub fn dislikes(&self) -> &[Reaction] {
        &self.dislikes
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn has_user_liked(&self, user_id: UserId) -> bool {
        self.likes.iter().any(|r| r.user_id == user_id)
    }

    pub fn has_user_disliked(&self, user_id: UserId) -> bool {
        self.dislikes.iter().any(|r| r.user_id == user_id)
    }

    /// Toggle `user_id` in the `kind` set.
    ///
    /// Already present: removed. Absent: added, and removed from the
    /// opposite set, so a user sits in at most one of the two.
    pub fn toggle(
        &mut self,
        kind: ReactionKind,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> ReactionSummary {
        let (target, opposite) = match kind {
            ReactionKind::Like => (&mut self.likes, &mut self.dislikes),
            ReactionKind::Dislike => (&mut self.dislikes, &mut self.likes),
        };

        if let Some(pos) = target.iter().position(|r| r.user_id == user_id) {
            target.remove(pos);
        } else {
            target.push(Reaction {
                user_id,
                created_at: now,
            });
            opposite.retain(|r| r.user_id != user_id);
        }

        self.updated_at = now;
        self.reactions_for(Some(user_id))
    }

    /// Counts, plus the viewer's own like/dislike state when given
    pub fn reactions_for(&self, viewer: Option<UserId>) -> ReactionSummary {
        ReactionSummary {
            like_count: self.likes.len(),
            dislike_count: self.dislikes.len(),
            user_has_liked: viewer.is_some_and(|id| self.has_user_liked(id)),
            user_has_disliked: viewer.is_some_and(|id| self.has_user_disliked(id)),
        }
    }

    /// Append a comment; comments are never edited or removed
    pub fn push_comment(
        &mut self,
        user_id: UserId,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Comment {
        let comment = Comment {
            user_id,
            text: text.into(),
            created_at: now,
        };
        self.comments.push(comment.clone());
        self.updated_at = now;
        comment
    }

    pub fn mark_edited(&mut self, now: DateTime<Utc>) {
        self.is_edited = true;
        self.edited_at = Some(now);
        self.updated_at = now;
    }
}

// =============================================================================
// User Document
// =============================================================================

/// Denormalized profile numbers; refreshed by the user-profile service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub movies_watched: u32,
    pub reviews_written: u32,
    pub followers_count: u32,
    pub following_count: u32,
}

/// A user as far as the social graph is concerned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub followers: Vec<UserId>,
    #[serde(default)]
    pub following: Vec<UserId>,
    #[serde(default)]
    pub stats: UserStats,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: UserId, username: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            followers: Vec::new(),
            following: Vec::new(),
            stats: UserStats::default(),
            created_at: now,
        }
    }

    pub fn is_following(&self, user_id: UserId) -> bool {
        self.following.contains(&user_id)
    }

    pub fn has_follower(&self, user_id: UserId) -> bool {
        self.followers.contains(&user_id)
    }
}
