//! Inputs for the user profile stats block.
//!
//! The profile service decides when to refresh `User::stats`; this module
//! only computes the numbers from the engine's own documents.

use crate::error::{EngineError, Result};
use crate::interactions::InteractionAccessor;
use crate::reviews::ReviewLedger;
use std::sync::Arc;
use store::{DocumentStore, UserId, UserStats};

#[derive(Clone)]
pub struct ProfileStats {
    store: Arc<dyn DocumentStore>,
    interactions: InteractionAccessor,
    reviews: ReviewLedger,
}

impl ProfileStats {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            interactions: InteractionAccessor::new(store.clone()),
            reviews: ReviewLedger::new(store.clone()),
            store,
        }
    }

    /// Movies watched, reviews written, follower and following counts
    pub async fn profile_stats(&self, user_id: UserId) -> Result<UserStats> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(EngineError::UserNotFound(user_id))?;

        let (watched, reviews) = tokio::try_join!(
            self.interactions.watched_count(user_id),
            self.reviews.review_count(user_id),
        )?;

        Ok(UserStats {
            movies_watched: watched as u32,
            reviews_written: reviews as u32,
            followers_count: user.followers.len() as u32,
            following_count: user.following.len() as u32,
        })
    }
}
