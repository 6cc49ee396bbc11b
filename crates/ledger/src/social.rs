//! Social graph accessor.
//!
//! A follow edge lives in two documents: `following` on the follower and
//! `followers` on the target. The store cannot write both at once, so
//! follow and unfollow are two-step:
//!
//! 1. update the follower's `following` list (the source of truth)
//! 2. update the target's `followers` list (a back-reference)
//!
//! A failure between the steps leaves the back-reference out of date. It
//! is repaired by read-repair: `follow`/`unfollow` fix the edge they touch
//! even when they go on to report `AlreadyFollowing`/`NotFollowing`, and
//! `reconcile_follows` sweeps every edge of one user.

use crate::error::{EngineError, Result};
use serde::Serialize;
use std::sync::Arc;
use store::{DocumentStore, Page, PageRequest, User, UserId};
use tracing::{debug, info, instrument, warn};

/// Just enough of a user to list them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// What a reconciliation pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Back-references added to the `followers` of users this one follows
    pub back_references_added: usize,
    /// Entries dropped from this user's `followers` with no matching edge
    pub stale_followers_dropped: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.back_references_added == 0 && self.stale_followers_dropped == 0
    }
}

#[derive(Clone)]
pub struct SocialGraph {
    store: Arc<dyn DocumentStore>,
}

impl SocialGraph {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn follow(&self, follower_id: UserId, target_id: UserId) -> Result<()> {
        if follower_id == target_id {
            return Err(EngineError::SelfFollow);
        }
        let mut follower = self.user(follower_id).await?;
        let mut target = self.user(target_id).await?;

        if follower.is_following(target_id) {
            if !target.has_follower(follower_id) {
                warn!(follower_id, target_id, "Repairing missing follower back-reference");
                target.followers.push(follower_id);
                self.store.upsert_user(target).await?;
            }
            return Err(EngineError::AlreadyFollowing {
                follower: follower_id,
                target: target_id,
            });
        }

        follower.following.push(target_id);
        self.store.upsert_user(follower).await?;

        if !target.has_follower(follower_id) {
            target.followers.push(follower_id);
            self.store.upsert_user(target).await?;
        }

        info!(follower_id, target_id, "Followed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower_id: UserId, target_id: UserId) -> Result<()> {
        let mut follower = self.user(follower_id).await?;
        let mut target = self.user(target_id).await?;

        if !follower.is_following(target_id) {
            if target.has_follower(follower_id) {
                warn!(follower_id, target_id, "Dropping stale follower back-reference");
                target.followers.retain(|&id| id != follower_id);
                self.store.upsert_user(target).await?;
            }
            return Err(EngineError::NotFollowing {
                follower: follower_id,
                target: target_id,
            });
        }

        follower.following.retain(|&id| id != target_id);
        self.store.upsert_user(follower).await?;

        if target.has_follower(follower_id) {
            target.followers.retain(|&id| id != follower_id);
            self.store.upsert_user(target).await?;
        }

        info!(follower_id, target_id, "Unfollowed");
        Ok(())
    }

    /// Bring every edge touching `user_id` back in line with the
    /// `following` lists.
    ///
    /// Outgoing: each followed user gets the back-reference if it is
    /// missing. Incoming: `followers` entries whose owner no longer follows
    /// this user (or no longer exists) are dropped. Followed users that do
    /// not exist are left alone; there is no document to repair.
    #[instrument(skip(self))]
    pub async fn reconcile_follows(&self, user_id: UserId) -> Result<ReconcileReport> {
        let mut user = self.user(user_id).await?;
        let mut report = ReconcileReport::default();

        for &target_id in &user.following {
            match self.store.find_user(target_id).await? {
                Some(mut target) if !target.has_follower(user_id) => {
                    target.followers.push(user_id);
                    self.store.upsert_user(target).await?;
                    report.back_references_added += 1;
                }
                Some(_) => {}
                None => debug!(user_id, target_id, "Followed user no longer exists"),
            }
        }

        let mut kept = Vec::with_capacity(user.followers.len());
        for &follower_id in &user.followers {
            let follows = self
                .store
                .find_user(follower_id)
                .await?
                .is_some_and(|f| f.is_following(user_id));
            if follows && !kept.contains(&follower_id) {
                kept.push(follower_id);
            } else {
                report.stale_followers_dropped += 1;
            }
        }
        if report.stale_followers_dropped > 0 {
            user.followers = kept;
            self.store.upsert_user(user).await?;
        }

        if !report.is_clean() {
            info!(
                user_id,
                added = report.back_references_added,
                dropped = report.stale_followers_dropped,
                "Reconciled follow edges"
            );
        }
        Ok(report)
    }

    /// Users following `user_id`, in the order they followed
    pub async fn followers(&self, user_id: UserId, page: PageRequest) -> Result<Page<UserSummary>> {
        let user = self.user(user_id).await?;
        self.summaries(&user.followers, page).await
    }

    /// Users `user_id` follows, in the order they were followed
    pub async fn following(&self, user_id: UserId, page: PageRequest) -> Result<Page<UserSummary>> {
        let user = self.user(user_id).await?;
        self.summaries(&user.following, page).await
    }

    async fn summaries(&self, ids: &[UserId], page: PageRequest) -> Result<Page<UserSummary>> {
        let mut summaries = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.store.find_user(id).await? {
                Some(user) => summaries.push(UserSummary::from(&user)),
                None => debug!(user_id = id, "Skipping reference to missing user"),
            }
        }
        Ok(Page::slice(summaries, page))
    }

    async fn user(&self, user_id: UserId) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or(EngineError::UserNotFound(user_id))
    }
}
