//! JSON snapshots of the whole document set.
//!
//! A snapshot is one file holding every movie, review and user document.
//! Loading always recomputes movie stats from interactions, so a file
//! edited by hand (or written by an older build) cannot smuggle in stale
//! aggregates.

use crate::error::Result;
use crate::stats;
use crate::types::{Movie, Review, User};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Every document, grouped by collection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub movies: Vec<Movie>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Snapshot {
    /// Read a snapshot file.
    ///
    /// A missing file is an empty snapshot; anything else that goes wrong
    /// is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(?path, "No snapshot file, starting empty");
            return Ok(Self::default());
        }

        let bytes = fs::read(path)?;
        let mut snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        stats::recompute_all(&mut snapshot.movies)?;

        info!(
            movies = snapshot.movies.len(),
            reviews = snapshot.reviews.len(),
            users = snapshot.users.len(),
            "Loaded snapshot from {:?}",
            path
        );
        Ok(snapshot)
    }

    /// Write the snapshot as pretty JSON, replacing the file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        debug!(?path, movies = self.movies.len(), "Saved snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::types::{CatalogMovie, InteractionUpdate};
    use chrono::Utc;
    use std::path::PathBuf;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("reeldeal-snapshot-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_missing_file_is_empty() {
        let snapshot = Snapshot::load(&scratch_path()).unwrap();
        assert!(snapshot.movies.is_empty());
        assert!(snapshot.users.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let now = Utc::now();
        let mut movie = Movie::new(CatalogMovie::new(603, "The Matrix"), now);
        movie
            .apply_interaction(1, &InteractionUpdate::new().with_rating(5).with_watched(true), now)
            .unwrap();
        let snapshot = Snapshot {
            movies: vec![movie],
            reviews: vec![Review::new(1, 603, 5, "Red pill, every single time", now)],
            users: vec![User::new(1, "neo", now)],
        };

        let path = scratch_path();
        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.movies.len(), 1);
        assert_eq!(loaded.movies[0].stats().total_watched, 1);
        assert_eq!(loaded.reviews, snapshot.reviews);
        assert_eq!(loaded.users, snapshot.users);
    }

    #[test]
    fn test_stale_stats_are_recomputed_on_load() {
        let path = scratch_path();
        std::fs::write(
            &path,
            r#"{
                "movies": [{
                    "catalog": { "id": 1, "title": "Alien" },
                    "interactions": {
                        "4": { "rating": 4, "watched": true, "created_at": "2024-01-01T00:00:00Z" }
                    },
                    "stats": { "average_rating": 1.0, "total_ratings": 9, "total_reviews": 0,
                               "total_watched": 0, "total_watchlist": 0, "total_favorites": 0 },
                    "created_at": "2024-01-01T00:00:00Z",
                    "updated_at": "2024-01-01T00:00:00Z"
                }]
            }"#,
        )
        .unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let stats = loaded.movies[0].stats();
        assert_eq!(stats.total_ratings, 1);
        assert_eq!(stats.total_watched, 1);
        assert!((stats.average_rating - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_malformed_file_is_a_format_error() {
        let path = scratch_path();
        std::fs::write(&path, "{ not json").unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err, StoreError::FormatError(_)));
    }
}
