//! A fixed, in-memory catalog.

use crate::{CatalogClient, CatalogError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use store::{CatalogMovie, MovieId};

/// Serves lookups from a map; unknown ids are `NotFound`.
///
/// `offline()` builds a catalog that is unreachable for every id, which is
/// how the CLI runs when no API key is configured.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    movies: HashMap<MovieId, CatalogMovie>,
    offline: bool,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog whose every lookup fails with `Unavailable`
    pub fn offline() -> Self {
        Self {
            movies: HashMap::new(),
            offline: true,
        }
    }

    pub fn with_movie(mut self, movie: CatalogMovie) -> Self {
        self.movies.insert(movie.id, movie);
        self
    }

    pub fn insert(&mut self, movie: CatalogMovie) {
        self.movies.insert(movie.id, movie);
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}

impl FromIterator<CatalogMovie> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = CatalogMovie>>(iter: I) -> Self {
        Self {
            movies: iter.into_iter().map(|m| (m.id, m)).collect(),
            offline: false,
        }
    }
}

#[async_trait]
impl CatalogClient for StaticCatalog {
    async fn fetch_catalog_movie(&self, id: MovieId) -> Result<CatalogMovie> {
        if self.offline {
            return Err(CatalogError::Unavailable("catalog is offline".to_string()));
        }
        self.movies.get(&id).cloned().ok_or(CatalogError::NotFound(id))
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup() {
        let catalog: StaticCatalog = [
            CatalogMovie::new(1, "Alien").with_genres(["Horror", "Science Fiction"]),
            CatalogMovie::new(2, "Aliens"),
        ]
        .into_iter()
        .collect();

        assert_eq!(catalog.len(), 2);
        let alien = catalog.fetch_catalog_movie(1).await.unwrap();
        assert_eq!(alien.genres, vec!["Horror", "Science Fiction"]);
        assert_eq!(
            catalog.fetch_catalog_movie(3).await.unwrap_err(),
            CatalogError::NotFound(3)
        );
    }

    #[tokio::test]
    async fn test_offline_catalog() {
        let catalog = StaticCatalog::offline();
        assert!(matches!(
            catalog.fetch_catalog_movie(1).await,
            Err(CatalogError::Unavailable(_))
        ));
    }
}
