use anyhow::{Context, Result, ensure};
use recommender::RecommenderConfig;
use serde::Deserialize;
use std::sync::Arc;

use catalog::{CatalogClient, HttpCatalogClient};

/// Prefix of every environment variable the service reads
pub const ENV_PREFIX: &str = "REELDEAL_";

/// Service configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Catalog API base URL
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Catalog API key; without one every lookup is refused
    #[serde(default)]
    pub catalog_api_key: Option<String>,

    /// Inclusive floor on a recommended movie's average rating
    #[serde(default = "default_min_average_rating")]
    pub min_average_rating: f32,

    /// How many favourite genres recommendations match against
    #[serde(default = "default_top_genres")]
    pub top_genres: usize,

    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

fn default_catalog_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_min_average_rating() -> f32 {
    6.0
}

fn default_top_genres() -> usize {
    3
}

fn default_page_size() -> usize {
    20
}

fn default_max_page_size() -> usize {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            catalog_api_key: None,
            min_average_rating: default_min_average_rating(),
            top_genres: default_top_genres(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from `REELDEAL_*` environment variables, after
    /// reading an optional `.env` file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<ServiceConfig>()
            .context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_average_rating.is_finite(),
            "min_average_rating must be a finite number"
        );
        ensure!(self.top_genres >= 1, "top_genres must be at least 1");
        ensure!(
            self.default_page_size >= 1 && self.default_page_size <= self.max_page_size,
            "default_page_size must be between 1 and max_page_size ({}), got {}",
            self.max_page_size,
            self.default_page_size
        );
        Ok(())
    }

    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            min_average_rating: self.min_average_rating,
            top_genres: self.top_genres,
        }
    }

    pub fn catalog_client(&self) -> Arc<dyn CatalogClient> {
        Arc::new(HttpCatalogClient::new(
            self.catalog_url.clone(),
            self.catalog_api_key.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ServiceConfig> {
        let vars = pairs
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string()));
        let config = envy::prefixed(ENV_PREFIX).from_iter::<_, ServiceConfig>(vars)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.recommender_config(), RecommenderConfig::default());
        assert!(config.catalog_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("CATALOG_API_KEY", "secret"),
            ("MIN_AVERAGE_RATING", "3.5"),
            ("TOP_GENRES", "2"),
            ("DEFAULT_PAGE_SIZE", "10"),
        ])
        .unwrap();
        assert_eq!(config.catalog_api_key.as_deref(), Some("secret"));
        assert_eq!(config.recommender_config().min_average_rating, 3.5);
        assert_eq!(config.top_genres, 2);
        assert_eq!(config.default_page_size, 10);
    }

    #[test]
    fn test_default_page_size_above_max_is_rejected() {
        assert!(from_pairs(&[("DEFAULT_PAGE_SIZE", "500")]).is_err());
        assert!(from_pairs(&[("TOP_GENRES", "0")]).is_err());
    }
}
