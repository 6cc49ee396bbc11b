//! Catalog lookup client.
//!
//! Movie metadata comes from an external catalog. This crate provides:
//! - `CatalogClient`, the seam the engine looks movies up through
//! - `HttpCatalogClient`, which talks to a TMDB-style HTTP API
//! - `StaticCatalog`, a fixed in-memory catalog for tests and offline runs
//!
//! Every failure collapses to one of three kinds (`NotFound`,
//! `Unauthorized`, `Unavailable`). Callers decide whether a failed lookup
//! is fatal; rating actions can fall back to caller-supplied metadata.

use async_trait::async_trait;
use store::{CatalogMovie, MovieId};
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::HttpCatalogClient;
pub use memory::StaticCatalog;

/// Errors that can occur when looking a movie up in the catalog
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Movie {0} not found in catalog")]
    NotFound(MovieId),

    #[error("Catalog rejected the API key (or none is configured)")]
    Unauthorized,

    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Source of movie metadata
#[async_trait]
pub trait CatalogClient: Send + Sync {
    async fn fetch_catalog_movie(&self, id: MovieId) -> Result<CatalogMovie>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}
