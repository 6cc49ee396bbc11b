//! Genre-affinity recommendations over aggregated movie documents.
//!
//! This crate provides:
//! - ViewerContext: a user's watched set and genre histogram
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Ranking and pagination of the surviving candidates
//! - Recommender, which ties the stages together
//!
//! ## Architecture
//! A request runs in stages:
//! 1. Build the viewer context from the movies they marked watched
//! 2. Turn every movie document into a candidate
//! 3. Filters remove unwanted candidates (already watched, low rated, wrong genre)
//! 4. Survivors are ranked and sliced into the requested page
//!
//! ## Example Usage
//! ```ignore
//! use recommender::{Recommender, RecommenderConfig};
//! use store::PageRequest;
//!
//! let engine = Recommender::new(RecommenderConfig::default());
//! let page = engine.recommend(user_id, &movies, PageRequest::new(1, 20).unwrap())?;
//! ```
//!
//! The engine is synchronous and CPU bound; async callers should run it on
//! a blocking thread.

pub mod candidate;
pub mod context;
pub mod engine;
pub mod filter_pipeline;
pub mod filters;
pub mod ranking;
pub mod traits;

pub use candidate::Candidate;
pub use context::{ViewerContext, build_viewer_context};
pub use engine::{
    FALLBACK_REASON, RecommendationPage, RecommendedMovie, Recommender, RecommenderConfig,
    genre_reason,
};
pub use filter_pipeline::FilterPipeline;
pub use traits::Filter;
