//! Service crate for the ReelDeal engine.
//!
//! This crate contains the orchestrator that wires the catalog, the
//! ledger components and the recommender over one document store, plus
//! the environment-driven configuration.

pub mod config;
pub mod error;
pub mod orchestrator;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use orchestrator::{MetadataSource, MovieDetails, RateOutcome, ReelDeal, ReviewSync};
