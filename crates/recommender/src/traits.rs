//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable
//! filters to be applied to candidate sets.

use crate::candidate::Candidate;
use crate::context::ViewerContext;
use anyhow::Result;

/// Core trait for filtering candidates.
///
/// All filters must implement this trait to be used in the FilterPipeline.
///
/// ## Design Note
/// - `Send + Sync` lets a pipeline be shared by concurrent requests
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec,
///   and may annotate the candidates they keep
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    ///
    /// # Arguments
    /// * `candidates` - The candidates to filter (takes ownership)
    /// * `context` - Viewer context holding watch history and genre counts
    fn apply(&self, candidates: Vec<Candidate>, context: &ViewerContext)
    -> Result<Vec<Candidate>>;
}
