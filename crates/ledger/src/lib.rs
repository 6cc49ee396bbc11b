//! # Ledger Crate
//!
//! The write side of the ReelDeal engine: everything that records what a
//! user thinks of a movie, and who follows whom.
//!
//! ## Main Components
//!
//! - **interactions**: per-user interaction records on movie documents, plus the
//!   watchlist / watched / favorites read paths
//! - **reviews**: the review ledger (create, edit, delete, reactions, comments) and
//!   the review feeds
//! - **social**: follow / unfollow with read-repair of the two-document edge
//! - **profile**: the numbers behind a user's profile stats
//! - **validation**: input limits shared by the operations above
//! - **error**: `EngineError` and its coarse `ErrorKind`
//!
//! Every component holds an `Arc<dyn DocumentStore>` and is cheap to clone.

pub mod error;
pub mod interactions;
pub mod profile;
pub mod reviews;
pub mod social;
pub mod validation;

pub use error::{EngineError, ErrorKind, Result};
pub use interactions::{InteractionAccessor, UserMovie};
pub use profile::ProfileStats;
pub use reviews::{CommentAdded, ReviewDraft, ReviewEdit, ReviewLedger, ReviewSort, ReviewView};
pub use social::{ReconcileReport, SocialGraph, UserSummary};
