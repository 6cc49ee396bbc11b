//! Filter implementations for the candidate pipeline.

pub mod already_watched;
pub mod genre_preference;
pub mod minimum_rating;

pub use already_watched::AlreadyWatchedFilter;
pub use genre_preference::GenrePreferenceFilter;
pub use minimum_rating::MinimumRatingFilter;
