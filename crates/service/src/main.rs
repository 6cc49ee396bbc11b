//! Demo harness for the ReelDeal service.
//!
//! Seeds an in-memory store from a small static catalog, records a few
//! interactions and prints the resulting recommendations. Recommendation
//! settings come from `REELDEAL_*` variables.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog::StaticCatalog;
use chrono::NaiveDate;
use service::{ReelDeal, ServiceConfig};
use store::{CatalogMovie, InteractionUpdate, MemoryStore};

fn demo_catalog() -> StaticCatalog {
    let movies = [
        (1, "Heat", &["Action", "Crime"][..], 48.0, (1995, 12, 15)),
        (2, "Ronin", &["Action", "Thriller"][..], 31.0, (1998, 9, 25)),
        (3, "Arrival", &["Drama", "Science Fiction"][..], 62.0, (2016, 11, 11)),
        (4, "Mad Max: Fury Road", &["Action", "Adventure"][..], 88.0, (2015, 5, 15)),
        (5, "Collateral", &["Crime", "Thriller"][..], 40.0, (2004, 8, 6)),
        (6, "Paddington 2", &["Comedy", "Family"][..], 35.0, (2017, 11, 10)),
    ];
    movies
        .into_iter()
        .map(|(id, title, genres, popularity, (y, m, d))| {
            let movie = CatalogMovie::new(id, title)
                .with_genres(genres.iter().copied())
                .with_popularity(popularity);
            match NaiveDate::from_ymd_opt(y, m, d) {
                Some(date) => movie.with_release_date(date),
                None => movie,
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting ReelDeal demo harness");
    let config = ServiceConfig::from_env()?;
    info!(
        "Recommendation threshold {} over top {} genres",
        config.min_average_rating, config.top_genres
    );

    let service = ReelDeal::new(
        Arc::new(MemoryStore::new()),
        Arc::new(demo_catalog()),
        config,
    );
    for (id, name) in [(1, "neil"), (2, "chris"), (3, "eady")] {
        service.register_user(id, name).await?;
    }

    // Ratings from the other two users give the catalog its averages
    for (user, movie, rating) in [(2, 4, 5), (3, 4, 4), (2, 5, 4), (3, 3, 5), (2, 6, 3)] {
        service
            .rate_movie(movie, user, InteractionUpdate::new().with_rating(rating), None)
            .await?;
    }

    // Neil watches two Action movies and reviews one
    let outcome = service
        .rate_movie(
            1,
            1,
            InteractionUpdate::new()
                .with_rating(5)
                .with_watched(true)
                .with_review("The harbour shootout still holds up."),
            None,
        )
        .await?;
    info!("Rated Heat: review {:?}", outcome.review);
    service
        .rate_movie(2, 1, InteractionUpdate::new().with_watched(true), None)
        .await?;
    service.follow(1, 2).await?;

    let page = service.page(None, Some(10))?;
    for user_id in [1, 3] {
        let result = service.recommend(user_id, page).await?;
        info!(
            "User {} gets {} of {} recommendations (top genres: {:?})",
            user_id,
            result.movies.len(),
            result.total_results,
            result.top_genres
        );
        for (i, movie) in result.movies.iter().enumerate() {
            info!(
                "{}. {} ({:.1}) - {}",
                i + 1,
                movie.title,
                movie.average_rating,
                movie.match_reason
            );
        }
        if result.is_personalized() && result.movies.is_empty() {
            info!("Nothing clears the threshold; ratings top out at 5, try REELDEAL_MIN_AVERAGE_RATING=3.5");
        }
    }

    let stats = service.profile_stats(1).await?;
    info!(
        "User 1 watched {}, reviewed {}, follows {}",
        stats.movies_watched, stats.reviews_written, stats.following_count
    );
    Ok(())
}
