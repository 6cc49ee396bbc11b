//! Integration tests for the interaction accessor and profile stats.

use chrono::Utc;
use ledger::{EngineError, ErrorKind, InteractionAccessor, ProfileStats};
use std::sync::Arc;
use store::{CatalogMovie, DocumentStore, InteractionUpdate, MemoryStore, Movie, User};

async fn create_test_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let now = Utc::now();

    for (id, title) in [(1, "Heat"), (2, "Ronin"), (3, "Collateral")] {
        store
            .upsert_movie(Movie::new(
                CatalogMovie::new(id, title).with_genres(["Action", "Crime"]),
                now,
            ))
            .await
            .unwrap();
    }
    store.upsert_user(User::new(10, "vincent", now)).await.unwrap();
    store
}

#[tokio::test]
async fn test_upsert_creates_then_overwrites() {
    let store = create_test_store().await;
    let accessor = InteractionAccessor::new(store.clone());

    let created = accessor
        .upsert_interaction(1, 10, &InteractionUpdate::new().with_rating(4))
        .await
        .unwrap();
    assert_eq!(created.rating, 4);
    assert!(!created.watched);

    let updated = accessor
        .upsert_interaction(1, 10, &InteractionUpdate::new().with_watched(true))
        .await
        .unwrap();
    assert_eq!(updated.rating, 4);
    assert!(updated.watched);
    assert!(updated.watched_date.is_some());
    assert_eq!(updated.created_at, created.created_at);

    let movie = store.find_movie(1).await.unwrap().unwrap();
    assert_eq!(movie.interactions().len(), 1);
    assert_eq!(movie.stats().total_watched, 1);
}

#[tokio::test]
async fn test_average_tracks_every_write() {
    let store = create_test_store().await;
    let accessor = InteractionAccessor::new(store.clone());

    for (user, rating) in [(1, 5), (2, 4), (3, 0), (4, 3)] {
        accessor
            .upsert_interaction(2, user, &InteractionUpdate::new().with_rating(rating))
            .await
            .unwrap();
    }
    let stats = *store.find_movie(2).await.unwrap().unwrap().stats();
    assert_eq!(stats.total_ratings, 3);
    assert!((stats.average_rating - 4.0).abs() < 1e-6);

    // User 1 changes their mind
    accessor
        .upsert_interaction(2, 1, &InteractionUpdate::new().with_rating(2))
        .await
        .unwrap();
    let stats = *store.find_movie(2).await.unwrap().unwrap().stats();
    assert!((stats.average_rating - 3.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_aggregation_failure_writes_nothing() {
    let store = create_test_store().await;
    let accessor = InteractionAccessor::new(store.clone());
    accessor
        .upsert_interaction(3, 10, &InteractionUpdate::new().with_rating(4))
        .await
        .unwrap();
    let before = store.find_movie(3).await.unwrap().unwrap();

    let err = accessor
        .upsert_interaction(3, 11, &InteractionUpdate::new().with_rating(11))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Aggregation { movie_id: 3, .. }));
    assert_eq!(err.kind(), ErrorKind::Internal);
    let after = store.find_movie(3).await.unwrap().unwrap();
    assert_eq!(after.interactions(), before.interactions());
    assert_eq!(after.stats(), before.stats());
}

#[tokio::test]
async fn test_unknown_movie() {
    let store = create_test_store().await;
    let accessor = InteractionAccessor::new(store);

    let err = accessor
        .upsert_interaction(99, 10, &InteractionUpdate::new().with_favorite(true))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MovieNotFound(99)));
}

#[tokio::test]
async fn test_watched_movies_leave_the_watchlist() {
    let store = create_test_store().await;
    let accessor = InteractionAccessor::new(store.clone());

    // Bookmark all three, then watch one without clearing its bookmark
    for movie_id in 1..=3 {
        accessor
            .upsert_interaction(movie_id, 10, &InteractionUpdate::new().with_watchlist(true))
            .await
            .unwrap();
    }
    accessor
        .upsert_interaction(2, 10, &InteractionUpdate::new().with_watched(true).with_favorite(true))
        .await
        .unwrap();

    let watchlist: Vec<u32> = accessor
        .watchlist(10)
        .await
        .unwrap()
        .iter()
        .map(|m| m.movie.id)
        .collect();
    let watched: Vec<u32> = accessor
        .watched_movies(10)
        .await
        .unwrap()
        .iter()
        .map(|m| m.movie.id)
        .collect();
    let favorites = accessor.favorites(10).await.unwrap();

    assert_eq!(watchlist.len(), 2);
    assert!(!watchlist.contains(&2));
    assert_eq!(watched, vec![2]);
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].movie.title, "Ronin");

    // The raw flag is still counted by the aggregate
    let stats = *store.find_movie(2).await.unwrap().unwrap().stats();
    assert_eq!(stats.total_watchlist, 1);
}

#[tokio::test]
async fn test_profile_stats_inputs() {
    let store = create_test_store().await;
    let now = Utc::now();
    let mut user = User::new(10, "vincent", now);
    user.followers = vec![20, 21];
    user.following = vec![20];
    store.upsert_user(user).await.unwrap();

    let accessor = InteractionAccessor::new(store.clone());
    for movie_id in [1, 3] {
        accessor
            .upsert_interaction(movie_id, 10, &InteractionUpdate::new().with_watched(true))
            .await
            .unwrap();
    }
    accessor
        .upsert_interaction(2, 10, &InteractionUpdate::new().with_watchlist(true))
        .await
        .unwrap();
    store
        .upsert_review(store::Review::new(10, 1, 5, "Best shootout ever filmed", now))
        .await
        .unwrap();

    let stats = ProfileStats::new(store).profile_stats(10).await.unwrap();
    assert_eq!(stats.movies_watched, 2);
    assert_eq!(stats.reviews_written, 1);
    assert_eq!(stats.followers_count, 2);
    assert_eq!(stats.following_count, 1);
}

#[tokio::test]
async fn test_profile_stats_unknown_user() {
    let store = create_test_store().await;
    let err = ProfileStats::new(store).profile_stats(404).await.unwrap_err();
    assert!(matches!(err, EngineError::UserNotFound(404)));
}
