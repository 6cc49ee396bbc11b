use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ledger::{ReviewDraft, ReviewEdit, ReviewSort, ReviewView, UserMovie};
use rand::Rng;
use recommender::RecommendationPage;
use service::{ReelDeal, ReviewSync, ServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::{
    CatalogMovie, InteractionUpdate, MemoryStore, MovieId, Page, ReviewId, Snapshot, UserId,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// ReelDeal - movie ratings, reviews and recommendations
#[derive(Parser)]
#[command(name = "reeldeal")]
#[command(about = "Rate and review movies, follow people, get genre-based recommendations", long_about = None)]
struct Cli {
    /// JSON snapshot holding every movie, review and user
    #[arg(short, long, default_value = "reeldeal.json")]
    snapshot: PathBuf,

    /// More logging (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListKind {
    Watchlist,
    Watched,
    Favorites,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user
    AddUser {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        username: String,
    },

    /// Rate, watch, bookmark or favourite a movie
    Rate {
        #[arg(long)]
        movie_id: MovieId,
        #[arg(long)]
        user_id: UserId,
        /// 1-5
        #[arg(long)]
        rating: Option<u8>,
        /// Inline review; with a rating it also creates or updates the review
        #[arg(long)]
        review: Option<String>,
        #[arg(long)]
        watched: Option<bool>,
        #[arg(long)]
        watchlist: Option<bool>,
        #[arg(long)]
        favorite: Option<bool>,
        /// Fallback title used when the catalog lookup fails
        #[arg(long)]
        title: Option<String>,
        /// Fallback genres, comma separated
        #[arg(long, value_delimiter = ',')]
        genres: Vec<String>,
    },

    /// Show a movie with its stats and latest reviews
    Movie {
        #[arg(long)]
        movie_id: MovieId,
        /// Show this user's own interaction too
        #[arg(long)]
        viewer: Option<UserId>,
    },

    /// Write a review
    Review {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        movie_id: MovieId,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        text: String,
        #[arg(long)]
        title: Option<String>,
        /// Only visible to the author
        #[arg(long)]
        private: bool,
    },

    /// Edit your review
    EditReview {
        #[arg(long)]
        review_id: ReviewId,
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        rating: Option<u8>,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        public: Option<bool>,
    },

    /// Delete your review (keeps your rating and watch flags)
    DeleteReview {
        #[arg(long)]
        review_id: ReviewId,
        #[arg(long)]
        user_id: UserId,
    },

    /// Toggle a like on a review
    Like {
        #[arg(long)]
        review_id: ReviewId,
        #[arg(long)]
        user_id: UserId,
    },

    /// Toggle a dislike on a review
    Dislike {
        #[arg(long)]
        review_id: ReviewId,
        #[arg(long)]
        user_id: UserId,
    },

    /// Comment on a review
    Comment {
        #[arg(long)]
        review_id: ReviewId,
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        text: String,
    },

    /// List a movie's reviews
    Reviews {
        #[arg(long)]
        movie_id: MovieId,
        /// recent, rating or helpful
        #[arg(long, default_value = "recent")]
        sort: String,
        #[arg(long)]
        viewer: Option<UserId>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Public reviews from everyone a user follows
    Feed {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
    },

    Follow {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        target: UserId,
    },

    Unfollow {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        target: UserId,
    },

    /// Repair one user's follow edges after an interrupted follow or unfollow
    Reconcile {
        #[arg(long)]
        user_id: UserId,
    },

    /// Show a user's watchlist, watched movies or favourites
    List {
        #[arg(long)]
        user_id: UserId,
        #[arg(long, value_enum, default_value = "watchlist")]
        kind: ListKind,
    },

    /// Show a user's profile numbers
    Profile {
        #[arg(long)]
        user_id: UserId,
    },

    /// Get movie recommendations for a user
    Recommend {
        #[arg(long)]
        user_id: UserId,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
        /// Show the match reason for each recommendation
        #[arg(long)]
        explain: bool,
    },

    /// Time concurrent recommendation requests
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,
    },
}

impl Commands {
    /// Commands that may change documents (movie details registers the movie)
    fn writes(&self) -> bool {
        !matches!(
            self,
            Commands::Reviews { .. }
                | Commands::Feed { .. }
                | Commands::List { .. }
                | Commands::Profile { .. }
                | Commands::Recommend { .. }
                | Commands::Benchmark { .. }
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = ServiceConfig::from_env()?;
    let snapshot = Snapshot::load(&cli.snapshot)
        .with_context(|| format!("Failed to load snapshot {}", cli.snapshot.display()))?;
    let store = Arc::new(MemoryStore::from_snapshot(snapshot));
    let service = ReelDeal::new(store.clone(), config.catalog_client(), config);

    let writes = cli.command.writes();
    let result = run(&service, cli.command).await;

    // Saved on failure too: a multi-document command may have landed some writes
    if writes {
        store
            .snapshot()
            .await
            .save(&cli.snapshot)
            .with_context(|| format!("Failed to save snapshot {}", cli.snapshot.display()))?;
        debug!("Saved snapshot to {}", cli.snapshot.display());
    }
    result
}

async fn run(service: &ReelDeal, command: Commands) -> Result<()> {
    match command {
        Commands::AddUser { user_id, username } => {
            let user = service.register_user(user_id, &username).await?;
            println!("{} User {} ({})", "✓".green(), user.id, user.username.bold());
        }
        Commands::Rate {
            movie_id,
            user_id,
            rating,
            review,
            watched,
            watchlist,
            favorite,
            title,
            genres,
        } => {
            let update = InteractionUpdate {
                rating,
                review,
                watched,
                watchlist,
                favorite,
                watched_date: None,
            };
            let fallback = title.map(|title| CatalogMovie::new(movie_id, title).with_genres(genres));
            let outcome = service.rate_movie(movie_id, user_id, update, fallback).await?;

            println!(
                "{} Saved ({:?} metadata). Average {:.2} from {} ratings",
                "✓".green(),
                outcome.metadata,
                outcome.stats.average_rating,
                outcome.stats.total_ratings
            );
            match outcome.review {
                ReviewSync::Skipped => {}
                ReviewSync::Created(id) => println!("  Review created: {id}"),
                ReviewSync::Updated(id) => println!("  Review updated: {id}"),
                ReviewSync::Failed(reason) => {
                    println!("  {} Review not saved: {reason}", "!".yellow())
                }
            }
        }
        Commands::Movie { movie_id, viewer } => {
            let details = service.movie_details(movie_id, viewer).await?;
            let movie = &details.movie;
            println!("{}", format!("{} [{}]", movie.title, movie.id).bold().blue());
            println!("{}Genres: {}", "• ".green(), movie.genres.join(", "));
            if let Some(date) = movie.release_date {
                println!("{}Released: {date}", "• ".green());
            }
            if let Some(overview) = &movie.overview {
                println!("{}{overview}", "• ".green());
            }
            let stats = &details.stats;
            println!(
                "{}Average {:.2} ({} ratings, {} reviews, {} watched, {} bookmarked, {} favourites)",
                "• ".cyan(),
                stats.average_rating,
                stats.total_ratings,
                stats.total_reviews,
                stats.total_watched,
                stats.total_watchlist,
                stats.total_favorites
            );
            if let Some(record) = &details.viewer_interaction {
                println!(
                    "{}You: rating {}, watched {}, watchlist {}, favourite {}",
                    "• ".cyan(),
                    record.rating,
                    record.watched,
                    record.on_watchlist(),
                    record.favorite
                );
            }
            println!("Latest reviews:");
            for view in &details.recent_reviews {
                print_review(view);
            }
        }
        Commands::Review {
            user_id,
            movie_id,
            rating,
            text,
            title,
            private,
        } => {
            let mut draft = ReviewDraft::new(rating, text);
            if let Some(title) = title {
                draft = draft.with_title(title);
            }
            if private {
                draft = draft.private();
            }
            let view = service.create_review(user_id, movie_id, draft).await?;
            println!("{} Review {}", "✓".green(), view.review.id);
        }
        Commands::EditReview {
            review_id,
            user_id,
            rating,
            text,
            title,
            public,
        } => {
            let edit = ReviewEdit {
                rating,
                text,
                title,
                is_public: public,
            };
            let view = service.update_review(review_id, user_id, edit).await?;
            print_review(&view);
        }
        Commands::DeleteReview { review_id, user_id } => {
            service.delete_review(review_id, user_id).await?;
            println!("{} Review {review_id} deleted", "✓".green());
        }
        Commands::Like { review_id, user_id } => {
            let summary = service.toggle_like(review_id, user_id).await?;
            println!(
                "👍 {}  👎 {}  (you like: {}, you dislike: {})",
                summary.like_count,
                summary.dislike_count,
                summary.user_has_liked,
                summary.user_has_disliked
            );
        }
        Commands::Dislike { review_id, user_id } => {
            let summary = service.toggle_dislike(review_id, user_id).await?;
            println!(
                "👍 {}  👎 {}  (you like: {}, you dislike: {})",
                summary.like_count,
                summary.dislike_count,
                summary.user_has_liked,
                summary.user_has_disliked
            );
        }
        Commands::Comment {
            review_id,
            user_id,
            text,
        } => {
            let added = service.add_comment(review_id, user_id, &text).await?;
            println!(
                "{} Comment added ({} on this review)",
                "✓".green(),
                added.review.comment_count
            );
        }
        Commands::Reviews {
            movie_id,
            sort,
            viewer,
            page,
            limit,
        } => {
            let sort: ReviewSort = sort.parse()?;
            let page = service.page(page, limit)?;
            let reviews = service.reviews_for_movie(movie_id, viewer, page, sort).await?;
            print_review_page(&reviews);
        }
        Commands::Feed {
            user_id,
            page,
            limit,
        } => {
            let page = service.page(page, limit)?;
            let reviews = service.following_feed(user_id, page).await?;
            print_review_page(&reviews);
        }
        Commands::Follow { user_id, target } => {
            service.follow(user_id, target).await?;
            println!("{} {user_id} now follows {target}", "✓".green());
        }
        Commands::Unfollow { user_id, target } => {
            service.unfollow(user_id, target).await?;
            println!("{} {user_id} no longer follows {target}", "✓".green());
        }
        Commands::Reconcile { user_id } => {
            let report = service.reconcile_follows(user_id).await?;
            if report.is_clean() {
                println!("{} Nothing to repair", "✓".green());
            } else {
                println!(
                    "{} Added {} back-references, dropped {} stale followers",
                    "✓".green(),
                    report.back_references_added,
                    report.stale_followers_dropped
                );
            }
        }
        Commands::List { user_id, kind } => {
            let (heading, movies) = match kind {
                ListKind::Watchlist => ("Watchlist", service.watchlist(user_id).await?),
                ListKind::Watched => ("Watched", service.watched_movies(user_id).await?),
                ListKind::Favorites => ("Favourites", service.favorites(user_id).await?),
            };
            print_user_movies(heading, &movies);
        }
        Commands::Profile { user_id } => {
            let stats = service.profile_stats(user_id).await?;
            println!("{}", format!("User {user_id}").bold().blue());
            println!("{}Movies watched: {}", "• ".green(), stats.movies_watched);
            println!("{}Reviews written: {}", "• ".green(), stats.reviews_written);
            println!("{}Followers: {}", "• ".cyan(), stats.followers_count);
            println!("{}Following: {}", "• ".cyan(), stats.following_count);
        }
        Commands::Recommend {
            user_id,
            page,
            limit,
            explain,
        } => {
            let page = service.page(page, limit)?;
            let recommendations = service.recommend(user_id, page).await?;
            print_recommendations(&recommendations, page.offset(), explain);
        }
        Commands::Benchmark { requests } => handle_benchmark(service, requests).await?,
    }
    Ok(())
}

/// Fire `requests` concurrent recommendation requests at random users
async fn handle_benchmark(service: &ReelDeal, requests: usize) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("requests must be at least 1"));
    }
    let page = service.page(None, None)?;
    let users: Vec<UserId> = {
        let mut rng = rand::rng();
        (0..requests).map(|_| rng.random_range(1..=1000)).collect()
    };

    let start = Instant::now();
    let mut handles = vec![];
    for user in users {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            service.recommend(user, page).await?;
            Ok::<_, anyhow::Error>(start.elapsed())
        }));
    }
    let mut timings: Vec<Duration> = vec![];
    for handle in handles {
        timings.push(handle.await??);
    }
    let wall = start.elapsed();

    timings.sort();
    let total: Duration = timings.iter().sum();
    let percentile = |p: f32| timings[((timings.len() as f32 * p) as usize).min(timings.len() - 1)];
    println!("{}", "Benchmark results:".bold().blue());
    println!("Wall time: {wall:?}");
    println!("Average latency: {:?}", total / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!(
        "Throughput: {:.2} requests/second",
        requests as f32 / wall.as_secs_f32()
    );
    Ok(())
}

fn print_review(view: &ReviewView) {
    let review = &view.review;
    let title = review.title.as_deref().unwrap_or("");
    println!(
        "  {} {} {} by user {}{}",
        "★".repeat(review.rating as usize).yellow(),
        title.bold(),
        review.id.to_string().dimmed(),
        review.user_id,
        if review.is_edited { " (edited)" } else { "" }
    );
    println!("    {}", review.text);
    println!(
        "    👍 {}  👎 {}  💬 {}",
        view.like_count, view.dislike_count, view.comment_count
    );
}

fn print_review_page(page: &Page<ReviewView>) {
    println!(
        "{}",
        format!(
            "Page {} of {} ({} reviews)",
            page.page, page.total_pages, page.total_results
        )
        .bold()
        .blue()
    );
    for view in &page.items {
        print_review(view);
    }
}

fn print_user_movies(heading: &str, movies: &[UserMovie]) {
    println!("{}", format!("{heading} ({})", movies.len()).bold().blue());
    for entry in movies {
        let rating = match entry.interaction.rating {
            0 => "unrated".to_string(),
            r => format!("rated {r}"),
        };
        println!(
            "{}{} [{}] - {}",
            "• ".green(),
            entry.movie.title,
            entry.movie.genres.join(", "),
            rating
        );
    }
}

/// Print recommendations. The match percentage is cosmetic and random.
fn print_recommendations(recommendations: &RecommendationPage, offset: usize, explain: bool) {
    let heading = if recommendations.is_personalized() {
        format!(
            "Movie Recommendations (top genres: {})",
            recommendations.top_genres.join(", ")
        )
    } else {
        "Popular Movies".to_string()
    };
    println!("{}", heading.bold().blue());

    let mut rng = rand::rng();
    for (i, movie) in recommendations.movies.iter().enumerate() {
        let year = movie
            .release_date
            .map(|d| d.format("%Y").to_string())
            .unwrap_or_else(|| "????".to_string());
        let match_score: u8 = rng.random_range(80..100);
        println!(
            "{}. {} ({}) [{}] - avg {:.2} - {}% match",
            (offset + i + 1).to_string().green(),
            movie.title,
            year,
            movie.genres.join(", "),
            movie.average_rating,
            match_score
        );
        if explain {
            println!("   {}", movie.match_reason);
        }
    }
    println!(
        "Page {} of {} ({} results)",
        recommendations.page, recommendations.total_pages, recommendations.total_results
    );
}
