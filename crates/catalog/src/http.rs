//! HTTP client for a TMDB-style movie catalog.
//!
//! Lookups are `GET {base}/movie/{id}?api_key=...`. Status codes map to
//! catalog errors:
//! - 404 -> `NotFound`
//! - 401 -> `Unauthorized`
//! - anything else, or a transport failure -> `Unavailable`

use crate::{CatalogClient, CatalogError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use store::{CatalogMovie, MovieId};
use tracing::{debug, warn};

/// Catalog client backed by the TMDB REST API
#[derive(Clone)]
pub struct HttpCatalogClient {
    http_client: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCatalogClient {
    /// `api_key` of `None` makes every lookup fail with `Unauthorized`
    /// without touching the network.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client: HttpClient::new(),
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn fetch_catalog_movie(&self, id: MovieId) -> Result<CatalogMovie> {
        let api_key = self.api_key.as_deref().ok_or(CatalogError::Unauthorized)?;
        let url = format!("{}/movie/{}", self.base_url, id);
        debug!(movie_id = id, "Fetching movie from catalog");

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", api_key)])
            .send()
            .await
            .map_err(|e| {
                warn!(movie_id = id, "Catalog request failed: {}", e);
                CatalogError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, id));
        }

        let body: TmdbMovie = response
            .json()
            .await
            .map_err(|e| CatalogError::Unavailable(format!("malformed catalog response: {e}")))?;

        Ok(body.into_catalog_movie())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn status_error(status: StatusCode, id: MovieId) -> CatalogError {
    match status {
        StatusCode::NOT_FOUND => CatalogError::NotFound(id),
        StatusCode::UNAUTHORIZED => CatalogError::Unauthorized,
        other => CatalogError::Unavailable(format!("catalog returned status {other}")),
    }
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

/// The subset of the TMDB movie payload we keep
#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: MovieId,
    title: String,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    original_language: Option<String>,
    #[serde(default)]
    vote_average: f32,
    #[serde(default)]
    vote_count: u32,
    #[serde(default)]
    popularity: f32,
    #[serde(default)]
    tagline: Option<String>,
    #[serde(default)]
    imdb_id: Option<String>,
}

impl TmdbMovie {
    fn into_catalog_movie(self) -> CatalogMovie {
        // TMDB sends "" for unknown dates
        let release_date = self
            .release_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        CatalogMovie {
            id: self.id,
            title: self.title,
            original_title: self.original_title,
            overview: self.overview,
            poster_path: self.poster_path,
            backdrop_path: self.backdrop_path,
            release_date,
            runtime: self.runtime,
            genres: self.genres.into_iter().map(|g| g.name).collect(),
            language: self.original_language,
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            tagline: self.tagline.filter(|t| !t.is_empty()),
            imdb_id: self.imdb_id.filter(|i| !i.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tmdb_payload_mapping() {
        let body: TmdbMovie = serde_json::from_str(
            r#"{
                "id": 550,
                "title": "Fight Club",
                "original_title": "Fight Club",
                "release_date": "1999-10-15",
                "runtime": 139,
                "genres": [{"id": 18, "name": "Drama"}, {"id": 53, "name": "Thriller"}],
                "original_language": "en",
                "vote_average": 8.4,
                "vote_count": 26280,
                "popularity": 61.4,
                "tagline": "",
                "imdb_id": "tt0137523",
                "budget": 63000000
            }"#,
        )
        .unwrap();

        let movie = body.into_catalog_movie();
        assert_eq!(movie.id, 550);
        assert_eq!(movie.genres, vec!["Drama", "Thriller"]);
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(1999, 10, 15));
        assert_eq!(movie.language.as_deref(), Some("en"));
        assert_eq!(movie.tagline, None);
        assert_eq!(movie.imdb_id.as_deref(), Some("tt0137523"));
    }

    #[test]
    fn test_blank_release_date_is_none() {
        let body: TmdbMovie =
            serde_json::from_str(r#"{"id": 1, "title": "Untitled", "release_date": ""}"#).unwrap();
        assert_eq!(body.into_catalog_movie().release_date, None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_error(StatusCode::NOT_FOUND, 7), CatalogError::NotFound(7));
        assert_eq!(status_error(StatusCode::UNAUTHORIZED, 7), CatalogError::Unauthorized);
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, 7),
            CatalogError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = HttpCatalogClient::new("http://127.0.0.1:9/", Some("  ".to_string()));

        assert!(!client.has_api_key());
        assert_eq!(client.base_url(), "http://127.0.0.1:9");
        assert_eq!(
            client.fetch_catalog_movie(550).await.unwrap_err(),
            CatalogError::Unauthorized
        );
    }
}
