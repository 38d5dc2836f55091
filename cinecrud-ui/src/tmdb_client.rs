//! TMDb API client
//!
//! Stateless wrapper over the movie search/detail endpoints. Raw responses are
//! normalized into [`Movie`] records by [`to_movie`].

use std::time::Duration;

use async_trait::async_trait;
use cinecrud_common::models::{Movie, PosterUrls};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Credentials;
use crate::source::CatalogSource;

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";
const USER_AGENT: &str = concat!("cinecrud/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Poster size tiers served by the image host
pub const POSTER_SIZES: [&str; 4] = ["w342", "w500", "w780", "original"];

/// TMDb client errors
#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized (check TMDb credentials)")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Raw movie (or TV show) entry as returned by search and detail endpoints
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TmdbMovie {
    pub id: i64,
    /// Movie title
    pub title: Option<String>,
    /// TV show name (multi-search results)
    pub name: Option<String>,
    /// Movie release date, `YYYY-MM-DD`
    pub release_date: Option<String>,
    /// TV first air date, `YYYY-MM-DD`
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub original_language: Option<String>,
}

/// Search endpoint envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

/// Video (trailer, teaser, clip) attached to a movie
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TmdbVideo {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
}

impl TmdbVideo {
    /// Watch URL for videos hosted on YouTube
    pub fn watch_url(&self) -> Option<String> {
        (self.site == "YouTube").then(|| format!("https://www.youtube.com/watch?v={}", self.key))
    }
}

/// Videos endpoint envelope
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbVideosResponse {
    pub id: i64,
    pub results: Vec<TmdbVideo>,
}

/// How requests are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TmdbAuth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `api_key=<key>` query parameter
    ApiKey(String),
    /// No credential; the service will reject requests
    Unauthenticated,
}

impl From<&Credentials> for TmdbAuth {
    fn from(credentials: &Credentials) -> Self {
        if let Some(token) = &credentials.access_token {
            TmdbAuth::Bearer(token.clone())
        } else if let Some(key) = &credentials.api_key {
            TmdbAuth::ApiKey(key.clone())
        } else {
            TmdbAuth::Unauthenticated
        }
    }
}

/// TMDb API client
pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    auth: TmdbAuth,
}

impl TmdbClient {
    pub fn new(credentials: &Credentials) -> Result<Self, TmdbError> {
        Self::with_base_url(credentials, TMDB_BASE_URL)
    }

    /// Client against a different host (tests, proxies)
    pub fn with_base_url(credentials: &Credentials, base_url: &str) -> Result<Self, TmdbError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TmdbError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: TmdbAuth::from(credentials),
        })
    }

    pub fn auth(&self) -> &TmdbAuth {
        &self.auth
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Querying TMDb API");

        let mut request = self.http_client.get(&url).header(ACCEPT, "application/json");
        match &self.auth {
            TmdbAuth::Bearer(token) => {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            TmdbAuth::ApiKey(key) => {
                request = request.query(&[("api_key", key.as_str())]);
            }
            TmdbAuth::Unauthenticated => {}
        }
        if !params.is_empty() {
            request = request.query(params);
        }
        request
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, TmdbError> {
        let response = request
            .send()
            .await
            .map_err(|e| TmdbError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(TmdbError::Unauthorized);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(TmdbError::NotFound(what.to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TmdbError::ApiError(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| TmdbError::ParseError(e.to_string()))
    }

    /// Search movies by title
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Vec<TmdbMovie>, TmdbError> {
        let request = self.get(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        );
        let response: TmdbSearchResponse = self.send(request, &format!("search '{}'", query)).await?;

        tracing::info!(
            query = %query,
            page = page,
            results = response.results.len(),
            total_results = response.total_results,
            "TMDb search complete"
        );

        Ok(response.results)
    }

    /// Movie details by id
    pub async fn get_movie(&self, movie_id: i64) -> Result<TmdbMovie, TmdbError> {
        let request = self.get(&format!("/movie/{}", movie_id), &[]);
        self.send(request, &format!("movie {}", movie_id)).await
    }

    /// Trailers and clips for a movie
    pub async fn get_movie_videos(&self, movie_id: i64) -> Result<Vec<TmdbVideo>, TmdbError> {
        let request = self.get(&format!("/movie/{}/videos", movie_id), &[]);
        let response: TmdbVideosResponse = self
            .send(request, &format!("videos for movie {}", movie_id))
            .await?;
        Ok(response.results)
    }
}

#[async_trait]
impl CatalogSource for TmdbClient {
    async fn search(&self, query: &str, page: u32) -> Result<Vec<Movie>, TmdbError> {
        let raw = self.search_movies(query, page).await?;
        Ok(raw.iter().map(to_movie).collect())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Movie, TmdbError> {
        Ok(to_movie(&self.get_movie(id).await?))
    }

    async fn videos(&self, id: i64) -> Result<Vec<TmdbVideo>, TmdbError> {
        self.get_movie_videos(id).await
    }
}

/// Year portion of a `YYYY-MM-DD` date
pub fn year_from_date(date: &str) -> Option<String> {
    let year: String = date.split('-').next()?.chars().take(4).collect();
    (!year.is_empty()).then_some(year)
}

/// Poster URLs for every size tier, or `None` without a path fragment
pub fn poster_urls(poster_path: Option<&str>) -> Option<PosterUrls> {
    let path = poster_path.filter(|p| !p.trim().is_empty())?;
    let url = |size: &str| Some(format!("{}{}{}", TMDB_IMAGE_BASE_URL, size, path));

    Some(PosterUrls {
        w342: url(POSTER_SIZES[0]),
        w500: url(POSTER_SIZES[1]),
        w780: url(POSTER_SIZES[2]),
        original: url(POSTER_SIZES[3]),
    })
}

/// Normalize a raw entry into a catalog record
pub fn to_movie(raw: &TmdbMovie) -> Movie {
    let title = raw
        .title
        .clone()
        .or_else(|| raw.name.clone())
        .unwrap_or_default();
    let year = raw
        .release_date
        .as_deref()
        .filter(|d| !d.is_empty())
        .or(raw.first_air_date.as_deref())
        .and_then(year_from_date);

    Movie {
        id: Some(raw.id),
        title,
        year,
        poster_path: raw.poster_path.clone(),
        poster_urls: poster_urls(raw.poster_path.as_deref()),
        overview: raw.overview.clone(),
        original_language: raw.original_language.clone(),
    }
}
