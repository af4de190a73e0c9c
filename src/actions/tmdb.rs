//! The Movie Database (TMDB) v3 client for listings and reviews.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::MovieId;
use crate::constants::{REVIEW_EXCERPT_CHARS, REVIEW_LIMIT};

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MovieSummary {
    id: u64,
    title: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    vote_average: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Review {
    author: String,
    #[serde(default)]
    author_details: Option<AuthorDetails>,
    content: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthorDetails {
    #[serde(default)]
    rating: Option<f64>,
}

/// Thin TMDB client. Requests fail with a descriptive error when no API key
/// is configured.
pub struct TmdbClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl TmdbClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("TMDB API key not configured. Set TMDB_API_KEY"))
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key()?), ("language", "en-US")])
            .query(query)
            .send()
            .await
            .with_context(|| format!("TMDB request to {path} failed"))?
            .error_for_status()
            .with_context(|| format!("TMDB returned an error for {path}"))?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to decode TMDB response for {path}"))
    }

    /// Movies currently in theaters.
    pub async fn now_playing(&self) -> Result<String> {
        let page: Page<MovieSummary> = self.get("/movie/now_playing", &[("page", "1")]).await?;
        Ok(format_now_playing(&page.results))
    }

    /// Reviews for a movie. A title is resolved to an id with a search first.
    pub async fn reviews(&self, movie_id: &MovieId) -> Result<String> {
        let id = match movie_id {
            MovieId::Numeric(id) => *id,
            MovieId::Title(title) => self.search(title).await?,
        };
        let page: Page<Review> = self.get(&format!("/movie/{id}/reviews"), &[]).await?;
        Ok(format_reviews(&page.results))
    }

    async fn search(&self, title: &str) -> Result<u64> {
        // Numeric strings are ids the model quoted.
        if let Ok(id) = title.trim().parse::<u64>() {
            return Ok(id);
        }
        let page: Page<MovieSummary> = self.get("/search/movie", &[("query", title)]).await?;
        page.results
            .first()
            .map(|m| m.id)
            .ok_or_else(|| anyhow!("No movie found matching \"{title}\""))
    }
}

fn format_now_playing(movies: &[MovieSummary]) -> String {
    if movies.is_empty() {
        return "No movies are currently playing.".to_string();
    }
    let mut out = String::from("Now Playing Movies:\n");
    for movie in movies {
        out.push_str(&format!("- {} (ID: {}", movie.title, movie.id));
        if let Some(date) = movie.release_date.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(", released {date}"));
        }
        if let Some(score) = movie.vote_average {
            out.push_str(&format!(", audience score {score:.1}/10"));
        }
        out.push_str(")\n");
    }
    out.trim_end().to_string()
}

fn format_reviews(reviews: &[Review]) -> String {
    if reviews.is_empty() {
        return "No reviews found.".to_string();
    }
    let mut out = String::new();
    for review in reviews.iter().take(REVIEW_LIMIT) {
        out.push_str(&format!("Author: {}\n", review.author));
        if let Some(rating) = review.author_details.as_ref().and_then(|d| d.rating) {
            out.push_str(&format!("Rating: {rating}/10\n"));
        }
        out.push_str(&format!("Review: {}\n", excerpt(&review.content)));
        if let Some(url) = &review.url {
            out.push_str(&format!("Full review: {url}\n"));
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// First [`REVIEW_EXCERPT_CHARS`] characters, cut on a char boundary.
fn excerpt(content: &str) -> String {
    let content = content.trim();
    match content.char_indices().nth(REVIEW_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
