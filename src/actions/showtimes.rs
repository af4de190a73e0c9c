//! Showtime lookups through SerpApi's Google showtimes results.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use super::ShowtimeQuery;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    showtimes: Vec<ShowtimeDay>,
}

#[derive(Debug, Deserialize)]
struct ShowtimeDay {
    #[serde(default)]
    day: String,
    #[serde(default)]
    theaters: Vec<Theater>,
}

#[derive(Debug, Deserialize)]
struct Theater {
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    showing: Vec<Showing>,
}

#[derive(Debug, Deserialize)]
struct Showing {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default, rename = "type")]
    format: Option<String>,
}

pub struct ShowtimeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl ShowtimeClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, base_url: String) -> Self {
        Self {
            http,
            api_key,
            base_url,
        }
    }

    /// Today's showtimes for `query.title` near `query.location`.
    pub async fn showtimes(&self, query: &ShowtimeQuery) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("SerpApi key not configured. Set SERPAPI_API_KEY"))?;

        let search = format!("showtimes for {}", query.title);
        let response: SearchResponse = self
            .http
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", search.as_str()),
                ("location", query.location.as_str()),
                ("hl", "en"),
                ("gl", "us"),
                ("api_key", api_key),
            ])
            .send()
            .await
            .context("Showtime search request failed")?
            .error_for_status()
            .context("Showtime search returned an error")?
            .json()
            .await
            .context("Failed to decode showtime search response")?;

        Ok(format_showtimes(query, &response.showtimes))
    }
}

/// Formats the first listed day; later days are noise for "when can I go".
fn format_showtimes(query: &ShowtimeQuery, days: &[ShowtimeDay]) -> String {
    let Some(day) = days.iter().find(|d| !d.theaters.is_empty()) else {
        return format!(
            "No showtimes found for {} near {}.",
            query.title, query.location
        );
    };

    let mut out = format!("Showtimes for {} near {}", query.title, query.location);
    if !day.day.is_empty() {
        out.push_str(&format!(" ({})", day.day));
    }
    out.push_str(":\n");
    for theater in &day.theaters {
        out.push_str(&format!("\n{}", theater.name));
        if let Some(address) = &theater.address {
            out.push_str(&format!(" - {address}"));
        }
        out.push('\n');
        for showing in &theater.showing {
            let label = showing.format.as_deref().unwrap_or("Standard");
            out.push_str(&format!("  {label}: {}\n", showing.time.join(", ")));
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query() -> ShowtimeQuery {
        ShowtimeQuery {
            title: "Inception".into(),
            location: "New York".into(),
        }
    }

    #[test]
    fn test_format_first_day_with_theaters() {
        let response: SearchResponse = serde_json::from_value(json!({
            "showtimes": [
                {"day": "TodayOct 19", "theaters": [{
                    "name": "AMC Lincoln Square 13",
                    "address": "1998 Broadway",
                    "showing": [
                        {"time": ["4:00pm", "7:30pm"], "type": "Standard"},
                        {"time": ["9:45pm"], "type": "IMAX"}
                    ]
                }]},
                {"day": "TomorrowOct 20", "theaters": [{"name": "Regal", "showing": []}]}
            ]
        }))
        .unwrap();

        let text = format_showtimes(&query(), &response.showtimes);
        assert!(text.starts_with("Showtimes for Inception near New York (TodayOct 19):"));
        assert!(text.contains("AMC Lincoln Square 13 - 1998 Broadway"));
        assert!(text.contains("Standard: 4:00pm, 7:30pm"));
        assert!(text.contains("IMAX: 9:45pm"));
        assert!(!text.contains("Regal"));
    }

    #[test]
    fn test_format_no_showtimes() {
        let text = format_showtimes(&query(), &[]);
        assert_eq!(text, "No showtimes found for Inception near New York.");
    }
}
