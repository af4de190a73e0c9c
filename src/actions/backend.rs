//! The capability set actions run against.

use anyhow::Result;

use super::box_office::BoxOffice;
use super::showtimes::ShowtimeClient;
use super::tmdb::TmdbClient;
use super::{MovieId, ShowtimeQuery, TicketOrder};
use crate::config::Config;

/// Every backend implements this trait.
///
/// Each method returns display-ready text (or structured text) that is fed
/// back to the model verbatim. Errors are reported to the model as failed
/// actions; they never end the turn.
#[async_trait::async_trait]
pub trait MovieBackend: Send + Sync {
    async fn now_playing(&self) -> Result<String>;

    async fn showtimes(&self, query: &ShowtimeQuery) -> Result<String>;

    async fn confirm_ticket_purchase(&self, order: &TicketOrder) -> Result<String>;

    async fn buy_ticket(&self, order: &TicketOrder) -> Result<String>;

    async fn reviews(&self, movie_id: &MovieId) -> Result<String>;
}

/// Production backend: TMDB for listings and reviews, SerpApi for showtimes,
/// and the in-process [`BoxOffice`] for tickets.
pub struct StandardBackend {
    tmdb: TmdbClient,
    showtimes: ShowtimeClient,
    box_office: BoxOffice,
}

impl StandardBackend {
    pub fn new(tmdb: TmdbClient, showtimes: ShowtimeClient, box_office: BoxOffice) -> Self {
        Self {
            tmdb,
            showtimes,
            box_office,
        }
    }

    /// Builds the backend from the `[movies]` config section.
    ///
    /// Missing API keys are not an error here; the affected actions fail
    /// when called, so the model can tell the user what is unavailable.
    pub fn from_config(config: &Config) -> Self {
        let http = reqwest::Client::new();
        Self::new(
            TmdbClient::new(http.clone(), config.tmdb_api_key(), config.tmdb_base_url()),
            ShowtimeClient::new(http, config.serpapi_api_key(), config.serpapi_base_url()),
            BoxOffice::new(),
        )
    }
}

#[async_trait::async_trait]
impl MovieBackend for StandardBackend {
    async fn now_playing(&self) -> Result<String> {
        self.tmdb.now_playing().await
    }

    async fn showtimes(&self, query: &ShowtimeQuery) -> Result<String> {
        self.showtimes.showtimes(query).await
    }

    async fn confirm_ticket_purchase(&self, order: &TicketOrder) -> Result<String> {
        Ok(self.box_office.confirmation_request(order))
    }

    async fn buy_ticket(&self, order: &TicketOrder) -> Result<String> {
        let receipt = self.box_office.purchase(order)?;
        tracing::info!(
            confirmation = %receipt.confirmation,
            sold = self.box_office.sold(),
            "ticket recorded"
        );
        Ok(receipt.to_string())
    }

    async fn reviews(&self, movie_id: &MovieId) -> Result<String> {
        self.tmdb.reviews(movie_id).await
    }
}
