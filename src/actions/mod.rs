//! The closed set of actions the model may request.
//!
//! Each action is an [`Action`] variant carrying a typed parameter struct.
//! An [`ActionCall`] parsed from model output is bound to a variant by
//! [`Action::from_call`], which rejects unknown names and mismatched
//! parameters before anything runs. The [`ActionRegistry`] then executes the
//! variant against a [`MovieBackend`].

pub mod backend;
pub mod box_office;
pub mod call;
pub mod registry;
pub mod showtimes;
pub mod tmdb;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub use backend::{MovieBackend, StandardBackend};
pub use call::{parse_action_call, ActionCall};
pub use registry::{ActionRegistry, DispatchError, DispatchErrorKind};

/// A movie identifier as the model supplies it.
///
/// The model usually passes a numeric database id, but may fall back to a
/// title when it never saw one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawMovieId")]
pub enum MovieId {
    Numeric(u64),
    Title(String),
}

/// Any JSON shape a model uses for an id, including `27205.0`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMovieId {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl TryFrom<RawMovieId> for MovieId {
    type Error = String;

    fn try_from(raw: RawMovieId) -> Result<Self, Self::Error> {
        match raw {
            RawMovieId::Integer(id) => Ok(MovieId::Numeric(id)),
            RawMovieId::Float(id) if id >= 0.0 && id.fract() == 0.0 && id <= u64::MAX as f64 => {
                Ok(MovieId::Numeric(id as u64))
            }
            RawMovieId::Float(id) => Err(format!("movie id {id} is not a whole number")),
            RawMovieId::Text(title) => Ok(MovieId::Title(title)),
        }
    }
}

/// Accepts a string or a bare number, so `"location": 10001` binds like `"10001"`.
fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(text) => text,
        Scalar::Number(number) => number.to_string(),
    })
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovieId::Numeric(id) => write!(f, "{id}"),
            MovieId::Title(title) => write!(f, "{title}"),
        }
    }
}

/// Parameters for `get_showtimes`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShowtimeQuery {
    #[serde(deserialize_with = "text_or_number")]
    pub title: String,
    /// City, "city, state", or zip code.
    #[serde(deserialize_with = "text_or_number")]
    pub location: String,
}

/// Parameters shared by `confirm_ticket_purchase` and `buy_ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TicketOrder {
    #[serde(deserialize_with = "text_or_number")]
    pub theater: String,
    #[serde(deserialize_with = "text_or_number")]
    pub movie: String,
    #[serde(deserialize_with = "text_or_number")]
    pub showtime: String,
}

/// Parameters for `get_reviews`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewQuery {
    pub movie_id: MovieId,
}

/// `get_now_playing_movies` takes nothing; any key is a mismatch.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoParameters {}

/// Names of every supported action, independent of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    GetNowPlayingMovies,
    GetShowtimes,
    BuyTicket,
    ConfirmTicketPurchase,
    GetReviews,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::GetNowPlayingMovies,
        ActionKind::GetShowtimes,
        ActionKind::BuyTicket,
        ActionKind::ConfirmTicketPurchase,
        ActionKind::GetReviews,
    ];

    /// The wire name the model uses in `"function"`.
    pub fn name(self) -> &'static str {
        match self {
            ActionKind::GetNowPlayingMovies => "get_now_playing_movies",
            ActionKind::GetShowtimes => "get_showtimes",
            ActionKind::BuyTicket => "buy_ticket",
            ActionKind::ConfirmTicketPurchase => "confirm_ticket_purchase",
            ActionKind::GetReviews => "get_reviews",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Declared parameter names, in signature order.
    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            ActionKind::GetNowPlayingMovies => &[],
            ActionKind::GetShowtimes => &["title", "location"],
            ActionKind::BuyTicket | ActionKind::ConfirmTicketPurchase => {
                &["theater", "movie", "showtime"]
            }
            ActionKind::GetReviews => &["movie_id"],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ActionKind::GetNowPlayingMovies => "List movies currently playing in theaters",
            ActionKind::GetShowtimes => "List showtimes for a movie near a city or zip code",
            ActionKind::BuyTicket => "Buy a ticket (only after the user confirmed the purchase)",
            ActionKind::ConfirmTicketPurchase => {
                "Ask the user to confirm a ticket purchase before buying"
            }
            ActionKind::GetReviews => "Fetch critic and audience reviews for a movie",
        }
    }

    /// `name(param, ...)` as shown in catalogs.
    pub fn signature(self) -> String {
        format!("{}({})", self.name(), self.parameters().join(", "))
    }
}

/// A fully bound action, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    GetNowPlayingMovies,
    GetShowtimes(ShowtimeQuery),
    BuyTicket(TicketOrder),
    ConfirmTicketPurchase(TicketOrder),
    GetReviews(ReviewQuery),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::GetNowPlayingMovies => ActionKind::GetNowPlayingMovies,
            Action::GetShowtimes(_) => ActionKind::GetShowtimes,
            Action::BuyTicket(_) => ActionKind::BuyTicket,
            Action::ConfirmTicketPurchase(_) => ActionKind::ConfirmTicketPurchase,
            Action::GetReviews(_) => ActionKind::GetReviews,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Binds a parsed call to its typed variant.
    ///
    /// # Errors
    ///
    /// [`DispatchError::UnknownAction`] if the name is not in the catalog,
    /// [`DispatchError::ParameterMismatch`] if a key is missing, unexpected,
    /// or of the wrong type.
    pub fn from_call(call: &ActionCall) -> Result<Self, DispatchError> {
        let kind = ActionKind::from_name(&call.name)
            .ok_or_else(|| DispatchError::UnknownAction(call.name.clone()))?;

        let mismatch = |err: serde_json::Error| DispatchError::ParameterMismatch {
            action: call.name.clone(),
            detail: err.to_string(),
        };
        let params = call.parameters.clone();

        let action = match kind {
            ActionKind::GetNowPlayingMovies => {
                serde_json::from_value::<NoParameters>(params).map_err(mismatch)?;
                Action::GetNowPlayingMovies
            }
            ActionKind::GetShowtimes => {
                Action::GetShowtimes(serde_json::from_value(params).map_err(mismatch)?)
            }
            ActionKind::BuyTicket => {
                Action::BuyTicket(serde_json::from_value(params).map_err(mismatch)?)
            }
            ActionKind::ConfirmTicketPurchase => {
                Action::ConfirmTicketPurchase(serde_json::from_value(params).map_err(mismatch)?)
            }
            ActionKind::GetReviews => {
                Action::GetReviews(serde_json::from_value(params).map_err(mismatch)?)
            }
        };
        Ok(action)
    }
}
