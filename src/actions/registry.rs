//! Action lookup and dispatch.
//!
//! [`ActionRegistry`] binds an [`ActionCall`] to a typed [`Action`] and runs
//! it against the configured [`MovieBackend`]. Every failure, including a
//! backend error, comes back as a [`DispatchError`] so the turn loop can
//! report it to the model and keep going.

use std::sync::Arc;

use tracing::{info, warn};

use super::{Action, ActionCall, ActionKind, MovieBackend};

/// Why a dispatch did not produce a result.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Action {0} not found")]
    UnknownAction(String),

    #[error("Invalid parameters for action {action}: {detail}")]
    ParameterMismatch { action: String, detail: String },

    #[error("Error calling action {action}: {detail}")]
    ActionFailed { action: String, detail: String },
}

/// Discriminant of [`DispatchError`], for callers that only need the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    UnknownAction,
    ParameterMismatch,
    ActionFailed,
}

impl DispatchError {
    pub fn kind(&self) -> DispatchErrorKind {
        match self {
            DispatchError::UnknownAction(_) => DispatchErrorKind::UnknownAction,
            DispatchError::ParameterMismatch { .. } => DispatchErrorKind::ParameterMismatch,
            DispatchError::ActionFailed { .. } => DispatchErrorKind::ActionFailed,
        }
    }
}

/// Dispatches actions by name to a shared backend.
///
/// Stateless apart from the backend handle, so one registry can be shared
/// by every session through an `Arc`.
pub struct ActionRegistry {
    backend: Arc<dyn MovieBackend>,
}

impl ActionRegistry {
    pub fn new(backend: Arc<dyn MovieBackend>) -> Self {
        Self { backend }
    }

    /// Whether `name` is a supported action.
    pub fn has(&self, name: &str) -> bool {
        ActionKind::from_name(name).is_some()
    }

    /// Catalog of supported actions.
    pub fn kinds(&self) -> &'static [ActionKind] {
        &ActionKind::ALL
    }

    /// Binds and runs a parsed call.
    ///
    /// Runs the action at most once. Nothing is retried or deduplicated.
    pub async fn invoke(&self, call: &ActionCall) -> Result<String, DispatchError> {
        let action = Action::from_call(call).inspect_err(|err| {
            warn!(action = %call.name, error = %err, "action rejected before dispatch");
        })?;
        self.execute(action).await
    }

    /// Runs an already bound action.
    pub async fn execute(&self, action: Action) -> Result<String, DispatchError> {
        let name = action.name();
        info!(action = name, "dispatching action");

        let result = match &action {
            Action::GetNowPlayingMovies => self.backend.now_playing().await,
            Action::GetShowtimes(query) => self.backend.showtimes(query).await,
            Action::ConfirmTicketPurchase(order) => {
                self.backend.confirm_ticket_purchase(order).await
            }
            Action::BuyTicket(order) => self.backend.buy_ticket(order).await,
            Action::GetReviews(query) => self.backend.reviews(&query.movie_id).await,
        };

        result.map_err(|err| {
            warn!(action = name, error = %format!("{err:#}"), "action failed");
            DispatchError::ActionFailed {
                action: name.to_string(),
                detail: format!("{err:#}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::MovieId;
    use crate::testing::RecordingBackend;
    use serde_json::json;

    fn registry_with(backend: Arc<RecordingBackend>) -> ActionRegistry {
        ActionRegistry::new(backend)
    }

    #[test]
    fn test_has_only_catalog_names() {
        let registry = registry_with(Arc::new(RecordingBackend::default()));
        assert!(registry.has("get_showtimes"));
        assert!(registry.has("buy_ticket"));
        assert!(!registry.has("delete_database"));
        assert!(!registry.has("GET_SHOWTIMES"));
        assert_eq!(registry.kinds().len(), 5);
    }

    #[tokio::test]
    async fn test_invoke_runs_backend_once() {
        let backend = Arc::new(RecordingBackend::default());
        let registry = registry_with(backend.clone());

        let result = registry
            .invoke(&ActionCall::new(
                "get_showtimes",
                json!({"title": "Inception", "location": "New York"}),
            ))
            .await
            .unwrap();

        assert!(result.contains("Inception"));
        assert_eq!(backend.calls(), vec!["get_showtimes".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_location_never_reaches_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let registry = registry_with(backend.clone());

        let err = registry
            .invoke(&ActionCall::new("get_showtimes", json!({"title": "Inception"})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::ParameterMismatch);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_becomes_action_failed() {
        let backend = Arc::new(RecordingBackend::failing("TMDB API key not configured"));
        let registry = registry_with(backend);

        let err = registry
            .execute(Action::GetReviews(crate::actions::ReviewQuery {
                movie_id: MovieId::Numeric(27205),
            }))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), DispatchErrorKind::ActionFailed);
        assert_eq!(
            err.to_string(),
            "Error calling action get_reviews: TMDB API key not configured"
        );
    }
}
