//! Review enrichment decisions.
//!
//! Before each answer, an auxiliary non-streamed query asks the model which
//! movie the conversation is about and whether critic reviews would help
//! answer the latest message. The reply must be one strict JSON object:
//!
//! ```text
//! {"movie": "Inception", "id": 27205, "fetch_reviews": true, "rationale": "asks what critics think"}
//! ```
//!
//! A reply that doesn't match is a [`MalformedDecisionError`], which ends the
//! turn; it is never retried.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::actions::MovieId;
use crate::constants::ENRICHMENT_PROMPT;
use crate::message::{Message, Role};
use crate::provider::{CompletionService, GenerationConfig};

/// Whether to fetch reviews before answering, and for which movie.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentDecision {
    pub movie_title: Option<String>,
    pub movie_id: Option<MovieId>,
    pub should_fetch: bool,
    pub rationale: String,
}

impl EnrichmentDecision {
    /// A decision that never fetches.
    pub fn skip(rationale: impl Into<String>) -> Self {
        Self {
            movie_title: None,
            movie_id: None,
            should_fetch: false,
            rationale: rationale.into(),
        }
    }
}

/// The enrichment reply did not follow the wire format.
#[derive(Debug, thiserror::Error)]
#[error("malformed enrichment decision: {reason}")]
pub struct MalformedDecisionError {
    pub reason: String,
    /// The reply as received, for logs.
    pub raw: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    #[error(transparent)]
    Malformed(#[from] MalformedDecisionError),

    #[error("review check failed: {0:#}")]
    Query(anyhow::Error),
}

/// Decides, once per user message, whether review context is needed.
#[async_trait::async_trait]
pub trait EnrichmentDecider: Send + Sync {
    async fn decide(
        &self,
        transcript: &[Message],
        latest_user_message: &str,
    ) -> Result<EnrichmentDecision, DecisionError>;
}

/// Asks the completion service for the decision.
pub struct ModelDecider {
    completion: Arc<dyn CompletionService>,
    config: GenerationConfig,
}

impl ModelDecider {
    pub fn new(completion: Arc<dyn CompletionService>, config: GenerationConfig) -> Self {
        Self { completion, config }
    }

    /// The two-message prompt: instructions plus rendered conversation as the
    /// system message, the latest user message as the user message.
    pub fn prompt(transcript: &[Message], latest_user_message: &str) -> Vec<Message> {
        let mut conversation = String::new();
        // The opening contract is the assistant's instructions, not conversation.
        for msg in transcript.iter().skip(1) {
            let label = match (&msg.role, &msg.action_name) {
                (Role::ActionResult, Some(name)) => format!("action {name}"),
                (role, _) => role.to_string(),
            };
            conversation.push_str(&format!("[{}]: {}\n", label, msg.text()));
        }

        let instructions = format!(
            "{ENRICHMENT_PROMPT}\n\nConversation:\n{conversation}\nLatest User Message: {latest_user_message}"
        );
        vec![
            Message::system(instructions),
            Message::user(latest_user_message),
        ]
    }
}

#[async_trait::async_trait]
impl EnrichmentDecider for ModelDecider {
    async fn decide(
        &self,
        transcript: &[Message],
        latest_user_message: &str,
    ) -> Result<EnrichmentDecision, DecisionError> {
        let prompt = Self::prompt(transcript, latest_user_message);
        let reply = self
            .completion
            .complete(&prompt, &self.config)
            .await
            .map_err(DecisionError::Query)?;
        let decision = parse_decision(&reply).inspect_err(|err| {
            warn!(reason = %err.reason, raw = %err.raw, "malformed enrichment decision")
        })?;
        debug!(
            movie = ?decision.movie_title,
            fetch = decision.should_fetch,
            rationale = %decision.rationale,
            "enrichment decision"
        );
        Ok(decision)
    }
}

/// Used when enrichment is turned off in config.
pub struct NoEnrichment;

#[async_trait::async_trait]
impl EnrichmentDecider for NoEnrichment {
    async fn decide(&self, _: &[Message], _: &str) -> Result<EnrichmentDecision, DecisionError> {
        Ok(EnrichmentDecision::skip("review enrichment is disabled"))
    }
}

#[derive(Deserialize)]
struct DecisionWire {
    movie: Option<String>,
    id: Option<MovieId>,
    fetch_reviews: bool,
    rationale: String,
}

const REQUIRED_FIELDS: [&str; 4] = ["movie", "id", "fetch_reviews", "rationale"];

/// Parses an enrichment reply.
///
/// All four fields must be present; `movie` and `id` may be `null` but not
/// absent. Extra fields are ignored.
pub fn parse_decision(text: &str) -> Result<EnrichmentDecision, MalformedDecisionError> {
    let malformed = |reason: String| MalformedDecisionError {
        reason,
        raw: text.to_string(),
    };

    let value: Value =
        serde_json::from_str(text).map_err(|e| malformed(format!("not valid JSON ({e})")))?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object".to_string()))?;
    if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
        return Err(malformed(format!("missing field `{missing}`")));
    }

    let wire: DecisionWire =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
    Ok(EnrichmentDecision {
        movie_title: wire.movie,
        movie_id: wire.id,
        should_fetch: wire.fetch_reviews,
        rationale: wire.rationale,
    })
}

/// Text of the system message that injects fetched reviews.
pub fn review_context(title: Option<&str>, movie_id: &MovieId, reviews: &str) -> String {
    let title = title.unwrap_or("the movie");
    format!("CONTEXT: Reviews for {title} (ID: {movie_id}):\n\n{reviews}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCompletion;

    #[test]
    fn test_parse_full_decision() {
        let decision = parse_decision(
            r#"{"movie": "Inception", "id": 27205, "fetch_reviews": true, "rationale": "asks about critics"}"#,
        )
        .unwrap();
        assert_eq!(decision.movie_title.as_deref(), Some("Inception"));
        assert_eq!(decision.movie_id, Some(MovieId::Numeric(27205)));
        assert!(decision.should_fetch);
        assert_eq!(decision.rationale, "asks about critics");
    }

    #[test]
    fn test_parse_integral_float_id() {
        let decision = parse_decision(
            r#"{"movie": "Inception", "id": 27205.0, "fetch_reviews": true, "rationale": "r"}"#,
        )
        .unwrap();
        assert_eq!(decision.movie_id, Some(MovieId::Numeric(27205)));

        let err = parse_decision(
            r#"{"movie": "Inception", "id": 27205.5, "fetch_reviews": true, "rationale": "r"}"#,
        )
        .unwrap_err();
        assert!(err.raw.contains("27205.5"));
    }

    #[test]
    fn test_parse_nulls_are_allowed() {
        let decision = parse_decision(
            r#"{"movie": null, "id": null, "fetch_reviews": false, "rationale": "small talk"}"#,
        )
        .unwrap();
        assert_eq!(decision, EnrichmentDecision::skip("small talk"));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let err = parse_decision(r#"{"movie": null, "fetch_reviews": false, "rationale": "x"}"#)
            .unwrap_err();
        assert!(err.reason.contains("`id`"));
    }

    #[test]
    fn test_parse_rejects_wrong_types_and_non_json() {
        assert!(parse_decision(
            r#"{"movie": null, "id": null, "fetch_reviews": "yes", "rationale": "x"}"#
        )
        .is_err());
        assert!(parse_decision("I think we should fetch reviews.").is_err());
        assert!(parse_decision("[]").is_err());
        // The prompt forbids code fences; they are not stripped.
        let fenced = "```json\n{\"movie\": null, \"id\": null, \"fetch_reviews\": false, \"rationale\": \"x\"}\n```";
        let err = parse_decision(fenced).unwrap_err();
        assert_eq!(err.raw, fenced);
    }

    #[test]
    fn test_prompt_embeds_conversation_without_contract() {
        let transcript = vec![
            Message::system("SECRET CONTRACT"),
            Message::user("Tell me about Inception"),
            Message::system("CONTEXT: Reviews for Inception (ID: 27205):\n\ngreat"),
        ];
        let prompt = ModelDecider::prompt(&transcript, "Is it good?");
        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, Role::System);
        assert!(!prompt[0].text().contains("SECRET CONTRACT"));
        assert!(prompt[0].text().contains("[user]: Tell me about Inception"));
        assert!(prompt[0].text().contains("CONTEXT: Reviews for Inception"));
        assert!(prompt[0].text().ends_with("Latest User Message: Is it good?"));
        assert_eq!(prompt[1], Message::user("Is it good?"));
    }

    #[test]
    fn test_review_context_format() {
        assert_eq!(
            review_context(Some("Inception"), &MovieId::Numeric(27205), "Loved it."),
            "CONTEXT: Reviews for Inception (ID: 27205):\n\nLoved it."
        );
    }

    #[tokio::test]
    async fn test_model_decider_uses_single_completion() {
        let completion = Arc::new(ScriptedCompletion::with_decisions(vec![
            r#"{"movie": "Dune", "id": 438631, "fetch_reviews": false, "rationale": "already have reviews"}"#,
        ]));
        let config = GenerationConfig {
            model: "gpt-4o".into(),
            temperature: 0.2,
            max_tokens: 300,
        };
        let decider = ModelDecider::new(completion.clone(), config);

        let decision = decider
            .decide(&[Message::system("c"), Message::user("hi")], "hi")
            .await
            .unwrap();

        assert!(!decision.should_fetch);
        assert_eq!(completion.complete_calls(), 1);
        assert_eq!(completion.stream_calls(), 0);
    }

    #[tokio::test]
    async fn test_model_decider_reports_malformed_reply() {
        let completion = Arc::new(ScriptedCompletion::with_decisions(vec!["sure, fetch them"]));
        let config = GenerationConfig {
            model: "gpt-4o".into(),
            temperature: 0.2,
            max_tokens: 300,
        };
        let decider = ModelDecider::new(completion, config);

        let err = decider.decide(&[Message::system("c")], "hi").await.unwrap_err();
        assert!(matches!(err, DecisionError::Malformed(_)));
    }
}
