//! The per-message turn loop.
//!
//! A turn starts when the user sends a message and ends when the model
//! answers in plain text. In between it runs an explicit state machine:
//!
//! ```text
//! AwaitingEnrichmentDecision -> AwaitingCompletion -> ParsingResponse -> Done
//!                                      ^                    |
//!                                      +---- Dispatching <--+
//! ```
//!
//! Every side effect the model should see later is appended to the session
//! transcript before the next completion request.


use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::actions::{parse_action_call, Action, ActionCall, ActionRegistry, ReviewQuery};
use crate::config::Config;
use crate::enrichment::{review_context, DecisionError, EnrichmentDecider};
use crate::message::Message;
use crate::presentation::Presenter;
use crate::provider::{CompletionService, GenerationConfig};
use crate::session::ChatSession;

/// Settings for one turn.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    pub generation: GenerationConfig,
    /// Upper bound on action dispatches within a single turn.
    pub max_action_iterations: usize,
    /// Applies separately to each completion, decision query and action call.
    pub request_timeout: Duration,
}

impl TurnConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            generation: config.generation_config(),
            max_action_iterations: config.max_action_iterations(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// How a turn that did not fail came to an end.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The model produced a plain answer.
    Answered(String),
    /// The model kept requesting actions past the per-turn cap.
    IterationLimitReached,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnSummary {
    pub outcome: TurnOutcome,
    pub completions: usize,
    pub dispatches: usize,
    pub context_injected: bool,
}

/// The step that ran out of time.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    EnrichmentDecision,
    ReviewFetch,
    Completion,
    Action(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::EnrichmentDecision => write!(f, "review check"),
            Stage::ReviewFetch => write!(f, "review fetch"),
            Stage::Completion => write!(f, "completion"),
            Stage::Action(name) => write!(f, "action {name}"),
        }
    }
}

/// Failures that end a turn early.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error("completion failed: {0:#}")]
    Completion(anyhow::Error),

    #[error("{stage} timed out after {}s", .after.as_secs_f32())]
    Timeout { stage: Stage, after: Duration },
}

enum TurnState {
    AwaitingEnrichmentDecision,
    AwaitingCompletion,
    ParsingResponse(String),
    Dispatching(ActionCall),
    Done(TurnOutcome),
}

#[derive(Default)]
struct Progress {
    completions: usize,
    dispatches: usize,
    context_injected: bool,
}

/// Runs turns against shared collaborators.
///
/// The engine holds no per-conversation state, so one engine can serve any
/// number of sessions.
pub struct TurnEngine {
    completion: Arc<dyn CompletionService>,
    decider: Arc<dyn EnrichmentDecider>,
    registry: Arc<ActionRegistry>,
    config: TurnConfig,
}

impl TurnEngine {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        decider: Arc<dyn EnrichmentDecider>,
        registry: Arc<ActionRegistry>,
        config: TurnConfig,
    ) -> Self {
        Self {
            completion,
            decider,
            registry,
            config,
        }
    }

    /// Processes one user message to completion.
    ///
    /// Errors are already displayed through `presenter` when this returns;
    /// callers only need to decide whether to keep going.
    ///
    /// Only a timeout leaves a system note in the transcript. A malformed or
    /// failed enrichment decision and a failed completion leave it exactly at
    /// its last successful append, so partial streamed text is never kept.
    #[instrument(skip_all, fields(session = %session.short_id()))]
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        user_message: &str,
        presenter: &mut dyn Presenter,
    ) -> Result<TurnSummary, TurnError> {
        session.transcript.append(Message::user(user_message));

        let result = self.drive(session, user_message, presenter).await;
        if let Err(err) = &result {
            warn!(error = %err, "turn failed");
            if matches!(err, TurnError::Timeout { .. }) {
                session.transcript.append(Message::system(err.to_string()));
            }
            presenter.show_error(&err.to_string());
        }
        result
    }

    async fn drive(
        &self,
        session: &mut ChatSession,
        user_message: &str,
        presenter: &mut dyn Presenter,
    ) -> Result<TurnSummary, TurnError> {
        let mut progress = Progress::default();
        let mut state = TurnState::AwaitingEnrichmentDecision;

        loop {
            state = match state {
                TurnState::AwaitingEnrichmentDecision => {
                    progress.context_injected =
                        self.enrich(session, user_message, presenter).await?;
                    TurnState::AwaitingCompletion
                }
                TurnState::AwaitingCompletion => {
                    progress.completions += 1;
                    TurnState::ParsingResponse(self.stream_answer(session, presenter).await?)
                }
                TurnState::ParsingResponse(text) => match parse_action_call(&text) {
                    None => {
                        session.transcript.append(Message::assistant(text.clone()));
                        TurnState::Done(TurnOutcome::Answered(text))
                    }
                    Some(_) if progress.dispatches >= self.config.max_action_iterations => {
                        warn!(
                            limit = self.config.max_action_iterations,
                            "action iteration limit reached"
                        );
                        session.transcript.append(Message::assistant(text));
                        let note = format!(
                            "Stopped after {} action calls in one turn. Ask again to continue.",
                            progress.dispatches
                        );
                        session.transcript.append(Message::system(note.clone()));
                        presenter.show_message(&note);
                        TurnState::Done(TurnOutcome::IterationLimitReached)
                    }
                    Some(call) => TurnState::Dispatching(call),
                },
                TurnState::Dispatching(call) => {
                    progress.dispatches += 1;
                    self.dispatch(session, call, presenter).await?;
                    TurnState::AwaitingCompletion
                }
                TurnState::Done(outcome) => {
                    return Ok(TurnSummary {
                        outcome,
                        completions: progress.completions,
                        dispatches: progress.dispatches,
                        context_injected: progress.context_injected,
                    });
                }
            };
        }
    }

    /// Asks the decider whether reviews are needed and injects them.
    /// Returns whether a context message was appended.
    async fn enrich(
        &self,
        session: &mut ChatSession,
        user_message: &str,
        presenter: &mut dyn Presenter,
    ) -> Result<bool, TurnError> {
        let decision = self
            .within(
                Stage::EnrichmentDecision,
                self.decider.decide(session.transcript.snapshot(), user_message),
            )
            .await??;

        if !decision.should_fetch {
            return Ok(false);
        }
        let Some(movie_id) = decision.movie_id else {
            warn!(rationale = %decision.rationale, "review fetch requested without a movie id");
            return Ok(false);
        };

        let fetched = self
            .within(
                Stage::ReviewFetch,
                self.registry.execute(Action::GetReviews(ReviewQuery {
                    movie_id: movie_id.clone(),
                })),
            )
            .await?;

        match fetched {
            Ok(reviews) => {
                debug!(movie = %movie_id, "injecting review context");
                session.transcript.append(Message::system(review_context(
                    decision.movie_title.as_deref(),
                    &movie_id,
                    &reviews,
                )));
                Ok(true)
            }
            Err(err) => {
                let note = format!("Could not load reviews for {movie_id}: {err}");
                session.transcript.append(Message::system(note.clone()));
                presenter.show_error(&note);
                Ok(false)
            }
        }
    }

    /// Streams one completion over the current transcript, relaying chunks
    /// to the presenter as they arrive.
    async fn stream_answer(
        &self,
        session: &ChatSession,
        presenter: &mut dyn Presenter,
    ) -> Result<String, TurnError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let handle = presenter.begin_message();
        let mut text = String::new();

        let produce = tokio::time::timeout(
            self.config.request_timeout,
            self.completion
                .stream_complete(session.transcript.snapshot(), &self.config.generation, tx),
        );
        // The sender lives inside `produce`, so the channel closes when the
        // stream ends, fails or times out.
        let consume = async {
            while let Some(chunk) = rx.recv().await {
                presenter.append_token(&handle, &chunk);
                text.push_str(&chunk);
            }
        };
        let (result, ()) = tokio::join!(produce, consume);
        presenter.finalize(handle);

        match result {
            Err(_) => Err(TurnError::Timeout {
                stage: Stage::Completion,
                after: self.config.request_timeout,
            }),
            Ok(Err(err)) => Err(TurnError::Completion(err)),
            Ok(Ok(())) => Ok(text),
        }
    }

    async fn dispatch(
        &self,
        session: &mut ChatSession,
        call: ActionCall,
        presenter: &mut dyn Presenter,
    ) -> Result<(), TurnError> {
        session.transcript.append(Message::assistant(call.to_wire()));
        info!(action = %call.name, known = self.registry.has(&call.name), "model requested action");

        let result = self
            .within(Stage::Action(call.name.clone()), self.registry.invoke(&call))
            .await?;

        match result {
            Ok(output) => {
                session
                    .transcript
                    .append(Message::action_result(&call.name, output.clone()));
                presenter.show_message(&format!("Action result ({}):\n\n{}", call.name, output));
            }
            Err(err) => {
                debug!(kind = ?err.kind(), "noting failed dispatch for the model");
                let note = err.to_string();
                session.transcript.append(Message::system(note.clone()));
                presenter.show_error(&note);
            }
        }
        Ok(())
    }

    async fn within<T>(
        &self,
        stage: Stage,
        fut: impl Future<Output = T>,
    ) -> Result<T, TurnError> {
        let after = self.config.request_timeout;
        tokio::time::timeout(after, fut)
            .await
            .map_err(|_| TurnError::Timeout { stage, after })
    }
}
