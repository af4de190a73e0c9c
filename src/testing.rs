//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use tokio::sync::mpsc::UnboundedSender;

use crate::actions::{MovieBackend, MovieId, ShowtimeQuery, TicketOrder};
use crate::enrichment::{
    DecisionError, EnrichmentDecider, EnrichmentDecision, MalformedDecisionError,
};
use crate::message::Message;
use crate::presentation::{MessageHandle, Presenter};
use crate::provider::{CompletionService, GenerationConfig};

/// One scripted completion outcome.
pub enum Scripted {
    Text(String),
    /// Streams the text, then fails mid-stream.
    FailAfter(String),
    /// Never finishes.
    Hang,
}

/// Completion service that replays scripted responses in order.
#[derive(Default)]
pub struct ScriptedCompletion {
    streamed: Mutex<VecDeque<Scripted>>,
    decisions: Mutex<VecDeque<String>>,
    snapshots: Mutex<Vec<Vec<Message>>>,
    stream_calls: AtomicUsize,
    complete_calls: AtomicUsize,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<&str>) -> Self {
        Self::scripted(
            responses
                .into_iter()
                .map(|r| Scripted::Text(r.to_string()))
                .collect(),
        )
    }

    pub fn scripted(responses: Vec<Scripted>) -> Self {
        Self {
            streamed: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    pub fn with_decisions(decisions: Vec<&str>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().map(String::from).collect()),
            ..Self::default()
        }
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    /// Transcripts seen by each streamed completion, in call order.
    pub fn snapshots(&self) -> Vec<Vec<Message>> {
        self.snapshots.lock().unwrap().clone()
    }
}

/// Splits text into small chunks so streaming is exercised.
fn chunks(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(4).map(|c| c.iter().collect()).collect()
}

#[async_trait::async_trait]
impl CompletionService for ScriptedCompletion {
    async fn stream_complete(
        &self,
        transcript: &[Message],
        _config: &GenerationConfig,
        tokens: UnboundedSender<String>,
    ) -> Result<()> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshots.lock().unwrap().push(transcript.to_vec());
        let next = self.streamed.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Text(text)) => {
                for chunk in chunks(&text) {
                    let _ = tokens.send(chunk);
                }
                Ok(())
            }
            Some(Scripted::FailAfter(text)) => {
                for chunk in chunks(&text) {
                    let _ = tokens.send(chunk);
                }
                bail!("connection reset by peer")
            }
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
            None => Err(anyhow!("no scripted response left")),
        }
    }

    async fn complete(&self, _prompt: &[Message], _config: &GenerationConfig) -> Result<String> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted decision left"))
    }
}

/// Everything a presenter was asked to display.
#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Begin(usize),
    Token(String),
    Finalize(usize),
    Message(String),
    Error(String),
}

#[derive(Default)]
pub struct RecordingPresenter {
    pub events: Vec<Shown>,
    next: usize,
}

impl RecordingPresenter {
    /// Full text of each finalized streamed message.
    pub fn streamed(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = String::new();
        for event in &self.events {
            match event {
                Shown::Begin(_) => current.clear(),
                Shown::Token(t) => current.push_str(t),
                Shown::Finalize(_) => out.push(current.clone()),
                _ => {}
            }
        }
        out
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Shown::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Shown::Error(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn begin_message(&mut self) -> MessageHandle {
        self.next += 1;
        self.events.push(Shown::Begin(self.next));
        MessageHandle(self.next)
    }

    fn append_token(&mut self, _handle: &MessageHandle, token: &str) {
        self.events.push(Shown::Token(token.to_string()));
    }

    fn finalize(&mut self, handle: MessageHandle) {
        self.events.push(Shown::Finalize(handle.0));
    }

    fn show_message(&mut self, text: &str) {
        self.events.push(Shown::Message(text.to_string()));
    }

    fn show_error(&mut self, text: &str) {
        self.events.push(Shown::Error(text.to_string()));
    }
}

/// Decider that returns the same outcome every turn.
enum DeciderMode {
    Answer(EnrichmentDecision),
    Malformed,
    Fail(String),
    Hang,
}

pub struct ScriptedDecider {
    mode: DeciderMode,
    calls: AtomicUsize,
}

impl ScriptedDecider {
    pub fn skipping() -> Self {
        Self::returning(EnrichmentDecision::skip("no movie discussed"))
    }

    pub fn fetching(title: &str, id: u64) -> Self {
        Self::returning(EnrichmentDecision {
            movie_title: Some(title.to_string()),
            movie_id: Some(MovieId::Numeric(id)),
            should_fetch: true,
            rationale: "user asks what critics think".into(),
        })
    }

    pub fn returning(decision: EnrichmentDecision) -> Self {
        Self::with_mode(DeciderMode::Answer(decision))
    }

    pub fn malformed() -> Self {
        Self::with_mode(DeciderMode::Malformed)
    }

    /// The decision query itself errors, as a dropped connection would.
    pub fn failing(message: &str) -> Self {
        Self::with_mode(DeciderMode::Fail(message.to_string()))
    }

    pub fn hanging() -> Self {
        Self::with_mode(DeciderMode::Hang)
    }

    fn with_mode(mode: DeciderMode) -> Self {
        Self {
            mode,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl EnrichmentDecider for ScriptedDecider {
    async fn decide(&self, _: &[Message], _: &str) -> Result<EnrichmentDecision, DecisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            DeciderMode::Answer(decision) => Ok(decision.clone()),
            DeciderMode::Malformed => Err(MalformedDecisionError {
                reason: "not valid JSON".into(),
                raw: "fetch them!".into(),
            }
            .into()),
            DeciderMode::Fail(message) => Err(DecisionError::Query(anyhow!(message.clone()))),
            DeciderMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(EnrichmentDecision::skip("too late"))
            }
        }
    }
}

#[derive(Default, Clone, Copy, PartialEq)]
enum BackendMode {
    #[default]
    Answer,
    Fail,
    Hang,
}

/// Backend that records which actions ran and answers with canned text.
#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<String>>,
    mode: BackendMode,
    failure: String,
}

impl RecordingBackend {
    pub fn failing(message: &str) -> Self {
        Self {
            mode: BackendMode::Fail,
            failure: message.to_string(),
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            mode: BackendMode::Hang,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, name: &str, answer: String) -> Result<String> {
        self.calls.lock().unwrap().push(name.to_string());
        match self.mode {
            BackendMode::Answer => Ok(answer),
            BackendMode::Fail => Err(anyhow!("{}", self.failure)),
            BackendMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(answer)
            }
        }
    }
}

#[async_trait::async_trait]
impl MovieBackend for RecordingBackend {
    async fn now_playing(&self) -> Result<String> {
        self.record("get_now_playing_movies", "Now Playing Movies:\n- Dune (ID: 438631)".into())
            .await
    }

    async fn showtimes(&self, query: &ShowtimeQuery) -> Result<String> {
        self.record(
            "get_showtimes",
            format!("Showtimes for {} near {}: 7:00pm", query.title, query.location),
        )
        .await
    }

    async fn confirm_ticket_purchase(&self, order: &TicketOrder) -> Result<String> {
        self.record(
            "confirm_ticket_purchase",
            format!("Please confirm: {} at {}", order.movie, order.theater),
        )
        .await
    }

    async fn buy_ticket(&self, order: &TicketOrder) -> Result<String> {
        self.record("buy_ticket", format!("Ticket purchased for {}", order.movie))
            .await
    }

    async fn reviews(&self, movie_id: &MovieId) -> Result<String> {
        self.record("get_reviews", format!("Author: critic\nReview: {movie_id} is great"))
            .await
    }
}
