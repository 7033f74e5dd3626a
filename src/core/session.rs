//! Conversation session state machine
//!
//! A session owns the transcript, the unsent input buffer and the request
//! state. It moves between two states:
//!
//! ```text
//!            submit (non-blank input)
//!   Idle  ──────────────────────────────▶  Waiting
//!    ▲                                       │
//!    └──── on_answer_received / failed ──────┘
//! ```
//!
//! Everything else (blank submits, submits while waiting, input edits) leaves
//! the state untouched.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::answering::AnswerError;
use crate::config::SessionConfig;
use crate::conversation::{Message, Transcript};

use super::dispatch::Settlement;

/// Text shown to the user whenever a question fails for any reason
pub const FALLBACK_MESSAGE: &str = "Sorry, I ran into an error. Please try again.";

/// Map any answering failure to the text the user sees.
///
/// All failures collapse to [`FALLBACK_MESSAGE`]; the error detail is for logs only.
pub fn fallback_message(_error: &AnswerError) -> &'static str {
    FALLBACK_MESSAGE
}

/// Whether a question is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Waiting { since: DateTime<Utc> },
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Bot message seeded into the transcript at creation
    pub greeting: Option<String>,
}

impl SessionOptions {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            greeting: config.greeting(),
        }
    }
}

/// One line of the rendered conversation
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEntry<'a> {
    Message(&'a Message),
    /// Transient indicator that an answer is outstanding; never part of the transcript
    Pending { since: DateTime<Utc> },
}

/// Everything a renderer needs to draw the session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView<'a> {
    pub entries: Vec<ViewEntry<'a>>,
    pub input: &'a str,
    pub input_enabled: bool,
}

#[derive(Debug)]
pub struct ConversationSession {
    id: Uuid,
    transcript: Transcript,
    pending: String,
    state: RequestState,
}

impl ConversationSession {
    pub fn new(options: SessionOptions) -> Self {
        let mut transcript = Transcript::new();
        if let Some(greeting) = options.greeting {
            transcript.push(Message::bot(greeting));
        }

        let id = Uuid::new_v4();
        tracing::debug!(session_id = %id, seeded = !transcript.is_empty(), "Session created");

        Self {
            id,
            transcript,
            pending: String::new(),
            state: RequestState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn awaiting_response(&self) -> bool {
        matches!(self.state, RequestState::Waiting { .. })
    }

    /// Replace the input buffer verbatim
    pub fn update_input(&mut self, text: impl Into<String>) {
        self.pending = text.into();
    }

    /// Accept the buffered input as a question.
    ///
    /// Returns the question to send, exactly as appended to the transcript, or
    /// `None` (with no state change) when the buffer is blank or a question is
    /// already in flight.
    pub fn submit(&mut self) -> Option<String> {
        if self.pending.trim().is_empty() || self.awaiting_response() {
            return None;
        }

        let question = std::mem::take(&mut self.pending);
        self.transcript.push(Message::user(question.as_str()));
        self.state = RequestState::Waiting { since: Utc::now() };

        tracing::info!(session_id = %self.id, chars = question.chars().count(), "Question submitted");
        Some(question)
    }

    /// Record a successful answer. The text is shown as-is, even when empty.
    pub fn on_answer_received(&mut self, answer: impl Into<String>) -> bool {
        if !self.release() {
            return false;
        }
        self.transcript.push(Message::bot(answer));
        tracing::info!(session_id = %self.id, "Answer received");
        true
    }

    /// Record a failed question with the fallback text. The error is logged, not shown.
    pub fn on_answer_failed(&mut self, error: &AnswerError) -> bool {
        if !self.release() {
            return false;
        }
        self.transcript.push(Message::bot(fallback_message(error)));
        tracing::warn!(session_id = %self.id, error = %error, "Question failed");
        true
    }

    /// Apply the outcome of a dispatched question
    pub fn settle(&mut self, settlement: Settlement) -> bool {
        match settlement.outcome {
            Ok(answer) => self.on_answer_received(answer),
            Err(error) => self.on_answer_failed(&error),
        }
    }

    /// Leave `Waiting`. Outcomes that arrive while idle are dropped.
    fn release(&mut self) -> bool {
        match self.state {
            RequestState::Waiting { since } => {
                self.state = RequestState::Idle;
                let elapsed = Utc::now() - since;
                tracing::debug!(
                    session_id = %self.id,
                    elapsed_ms = elapsed.num_milliseconds(),
                    "Request settled"
                );
                true
            }
            RequestState::Idle => {
                tracing::warn!(session_id = %self.id, "Ignoring outcome with no request in flight");
                false
            }
        }
    }

    /// Render the session. Pure: reads state only.
    pub fn view(&self) -> SessionView<'_> {
        let mut entries: Vec<ViewEntry<'_>> =
            self.transcript.iter().map(ViewEntry::Message).collect();
        if let RequestState::Waiting { since } = self.state {
            entries.push(ViewEntry::Pending { since });
        }

        SessionView {
            entries,
            input: &self.pending,
            input_enabled: !self.awaiting_response(),
        }
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}
