//! Answering service integrations
//!
//! The chat client never answers questions itself. It hands the question text
//! to an [`Answerer`] and records whatever comes back.

mod http;

use async_trait::async_trait;
use thiserror::Error;

pub use http::HttpAnswerer;

/// Every way a question can fail to produce an answer.
///
/// The session shows the same fallback text for all of these; the variants
/// only exist so the detail can be logged.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Invalid response: {0}")]
    Malformed(String),

    #[error("Request ended without an outcome")]
    Abandoned,
}

impl From<reqwest::Error> for AnswerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnswerError::Timeout
        } else if err.is_decode() {
            AnswerError::Malformed(err.to_string())
        } else {
            AnswerError::Transport(err)
        }
    }
}

/// The remote collaborator that turns a question into an answer
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Send one question and wait for its answer text
    async fn answer(&self, question: &str) -> Result<String, AnswerError>;
}
