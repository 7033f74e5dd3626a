//! HTTP answering service client
//!
//! Talks to a service exposing the question/answer exchange:
//!
//! ```text
//! POST /api/chat   {"question": "..."}  ->  200 {"answer": "..."}
//!                                       ->  4xx/5xx {"error": "..."}
//! GET  /api/test                        ->  200 {"message": "..."}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;

use super::{AnswerError, Answerer};

pub struct HttpAnswerer {
    client: Client,
    chat_url: String,
    health_url: String,
}

#[derive(Debug, Serialize)]
struct QuestionRequest<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    answer: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    #[serde(default)]
    message: Option<String>,
}

impl HttpAnswerer {
    pub fn new(
        base_url: &str,
        chat_path: &str,
        health_path: &str,
        timeout: Duration,
    ) -> Result<Self, AnswerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AnswerError::Transport)?;
        let base = base_url.trim_end_matches('/');

        Ok(Self {
            client,
            chat_url: format!("{}{}", base, chat_path),
            health_url: format!("{}{}", base, health_path),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, AnswerError> {
        Self::new(
            &api.base_url,
            &api.chat_path,
            &api.health_path,
            Duration::from_secs(api.timeout_secs),
        )
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Probe the service's test endpoint. Returns the greeting it reports.
    pub async fn check_connection(&self) -> Result<String, AnswerError> {
        let response = self.client.get(&self.health_url).send().await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        let health: HealthResponse =
            serde_json::from_str(&body).map_err(|e| AnswerError::Malformed(e.to_string()))?;
        Ok(health.message.unwrap_or_else(|| "ok".to_string()))
    }
}

#[async_trait]
impl Answerer for HttpAnswerer {
    async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        let response = self
            .client
            .post(&self.chat_url)
            .json(&QuestionRequest { question })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        let parsed: AnswerResponse =
            serde_json::from_str(&body).map_err(|e| AnswerError::Malformed(e.to_string()))?;

        Ok(parsed.answer)
    }
}

/// Build a status error, preferring the service's own `error` message
async fn status_error(response: reqwest::Response) -> AnswerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorResponse>(&body) {
        Ok(err) => err.error,
        Err(_) => body,
    };
    AnswerError::Status { status, detail }
}
