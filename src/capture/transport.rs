use crate::reply::coerce_answer;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use std::fmt;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001/ask";

#[derive(Debug)]
pub enum AskError {
    Network(reqwest::Error),
    /// Non-2xx reply; `body` is the raw response text.
    Status { status: StatusCode, body: String },
    InvalidBody(String),
}

impl fmt::Display for AskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AskError::Network(err) => write!(f, "{err}"),
            AskError::Status { status, body } if body.trim().is_empty() => {
                write!(f, "Server error {}", status.as_u16())
            }
            AskError::Status { body, .. } => f.write_str(body),
            AskError::InvalidBody(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for AskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AskError::Network(err) => Some(err),
            _ => None,
        }
    }
}

#[async_trait]
pub trait AskTransport: Send + Sync {
    /// Sends prepared text and returns the answer to display.
    async fn ask(&self, text: &str) -> Result<String, AskError>;
}

#[derive(Debug, Clone)]
pub struct HttpAskTransport {
    http: Client,
    endpoint: String,
}

impl HttpAskTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpAskTransport {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl AskTransport for HttpAskTransport {
    async fn ask(&self, text: &str) -> Result<String, AskError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(AskError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AskError::Status { status, body });
        }

        let body = response.text().await.map_err(AskError::Network)?;
        let value: Value = serde_json::from_str(&body)
            .map_err(|err| AskError::InvalidBody(format!("Invalid response from server: {err}")))?;
        Ok(coerce_answer(value.get("answer")))
    }
}
