//! Error taxonomy for backend calls.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::management::StoreError;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Input rejected locally; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with a non-success status.
    #[error("{}", http_message(.status, .message))]
    Http {
        status: StatusCode,
        message: Option<String>,
    },

    /// No response: connection refused, DNS, TLS and similar.
    #[error("Network error: {0}")]
    Network(String),

    /// A success response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(Arc<StoreError>),
}

impl ApiError {
    /// Builds an [`ApiError::Http`] from a status and raw body.
    ///
    /// The message is the body's top-level `message` string when present.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        ApiError::Http {
            status,
            message: extract_message(body),
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Human-readable text for the terminal.
    ///
    /// Validation errors and backend messages are shown verbatim; everything
    /// else collapses to the caller's `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Validation(m) => m.clone(),
            ApiError::Http {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Storage(Arc::new(err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

fn http_message(status: &StatusCode, message: &Option<String>) -> String {
    match message {
        Some(m) if !m.trim().is_empty() => m.clone(),
        _ => format!("HTTP error with status {}", status),
    }
}

fn extract_message(body: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(body).ok()?;
    json.get("message")?.as_str().map(str::to_string)
}
