//! Error types for the counter service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The backing database failed.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A stored value could not be read as an integer.
    #[error("Invalid value for key '{key}': {value:?}")]
    InvalidValue { key: String, value: String },

    /// The request body was not a JSON signals object.
    #[error("Invalid signals payload: {0}")]
    InvalidSignals(#[source] serde_json::Error),

    /// A signal the handler depends on was not sent by the client.
    #[error("Missing signal: {0}")]
    MissingSignal(&'static str),

    #[error("Counter overflow for key '{key}'")]
    Overflow { key: String },

    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// HTTP status for this error when it escapes a handler.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidSignals(_) | Error::MissingSignal(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Rejected request");
        }

        let body = status.canonical_reason().unwrap_or("Request failed");
        (status, body).into_response()
    }
}
