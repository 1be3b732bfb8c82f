use reqwest::{header::HeaderMap, StatusCode, Url};
use serde_json::Value as JsonValue;

use crate::message::{error_message, preview};

/// Error type returned by [`crate::Fetcher::fetch_with_error`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server answered with a non-success status code.
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Network or request execution error from `reqwest`, passed through unmodified.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A header in [`crate::RequestInit`] could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Returns the HTTP status when the server produced a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Network(err) => Some(err.status()),
            Self::Transport(err) => err.status(),
            Self::InvalidRequest(_) => None,
        }
    }

    pub fn as_network(&self) -> Option<&NetworkError> {
        match self {
            Self::Network(err) => Some(err),
            _ => None,
        }
    }
}

/// Metadata of the response that failed.
///
/// The body itself has been consumed and lives on as
/// [`NetworkError::response_data`].
#[derive(Clone, Debug)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Url,
}

/// Non-success HTTP response turned into an error.
///
/// `Display` is the composed message:
/// `<base message> (status: <status>) <body preview>`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct NetworkError {
    message: String,
    response: ResponseParts,
    response_data: JsonValue,
}

impl NetworkError {
    /// Builds the error and its message from the response metadata and the
    /// parsed body.
    pub fn from_parts(response: ResponseParts, response_data: JsonValue) -> Self {
        let message = format!(
            "{} (status: {}) {}",
            error_message(&response_data),
            response.status.as_u16(),
            preview(&response_data)
        );

        Self {
            message,
            response,
            response_data,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn response(&self) -> &ResponseParts {
        &self.response
    }

    /// Parsed response body: JSON when it parsed, otherwise the raw text as a
    /// JSON string.
    pub fn response_data(&self) -> &JsonValue {
        &self.response_data
    }

    pub fn into_response_data(self) -> JsonValue {
        self.response_data
    }
}
