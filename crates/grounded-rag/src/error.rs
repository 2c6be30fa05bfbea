//! Error types for the RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required file of the persisted index bundle is absent
    #[error("Required index file not found: {}", .0.display())]
    MissingIndexFile(PathBuf),

    /// A bundle file exists but cannot be turned into a usable index
    #[error("Failed to load '{}': {message}", path.display())]
    IndexLoad { path: PathBuf, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Language model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an index load error for a bundle file
    pub fn index_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IndexLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error means the core cannot be brought up at all
    pub fn is_fatal_load(&self) -> bool {
        matches!(self, Self::MissingIndexFile(_) | Self::IndexLoad { .. })
    }
}

/// Failure classes visible at the HTTP boundary
///
/// The underlying error is logged where it happens; none of its text
/// reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The core failed to load at startup
    NotReady,
    /// Malformed request (not JSON, missing query, ...)
    BadRequest(&'static str),
    /// The query did not finish within the request deadline
    Timeout,
    /// Any failure during search or generation
    Internal,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            ApiError::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                "The backend RAG system failed to start. Please check server logs.",
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", *message),
            ApiError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "timeout",
                "The request took too long to process. Please try again.",
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred while processing your query. Please try again.",
            ),
        }
    }

    /// HTTP status for this failure class
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        tracing::error!("Query failed: {}", err);
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = self.parts();

        let body = Json(json!({
            "error": message,
            "kind": kind,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_load_classification() {
        assert!(Error::MissingIndexFile(PathBuf::from("docs/faiss/index.vec")).is_fatal_load());
        assert!(Error::index_load("index.json", "bad ordinal key").is_fatal_load());
        assert!(!Error::llm("timeout").is_fatal_load());
        assert!(!Error::embedding("401").is_fatal_load());
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(ApiError::NotReady.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::BadRequest("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::from(Error::internal("boom")), ApiError::Internal);
    }
}
