//! # Errors
//!
//! Typed failures surfaced by the ideation client library.

use thiserror::Error;

/// Message stored when a submit is attempted without an open socket.
pub const NOT_CONNECTED_MESSAGE: &str = "Cannot start ideation: WebSocket is not connected.";

/// Client-side form validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("industry is required")]
    MissingIndustry,
    #[error("target audience is required")]
    MissingAudience,
    #[error("select at least one content format")]
    NoFormats,
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// A content format name that is not blog, video or social
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown format '{0}' (expected blog, video or social)")]
pub struct UnknownFormat(pub String);

/// Errors returned by `ideation_core`
#[derive(Debug, Error)]
pub enum IdeationError {
    /// The socket is not open; nothing was sent.
    #[error("WebSocket is not connected")]
    NotConnected,

    /// A request is still in flight; the submit was ignored.
    #[error("an ideation request is already running")]
    Busy,

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("invalid endpoint url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to encode frame: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("health check failed: {0}")]
    Health(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, IdeationError>;
