//! Error taxonomy for the sync layer.
//!
//! ERROR HANDLING
//! ==============
//! `ApiError` is the network-failure kind: the server could not be reached,
//! answered non-2xx, or answered with a body we could not read.
//! `ValidationError` is raised before any request is built. Rate limiting and
//! missing selection are not errors; they are `RefreshOutcome` values.
//! None of these are fatal: the orchestrator renders them inline and keeps
//! running.

use serde_json::Value;

/// The HTTP transport failed before producing a response.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http request failed: {0}")]
    Transport(#[from] TransportError),
    /// Non-2xx response. `context` is the JSON error body, or `{}` when the
    /// body was missing or unparsable.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, context: Value },
    #[error("invalid JSON response body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    /// HTTP status for `Status` errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Operator input rejected before any network call.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title and location are required.")]
    TitleAndLocationRequired,
    #[error("Report content is required.")]
    ReportContentRequired,
    #[error("Invalid image URL format.")]
    InvalidImageUrl(String),
    #[error("Description is required for geocoding.")]
    GeocodeDescriptionRequired,
    /// The action needs a selected disaster; the payload completes the sentence.
    #[error("Please select a disaster {0}.")]
    NoSelection(&'static str),
}

/// Failure of an orchestrator operation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Network(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
