use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single backend call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// DNS, connection refused and other transport-level failures.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the server's own text when it sent one.
    #[error("{message}")]
    Server { status: StatusCode, message: String },

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

/// Rejections raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter an ingredient name")]
    MissingName,
    #[error("Please enter a valid quantity")]
    InvalidQuantity,
    #[error("Please select a unit")]
    MissingUnit,
    #[error("Please add at least one ingredient")]
    NoIngredients,
    #[error("Please enter an API key")]
    MissingApiKey,
    #[error("Cannot track nutrition for a future date")]
    FutureDate,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AuthError {
    /// Provider error code such as `auth/wrong-password`.
    pub code: Option<String>,
    pub message: String,
}

impl AuthError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn without_code(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

/// Outcome of a page-controller operation that did not complete.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("cancelled by user")]
    Cancelled,
    #[error("no such item")]
    NotFound,
}
