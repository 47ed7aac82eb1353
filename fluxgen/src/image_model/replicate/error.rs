use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Replicate HTTP API
#[derive(Debug, Error)]
pub enum ReplicateApiError {
    #[error("Authentication error (401): {message}")]
    Authentication { message: String },

    #[error("Payment required (402): {message}")]
    PaymentRequired { message: String },

    #[error("Permission error (403): {message}")]
    Permission { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Invalid input (422): {message}")]
    InvalidInput { message: String },

    #[error("Rate limit exceeded (429): {message}")]
    RateLimit { message: String },

    #[error("Replicate server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Catch-all for unexpected status codes
    #[error("Unexpected API error ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl ReplicateApiError {
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| body.to_string());

        match status.as_u16() {
            401 => Self::Authentication { message },
            402 => Self::PaymentRequired { message },
            403 => Self::Permission { message },
            404 => Self::NotFound { message },
            422 => Self::InvalidInput { message },
            429 => Self::RateLimit { message },
            status @ 500..=599 => Self::Server { status, message },
            status => Self::Unexpected { status, message },
        }
    }
}
