use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the fal.ai queue API
#[derive(Debug, Error)]
pub enum FalApiError {
    #[error("No fal.ai API key configured")]
    MissingCredentials,

    #[error("Invalid request ({status}): {message}")]
    InvalidRequest { status: u16, message: String },

    #[error("Authentication error (401): {message}")]
    Authentication { message: String },

    #[error("Permission error (403): {message}")]
    Permission { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Rate limit exceeded (429): {message}")]
    RateLimit { message: String },

    #[error("Internal API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Generation ended with queue status {status}")]
    GenerationFailed { status: String },

    /// Catch-all for unexpected status codes
    #[error("Unexpected API error ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl FalApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = error_message(body);

        match status {
            400 | 422 => Self::InvalidRequest { status, message },
            401 => Self::Authentication { message },
            403 => Self::Permission { message },
            404 => Self::NotFound { message },
            429 => Self::RateLimit { message },
            500..=599 => Self::Api { status, message },
            _ => Self::Unexpected { status, message },
        }
    }
}

/// `detail` is either a plain string or a list of validation records.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.to_string(),
    }
}
