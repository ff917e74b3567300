use thiserror::Error;

pub type Result<T> = std::result::Result<T, FaultlineError>;

/// Errors raised while building the pipeline (catalog and configuration).
///
/// These surface at startup, before any request traffic. Failures that happen
/// while handling a request never use this type: see
/// [`UnexpectedMajorExceptionHandlingError`](crate::engine::UnexpectedMajorExceptionHandlingError).
#[derive(Debug, Error)]
pub enum FaultlineError {
    #[error("Duplicate error code in catalog: {code}")]
    DuplicateCode { code: String },

    #[error("Error code must not be blank")]
    BlankCode,

    #[error("Invalid HTTP status {status} for error code {code}: must be within 100..=599")]
    InvalidStatus { code: String, status: u16 },

    #[error("Catalog has no fallback error definition")]
    MissingFallback,

    #[error("Fallback error code {code} is not defined in the catalog")]
    UnknownFallback { code: String },

    #[error("Fallback error {code} must map to a server error status, got {status}")]
    FallbackNotServerError { code: String, status: u16 },

    #[error("Catalog is missing errors the default listeners emit: {}", .codes.join(", "))]
    MissingCoreErrors { codes: Vec<String> },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FaultlineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
