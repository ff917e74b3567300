use crate::exception::BoxError;
use thiserror::Error;

/// A failure that carries nothing but an HTTP status.
///
/// Raise this when the status itself is the whole story (an upstream said
/// 503, a route does not exist). The default `StatusListener` maps it to the
/// matching core error and keeps the status.
#[derive(Debug, Error)]
#[error("HTTP {status}: {reason}")]
pub struct HttpStatusException {
    status: u16,
    reason: String,
    #[source]
    source: Option<BoxError>,
}

impl HttpStatusException {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}
