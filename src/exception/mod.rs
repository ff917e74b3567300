//! Failure types understood by the default listeners.
//!
//! Any `std::error::Error + Send + Sync + 'static` can enter the pipeline.
//! The types in this module are the ones application code raises when it
//! wants a specific catalog error returned without writing a listener.

use crate::listener::ErrorRef;
use serde_json::Value;
use std::error::Error;
use std::fmt;

pub mod http;
pub mod validation;

pub use http::HttpStatusException;
pub use validation::{FieldViolation, ValidationFailure};

/// A failure as seen by the pipeline.
pub type DynError = dyn Error + Send + Sync + 'static;

/// An owned, type-erased failure.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Find the first error of type `T` in `error` or its `source()` chain.
pub fn find_in_chain<'a, T: Error + 'static>(error: &'a DynError) -> Option<&'a T> {
    let mut current: Option<&'a (dyn Error + 'static)> = Some(error as &(dyn Error + 'static));
    while let Some(err) = current {
        if let Some(found) = err.downcast_ref::<T>() {
            return Some(found);
        }
        current = err.source();
    }
    None
}

/// Render an error and every `source()` below it, outermost first.
pub fn describe_chain(error: &DynError) -> String {
    let mut description = error.to_string();
    let mut current = error.source();
    while let Some(err) = current {
        description.push_str(" <- caused by: ");
        description.push_str(&err.to_string());
        current = err.source();
    }
    description
}

/// A failure that names its catalog errors directly.
///
/// The `Display` output is the log message only. It never reaches the
/// client payload; the client sees the catalog messages of the referenced
/// errors.
///
/// # Example
/// ```
/// use faultline::exception::ApiException;
/// use faultline::listener::ErrorRef;
///
/// let err = ApiException::new("NOT_FOUND")
///     .with_error(ErrorRef::new("STALE_ETAG").with_arg("etag", "W/\"42\""))
///     .with_log_message("order 42 missing from replica")
///     .with_detail("order_id", "42");
/// assert_eq!(err.errors().len(), 2);
/// ```
#[derive(Debug)]
pub struct ApiException {
    errors: Vec<ErrorRef>,
    status_override: Option<u16>,
    log_message: String,
    details: Vec<(String, String)>,
    source: Option<BoxError>,
}

impl ApiException {
    pub fn new(error: impl Into<ErrorRef>) -> Self {
        Self::with_errors([error])
    }

    pub fn with_errors<I, E>(errors: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<ErrorRef>,
    {
        Self {
            errors: errors.into_iter().map(Into::into).collect(),
            status_override: None,
            log_message: String::new(),
            details: Vec::new(),
            source: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<ErrorRef>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Force the response status instead of deriving it from the errors.
    /// Must be a 4xx or 5xx status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_override = Some(status);
        self
    }

    pub fn with_log_message(mut self, message: impl Into<String>) -> Self {
        self.log_message = message.into();
        self
    }

    /// Extra key/value pair for the server-side log line.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn errors(&self) -> &[ErrorRef] {
        &self.errors
    }

    pub fn status_override(&self) -> Option<u16> {
        self.status_override
    }

    pub fn details(&self) -> &[(String, String)] {
        &self.details
    }

    /// Attach a metadata value to every referenced error.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        self.errors = self
            .errors
            .into_iter()
            .map(|e| e.with_metadata(key.clone(), value.clone()))
            .collect();
        self
    }
}

impl fmt::Display for ApiException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.errors.iter().map(ErrorRef::code).collect();
        write!(f, "ApiException [{}]", codes.join(", "))?;
        if !self.log_message.is_empty() {
            write!(f, ": {}", self.log_message)?;
        }
        for (key, value) in &self.details {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

impl Error for ApiException {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("repository failure")]
    struct RepoError {
        #[source]
        cause: ApiException,
    }

    #[derive(Debug, Error)]
    #[error("service failure")]
    struct ServiceError(#[source] RepoError);

    #[test]
    fn test_find_in_chain_on_self() {
        let err: BoxError = Box::new(ApiException::new("NOT_FOUND"));
        let found = find_in_chain::<ApiException>(err.as_ref()).unwrap();
        assert_eq!(found.errors()[0].code(), "NOT_FOUND");
    }

    #[test]
    fn test_find_in_chain_walks_sources() {
        let err: BoxError = Box::new(ServiceError(RepoError {
            cause: ApiException::new("CONFLICT"),
        }));
        let found = find_in_chain::<ApiException>(err.as_ref()).unwrap();
        assert_eq!(found.errors()[0].code(), "CONFLICT");
        assert!(find_in_chain::<HttpStatusException>(err.as_ref()).is_none());
    }

    #[test]
    fn test_describe_chain() {
        let err: BoxError = Box::new(ServiceError(RepoError {
            cause: ApiException::new("CONFLICT").with_log_message("row locked"),
        }));
        assert_eq!(
            describe_chain(err.as_ref()),
            "service failure <- caused by: repository failure <- caused by: ApiException [CONFLICT]: row locked"
        );
    }

    #[test]
    fn test_display_is_log_oriented() {
        let err = ApiException::with_errors(["A", "B"])
            .with_log_message("boom")
            .with_detail("user", "7");
        assert_eq!(err.to_string(), "ApiException [A, B]: boom user=7");
    }

    #[test]
    fn test_metadata_applies_to_all_errors() {
        let err = ApiException::with_errors(["A", "B"]).with_metadata("retryable", true);
        assert!(err
            .errors()
            .iter()
            .all(|e| e.metadata().get("retryable") == Some(&Value::Bool(true))));
    }
}
