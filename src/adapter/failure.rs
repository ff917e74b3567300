use crate::exception::{BoxError, DynError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error type for axum handlers.
///
/// Any `std::error::Error` converts into it, so handlers can use `?`
/// directly:
///
/// ```
/// use faultline::adapter::Failure;
/// use faultline::prelude::*;
///
/// async fn show_order() -> Result<String, Failure> {
///     let order: Option<String> = None;
///     let order = order.ok_or_else(|| ApiException::new("NOT_FOUND"))?;
///     Ok(order)
/// }
/// ```
///
/// Turned into a response, a `Failure` is only a placeholder 500 carrying
/// the error in its extensions. [`ErrorTranslationLayer`](super::ErrorTranslationLayer)
/// picks it up there and replaces the response with the translated one.
#[derive(Clone)]
pub struct Failure {
    error: Arc<DynError>,
}

/// Response extension marking a response as a raised failure.
#[derive(Clone)]
pub struct RaisedFailure(pub Arc<DynError>);

impl Failure {
    pub fn from_boxed(error: BoxError) -> Self {
        Self {
            error: Arc::from(error),
        }
    }

    pub fn error(&self) -> &DynError {
        self.error.as_ref()
    }
}

impl<E> From<E> for Failure
where
    E: Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            error: Arc::new(error),
        }
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.error, f)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(RaisedFailure(self.error));
        response
    }
}

impl fmt::Debug for RaisedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RaisedFailure").field(&self.0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ApiException;

    #[test]
    fn test_response_carries_the_error() {
        let response = Failure::from(ApiException::new("NOT_FOUND")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let raised = response.extensions().get::<RaisedFailure>().unwrap();
        assert!(raised.0.is::<ApiException>());
    }

    #[test]
    fn test_from_boxed() {
        let boxed: BoxError = Box::new(std::io::Error::other("disk full"));
        let failure = Failure::from_boxed(boxed);
        assert_eq!(failure.to_string(), "disk full");
        assert!(failure.error().is::<std::io::Error>());
    }
}
