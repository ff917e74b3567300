//! Framework adapters
//!
//! The pipeline produces plain data: a status code and an
//! [`ErrorContractPayload`]. An adapter turns that into whatever the host
//! framework writes back to the client. [`RawAdapter`] hands the data back
//! untouched; [`AxumAdapter`] builds an `axum::response::Response`.

mod failure;
mod layer;
mod rejection;
mod response;

pub use failure::{Failure, RaisedFailure};
pub use layer::{ErrorTranslationLayer, ErrorTranslationService};
pub use rejection::RejectionListener;
pub use response::{AxumAdapter, ContentTypeResolver};

use crate::common::{ErrorContractPayload, RequestContext};
use crate::engine::ExceptionHandlingResult;
use crate::listener::Listener;
use crate::listener::builtins::default_listeners;
use std::sync::Arc;

/// Translates pipeline output into a framework representation.
pub trait FrameworkAdapter: Send + Sync + 'static {
    type Output;

    /// Build the framework's response. Must not fail: by the time this runs
    /// the payload is final and the client must get it.
    fn prepare(
        &self,
        payload: &ErrorContractPayload,
        http_status: u16,
        result: &ExceptionHandlingResult<'_>,
        context: &RequestContext,
    ) -> Self::Output;
}

/// Returns the framework-agnostic `(status, payload)` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawAdapter;

impl FrameworkAdapter for RawAdapter {
    type Output = (u16, ErrorContractPayload);

    fn prepare(
        &self,
        payload: &ErrorContractPayload,
        http_status: u16,
        _result: &ExceptionHandlingResult<'_>,
        _context: &RequestContext,
    ) -> Self::Output {
        (http_status, payload.clone())
    }
}

/// The core default listeners followed by [`RejectionListener`].
pub fn axum_default_listeners() -> Vec<Arc<dyn Listener>> {
    let mut listeners = default_listeners();
    listeners.push(Arc::new(RejectionListener));
    listeners
}
