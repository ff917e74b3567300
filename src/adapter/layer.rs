use super::{AxumAdapter, RaisedFailure, axum_default_listeners, response::ErrorContractResponse};
use crate::catalog::{ErrorCatalog, core};
use crate::common::RequestContext;
use crate::config::{DEFAULT_CORRELATION_HEADER, PipelineConfig};
use crate::error::{FaultlineError, Result};
use crate::exception::{BoxError, HttpStatusException};
use crate::handler::ApiExceptionHandler;
use crate::listener::{Listener, ListenerChain};
use axum::{
    body::Body,
    http::{HeaderName, Request},
    response::Response,
};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

/// Tower layer that routes every failure of the wrapped service through
/// the exception handler.
///
/// Three kinds of failure are caught:
///
/// - errors returned by the inner service,
/// - responses produced by a [`Failure`](super::Failure),
/// - any other 4xx/5xx response, such as axum's own unmatched-route 404,
///   method-not-allowed 405 and bare extractor rejections. These go through
///   the pipeline as an [`HttpStatusException`] carrying the response status.
///   Disable with [`with_error_response_translation`](Self::with_error_response_translation).
#[derive(Clone)]
pub struct ErrorTranslationLayer {
    handler: Arc<ApiExceptionHandler<AxumAdapter>>,
    correlation_header: HeaderName,
    translate_error_responses: bool,
}

impl ErrorTranslationLayer {
    pub fn new(handler: ApiExceptionHandler<AxumAdapter>) -> Self {
        Self {
            handler: Arc::new(handler),
            correlation_header: HeaderName::from_static(DEFAULT_CORRELATION_HEADER),
            translate_error_responses: true,
        }
    }

    /// Application listeners run ahead of the framework defaults.
    ///
    /// Fails if the catalog lacks a code the default listeners can name;
    /// build it with [`ErrorCatalogBuilder::with_core_errors`](crate::catalog::ErrorCatalogBuilder::with_core_errors)
    /// or [`ErrorCatalog::from_set`].
    pub fn from_config(
        catalog: Arc<ErrorCatalog>,
        application_listeners: Vec<Arc<dyn Listener>>,
        config: &PipelineConfig,
    ) -> Result<Self> {
        let missing = catalog.missing_codes(core::DEFAULT_LISTENER_CODES);
        if !missing.is_empty() {
            return Err(FaultlineError::MissingCoreErrors {
                codes: missing.into_iter().map(str::to_string).collect(),
            });
        }

        let chain = ListenerChain::compose(application_listeners, axum_default_listeners());
        let adapter = AxumAdapter::from_config(config)?;
        let handler = ApiExceptionHandler::new(catalog, chain, adapter).with_config(config);
        let correlation_header = HeaderName::from_bytes(config.correlation_header.as_bytes())
            .map_err(|e| {
                FaultlineError::config(format!(
                    "invalid correlation header {:?}: {e}",
                    config.correlation_header
                ))
            })?;

        Ok(Self {
            handler: Arc::new(handler),
            correlation_header,
            translate_error_responses: true,
        })
    }

    pub fn with_correlation_header(mut self, header: HeaderName) -> Self {
        self.correlation_header = header;
        self
    }

    /// Whether plain 4xx/5xx responses of the inner service are rewritten
    /// into the error contract. On by default.
    pub fn with_error_response_translation(mut self, enabled: bool) -> Self {
        self.translate_error_responses = enabled;
        self
    }

    pub fn handler(&self) -> &ApiExceptionHandler<AxumAdapter> {
        &self.handler
    }
}

impl<S> Layer<S> for ErrorTranslationLayer {
    type Service = ErrorTranslationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ErrorTranslationService {
            inner,
            handler: self.handler.clone(),
            correlation_header: self.correlation_header.clone(),
            translate_error_responses: self.translate_error_responses,
        }
    }
}

#[derive(Clone)]
pub struct ErrorTranslationService<S> {
    inner: S,
    handler: Arc<ApiExceptionHandler<AxumAdapter>>,
    correlation_header: HeaderName,
    translate_error_responses: bool,
}

impl<S> ErrorTranslationService<S> {
    fn context_for(&self, req: &Request<Body>) -> RequestContext {
        let context = RequestContext::new(req.method().as_str(), req.uri().path());
        match req
            .headers()
            .get(&self.correlation_header)
            .and_then(|value| value.to_str().ok())
        {
            Some(correlation_id) => context.with_correlation_id(correlation_id),
            None => context,
        }
    }
}

impl<S> Service<Request<Body>> for ErrorTranslationService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<BoxError> + Send,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = std::result::Result<Response, Infallible>> + Send>>;

    // Readiness errors of the inner service are translated in `call`.
    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Infallible>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let context = self.context_for(&req);
        let handler = self.handler.clone();
        let translate_error_responses = self.translate_error_responses;
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = match inner.oneshot(req).await {
                Ok(response) => response,
                Err(error) => {
                    let error: BoxError = error.into();
                    return Ok(handler.handle(error.as_ref(), &context).framework_representation);
                }
            };

            if let Some(RaisedFailure(error)) = outcome.extensions().get::<RaisedFailure>().cloned() {
                return Ok(handler.handle(error.as_ref(), &context).framework_representation);
            }

            let status = outcome.status();
            let already_translated = outcome.extensions().get::<ErrorContractResponse>().is_some();
            if translate_error_responses
                && (status.is_client_error() || status.is_server_error())
                && !already_translated
            {
                let error = HttpStatusException::new(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("error response"),
                );
                return Ok(handler.handle(&error, &context).framework_representation);
            }

            Ok(outcome)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ErrorDefinition;

    #[test]
    fn test_from_config_rejects_catalog_without_core_errors() {
        let catalog = ErrorCatalog::builder()
            .define(ErrorDefinition::new(core::NOT_FOUND, "Not found", 404))
            .fallback(ErrorDefinition::new("GENERIC_SERVER_ERROR", "Something went wrong", 500))
            .build()
            .unwrap();

        let err = ErrorTranslationLayer::from_config(Arc::new(catalog), vec![], &PipelineConfig::default())
            .err()
            .unwrap();
        match err {
            FaultlineError::MissingCoreErrors { codes } => {
                assert!(codes.contains(&core::MALFORMED_REQUEST.to_string()));
                assert!(!codes.contains(&core::NOT_FOUND.to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_config_accepts_catalog_with_core_errors() {
        let catalog = ErrorCatalog::builder().with_core_errors().build().unwrap();
        assert!(
            ErrorTranslationLayer::from_config(Arc::new(catalog), vec![], &PipelineConfig::default())
                .is_ok()
        );
    }
}
