//! Unhandled-exception handler
//!
//! The last stop for failures the chain could not resolve, and for failures
//! whose resolution broke the engine. It always answers, with the generic
//! server error, and it is the only place where the complete failure detail
//! (debug representation and source chain) is logged.

use crate::catalog::core::{GENERIC_SERVICE_ERROR, GENERIC_SERVICE_ERROR_MESSAGE};
use crate::catalog::{ErrorCatalog, ErrorDefinition, is_server_error};
use crate::common::RequestContext;
use crate::engine::{ExceptionHandlingResult, ResolvedError};
use crate::exception::{DynError, describe_chain};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// The generic 500 definition the handler falls back to when no catalog is
/// available. Independent of any application configuration.
pub fn hardcoded_generic_error() -> ErrorDefinition {
    ErrorDefinition::new(GENERIC_SERVICE_ERROR, GENERIC_SERVICE_ERROR_MESSAGE, 500)
}

#[derive(Debug, Clone, Default)]
pub struct UnhandledExceptionHandler {
    catalog: Option<Arc<ErrorCatalog>>,
}

impl UnhandledExceptionHandler {
    /// Answer with the catalog's fallback definition.
    pub fn new(catalog: Arc<ErrorCatalog>) -> Self {
        Self {
            catalog: Some(catalog),
        }
    }

    /// Answer with the hardcoded generic definition only.
    pub fn standalone() -> Self {
        Self { catalog: None }
    }

    /// Build the generic result for `error`. Never fails, never panics.
    pub fn handle_unhandled<'e>(
        &self,
        error: &'e DynError,
        context: &RequestContext,
    ) -> ExceptionHandlingResult<'e> {
        log_unhandled(error, context);

        let definition = self.generic_definition();
        let http_status = definition.http_status();
        ExceptionHandlingResult::new(http_status, vec![ResolvedError::new(definition)], error, None)
    }

    fn generic_definition(&self) -> Arc<ErrorDefinition> {
        let from_catalog = self.catalog.as_ref().and_then(|catalog| {
            panic::catch_unwind(AssertUnwindSafe(|| Arc::clone(catalog.fallback()))).ok()
        });
        match from_catalog {
            Some(definition) if is_server_error(definition.http_status()) => definition,
            _ => Arc::new(hardcoded_generic_error()),
        }
    }
}

fn log_unhandled(error: &DynError, context: &RequestContext) {
    // Formatting user error types can panic too; the log line is best effort.
    let detail = panic::catch_unwind(AssertUnwindSafe(|| {
        (describe_chain(error), format!("{error:?}"))
    }));
    match detail {
        Ok((chain, debug_repr)) => tracing::error!(
            method = %context.method(),
            path = %context.path(),
            error_id = context.correlation_id().unwrap_or("-"),
            exception = %chain,
            exception_debug = %debug_repr,
            "Unhandled exception; responding with the generic service error"
        ),
        Err(_) => tracing::error!(
            method = %context.method(),
            path = %context.path(),
            error_id = context.correlation_id().unwrap_or("-"),
            "Unhandled exception whose description could not be rendered; responding with the generic service error"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::BoxError;
    use std::collections::BTreeMap;
    use std::fmt;
    use std::io;
    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::{Layer, Registry};

    #[derive(Clone, Default)]
    struct CapturedFields(Arc<Mutex<Vec<BTreeMap<String, String>>>>);

    struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for FieldVisitor<'_> {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{value:?}"));
        }
    }

    impl<S: tracing::Subscriber> Layer<S> for CapturedFields {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = BTreeMap::new();
            event.record(&mut FieldVisitor(&mut fields));
            self.0.lock().unwrap().push(fields);
        }
    }

    struct PanickyDisplay;

    impl fmt::Debug for PanickyDisplay {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("debug exploded")
        }
    }

    impl fmt::Display for PanickyDisplay {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("display exploded")
        }
    }

    impl std::error::Error for PanickyDisplay {}

    #[test]
    fn test_uses_catalog_fallback() {
        let catalog = Arc::new(
            ErrorCatalog::builder()
                .fallback(ErrorDefinition::new("OOPS", "Oops", 503))
                .build()
                .unwrap(),
        );
        let handler = UnhandledExceptionHandler::new(catalog);
        let err: BoxError = Box::new(io::Error::other("db password=hunter2"));

        let result = handler.handle_unhandled(err.as_ref(), &RequestContext::default());
        assert_eq!(result.http_status(), 503);
        assert_eq!(result.codes(), vec!["OOPS"]);
        assert!(result.listener().is_none());
    }

    #[test]
    fn test_standalone_uses_hardcoded_definition() {
        let handler = UnhandledExceptionHandler::standalone();
        let err: BoxError = Box::new(io::Error::other("boom"));

        let result = handler.handle_unhandled(err.as_ref(), &RequestContext::default());
        assert_eq!(result.http_status(), 500);
        assert_eq!(result.codes(), vec![GENERIC_SERVICE_ERROR]);
        assert_eq!(result.errors()[0].message(), GENERIC_SERVICE_ERROR_MESSAGE);
    }

    #[test]
    fn test_logs_debug_representation_and_source_chain() {
        let captured = CapturedFields::default();
        let subscriber = Registry::default().with(captured.clone());

        tracing::subscriber::with_default(subscriber, || {
            let err: BoxError = Box::new(
                crate::exception::HttpStatusException::new(502, "gateway")
                    .with_source(io::Error::other("upstream reset")),
            );
            let ctx = RequestContext::new("GET", "/orders").with_correlation_id("corr-1");
            UnhandledExceptionHandler::standalone().handle_unhandled(err.as_ref(), &ctx);
        });

        let events = captured.0.lock().unwrap();
        let event = events
            .iter()
            .find(|fields| fields.contains_key("exception_debug"))
            .expect("unhandled exception event");
        assert!(event["exception_debug"].contains("HttpStatusException"));
        assert!(event["exception"].contains("upstream reset"));
        assert_eq!(event["error_id"], "\"corr-1\"");
    }

    #[test]
    fn test_survives_failures_that_cannot_be_formatted() {
        let handler = UnhandledExceptionHandler::standalone();
        let err: BoxError = Box::new(PanickyDisplay);

        let result = handler.handle_unhandled(err.as_ref(), &RequestContext::default());
        assert_eq!(result.http_status(), 500);
    }
}
